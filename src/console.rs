//! renderer for one-shot cli commands: readings to stdout, alerts to stderr

use crate::chart::{ChartSet, CHART_METRICS};
use crate::render::Renderer;
use crate::view::{ConnectionView, LampView, SnapshotView};

#[derive(Default)]
pub struct ConsoleRenderer;

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for ConsoleRenderer {
    fn render_snapshot(&self, view: &SnapshotView) {
        println!("[SENSOR] {}", view.last_updated);
        for readout in &view.readouts {
            println!("  {:<12} {}", readout.metric.label(), readout.text);
        }
    }

    fn render_lamp_list(&self, lamps: &[LampView]) {
        if lamps.is_empty() {
            println!("[LAMP] no lamps reported");
        }
        for lamp in lamps {
            println!("[LAMP] {:<10} {}", lamp.title, lamp.badge);
        }
    }

    fn render_connection_status(&self, view: &ConnectionView) {
        // "checking" is only interesting while a page is on screen
        if !matches!(view, ConnectionView::Checking) {
            println!("[COM] {}", view.text());
        }
    }

    fn render_charts(&self, charts: &ChartSet) {
        println!("[CHART] range {} | {} points", charts.range, charts.len());
        for metric in CHART_METRICS {
            let latest = metric.format(charts.latest(metric));
            let Some(series) = charts.series(metric) else { continue };
            let present = series.points.iter().filter(|p| p.is_some()).count();
            println!("  {:<12} latest {} ({} readings)", metric.label(), latest, present);
        }
        if let (Some(first), Some(last)) = (charts.labels.iter().flatten().next(), charts.labels.iter().flatten().last()) {
            println!("  from {} to {}", first, last);
        }
    }

    fn alert(&self, message: &str) {
        eprintln!("⚠ {}", message);
    }
}
