//! ==============================================================================
//! page.rs - in-memory dashboard page
//! ==============================================================================
//!
//! purpose:
//!     `PageRenderer` is the renderer used by `serve`. each render call
//!     overwrites its part of a `Page` model the same way the browser page
//!     overwrote element text; web.rs serves that model as html and json.
//!
//! relationships:
//!     - implements: render.rs (Renderer)
//!     - read by: web.rs (GET / and GET /api/page)
//!
//! ==============================================================================

use crate::chart::{ChartSet, Series};
use crate::domain::Snapshot;
use crate::render::Renderer;
use crate::view::{ConnectionView, LampView, Readout, SnapshotView};

use serde::Serialize;
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard};

/// alerts kept on the page; older ones drop off first
pub const MAX_ALERTS: usize = 20;

/// known history ranges offered by the range selector
pub const RANGE_CHOICES: [&str; 4] = ["1h", "24h", "7d", "30d"];

#[derive(Clone, Debug, Serialize)]
pub struct Page {
    pub readouts: Vec<Readout>,
    pub last_updated: Option<String>,
    pub lamps: Vec<LampView>,
    pub connection: Option<ConnectionView>,
    pub charts: Option<ChartSet>,
    /// alerts stay until dismissed, newest `MAX_ALERTS` only
    pub alerts: Vec<String>,
}

impl Default for Page {
    fn default() -> Self {
        // placeholders until the first snapshot arrives
        let blank = SnapshotView::new(&Snapshot::default(), chrono::Local::now());
        Self {
            readouts: blank.readouts,
            last_updated: None,
            lamps: Vec::new(),
            connection: None,
            charts: None,
            alerts: Vec::new(),
        }
    }
}

pub struct PageRenderer {
    page: Mutex<Page>,
    show_sensor_data: bool,
}

impl PageRenderer {
    pub fn new(show_sensor_data: bool) -> Self {
        Self { page: Mutex::new(Page::default()), show_sensor_data }
    }

    fn page(&self) -> MutexGuard<'_, Page> {
        // a panic mid-render leaves a page that is still safe to show
        self.page.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Page {
        self.page().clone()
    }

    pub fn dismiss_alerts(&self) {
        self.page().alerts.clear();
    }
}

impl Renderer for PageRenderer {
    fn render_snapshot(&self, view: &SnapshotView) {
        if self.show_sensor_data {
            let line: Vec<String> = view.readouts.iter().map(|r| format!("{}: {}", r.metric.label(), r.text)).collect();
            tracing::info!("[SENSOR] {}", line.join(" | "));
        }
        let mut page = self.page();
        page.readouts = view.readouts.clone();
        page.last_updated = Some(view.last_updated.clone());
    }

    fn render_lamp_list(&self, lamps: &[LampView]) {
        self.page().lamps = lamps.to_vec();
    }

    fn render_connection_status(&self, view: &ConnectionView) {
        self.page().connection = Some(view.clone());
    }

    fn render_charts(&self, charts: &ChartSet) {
        self.page().charts = Some(charts.clone());
    }

    fn alert(&self, message: &str) {
        tracing::warn!("[ALERT] {}", message);
        let mut page = self.page();
        page.alerts.push(message.to_string());
        let overflow = page.alerts.len().saturating_sub(MAX_ALERTS);
        page.alerts.drain(..overflow);
    }
}

// ==============================================================================
// html
// ==============================================================================

/// render the page as a self-contained html document
///
/// every control is a plain form post, so the page works without scripts.
pub fn render_html(page: &Page, refresh_secs: u64, paused: bool) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="{}">
<title>Hydroponic Dashboard</title>
<style>
body {{ font-family: system-ui; padding: 1.5rem; background: #1a1a2e; color: #eee; }}
.card {{ display: inline-block; min-width: 9rem; margin: 0 1rem 1rem 0; padding: 1rem; background: #16213e; border-radius: 8px; }}
.value {{ font-size: 1.6rem; font-weight: bold; }}
.badge {{ padding: 0.1rem 0.5rem; border-radius: 4px; }}
.badge.success {{ background: #1cc88a; }}
.badge.secondary {{ background: #6c757d; }}
.alert {{ background: #e74a3b; padding: 0.75rem; border-radius: 8px; margin-bottom: 1rem; }}
form {{ display: inline; }}
</style>
</head>
<body>
"#,
        refresh_secs.max(1)
    );

    if !page.alerts.is_empty() {
        html.push_str("<div class=\"alert\">");
        for alert in &page.alerts {
            let _ = write!(html, "<p>{}</p>", html_escape(alert));
        }
        html.push_str("<form method=\"post\" action=\"/alerts/dismiss\"><button>Dismiss</button></form></div>\n");
    }

    html.push_str("<h1>Hydroponic Dashboard</h1>\n<section>\n");
    for readout in &page.readouts {
        let _ = write!(
            html,
            "<div class=\"card\" id=\"{}-display\"><div>{}</div><div class=\"value\">{}</div></div>\n",
            readout.metric.key(),
            readout.metric.label(),
            html_escape(&readout.text)
        );
    }
    let _ = write!(
        html,
        "</section>\n<p id=\"last-updated\">{}</p>\n\
         <form method=\"post\" action=\"/refresh\"><button>Refresh</button></form>\n\
         <form method=\"post\" action=\"/visibility/{}\"><button>{}</button></form>\n",
        html_escape(page.last_updated.as_deref().unwrap_or("Last updated: never")),
        if paused { "visible" } else { "hidden" },
        if paused { "Resume updates" } else { "Pause updates" }
    );

    html.push_str("<h2>Serial link</h2>\n");
    let _ = write!(
        html,
        "<p id=\"comdetails\">{}</p>\n",
        html_escape(&page.connection.as_ref().map(ConnectionView::text).unwrap_or_default())
    );

    html.push_str("<h2>Lamps</h2>\n<div id=\"lampStatusContainer\">\n");
    for lamp in &page.lamps {
        let id = html_escape(&lamp.id.0);
        let _ = write!(
            html,
            "<div><strong>{}</strong> \
             <form method=\"post\" action=\"/lamps/{id}/on\"><button>Turn On</button></form> \
             <form method=\"post\" action=\"/lamps/{id}/off\"><button>Turn Off</button></form> \
             <span class=\"badge {}\">{}</span></div>\n",
            html_escape(&lamp.title),
            lamp.tone.css_class(),
            lamp.badge,
            id = id
        );
    }
    html.push_str("</div>\n");

    html.push_str("<h2>History</h2>\n<form method=\"post\" action=\"/range\"><select name=\"range\">");
    let selected = page.charts.as_ref().map(|c| c.range.as_str());
    for choice in RANGE_CHOICES {
        let _ = write!(
            html,
            "<option value=\"{0}\"{1}>{0}</option>",
            choice,
            if selected == Some(choice) { " selected" } else { "" }
        );
    }
    html.push_str("</select> <button>Show</button></form>\n");
    if let Some(charts) = &page.charts {
        for series in &charts.series {
            let _ = write!(html, "<div class=\"card\"><div>{}</div>{}</div>\n", html_escape(&series.label), sparkline(series));
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

const SPARK_W: f64 = 240.0;
const SPARK_H: f64 = 60.0;

/// a bare svg polyline; gaps break the line
fn sparkline(series: &Series) -> String {
    let present: Vec<f64> = series.points.iter().flatten().copied().collect();
    if present.is_empty() {
        return "<p>no data</p>".to_string();
    }
    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };
    let step = if series.points.len() > 1 { SPARK_W / (series.points.len() - 1) as f64 } else { 0.0 };

    let mut segments: Vec<Vec<String>> = vec![Vec::new()];
    for (i, point) in series.points.iter().enumerate() {
        match point {
            Some(v) => {
                let x = i as f64 * step;
                let y = SPARK_H - (v - min) / span * SPARK_H;
                if let Some(current) = segments.last_mut() {
                    current.push(format!("{:.1},{:.1}", x, y));
                }
            }
            None => segments.push(Vec::new()),
        }
    }

    let mut svg = format!("<svg width=\"{}\" height=\"{}\">", SPARK_W, SPARK_H);
    for segment in segments.iter().filter(|s| !s.is_empty()) {
        let _ = write!(svg, "<polyline fill=\"none\" stroke=\"#4e73df\" points=\"{}\"/>", segment.join(" "));
    }
    svg.push_str("</svg>");
    svg
}

/// escape html special characters to prevent xss
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
