//! history charts: one shared time axis, one series per metric
//!
//! a chart set is always rebuilt from a full history response; there is no
//! incremental append. only the newest `MAX_CHART_POINTS` samples are kept.

use crate::domain::Snapshot;
use crate::view::Metric;
use chrono::NaiveDateTime;
use serde::Serialize;

pub const MAX_CHART_POINTS: usize = 200;

/// series drawn per history load, in display order
pub const CHART_METRICS: [Metric; 5] = [Metric::Temperature, Metric::Humidity, Metric::Ph, Metric::Tds, Metric::Ec];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Series {
    pub metric: Metric,
    pub label: String,
    /// gaps stay `None` so a missing reading is not plotted as zero
    pub points: Vec<Option<f64>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSet {
    pub range: String,
    pub labels: Vec<Option<NaiveDateTime>>,
    pub series: Vec<Series>,
}

impl ChartSet {
    /// build every series from a history response (oldest first)
    pub fn from_history(range: &str, history: &[Snapshot]) -> Self {
        let window = &history[history.len().saturating_sub(MAX_CHART_POINTS)..];

        let labels = window.iter().map(Snapshot::recorded_at).collect();
        let series = CHART_METRICS
            .iter()
            .map(|metric| Series {
                metric: *metric,
                label: match metric.unit() {
                    Some(unit) => format!("{} ({})", metric.label(), unit),
                    None => metric.label().to_string(),
                },
                points: window.iter().map(|s| metric.value(s)).collect(),
            })
            .collect();

        Self { range: range.to_string(), labels, series }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn series(&self, metric: Metric) -> Option<&Series> {
        self.series.iter().find(|s| s.metric == metric)
    }

    /// most recent non-empty value of a series
    pub fn latest(&self, metric: Metric) -> Option<f64> {
        self.series(metric)?.points.iter().rev().find_map(|p| *p)
    }
}
