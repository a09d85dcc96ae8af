//! ==============================================================================
//! view.rs - display formatting for snapshots, lamps and the serial link
//! ==============================================================================
//!
//! purpose:
//!     turns domain values into the exact text a renderer shows. nothing in
//!     here does i/o, so every formatting rule is testable on its own.
//!
//! rules:
//!     - a present metric is shown at its precision followed by its unit
//!     - an absent (or null) metric is shown as its fixed placeholder
//!     - a lamp is "On"/affirmative only for "on" or "1"
//!     - missing port/baud rate show as "unknown"
//!
//! relationships:
//!     - used by: cycle.rs (builds views before calling the renderer)
//!     - used by: page.rs, console.rs (draw the views)
//!
//! ==============================================================================

use crate::domain::{ConnectionStatus, LampId, LampState, Snapshot};
use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Temperature,
    Humidity,
    Tds,
    Ph,
    Ec,
}

impl Metric {
    pub const ALL: [Metric; 5] = [Metric::Temperature, Metric::Humidity, Metric::Tds, Metric::Ph, Metric::Ec];

    /// lowercase identifier, matches the serialized form
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Tds => "tds",
            Metric::Ph => "ph",
            Metric::Ec => "ec",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::Tds => "TDS",
            Metric::Ph => "pH",
            Metric::Ec => "EC",
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self {
            Metric::Temperature => Some("°C"),
            Metric::Humidity => Some("%"),
            Metric::Tds => Some("ppm"),
            Metric::Ph => None,
            Metric::Ec => Some("mS/cm"),
        }
    }

    /// decimal places shown
    pub fn precision(&self) -> usize {
        match self {
            Metric::Temperature | Metric::Ec => 1,
            Metric::Ph => 2,
            Metric::Tds | Metric::Humidity => 0,
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Metric::Temperature => "-- °C",
            Metric::Humidity => "-- %",
            Metric::Tds => "-- ppm",
            Metric::Ph => "--",
            Metric::Ec => "-- mS/cm",
        }
    }

    pub fn value(&self, snapshot: &Snapshot) -> Option<f64> {
        match self {
            Metric::Temperature => snapshot.temperature,
            Metric::Humidity => snapshot.humidity,
            Metric::Tds => snapshot.tds,
            Metric::Ph => snapshot.ph,
            Metric::Ec => snapshot.ec,
        }
    }

    pub fn format(&self, value: Option<f64>) -> String {
        let places = self.precision();
        match (value.map(|v| round_half_away(v, places)), self.unit()) {
            (None, _) => self.placeholder().to_string(),
            (Some(v), Some(unit)) => format!("{:.*} {}", places, v, unit),
            (Some(v), None) => format!("{:.*}", places, v),
        }
    }
}

/// ties round away from zero (60.5 -> 61); `{:.N}` alone rounds them to even
fn round_half_away(value: f64, places: usize) -> f64 {
    let scale = 10f64.powi(places as i32);
    (value * scale).round() / scale
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Readout {
    pub metric: Metric,
    pub text: String,
}

/// one rendered pass over a snapshot
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SnapshotView {
    pub readouts: Vec<Readout>,
    pub last_updated: String,
}

impl SnapshotView {
    pub fn new(snapshot: &Snapshot, now: DateTime<Local>) -> Self {
        let readouts = Metric::ALL
            .iter()
            .map(|m| Readout { metric: *m, text: m.format(m.value(snapshot)) })
            .collect();
        Self { readouts, last_updated: format!("Last updated: {}", now.format("%Y-%m-%d %H:%M:%S")) }
    }

    pub fn text(&self, metric: Metric) -> Option<&str> {
        self.readouts.iter().find(|r| r.metric == metric).map(|r| r.text.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// green
    Affirmative,
    /// grey
    Neutral,
}

impl Tone {
    pub fn css_class(&self) -> &'static str {
        match self {
            Tone::Affirmative => "success",
            Tone::Neutral => "secondary",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LampView {
    pub id: LampId,
    pub title: String,
    pub badge: &'static str,
    pub tone: Tone,
}

impl From<&LampState> for LampView {
    fn from(lamp: &LampState) -> Self {
        let (badge, tone) = if lamp.is_on() { ("On", Tone::Affirmative) } else { ("Off", Tone::Neutral) };
        Self { id: lamp.id.clone(), title: format!("Lamp {}", lamp.id), badge, tone }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ConnectionView {
    /// request in flight
    Checking,
    Known { connected: bool, port: String, baudrate: String },
    /// the status endpoint itself could not be reached
    Unreachable,
}

pub const UNKNOWN: &str = "unknown";

impl From<&ConnectionStatus> for ConnectionView {
    fn from(status: &ConnectionStatus) -> Self {
        ConnectionView::Known {
            connected: status.connected,
            port: status.port.clone().filter(|p| !p.is_empty()).unwrap_or_else(|| UNKNOWN.to_string()),
            baudrate: status.baudrate.map(|b| b.to_string()).unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

impl ConnectionView {
    pub fn text(&self) -> String {
        match self {
            ConnectionView::Checking => "Checking connection...".to_string(),
            ConnectionView::Known { connected, port, baudrate } => format!(
                "Port: {} | Speed: {} baud | {}",
                port,
                baudrate,
                if *connected { "Connected" } else { "Not connected" }
            ),
            ConnectionView::Unreachable => "Unable to check connection".to_string(),
        }
    }
}
