use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// one reading of every sensor metric
///
/// every field is optional: the controller omits (or nulls) sensors that
/// are offline, and those must render as a placeholder, never as zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// temperature in celsius
    #[serde(default)]
    pub temperature: Option<f64>,
    /// relative humidity (0-100%)
    #[serde(default)]
    pub humidity: Option<f64>,
    /// total dissolved solids in ppm
    #[serde(default)]
    pub tds: Option<f64>,
    #[serde(default)]
    pub ph: Option<f64>,
    /// electrical conductivity in mS/cm
    #[serde(default)]
    pub ec: Option<f64>,
    /// iso-8601 timestamp as sent by the controller (history items only)
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl Snapshot {
    /// parse `timestamp`, accepting both offset and naive iso-8601 forms
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }
}

/// parse the controller's timestamps ("2024-05-01T10:00:00",
/// "2024-05-01T10:00:00.123456" or "2024-05-01T10:00:00+07:00")
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// the `{status, message, data}` wrapper most endpoints return
#[derive(Clone, Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
    /// "hardware" or "database" depending on where the reading came from
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// lamp identifier; the controller sends integers, older firmware strings
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LampId(pub String);

impl fmt::Display for LampId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LampId {
    fn from(s: &str) -> Self {
        LampId(s.to_string())
    }
}

impl From<u32> for LampId {
    fn from(n: u32) -> Self {
        LampId(n.to_string())
    }
}

impl<'de> Deserialize<'de> for LampId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => LampId(n.to_string()),
            Raw::Text(s) => LampId(s),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LampState {
    pub id: LampId,
    /// "on"/"off", or legacy "1"/"0"
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl LampState {
    /// only "on" and "1" count as lit; anything else (including missing) is off
    pub fn is_on(&self) -> bool {
        matches!(self.status.as_deref(), Some("on") | Some("1"))
    }
}

/// the value written by `PUT /lamp/status/{id}`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LampSwitch {
    On,
    Off,
}

impl LampSwitch {
    pub fn as_str(&self) -> &'static str {
        match self {
            LampSwitch::On => "on",
            LampSwitch::Off => "off",
        }
    }
}

impl std::str::FromStr for LampSwitch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" | "1" => Ok(LampSwitch::On),
            "off" | "0" => Ok(LampSwitch::Off),
            other => Err(format!("unknown lamp status '{}' (expected on/off)", other)),
        }
    }
}

/// body of `POST /lamp/lampcontrol`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlRequest {
    pub device_id: String,
    pub action: String,
    pub channel: String,
}

/// serial link between the controller and the hardware
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub baudrate: Option<u32>,
}

/// body of `GET /com-status`
///
/// newer controllers send `{connected: {connected, port, baudrate}}`,
/// older ones just `{connected: true}`.
#[derive(Clone, Debug, Deserialize)]
pub struct ComStatusResponse {
    pub connected: ConnectionField,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ConnectionField {
    Detailed(ConnectionStatus),
    Flag(bool),
}

impl From<ConnectionField> for ConnectionStatus {
    fn from(field: ConnectionField) -> Self {
        match field {
            ConnectionField::Detailed(status) => status,
            ConnectionField::Flag(connected) => ConnectionStatus { connected, ..Default::default() },
        }
    }
}
