//! Shared helpers for the integration tests.
//!
//! - `RecordingRenderer` captures every render call in order
//! - `FakeSource` is an in-process `DataSource` with scripted snapshot
//!   responses, optional per-call delays and an optional gate

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use hydroponic_dashboard::chart::ChartSet;
use hydroponic_dashboard::domain::{
    ConnectionStatus, ControlRequest, Envelope, LampId, LampState, LampSwitch, Snapshot,
};
use hydroponic_dashboard::view::{ConnectionView, LampView, SnapshotView};
use hydroponic_dashboard::{DataSource, Renderer, Result, SnapshotEndpoint};

// ============================================================================
// Recording renderer
// ============================================================================

#[derive(Debug, Clone)]
pub enum Event {
    Snapshot(SnapshotView),
    Lamps(Vec<LampView>),
    Connection(ConnectionView),
    Charts(ChartSet),
    Alert(String),
}

#[derive(Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<Event>>,
}

impl RecordingRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn snapshots(&self) -> Vec<SnapshotView> {
        self.events()
            .into_iter()
            .filter_map(|e| if let Event::Snapshot(v) = e { Some(v) } else { None })
            .collect()
    }

    pub fn lamp_lists(&self) -> Vec<Vec<LampView>> {
        self.events()
            .into_iter()
            .filter_map(|e| if let Event::Lamps(v) = e { Some(v) } else { None })
            .collect()
    }

    pub fn connections(&self) -> Vec<ConnectionView> {
        self.events()
            .into_iter()
            .filter_map(|e| if let Event::Connection(v) = e { Some(v) } else { None })
            .collect()
    }

    pub fn charts(&self) -> Vec<ChartSet> {
        self.events()
            .into_iter()
            .filter_map(|e| if let Event::Charts(v) = e { Some(v) } else { None })
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| if let Event::Alert(v) = e { Some(v) } else { None })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn render_snapshot(&self, view: &SnapshotView) {
        self.push(Event::Snapshot(view.clone()));
    }

    fn render_lamp_list(&self, lamps: &[LampView]) {
        self.push(Event::Lamps(lamps.to_vec()));
    }

    fn render_connection_status(&self, view: &ConnectionView) {
        self.push(Event::Connection(view.clone()));
    }

    fn render_charts(&self, charts: &ChartSet) {
        self.push(Event::Charts(charts.clone()));
    }

    fn alert(&self, message: &str) {
        self.push(Event::Alert(message.to_string()));
    }
}

// ============================================================================
// Fake data source
// ============================================================================

pub fn success<T>(data: T) -> Envelope<T> {
    Envelope { status: Some("success".to_string()), message: None, data: Some(data), source: None, timestamp: None }
}

pub fn reading(temperature: f64) -> Snapshot {
    Snapshot { temperature: Some(temperature), ..Default::default() }
}

#[derive(Default)]
pub struct FakeSource {
    calls: Mutex<Vec<SnapshotEndpoint>>,
    script: Mutex<VecDeque<(Duration, Snapshot)>>,
    gate: Option<Arc<Notify>>,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// every snapshot call waits for one `notify_one` on `gate`
    pub fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self { gate: Some(gate), ..Default::default() })
    }

    /// queue the response for the next unscripted snapshot call
    pub fn push(&self, delay: Duration, snapshot: Snapshot) {
        self.script.lock().unwrap().push_back((delay, snapshot));
    }

    pub fn calls(&self) -> Vec<SnapshotEndpoint> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource for FakeSource {
    async fn snapshot(&self, endpoint: SnapshotEndpoint) -> Result<Envelope<Snapshot>> {
        self.calls.lock().unwrap().push(endpoint);
        let (delay, snapshot) = self.script.lock().unwrap().pop_front().unwrap_or((Duration::ZERO, reading(21.0)));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(success(snapshot))
    }

    async fn history(&self, _range: &str) -> Result<Envelope<Vec<Snapshot>>> {
        Ok(success(vec![reading(20.0), reading(21.0), reading(22.0)]))
    }

    async fn control(&self, _request: &ControlRequest) -> Result<Envelope<Value>> {
        Ok(success(Value::Null))
    }

    async fn lamps(&self) -> Result<Vec<LampState>> {
        Ok(vec![
            LampState { id: LampId::from(1u32), status: Some("on".into()), timestamp: None },
            LampState { id: LampId::from(2u32), status: Some("0".into()), timestamp: None },
        ])
    }

    async fn set_lamp(&self, _id: &LampId, _status: LampSwitch) -> Result<Envelope<Value>> {
        Ok(success(Value::Null))
    }

    async fn connection(&self) -> Result<ConnectionStatus> {
        Ok(ConnectionStatus { connected: true, port: Some("/dev/ttyUSB0".into()), baudrate: Some(9600) })
    }
}
