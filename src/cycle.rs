//! ==============================================================================
//! cycle.rs - the refresh cycle: poll, render, control
//! ==============================================================================
//!
//! purpose:
//!     `RefreshCycle` owns everything the dashboard page used to keep in
//!     globals: the current snapshot, the selected history range and the
//!     polling timer. it reads from a `DataSource`, formats through view.rs
//!     and draws through a `Renderer`.
//!
//! lifecycle:
//!     start()  -> start_polling(), then initial snapshot, lamp list,
//!                 serial status and history, all in flight at once
//!     stop()   -> stop_polling()
//!
//! error tiers:
//!     - reads (snapshot, lamps, serial, history): logged, display untouched
//!     - control writes: `Renderer::alert` naming the failure
//!     - malformed bodies: logged at error level, nothing rendered
//!     no retries, no backoff.
//!
//! ordering:
//!     each tick spawns its load as its own task. loads are never cancelled
//!     and never sequenced: whichever response lands last is what stays on
//!     screen, even if it was issued first. stop_polling() only stops future
//!     ticks; a load already in flight still renders.
//!
//! relationships:
//!     - uses: source.rs (DataSource), render.rs (Renderer), view.rs, chart.rs
//!     - used by: main.rs (serve and one-shot commands), web.rs (form actions)
//!
//! ```text
//!     ┌───────────────────────────────────────────────────┐
//!     │                  RefreshCycle                     │
//!     │  ┌──────────────┐  spawn per tick  ┌───────────┐  │
//!     │  │ timer task   │ ───────────────> │ load task │  │
//!     │  │ (Weak inner) │                  └─────┬─────┘  │
//!     │  └──────────────┘                        │        │
//!     └──────────────────────────────────────────┼────────┘
//!                      ┌─────────────────────────┴───┐
//!                      ▼                             ▼
//!               ┌─────────────┐               ┌─────────────┐
//!               │ DataSource  │               │  Renderer   │
//!               └─────────────┘               └─────────────┘
//!
//! ```
//! ==============================================================================

use crate::chart::ChartSet;
use crate::config::{DashboardConfig, SnapshotFeed};
use crate::domain::{ConnectionStatus, ControlRequest, LampId, LampState, LampSwitch, Snapshot};
use crate::error::{DashboardError, Result};
use crate::render::Renderer;
use crate::source::{DataSource, SnapshotEndpoint};
use crate::view::{ConnectionView, LampView, SnapshotView};

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// whether the page is on screen; hidden pages do not poll
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

#[derive(Clone, Debug)]
pub struct CycleSettings {
    pub feed: SnapshotFeed,
    pub interval: Duration,
    pub default_range: String,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self { feed: SnapshotFeed::Hardware, interval: Duration::from_secs(30), default_range: "24h".to_string() }
    }
}

impl CycleSettings {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            feed: config.polling.feed,
            interval: config.polling.interval(),
            default_range: config.history.default_range.clone(),
        }
    }

    /// endpoint read on page load and manual refresh
    fn initial_endpoint(&self) -> SnapshotEndpoint {
        match self.feed {
            SnapshotFeed::Hardware => SnapshotEndpoint::Current,
            SnapshotFeed::Api => SnapshotEndpoint::ApiCurrent,
        }
    }

    /// endpoint read on every timer tick
    fn polling_endpoint(&self) -> SnapshotEndpoint {
        match self.feed {
            SnapshotFeed::Hardware => SnapshotEndpoint::Live,
            SnapshotFeed::Api => SnapshotEndpoint::ApiCurrent,
        }
    }
}

struct Inner {
    source: Arc<dyn DataSource>,
    renderer: Arc<dyn Renderer>,
    settings: CycleSettings,
    current: RwLock<Option<Snapshot>>,
    range: RwLock<String>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

/// clone-able handle; every clone drives the same page
#[derive(Clone)]
pub struct RefreshCycle {
    inner: Arc<Inner>,
}

impl RefreshCycle {
    pub fn new(source: Arc<dyn DataSource>, renderer: Arc<dyn Renderer>, settings: CycleSettings) -> Self {
        let range = settings.default_range.clone();
        Self {
            inner: Arc::new(Inner {
                source,
                renderer,
                settings,
                current: RwLock::new(None),
                range: RwLock::new(range),
                timer: Mutex::new(None),
            }),
        }
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.inner.settings
    }

    // ==========================================================================
    // lifecycle
    // ==========================================================================

    /// page load: start the timer, then run the initial reads side by side
    ///
    /// the reads are independent; a stalled one holds up neither the others
    /// nor polling. returns once every initial read has settled.
    pub async fn start(&self) {
        self.start_polling(self.inner.settings.interval).await;

        tracing::info!("[POLL] Loading initial data...");
        let range = self.selected_range().await;
        let _ = tokio::join!(
            self.load_snapshot(),
            self.fetch_lamp_status(),
            self.fetch_connection_status(),
            self.load_history(&range),
        );
    }

    pub async fn stop(&self) {
        self.stop_polling().await;
        tracing::info!("[POLL] Refresh cycle stopped");
    }

    // ==========================================================================
    // snapshot
    // ==========================================================================

    /// read the current values once and render them on success
    pub async fn load_snapshot(&self) -> Result<()> {
        self.load_snapshot_from(self.inner.settings.initial_endpoint()).await
    }

    /// manual refresh button
    pub async fn refresh(&self) -> Result<()> {
        self.load_snapshot().await
    }

    async fn load_snapshot_from(&self, endpoint: SnapshotEndpoint) -> Result<()> {
        let envelope = match self.inner.source.snapshot(endpoint).await {
            Ok(envelope) => envelope,
            Err(e) => {
                log_read_failure("[POLL] Error fetching sensor data", &e);
                return Err(e);
            }
        };

        if !envelope.is_success() {
            let e = DashboardError::rejected(envelope.status.as_deref(), envelope.message.as_deref());
            tracing::warn!("[POLL] Failed to load sensor data: {}", e);
            return Err(e);
        }

        let Some(snapshot) = envelope.data else {
            let e = DashboardError::UnexpectedShape("success response without data".to_string());
            tracing::error!("[POLL] {}", e);
            return Err(e);
        };

        tracing::debug!("[POLL] Sensor data ({:?}): {:?}", endpoint, snapshot);
        *self.inner.current.write().await = Some(snapshot.clone());
        self.render(&snapshot);
        Ok(())
    }

    /// format every metric (or its placeholder) and stamp "last updated"
    pub fn render(&self, snapshot: &Snapshot) {
        let view = SnapshotView::new(snapshot, chrono::Local::now());
        self.inner.renderer.render_snapshot(&view);
    }

    pub async fn current_snapshot(&self) -> Option<Snapshot> {
        self.inner.current.read().await.clone()
    }

    // ==========================================================================
    // polling timer
    // ==========================================================================

    /// (re)start the timer; any previous timer is cancelled first
    ///
    /// a zero interval still cancels the previous timer, it just starts no new one
    pub async fn start_polling(&self, interval: Duration) {
        let mut timer = self.inner.timer.lock().await;
        if let Some(previous) = timer.take() {
            previous.abort();
        }

        if interval.is_zero() {
            tracing::warn!("[POLL] Refusing to poll with a zero interval");
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let endpoint = self.inner.settings.polling_endpoint();
        *timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                let cycle = RefreshCycle { inner };
                // detached so that aborting the timer never cancels a load in flight
                tokio::spawn(async move {
                    if cycle.load_snapshot_from(endpoint).await.is_ok() {
                        tracing::debug!("[POLL] Real-time data updated");
                    }
                });
            }
        }));

        tracing::info!("[POLL] Polling every {}ms", interval.as_millis());
    }

    pub async fn stop_polling(&self) {
        if let Some(handle) = self.inner.timer.lock().await.take() {
            handle.abort();
            tracing::info!("[POLL] Polling stopped");
        }
    }

    pub async fn is_polling(&self) -> bool {
        self.inner.timer.lock().await.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// hidden stops polling, visible restarts it
    pub async fn set_visibility(&self, visibility: Visibility) {
        match visibility {
            Visibility::Hidden => self.stop_polling().await,
            Visibility::Visible => self.start_polling(self.inner.settings.interval).await,
        }
    }

    // ==========================================================================
    // lamps
    // ==========================================================================

    /// send a control command; failures raise an alert, success refreshes lamps
    pub async fn control_device(&self, device_id: &str, action: &str, channel: &str) -> Result<()> {
        tracing::info!("[LAMP] Controlling device {} to {} on channel {}", device_id, action, channel);
        let request = ControlRequest {
            device_id: device_id.to_string(),
            action: action.to_string(),
            channel: channel.to_string(),
        };

        let outcome = match self.inner.source.control(&request).await {
            Ok(envelope) if envelope.is_success() => Ok(()),
            Ok(envelope) => Err(DashboardError::rejected(envelope.status.as_deref(), envelope.message.as_deref())),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                tracing::info!("[LAMP] Device {} turned {} channel {}", device_id, action, channel);
                let _ = self.fetch_lamp_status().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!("[LAMP] Control of device {} failed: {}", device_id, e);
                self.inner.renderer.alert(&format!("Error controlling device: {}", e));
                Err(e)
            }
        }
    }

    /// read every lamp and rebuild the whole list
    pub async fn fetch_lamp_status(&self) -> Result<Vec<LampState>> {
        match self.inner.source.lamps().await {
            Ok(lamps) => {
                let views: Vec<LampView> = lamps.iter().map(LampView::from).collect();
                self.inner.renderer.render_lamp_list(&views);
                Ok(lamps)
            }
            Err(e) => {
                log_read_failure("[LAMP] Error fetching lamp status", &e);
                Err(e)
            }
        }
    }

    /// write one lamp, then resync the full list from the controller
    pub async fn update_lamp_status(&self, lamp_id: &LampId, status: LampSwitch) -> Result<()> {
        let envelope = match self.inner.source.set_lamp(lamp_id, status).await {
            Ok(envelope) => envelope,
            Err(e) => {
                log_read_failure("[LAMP] Error updating lamp status", &e);
                return Err(e);
            }
        };

        if !envelope.is_success() {
            let e = DashboardError::rejected(envelope.status.as_deref(), envelope.message.as_deref());
            tracing::error!("[LAMP] Update of lamp {} failed: {}", lamp_id, e);
            return Err(e);
        }

        tracing::info!("[LAMP] Lamp {} updated to {}", lamp_id, status.as_str());
        let _ = self.fetch_lamp_status().await;
        Ok(())
    }

    // ==========================================================================
    // serial link
    // ==========================================================================

    pub async fn fetch_connection_status(&self) -> Result<ConnectionStatus> {
        self.inner.renderer.render_connection_status(&ConnectionView::Checking);

        match self.inner.source.connection().await {
            Ok(status) => {
                self.inner.renderer.render_connection_status(&ConnectionView::from(&status));
                Ok(status)
            }
            Err(e) => {
                log_read_failure("[COM] Error fetching COM status", &e);
                self.inner.renderer.render_connection_status(&ConnectionView::Unreachable);
                Err(e)
            }
        }
    }

    // ==========================================================================
    // history charts
    // ==========================================================================

    /// replace every chart series with the full history for `range`
    pub async fn load_history(&self, range: &str) -> Result<()> {
        let envelope = match self.inner.source.history(range).await {
            Ok(envelope) => envelope,
            Err(e) => {
                log_read_failure("[CHART] Failed to load historical data", &e);
                return Err(e);
            }
        };

        if !envelope.is_success() {
            let e = DashboardError::rejected(envelope.status.as_deref(), envelope.message.as_deref());
            tracing::warn!("[CHART] Failed to load historical data: {}", e);
            return Err(e);
        }

        let Some(history) = envelope.data else {
            let e = DashboardError::UnexpectedShape("history response without data".to_string());
            tracing::error!("[CHART] {}", e);
            return Err(e);
        };

        let charts = ChartSet::from_history(range, &history);
        tracing::debug!("[CHART] {} points for range {}", charts.len(), range);
        self.inner.renderer.render_charts(&charts);
        Ok(())
    }

    /// switch the history range and reload immediately, outside the timer
    pub async fn select_range(&self, range: &str) -> Result<()> {
        *self.inner.range.write().await = range.to_string();
        self.load_history(range).await
    }

    pub async fn selected_range(&self) -> String {
        self.inner.range.read().await.clone()
    }
}

fn log_read_failure(context: &str, error: &DashboardError) {
    match error {
        DashboardError::UnexpectedShape(_) => tracing::error!("{}: {}", context, error),
        _ => tracing::warn!("{}: {}", context, error),
    }
}
