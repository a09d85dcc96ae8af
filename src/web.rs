//! ==============================================================================
//! web.rs - local view of the dashboard page
//! ==============================================================================
//!
//! purpose:
//!     serves what `PageRenderer` has drawn, and turns the page's buttons
//!     back into refresh-cycle operations. every action redirects to `/`.
//!
//! routes:
//!     GET  /                        html page
//!     GET  /api/page                page model as json
//!     POST /refresh                 out-of-band snapshot load
//!     POST /lamps/:id/:status       update_lamp_status (on|off)
//!     POST /control                 control_device (form: device_id, action, channel)
//!     POST /range                   select_range (form: range)
//!     POST /visibility/:state       hidden stops polling, visible restarts it
//!     POST /alerts/dismiss          clear shown alerts
//!
//! relationships:
//!     - reads: page.rs (PageRenderer)
//!     - drives: cycle.rs (RefreshCycle)
//!
//! ==============================================================================

use crate::cycle::{RefreshCycle, Visibility};
use crate::domain::{ControlRequest, LampId, LampSwitch};
use crate::page::{self, Page, PageRenderer};

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Json, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct WebState {
    pub cycle: RefreshCycle,
    pub page: Arc<PageRenderer>,
}

pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/api/page", get(page_json_handler))
        .route("/refresh", post(refresh_handler))
        .route("/lamps/:id/:status", post(lamp_handler))
        .route("/control", post(control_handler))
        .route("/range", post(range_handler))
        .route("/visibility/:state", post(visibility_handler))
        .route("/alerts/dismiss", post(dismiss_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(bind: &str, state: WebState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("[WEB] Dashboard live at http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn page_handler(State(state): State<WebState>) -> Html<String> {
    let paused = !state.cycle.is_polling().await;
    let refresh_secs = state.cycle.settings().interval.as_secs();
    Html(page::render_html(&state.page.snapshot(), refresh_secs, paused))
}

#[derive(Serialize)]
struct PageJson {
    page: Page,
    polling: bool,
    range: String,
}

async fn page_json_handler(State(state): State<WebState>) -> Json<PageJson> {
    Json(PageJson {
        page: state.page.snapshot(),
        polling: state.cycle.is_polling().await,
        range: state.cycle.selected_range().await,
    })
}

async fn refresh_handler(State(state): State<WebState>) -> Redirect {
    // read failures are already logged and leave the page as it was
    let _ = state.cycle.refresh().await;
    Redirect::to("/")
}

async fn lamp_handler(
    State(state): State<WebState>,
    Path((id, status)): Path<(String, String)>,
) -> Result<Redirect, (StatusCode, String)> {
    let status: LampSwitch = status.parse().map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    let _ = state.cycle.update_lamp_status(&LampId(id), status).await;
    Ok(Redirect::to("/"))
}

async fn control_handler(State(state): State<WebState>, Form(request): Form<ControlRequest>) -> Redirect {
    // failures surface as a page alert
    let _ = state.cycle.control_device(&request.device_id, &request.action, &request.channel).await;
    Redirect::to("/")
}

#[derive(Deserialize)]
struct RangeForm {
    range: String,
}

async fn range_handler(State(state): State<WebState>, Form(form): Form<RangeForm>) -> Redirect {
    let _ = state.cycle.select_range(&form.range).await;
    Redirect::to("/")
}

async fn visibility_handler(
    State(state): State<WebState>,
    Path(visibility): Path<String>,
) -> Result<Redirect, (StatusCode, String)> {
    let visibility = match visibility.as_str() {
        "hidden" => Visibility::Hidden,
        "visible" => Visibility::Visible,
        other => return Err((StatusCode::BAD_REQUEST, format!("unknown visibility '{}'", other))),
    };
    state.cycle.set_visibility(visibility).await;
    Ok(Redirect::to("/"))
}

async fn dismiss_handler(State(state): State<WebState>) -> Redirect {
    state.page.dismiss_alerts();
    Redirect::to("/")
}
