//! hydroponic dashboard client
//!
//! polls a sensor/lamp controller over http, renders the readings, redraws
//! history charts and sends lamp commands. `cycle::RefreshCycle` is the
//! heart of it; everything else is a collaborator behind a trait
//! (`source::DataSource`, `render::Renderer`) or ambient plumbing.

pub mod chart;
pub mod config;
pub mod console;
pub mod cycle;
pub mod domain;
pub mod error;
pub mod logging;
pub mod page;
pub mod render;
pub mod source;
pub mod view;
pub mod web;

pub use cycle::{CycleSettings, RefreshCycle, Visibility};
pub use error::{DashboardError, Result};
pub use render::Renderer;
pub use source::{DataSource, HttpDataSource, SnapshotEndpoint};
