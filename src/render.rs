//! the drawing boundary of the dashboard
//!
//! the refresh cycle hands fully formatted views to a `Renderer` and never
//! touches the drawing surface itself. every call runs to completion; a
//! renderer must not block on i/o.

use crate::chart::ChartSet;
use crate::view::{ConnectionView, LampView, SnapshotView};

pub trait Renderer: Send + Sync {
    /// current metric readouts plus the "last updated" stamp
    fn render_snapshot(&self, view: &SnapshotView);

    /// replaces the whole lamp list; never a diff
    fn render_lamp_list(&self, lamps: &[LampView]);

    fn render_connection_status(&self, view: &ConnectionView);

    /// replaces every chart series at once
    fn render_charts(&self, charts: &ChartSet);

    /// blocking, user-visible notification (control failures only)
    fn alert(&self, message: &str);
}
