//! View and navigation surface supplied by the host viewer.

use crate::model::record::{Placement, Record};
use crate::service::detail::DetailView;
use crate::service::menu::MenuDescriptor;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Host view call failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    Rejected(String),
}

impl Display for ViewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(message) => write!(f, "view request rejected: {message}"),
        }
    }
}

impl Error for ViewError {}

/// Camera, highlight and sidebar operations owned by the host.
pub trait ViewSurface: Send + Sync {
    fn go_to_poi(&self, record: &Record) -> Result<(), ViewError>;

    fn highlight_pois(&self, records: &[Record]) -> Result<(), ViewError>;

    fn unhighlight_pois(&self, records: &[Record]) -> Result<(), ViewError>;

    /// Closes the host's own POI panel.
    fn close_poi(&self);

    /// Closes the sidebar menu.
    fn close_menu(&self);

    /// Asks the host to reload its POI layer.
    fn refresh_pois(&self);

    fn render_menu(&self, menu: &MenuDescriptor);

    /// Shows the issue detail panel.
    fn show_detail(&self, detail: &DetailView);

    fn hide_detail(&self);

    /// Placement under the cursor, translated to global coordinates.
    fn cursor_placement(&self) -> Option<Placement>;

    /// Current camera point of view.
    fn current_point_of_view(&self) -> Option<Placement>;

    /// Blocking user-facing message.
    fn alert(&self, message: &str);
}
