//! Constants shared by integration tests

pub const MARKER: &str = "conduit-component";
pub const WIDGETS_NAME: &str = "widgets";
pub const WIDGETS_PACKAGE: &str = "acme/widgets";
pub const WIDGETS_HOOK: &str = "Acme\\WidgetsProvider";
pub const WIDGETS_COMMAND: &str = "widgets:run";
