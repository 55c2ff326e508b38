//! Logging facilities for Horizon Progress.
//!
//! Horizon Progress uses the `tracing` crate for instrumentation. Nothing is
//! printed unless the application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_progress=debug,horizon_progress_core=debug")
//!     .init();
//! ```
//!
//! Every log line carries one of the [`targets`] below, so subsystems can be
//! filtered individually.

/// Span names used throughout Horizon Progress for tracing.
pub mod span_names {
    /// Listener dispatch span.
    pub const DISPATCH: &str = "horizon_progress::dispatch";
    /// UI context event pumping span.
    pub const EVENT_PUMP: &str = "horizon_progress::event_pump";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_progress_core";
    /// Monitor state changes.
    pub const MONITOR: &str = "horizon_progress_core::monitor";
    /// Listener registration and dispatch.
    pub const LISTENER: &str = "horizon_progress_core::listener";
    /// Timer system target.
    pub const TIMER: &str = "horizon_progress_core::timer";
    /// UI context task hand-off and event pumping.
    pub const UI_CONTEXT: &str = "horizon_progress_core::ui_context";
    /// Signal emission.
    pub const SIGNAL: &str = "horizon_progress_core::signal";
    /// Progress dialog presentation state.
    pub const DIALOG: &str = "horizon_progress::dialog";
    /// Delayed popup coordinator.
    pub const POPUP: &str = "horizon_progress::popup";
    /// Resource loading (icons, strings, config).
    pub const RESOURCES: &str = "horizon_progress::resources";
}
