//! Fair Work task-page widget.
//!
//! Embedded in crowdsourced task pages, the widget reads the task identifiers
//! from the page URL, mounts the Fair Work compliance frame, tells that frame
//! how long the worker has been on the task, and reports HIT registrations and
//! worker-entered durations to the Fair Work backend.
//!
//! The page itself is reached only through [`host::HostPage`] and
//! [`host::HttpTransport`]; [`widget::FairworkWidget`] ties the pieces to the
//! page lifecycle.

pub mod cookies;
pub mod embed;
pub mod host;
pub mod messenger;
pub mod models;
pub mod query;
pub mod reporter;
pub mod scheduler;
pub mod settings;
pub mod timer;
pub mod utils;
pub mod widget;

pub use host::{HostPage, HttpTransport, ReqwestTransport};
pub use models::TaskContext;
pub use settings::{KeyNaming, WidgetSettings};
pub use utils::init_logging;
pub use widget::FairworkWidget;
