pub mod controller;
pub mod state;

pub use controller::{TimeTracker, TimerSnapshot};
pub use state::{TimerState, TimerStatus};
