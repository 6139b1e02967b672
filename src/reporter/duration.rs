use std::{sync::Arc, time::Duration};

use crate::{models::TaskContext, scheduler::Debouncer};

use super::HitReporter;

/// DOM id of the number field workers type their duration into.
pub const DURATION_FIELD_ID: &str = "fairwork-min";

/// Debounced handler for keystrokes in the duration field. Only the value left
/// in the field once typing pauses for `wait` is reported.
#[derive(Debug)]
pub struct DurationInput {
    debouncer: Debouncer<String>,
}

impl DurationInput {
    pub fn new(reporter: HitReporter, ctx: Arc<TaskContext>, wait: Duration) -> Self {
        let debouncer = Debouncer::trailing(wait, move |value: String| {
            // The send is spawned and logs its own outcome.
            let _ = reporter.report_duration(&ctx, &value);
        });
        Self { debouncer }
    }

    pub fn on_input(&self, value: &str) {
        self.debouncer.call(value.to_string());
    }

    pub fn cancel(&self) -> bool {
        self.debouncer.cancel()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}
