use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    NotStarted,
    Running,
    /// No activity for longer than the idle threshold.
    Idle,
    /// The page is in a background tab.
    Hidden,
}

impl Default for TimerStatus {
    fn default() -> Self {
        TimerStatus::NotStarted
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    /// Page the stopwatch is keyed by, normally the assignment id.
    pub page_name: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub idle_threshold_secs: u64,
    /// Time counted in running windows that have already closed.
    pub accumulated_ms: u64,
    #[serde(skip)]
    pub running_anchor: Option<Instant>,
    #[serde(skip)]
    pub last_activity: Option<Instant>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            status: TimerStatus::NotStarted,
            page_name: None,
            started_at: None,
            idle_threshold_secs: 30,
            accumulated_ms: 0,
            running_anchor: None,
            last_activity: None,
        }
    }
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(
        &mut self,
        page_name: Option<String>,
        idle_threshold: Duration,
        start_at: DateTime<Utc>,
        now: Instant,
    ) {
        *self = Self {
            status: TimerStatus::Running,
            page_name,
            started_at: Some(start_at),
            idle_threshold_secs: idle_threshold.as_secs(),
            accumulated_ms: 0,
            running_anchor: Some(now),
            last_activity: Some(now),
        };
    }

    fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_secs)
    }

    /// Latest instant the current running window may count up to.
    fn window_end(&self, now: Instant) -> Instant {
        match self.last_activity {
            Some(last) => now.min(last + self.idle_threshold()),
            None => now,
        }
    }

    pub fn current_active_ms(&self, now: Instant) -> u64 {
        match (self.status, self.running_anchor) {
            (TimerStatus::Running, Some(anchor)) => {
                let counted = self.window_end(now).saturating_duration_since(anchor);
                self.accumulated_ms
                    .saturating_add(counted.as_millis() as u64)
            }
            _ => self.accumulated_ms,
        }
    }

    pub fn elapsed_seconds(&self, now: Instant) -> f64 {
        self.current_active_ms(now) as f64 / 1000.0
    }

    /// Moves a running stopwatch to `Idle` once the threshold has passed
    /// without activity.
    pub fn sync_idle(&mut self, now: Instant) {
        if self.status != TimerStatus::Running {
            return;
        }
        if let Some(last) = self.last_activity {
            if now.saturating_duration_since(last) >= self.idle_threshold() {
                self.close_window(now);
                self.status = TimerStatus::Idle;
            }
        }
    }

    pub fn record_activity(&mut self, now: Instant) {
        self.sync_idle(now);
        match self.status {
            TimerStatus::Idle => {
                self.status = TimerStatus::Running;
                self.running_anchor = Some(now);
                self.last_activity = Some(now);
            }
            TimerStatus::Running => {
                self.last_activity = Some(now);
            }
            TimerStatus::NotStarted | TimerStatus::Hidden => {}
        }
    }

    pub fn set_visible(&mut self, visible: bool, now: Instant) {
        match (visible, self.status) {
            (false, TimerStatus::Running | TimerStatus::Idle) => {
                if self.status == TimerStatus::Running {
                    self.close_window(now);
                }
                self.status = TimerStatus::Hidden;
            }
            (true, TimerStatus::Hidden) => {
                self.status = TimerStatus::Running;
                self.running_anchor = Some(now);
                self.last_activity = Some(now);
            }
            _ => {}
        }
    }

    fn close_window(&mut self, now: Instant) {
        self.accumulated_ms = self.current_active_ms(now);
        self.running_anchor = None;
    }
}
