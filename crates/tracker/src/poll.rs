//! Handle to a running order-status poll.

use common::OrderStatus;
use tokio::task::JoinHandle;

/// How a poll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A read observed `paid`; the conversion path has run.
    Paid { attempts: u32 },

    /// The attempt budget ran out without observing `paid`.
    Exhausted { attempts: u32 },

    /// The status left the pollable set by some other route.
    Stopped { status: OrderStatus, attempts: u32 },

    /// The poll was cancelled before it finished.
    Cancelled,
}

impl PollOutcome {
    /// Number of status reads issued before the poll ended.
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Paid { attempts }
            | PollOutcome::Exhausted { attempts }
            | PollOutcome::Stopped { attempts, .. } => *attempts,
            PollOutcome::Cancelled => 0,
        }
    }
}

/// Owns the background poll task.
///
/// Dropping the handle cancels the poll, mirroring page teardown.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    pub(crate) fn new(task: JoinHandle<PollOutcome>) -> Self {
        Self { task }
    }

    /// Cancels the poll. No further status reads are issued.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Returns true once the poll task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the poll to end.
    pub async fn join(mut self) -> PollOutcome {
        match (&mut self.task).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => PollOutcome::Cancelled,
            Err(e) => {
                tracing::error!(error = %e, "order status poll task failed");
                PollOutcome::Cancelled
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
