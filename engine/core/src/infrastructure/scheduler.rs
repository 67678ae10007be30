// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Process-wide task scheduler shared by every monkey and flock.
//!
//! Each monkey loop runs as one tracked tokio task. The scheduler has
//! process lifetime: it is created with the manager and closed exactly once
//! at shutdown, after which nothing new may be scheduled and `close` does
//! not return until every tracked task has finished.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::warn;

pub struct Scheduler {
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Spawn a tracked background task.
    ///
    /// Returns `None` once the scheduler has closed; nothing may be
    /// scheduled after process teardown has begun.
    pub fn spawn<F>(&self, future: F) -> Option<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        if self.tracker.is_closed() {
            warn!("scheduler is closed, refusing to spawn");
            return None;
        }
        Some(self.tracker.spawn(future))
    }

    /// A cancellation token canceled when the scheduler closes. Every monkey
    /// loop waits on a child of this token so process shutdown reaches all
    /// of them at once.
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Cancel everything and wait for all tracked tasks to finish.
    pub async fn close(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
