// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! One monkey: a long-lived, cancelable loop driving a business.
//!
//! A monkey owns at most one background task at a time (its current
//! incarnation). Starting spawns the loop on the shared scheduler and
//! returns immediately; stopping is two-phase, cancel then await, so no
//! loop task can outlive the monkey that owns it. Statistics are written
//! only by the loop task and read as consistent snapshots by anyone.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domain::business::{Business, BusinessConfig, BusinessError};
use crate::domain::monkey::{FailureInfo, MonkeyData, MonkeyState, MonkeyStats};
use crate::domain::user::AuthenticatedUser;
use crate::infrastructure::alert::AlertSink;
use crate::infrastructure::business::BusinessFactory;
use crate::infrastructure::scheduler::Scheduler;

/// The currently-running incarnation of a monkey.
struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct Monkey {
    name: String,
    flock: Option<String>,
    user: AuthenticatedUser,
    config: BusinessConfig,
    restart: bool,
    factory: Arc<dyn BusinessFactory>,
    alerts: Arc<dyn AlertSink>,
    state: Arc<RwLock<MonkeyState>>,
    stats: Arc<RwLock<MonkeyStats>>,
    task: Mutex<Option<RunningTask>>,
}

impl Monkey {
    pub fn new(
        user: AuthenticatedUser,
        flock: Option<String>,
        config: BusinessConfig,
        factory: Arc<dyn BusinessFactory>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            name: user.username().to_string(),
            flock,
            restart: config.restart(),
            user,
            config,
            factory,
            alerts,
            state: Arc::new(RwLock::new(MonkeyState::Idle)),
            stats: Arc::new(RwLock::new(MonkeyStats::default())),
            task: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> MonkeyState {
        *self.state.read()
    }

    /// Consistent point-in-time snapshot of the rolling statistics. Safe to
    /// call at any time, concurrently with the running loop.
    pub fn statistics(&self) -> MonkeyStats {
        self.stats.read().clone()
    }

    pub fn dump(&self) -> MonkeyData {
        MonkeyData {
            name: self.name.clone(),
            business: self.config.kind().to_string(),
            restart: self.restart,
            state: self.state(),
            stats: self.statistics(),
            user: self.user.clone(),
        }
    }

    /// Start the monkey's loop as a background task.
    ///
    /// Returns immediately; the business startup hook runs inside the task.
    /// Statistics are reset here, and only here — internal failure-triggered
    /// restarts within the incarnation preserve them. Starting an
    /// already-running monkey is a no-op.
    pub fn start(&self, scheduler: &Scheduler) {
        let mut slot = self.task.lock();
        if slot.is_some() {
            warn!(monkey = %self.name, "monkey is already running, not starting");
            return;
        }

        *self.stats.write() = MonkeyStats {
            started_at: Some(Utc::now()),
            ..MonkeyStats::default()
        };
        *self.state.write() = MonkeyState::Starting;

        let cancel = scheduler.child_token();
        let runner = Runner {
            name: self.name.clone(),
            flock: self.flock.clone(),
            user: self.user.clone(),
            config: self.config.clone(),
            restart: self.restart,
            factory: self.factory.clone(),
            alerts: self.alerts.clone(),
            state: self.state.clone(),
            stats: self.stats.clone(),
            cancel: cancel.clone(),
        };
        match scheduler.spawn(runner.run()) {
            Some(handle) => *slot = Some(RunningTask { cancel, handle }),
            None => {
                warn!(monkey = %self.name, "scheduler is closed, not starting monkey");
                *self.state.write() = MonkeyState::Stopped;
            }
        }
    }

    /// Stop the monkey and wait for its loop task to finish.
    ///
    /// Interrupts an idle pause immediately and an in-flight business hook
    /// at its next await point. Idempotent: stopping a stopped (or never
    /// started) monkey only marks it `Stopped`.
    pub async fn stop(&self) {
        let task = self.task.lock().take();
        let Some(task) = task else {
            *self.state.write() = MonkeyState::Stopped;
            return;
        };

        {
            let mut state = self.state.write();
            if *state != MonkeyState::Stopped {
                *state = MonkeyState::Stopping;
            }
        }
        task.cancel.cancel();
        if let Err(err) = task.handle.await {
            error!(monkey = %self.name, error = %err, "monkey loop task panicked");
        }
        let mut stats = self.stats.write();
        if stats.stopped_at.is_none() {
            stats.stopped_at = Some(Utc::now());
        }
        drop(stats);
        *self.state.write() = MonkeyState::Stopped;
    }
}

/// Everything the loop task owns, detached from the `Monkey` handle.
struct Runner {
    name: String,
    flock: Option<String>,
    user: AuthenticatedUser,
    config: BusinessConfig,
    restart: bool,
    factory: Arc<dyn BusinessFactory>,
    alerts: Arc<dyn AlertSink>,
    state: Arc<RwLock<MonkeyState>>,
    stats: Arc<RwLock<MonkeyStats>>,
    cancel: CancellationToken,
}

impl Runner {
    /// Core monkey execution loop.
    ///
    /// Each pass of the outer loop is one business incarnation: build the
    /// business, run its startup hook, then iterate `execute` until failure
    /// or cancellation. Failures become statistics updates and an alert;
    /// nothing escapes this task.
    async fn run(self) {
        let options = self.config.general_options().clone();

        'incarnation: loop {
            self.set_state(MonkeyState::Starting);
            let mut business = self.factory.build(&self.config, &self.user);

            let started = tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.set_state(MonkeyState::Stopping);
                    self.shutdown_business(&mut business).await;
                    break 'incarnation;
                }
                result = business.startup() => result,
            };
            if let Err(err) = started {
                // Count a failed startup as a failed execution so a business
                // that never comes up does not report 100% success.
                self.record_failure(&err);
                self.send_alert(&err).await;
                self.shutdown_business(&mut business).await;
                if !self.restart {
                    warn!(monkey = %self.name, "shutting down monkey after failed startup");
                    break 'incarnation;
                }
                self.set_state(MonkeyState::FailedStart);
                if !self.pause(options.error_idle_time).await {
                    break 'incarnation;
                }
                continue 'incarnation;
            }

            self.set_state(MonkeyState::Running);
            loop {
                let result = tokio::select! {
                    _ = self.cancel.cancelled() => {
                        info!(monkey = %self.name, "shutting down");
                        self.set_state(MonkeyState::Stopping);
                        self.shutdown_business(&mut business).await;
                        break 'incarnation;
                    }
                    result = business.execute() => result,
                };

                match result {
                    Ok(()) => {
                        self.stats.write().success_count += 1;
                        if !options.idle_time.is_zero()
                            && !self.pause(options.idle_time).await
                        {
                            self.set_state(MonkeyState::Stopping);
                            self.shutdown_business(&mut business).await;
                            break 'incarnation;
                        }
                    }
                    Err(err) => {
                        self.record_failure(&err);
                        self.send_alert(&err).await;
                        if !self.restart {
                            warn!(monkey = %self.name, "shutting down monkey due to error");
                            self.shutdown_business(&mut business).await;
                            break 'incarnation;
                        }
                        warn!(
                            monkey = %self.name,
                            error_idle_time = ?options.error_idle_time,
                            "restarting failed monkey after idle"
                        );
                        self.shutdown_business(&mut business).await;
                        if !self.pause(options.error_idle_time).await {
                            break 'incarnation;
                        }
                        continue 'incarnation;
                    }
                }
            }
        }

        let mut stats = self.stats.write();
        if stats.stopped_at.is_none() {
            stats.stopped_at = Some(Utc::now());
        }
        drop(stats);
        self.set_state(MonkeyState::Stopped);
    }

    fn set_state(&self, state: MonkeyState) {
        *self.state.write() = state;
    }

    /// Record a failure as one atomic statistics update.
    fn record_failure(&self, err: &BusinessError) {
        let mut stats = self.stats.write();
        stats.failure_count += 1;
        stats.last_failure = Some(FailureInfo {
            at: Utc::now(),
            kind: err.kind(),
            message: err.to_string(),
            response_excerpt: err.response_excerpt().map(str::to_owned),
        });
    }

    async fn send_alert(&self, err: &BusinessError) {
        let state = *self.state.read();
        if matches!(state, MonkeyState::Stopping | MonkeyState::Stopped) {
            info!(monkey = %self.name, ?state, "not sending alert while stopping");
            return;
        }
        let failure = self.stats.read().last_failure.clone();
        if let Some(failure) = failure {
            self.alerts
                .alert(&self.name, self.flock.as_deref(), &failure)
                .await;
        } else {
            error!(monkey = %self.name, error = %err, "alert requested with no recorded failure");
        }
    }

    /// Run the shutdown hook best-effort and release resources.
    async fn shutdown_business(&self, business: &mut Box<dyn Business>) {
        if let Err(err) = business.shutdown().await {
            warn!(monkey = %self.name, error = %err, "error during business shutdown");
        }
        business.close().await;
    }

    /// Cancelable wait. Returns `false` when cancellation was requested,
    /// promptly interrupting the wait.
    async fn pause(&self, interval: Duration) -> bool {
        if interval.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(interval) => true,
        }
    }
}
