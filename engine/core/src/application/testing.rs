// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Shared scripted businesses for application-layer tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::business::{
    Business, BusinessConfig, BusinessError, BusinessOptions, EmptyLoopConfig,
};
use crate::domain::user::{AuthenticatedUser, User};
use crate::infrastructure::business::BusinessFactory;

/// Behavior for one business instance built by [`TestFactory`].
pub(crate) struct TestScript {
    fail_startup: bool,
    execute_results: VecDeque<Result<(), BusinessError>>,
}

impl TestScript {
    pub(crate) fn ok() -> Self {
        Self {
            fail_startup: false,
            execute_results: VecDeque::new(),
        }
    }

    pub(crate) fn failing_startup() -> Self {
        Self {
            fail_startup: true,
            execute_results: VecDeque::new(),
        }
    }

    /// Script the results of consecutive `execute` calls. Once the script is
    /// exhausted, `execute` hangs until canceled.
    pub(crate) fn executes(mut self, results: Vec<Result<(), BusinessError>>) -> Self {
        self.execute_results = results.into();
        self
    }
}

/// Scripted business that records its hook invocations.
struct TestBusiness {
    label: String,
    script: TestScript,
    events: Arc<Mutex<Vec<String>>>,
}

impl TestBusiness {
    fn record(&self, hook: &str) {
        self.events.lock().push(format!("{}:{hook}", self.label));
    }
}

#[async_trait]
impl Business for TestBusiness {
    fn name(&self) -> &'static str {
        "TestBusiness"
    }

    async fn startup(&mut self) -> Result<(), BusinessError> {
        self.record("startup");
        if self.script.fail_startup {
            Err(BusinessError::Assertion("startup failed".to_string()))
        } else {
            Ok(())
        }
    }

    async fn execute(&mut self) -> Result<(), BusinessError> {
        self.record("execute");
        match self.script.execute_results.pop_front() {
            Some(result) => result,
            // Out of script: hang until the monkey cancels us.
            None => std::future::pending().await,
        }
    }

    async fn shutdown(&mut self) -> Result<(), BusinessError> {
        self.record("shutdown");
        Ok(())
    }

    async fn close(&mut self) {
        self.record("close");
    }
}

/// Factory handing out one scripted business per incarnation.
///
/// Scripts are consumed in push order across all monkeys; when the queue is
/// empty the built business starts cleanly and hangs in `execute`. Build
/// instants are recorded on the tokio clock so batched-start tests can
/// assert ordering under a paused runtime.
pub(crate) struct TestFactory {
    scripts: Mutex<VecDeque<TestScript>>,
    events: Arc<Mutex<Vec<String>>>,
    built: Mutex<Vec<(String, tokio::time::Instant)>>,
    builds: AtomicUsize,
}

impl TestFactory {
    pub(crate) fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            events: Arc::new(Mutex::new(Vec::new())),
            built: Mutex::new(Vec::new()),
            builds: AtomicUsize::new(0),
        }
    }

    pub(crate) fn push(&self, script: TestScript) {
        self.scripts.lock().push_back(script);
    }

    pub(crate) fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub(crate) fn count_events(&self, event: &str) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    /// Usernames paired with the virtual instant their business was built.
    pub(crate) fn build_instants(&self) -> Vec<(String, tokio::time::Instant)> {
        self.built.lock().clone()
    }
}

impl BusinessFactory for TestFactory {
    fn build(&self, _config: &BusinessConfig, user: &AuthenticatedUser) -> Box<dyn Business> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.built
            .lock()
            .push((user.username().to_string(), tokio::time::Instant::now()));
        let script = self.scripts.lock().pop_front().unwrap_or(TestScript::ok());
        Box::new(TestBusiness {
            label: user.username().to_string(),
            script,
            events: self.events.clone(),
        })
    }
}

pub(crate) fn test_business_config(
    restart: bool,
    idle_time: Duration,
    error_idle_time: Duration,
) -> BusinessConfig {
    BusinessConfig::EmptyLoop(EmptyLoopConfig {
        options: BusinessOptions {
            error_idle_time,
            idle_time,
        },
        restart,
    })
}

pub(crate) fn test_user(username: &str) -> AuthenticatedUser {
    AuthenticatedUser {
        user: User {
            username: username.to_string(),
            uidnumber: None,
            gidnumber: None,
            groups: Vec::new(),
        },
        scopes: vec!["exec:test".to_string()],
        token: format!("gt-test-{username}"),
    }
}

/// Poll a condition until it holds, panicking after a generous timeout.
pub(crate) async fn wait_until<F>(what: &str, predicate: F)
where
    F: Fn() -> bool,
{
    let waited = tokio::time::timeout(Duration::from_secs(10), async {
        while !predicate() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {what}");
}
