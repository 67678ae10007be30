// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! A flock: a named set of monkeys running the same business.
//!
//! The flock owns its monkeys exclusively. Creation validates the
//! configuration, mints one credential per user in this replica's shard, and
//! constructs the monkeys idle; starting, stopping and replacement are
//! serialized on a lifecycle lock so two generations of monkeys can never run
//! under the same name.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::info;

use crate::application::monkey::Monkey;
use crate::domain::error::FlockError;
use crate::domain::flock::{FlockConfig, FlockData, FlockSummary, ReplicaInfo};
use crate::domain::monkey::MonkeyData;
use crate::infrastructure::alert::AlertSink;
use crate::infrastructure::business::BusinessFactory;
use crate::infrastructure::scheduler::Scheduler;
use crate::infrastructure::token::TokenProvider;

/// Shared collaborators every flock is constructed with.
#[derive(Clone)]
pub struct FlockContext {
    pub replica: ReplicaInfo,
    pub scheduler: Arc<Scheduler>,
    pub tokens: Arc<dyn TokenProvider>,
    pub factory: Arc<dyn BusinessFactory>,
    pub alerts: Arc<dyn AlertSink>,
}

struct FlockInner {
    config: FlockConfig,
    monkeys: Vec<Arc<Monkey>>,
    started_at: Option<DateTime<Utc>>,
}

pub struct Flock {
    name: String,
    ctx: FlockContext,
    /// Serializes start, stop and replace. Held across awaits, so it must be
    /// an async lock.
    lifecycle: Mutex<()>,
    inner: RwLock<FlockInner>,
}

impl Flock {
    /// Validate the configuration and construct the flock's monkeys, idle.
    ///
    /// Only this replica's shard of the user list is materialized; tokens are
    /// minted here, once per monkey, so a token-service outage fails creation
    /// instead of surfacing later inside running loops.
    pub async fn create(config: FlockConfig, ctx: FlockContext) -> Result<Self, FlockError> {
        config.validate()?;
        let monkeys = build_monkeys(&config, &ctx).await?;
        info!(
            flock = %config.name,
            monkeys = monkeys.len(),
            replica = ctx.replica.index,
            "created flock"
        );
        Ok(Self {
            name: config.name.clone(),
            ctx,
            lifecycle: Mutex::new(()),
            inner: RwLock::new(FlockInner {
                config,
                monkeys,
                started_at: None,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start every monkey in the flock, in batches when configured.
    ///
    /// Each monkey start is independent; one monkey's startup failure never
    /// blocks or aborts another's.
    pub async fn start(&self) {
        let _guard = self.lifecycle.lock().await;
        let (monkeys, batch) = {
            let mut inner = self.inner.write();
            inner.started_at = Some(Utc::now());
            (inner.monkeys.clone(), start_batch(&inner.config, self.ctx.replica.count))
        };
        info!(flock = %self.name, monkeys = monkeys.len(), "starting flock");
        self.start_batches(&monkeys, batch).await;
    }

    /// Stop every monkey concurrently and wait for all of them.
    pub async fn stop(&self) {
        let _guard = self.lifecycle.lock().await;
        let monkeys = self.inner.read().monkeys.clone();
        info!(flock = %self.name, monkeys = monkeys.len(), "stopping flock");
        join_all(monkeys.iter().map(|monkey| monkey.stop())).await;
    }

    /// Replace the flock's configuration and monkeys in place.
    ///
    /// The new generation is built before the old one is stopped, so a
    /// validation or token failure leaves the running flock untouched. The
    /// flock object itself, and therefore its registration under the
    /// manager, survives the swap.
    pub async fn replace(&self, config: FlockConfig) -> Result<(), FlockError> {
        if config.name != self.name {
            return Err(FlockError::InvalidConfig(format!(
                "flock name {} does not match {}",
                config.name, self.name
            )));
        }
        config.validate()?;
        let _guard = self.lifecycle.lock().await;
        let replacements = build_monkeys(&config, &self.ctx).await?;

        let outgoing = self.inner.read().monkeys.clone();
        join_all(outgoing.iter().map(|monkey| monkey.stop())).await;

        let batch = start_batch(&config, self.ctx.replica.count);
        let monkeys = {
            let mut inner = self.inner.write();
            inner.config = config;
            inner.monkeys = replacements;
            inner.started_at = Some(Utc::now());
            inner.monkeys.clone()
        };
        info!(flock = %self.name, monkeys = monkeys.len(), "replaced flock");
        self.start_batches(&monkeys, batch).await;
        Ok(())
    }

    /// Aggregate statistics across the flock's monkeys. Cheap enough to call
    /// from a status endpoint under load.
    pub fn summary(&self) -> FlockSummary {
        let inner = self.inner.read();
        let mut success_count = 0;
        let mut failure_count = 0;
        for monkey in &inner.monkeys {
            let stats = monkey.statistics();
            success_count += stats.success_count;
            failure_count += stats.failure_count;
        }
        FlockSummary {
            name: self.name.clone(),
            business: inner.config.business.kind().to_string(),
            start_time: inner.started_at,
            monkey_count: inner.monkeys.len(),
            success_count,
            failure_count,
        }
    }

    /// Full dump of configuration and per-monkey state.
    pub fn dump(&self) -> FlockData {
        let inner = self.inner.read();
        FlockData {
            name: self.name.clone(),
            config: inner.config.clone(),
            monkeys: inner.monkeys.iter().map(|monkey| monkey.dump()).collect(),
        }
    }

    pub fn list_monkeys(&self) -> Vec<String> {
        self.inner
            .read()
            .monkeys
            .iter()
            .map(|monkey| monkey.name().to_string())
            .collect()
    }

    pub fn get_monkey(&self, name: &str) -> Result<MonkeyData, FlockError> {
        self.inner
            .read()
            .monkeys
            .iter()
            .find(|monkey| monkey.name() == name)
            .map(|monkey| monkey.dump())
            .ok_or_else(|| FlockError::MonkeyNotFound(name.to_string()))
    }

    async fn start_batches(&self, monkeys: &[Arc<Monkey>], batch: Option<(usize, Duration)>) {
        let Some((size, wait)) = batch else {
            for monkey in monkeys {
                monkey.start(&self.ctx.scheduler);
            }
            return;
        };
        let total = monkeys.len();
        for (i, chunk) in monkeys.chunks(size).enumerate() {
            for monkey in chunk {
                monkey.start(&self.ctx.scheduler);
            }
            let started = (i + 1) * size;
            if started < total {
                info!(
                    flock = %self.name,
                    started,
                    total,
                    wait = ?wait,
                    "pausing between start batches"
                );
                tokio::time::sleep(wait).await;
            }
        }
    }
}

/// Build this replica's shard of the flock's monkeys, credentials attached.
async fn build_monkeys(
    config: &FlockConfig,
    ctx: &FlockContext,
) -> Result<Vec<Arc<Monkey>>, FlockError> {
    let users = match (&config.users, &config.user_spec) {
        (Some(users), None) => users.clone(),
        (None, Some(spec)) => spec.users(config.count),
        _ => {
            return Err(FlockError::InvalidConfig(
                "one of users or user_spec must be provided".to_string(),
            ));
        }
    };

    let shard = ctx.replica.shard(users.len());
    let mut monkeys = Vec::with_capacity(shard.len());
    for user in &users[shard] {
        let authenticated = ctx
            .tokens
            .create_service_token(user, &config.scopes)
            .await
            .map_err(|err| FlockError::TokenService(err.to_string()))?;
        monkeys.push(Arc::new(Monkey::new(
            authenticated,
            Some(config.name.clone()),
            config.business.clone(),
            ctx.factory.clone(),
            ctx.alerts.clone(),
        )));
    }
    Ok(monkeys)
}

/// Per-replica batch parameters, when batching is configured.
///
/// `start_batch_size` is a budget across all replicas, so each replica takes
/// its share, never less than one.
fn start_batch(config: &FlockConfig, replica_count: usize) -> Option<(usize, Duration)> {
    let size = config.start_batch_size?;
    let wait = config.start_batch_wait?;
    Some(((size / replica_count).max(1), wait))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{test_business_config, wait_until, TestFactory, TestScript};
    use crate::domain::business::BusinessError;
    use crate::domain::monkey::MonkeyState;
    use crate::domain::user::{User, UserSpec};
    use crate::infrastructure::alert::NullAlertSink;
    use crate::infrastructure::token::StaticTokenProvider;

    const SHORT: Duration = Duration::from_millis(5);

    fn test_context(factory: &Arc<TestFactory>, replica: ReplicaInfo) -> FlockContext {
        FlockContext {
            replica,
            scheduler: Arc::new(Scheduler::new()),
            tokens: Arc::new(StaticTokenProvider),
            factory: factory.clone() as Arc<dyn BusinessFactory>,
            alerts: Arc::new(NullAlertSink),
        }
    }

    fn spec_config(name: &str, count: usize) -> FlockConfig {
        FlockConfig {
            name: name.to_string(),
            count,
            users: None,
            user_spec: Some(UserSpec {
                username_prefix: "testuser".to_string(),
                uid_start: Some(60000),
                gid_start: None,
                groups: Vec::new(),
            }),
            scopes: vec!["exec:test".to_string()],
            business: test_business_config(false, SHORT, SHORT),
            start_batch_size: None,
            start_batch_wait: None,
        }
    }

    fn explicit_user(name: &str) -> User {
        User {
            username: name.to_string(),
            uidnumber: None,
            gidnumber: None,
            groups: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_builds_only_this_replicas_shard() {
        let factory = Arc::new(TestFactory::new());
        let ctx = test_context(
            &factory,
            ReplicaInfo::new(1, 4).expect("bad replica"),
        );
        let flock = Flock::create(spec_config("shards", 10), ctx)
            .await
            .expect("create failed");

        // Ten users over four replicas split 3, 3, 2, 2; replica 1 owns
        // identity indices 3..6.
        assert_eq!(
            flock.list_monkeys(),
            vec!["testuser04", "testuser05", "testuser06"]
        );
        let dump = flock.dump();
        assert!(dump
            .monkeys
            .iter()
            .all(|m| m.state == MonkeyState::Idle));
        assert_eq!(dump.monkeys[0].user.user.uidnumber, Some(60003));
        assert!(flock.summary().start_time.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_config() {
        let factory = Arc::new(TestFactory::new());
        let ctx = test_context(&factory, ReplicaInfo::default());
        let mut config = spec_config("broken", 0);
        let result = Flock::create(config.clone(), ctx.clone()).await;
        assert!(matches!(result, Err(FlockError::InvalidConfig(_))));

        config.count = 2;
        config.user_spec = None;
        config.users = Some(vec![explicit_user("bot-only-one")]);
        let result = Flock::create(config, ctx).await;
        assert!(matches!(result, Err(FlockError::InvalidConfig(_))));
        assert_eq!(factory.builds(), 0);
    }

    #[tokio::test]
    async fn test_start_and_stop_all_monkeys() {
        let factory = Arc::new(TestFactory::new());
        let ctx = test_context(&factory, ReplicaInfo::default());
        let scheduler = ctx.scheduler.clone();
        let flock = Flock::create(spec_config("basic", 3), ctx)
            .await
            .expect("create failed");

        flock.start().await;
        wait_until("all monkeys running", || {
            flock
                .dump()
                .monkeys
                .iter()
                .all(|m| m.state == MonkeyState::Running)
        })
        .await;
        assert!(flock.summary().start_time.is_some());
        assert_eq!(factory.builds(), 3);

        flock.stop().await;
        assert!(flock
            .dump()
            .monkeys
            .iter()
            .all(|m| m.state == MonkeyState::Stopped));
        scheduler.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_batched_start_waits_between_batches() {
        let factory = Arc::new(TestFactory::new());
        let ctx = test_context(
            &factory,
            ReplicaInfo::new(0, 2).expect("bad replica"),
        );
        let scheduler = ctx.scheduler.clone();
        let mut config = spec_config("batched", 5);
        // A cross-replica budget of four means each of the two replicas
        // starts two monkeys per batch.
        config.start_batch_size = Some(4);
        config.start_batch_wait = Some(Duration::from_secs(30));
        let flock = Flock::create(config, ctx).await.expect("create failed");

        // Replica 0 owns three of the five monkeys.
        assert_eq!(flock.list_monkeys().len(), 3);
        flock.start().await;
        wait_until("all businesses built", || factory.builds() == 3).await;

        let instants = factory.build_instants();
        assert_eq!(instants.len(), 3);
        assert_eq!(instants[0].1, instants[1].1);
        assert_eq!(
            instants[2].1 - instants[0].1,
            Duration::from_secs(30)
        );

        flock.stop().await;
        scheduler.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_batched_start_single_replica() {
        let factory = Arc::new(TestFactory::new());
        let ctx = test_context(&factory, ReplicaInfo::default());
        let scheduler = ctx.scheduler.clone();
        let mut config = spec_config("paced", 5);
        config.start_batch_size = Some(2);
        config.start_batch_wait = Some(Duration::from_secs(10));
        let flock = Flock::create(config, ctx).await.expect("create failed");

        flock.start().await;
        wait_until("all businesses built", || factory.builds() == 5).await;

        // Five monkeys with a batch size of two start as 2, 2, 1.
        let instants = factory.build_instants();
        let t0 = instants[0].1;
        let offsets: Vec<Duration> = instants.iter().map(|(_, t)| *t - t0).collect();
        assert_eq!(
            offsets,
            vec![
                Duration::ZERO,
                Duration::ZERO,
                Duration::from_secs(10),
                Duration::from_secs(10),
                Duration::from_secs(20),
            ]
        );

        flock.stop().await;
        scheduler.close().await;
    }

    #[tokio::test]
    async fn test_replace_swaps_generations() {
        let factory = Arc::new(TestFactory::new());
        let ctx = test_context(&factory, ReplicaInfo::default());
        let scheduler = ctx.scheduler.clone();
        let mut config = spec_config("rolling", 2);
        config.user_spec = None;
        config.users = Some(vec![explicit_user("bot-old1"), explicit_user("bot-old2")]);
        let flock = Flock::create(config.clone(), ctx).await.expect("create failed");
        flock.start().await;
        wait_until("old generation running", || factory.builds() == 2).await;

        config.users = Some(vec![explicit_user("bot-new1"), explicit_user("bot-new2")]);
        flock.replace(config).await.expect("replace failed");

        // The old generation was fully shut down before the new one started.
        assert_eq!(factory.count_events("bot-old1:close"), 1);
        assert_eq!(factory.count_events("bot-old2:close"), 1);
        assert_eq!(flock.list_monkeys(), vec!["bot-new1", "bot-new2"]);
        // The new generation starts with fresh statistics.
        let summary = flock.summary();
        assert_eq!(summary.success_count + summary.failure_count, 0);
        wait_until("new generation running", || {
            flock
                .dump()
                .monkeys
                .iter()
                .all(|m| m.state == MonkeyState::Running)
        })
        .await;

        flock.stop().await;
        scheduler.close().await;
    }

    #[tokio::test]
    async fn test_replace_rejects_bad_config_and_keeps_old_generation() {
        let factory = Arc::new(TestFactory::new());
        let ctx = test_context(&factory, ReplicaInfo::default());
        let scheduler = ctx.scheduler.clone();
        let flock = Flock::create(spec_config("sticky", 2), ctx)
            .await
            .expect("create failed");
        flock.start().await;
        wait_until("running", || factory.builds() == 2).await;

        let mut renamed = spec_config("other-name", 2);
        assert!(matches!(
            flock.replace(renamed.clone()).await,
            Err(FlockError::InvalidConfig(_))
        ));
        renamed.name = "sticky".to_string();
        renamed.count = 0;
        assert!(flock.replace(renamed).await.is_err());

        // Old generation untouched.
        assert_eq!(flock.list_monkeys().len(), 2);
        assert_eq!(factory.count_events("testuser1:close"), 0);

        flock.stop().await;
        scheduler.close().await;
    }

    #[tokio::test]
    async fn test_summary_aggregates_statistics() {
        let factory = Arc::new(TestFactory::new());
        factory.push(TestScript::ok().executes(vec![Ok(()), Ok(())]));
        factory.push(TestScript::ok().executes(vec![Err(BusinessError::Assertion(
            "bad row".to_string(),
        ))]));
        let ctx = test_context(&factory, ReplicaInfo::default());
        let scheduler = ctx.scheduler.clone();
        let flock = Flock::create(spec_config("stats", 2), ctx)
            .await
            .expect("create failed");
        flock.start().await;
        wait_until("counts settled", || {
            let summary = flock.summary();
            summary.success_count >= 2 && summary.failure_count == 1
        })
        .await;

        let summary = flock.summary();
        assert_eq!(summary.name, "stats");
        assert_eq!(summary.business, "EmptyLoop");
        assert_eq!(summary.monkey_count, 2);

        flock.stop().await;
        scheduler.close().await;
    }

    #[tokio::test]
    async fn test_get_monkey() {
        let factory = Arc::new(TestFactory::new());
        let ctx = test_context(&factory, ReplicaInfo::default());
        let flock = Flock::create(spec_config("lookup", 2), ctx)
            .await
            .expect("create failed");

        let monkey = flock.get_monkey("testuser1").expect("monkey not found");
        assert_eq!(monkey.business, "EmptyLoop");
        assert!(matches!(
            flock.get_monkey("nosuchuser"),
            Err(FlockError::MonkeyNotFound(_))
        ));
    }
}
