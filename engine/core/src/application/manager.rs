// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Registry of flocks by name, with process-shutdown teardown.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::info;

use crate::application::flock::{Flock, FlockContext};
use crate::domain::error::FlockError;
use crate::domain::flock::{FlockConfig, FlockSummary};

/// Owns every flock in the process.
///
/// The name-to-flock map is the only mutable state; flocks themselves
/// serialize their own lifecycle transitions, so manager operations on
/// different names never contend.
pub struct FlockManager {
    ctx: FlockContext,
    flocks: RwLock<HashMap<String, Arc<Flock>>>,
}

impl FlockManager {
    pub fn new(ctx: FlockContext) -> Self {
        Self {
            ctx,
            flocks: RwLock::new(HashMap::new()),
        }
    }

    /// Create and register a flock without starting it.
    pub async fn create_flock(&self, config: FlockConfig) -> Result<(), FlockError> {
        let name = config.name.clone();
        if self.flocks.read().await.contains_key(&name) {
            return Err(FlockError::FlockExists(name));
        }
        let flock = Arc::new(Flock::create(config, self.ctx.clone()).await?);

        // Creation awaited outside the lock, so re-check for a racing create.
        let mut flocks = self.flocks.write().await;
        if flocks.contains_key(&name) {
            return Err(FlockError::FlockExists(name));
        }
        flocks.insert(name, flock);
        Ok(())
    }

    pub async fn start_flock(&self, name: &str) -> Result<(), FlockError> {
        self.get_flock(name).await?.start().await;
        Ok(())
    }

    pub async fn stop_flock(&self, name: &str) -> Result<(), FlockError> {
        self.get_flock(name).await?.stop().await;
        Ok(())
    }

    /// Replace a registered flock's configuration and monkeys. The
    /// registration survives, so resource paths pointing at the flock stay
    /// valid across the swap.
    pub async fn replace_flock(&self, name: &str, config: FlockConfig) -> Result<(), FlockError> {
        self.get_flock(name).await?.replace(config).await
    }

    /// Stop a flock and unregister it.
    ///
    /// The flock is removed from the registry before it is stopped, so a
    /// concurrent `summarize_flocks` never reports a flock mid-teardown.
    pub async fn delete_flock(&self, name: &str) -> Result<(), FlockError> {
        let flock = self
            .flocks
            .write()
            .await
            .remove(name)
            .ok_or_else(|| FlockError::FlockNotFound(name.to_string()))?;
        flock.stop().await;
        Ok(())
    }

    pub async fn get_flock(&self, name: &str) -> Result<Arc<Flock>, FlockError> {
        self.flocks
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| FlockError::FlockNotFound(name.to_string()))
    }

    /// Names of all registered flocks, sorted.
    pub async fn list_flocks(&self) -> Vec<String> {
        let mut names: Vec<String> = self.flocks.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Summaries of all registered flocks, sorted by name.
    pub async fn summarize_flocks(&self) -> Vec<FlockSummary> {
        let flocks: Vec<Arc<Flock>> = self.flocks.read().await.values().cloned().collect();
        let mut summaries: Vec<FlockSummary> =
            flocks.iter().map(|flock| flock.summary()).collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Create and start every configured flock. Used at process startup.
    pub async fn autostart(&self, configs: Vec<FlockConfig>) -> Result<(), FlockError> {
        for config in configs {
            let name = config.name.clone();
            self.create_flock(config).await?;
            self.start_flock(&name).await?;
        }
        Ok(())
    }

    /// Stop every flock concurrently, then close the shared scheduler.
    ///
    /// After this returns no monkey loop task survives; call exactly once at
    /// process shutdown.
    pub async fn aclose(&self) {
        let flocks: Vec<Arc<Flock>> = self.flocks.write().await.drain().map(|(_, f)| f).collect();
        info!(flocks = flocks.len(), "shutting down all flocks");
        join_all(flocks.iter().map(|flock| flock.stop())).await;
        self.ctx.scheduler.close().await;
    }
}
