// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;

use crate::domain::business::{Business, BusinessError};

/// Business that does nothing per iteration.
///
/// Useful for scaffolding a new deployment and for exercising the monkey
/// loop itself: every iteration succeeds immediately and the idle pause
/// between iterations is the only thing that takes time.
pub struct EmptyLoop;

#[async_trait]
impl Business for EmptyLoop {
    fn name(&self) -> &'static str {
        "EmptyLoop"
    }

    async fn execute(&mut self) -> Result<(), BusinessError> {
        Ok(())
    }
}
