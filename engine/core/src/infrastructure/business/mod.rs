// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Concrete business implementations and their factory.
//!
//! The heavyweight workloads (notebook execution, query runners, file
//! transfer checks) live outside this engine; what is here is the closed set
//! of built-in businesses plus the factory that turns a validated
//! `BusinessConfig` into a runnable business. Construction is infallible:
//! anything that can fail was already rejected when the flock configuration
//! was parsed.

mod empty_loop;
mod web_probe;

pub use empty_loop::EmptyLoop;
pub use web_probe::WebProbe;

use crate::domain::business::{Business, BusinessConfig};
use crate::domain::user::AuthenticatedUser;

/// Builds a fresh business for each monkey incarnation.
pub trait BusinessFactory: Send + Sync {
    fn build(&self, config: &BusinessConfig, user: &AuthenticatedUser) -> Box<dyn Business>;
}

/// Factory for the built-in business types.
pub struct StandardBusinessFactory {
    client: reqwest::Client,
}

impl StandardBusinessFactory {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl BusinessFactory for StandardBusinessFactory {
    fn build(&self, config: &BusinessConfig, user: &AuthenticatedUser) -> Box<dyn Business> {
        match config {
            BusinessConfig::EmptyLoop(_) => Box::new(EmptyLoop),
            BusinessConfig::WebProbe(c) => Box::new(WebProbe::new(
                c.options.clone(),
                self.client.clone(),
                user.clone(),
            )),
        }
    }
}
