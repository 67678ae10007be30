// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Continuous synthetic-load engine.
//!
//! Runs flocks of monkeys, each monkey a long-lived task repeatedly
//! executing one business against the target platform and keeping rolling
//! statistics, with an HTTP surface to create, inspect and control flocks.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
