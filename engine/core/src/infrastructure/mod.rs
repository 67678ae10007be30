// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod alert;
pub mod business;
pub mod scheduler;
pub mod token;

pub use alert::{AlertSink, NullAlertSink, WebhookAlertSink};
pub use business::{BusinessFactory, StandardBusinessFactory};
pub use scheduler::Scheduler;
pub use token::{StaticTokenProvider, TokenProvider};
