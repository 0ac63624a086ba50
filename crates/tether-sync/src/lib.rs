//! Tether Sync
//!
//! Keeps a locally displayed, server-described UI tree consistent with its
//! remote source while keeping network traffic down. A [`SyncCoordinator`]
//! loads a resource through one of seven [`Strategy`] policies, combining
//! cache reads, plain fetches and change-token revalidation, and reports each
//! transition to the consumer as a [`TreeChange`].

pub mod config;
pub mod coordinator;
pub mod executor;
pub mod metrics;
pub mod request;
pub mod strategy;

pub use config::SyncConfig;
pub use coordinator::SyncCoordinator;
pub use executor::{PhaseOutcome, StepExecutor};
pub use metrics::{MetricsSnapshot, SyncMetrics};
pub use request::{LoadRequest, RetryFn, TreeChange};
pub use strategy::{Step, StepPlan, Strategy, StrategyParseError};
