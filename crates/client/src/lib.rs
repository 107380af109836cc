//! `vuzoll-client`
//!
//! **Responsibility:** Warehouse picking client for the Vuzoll backend.
//!
//! This crate provides:
//! - Adaptive connectivity monitoring (fast while the operator works, slower while idle)
//! - Cart-driven order submission, one request per line
//! - The HTTP contract with the backend behind swappable traits
//!
//! The backend stays the authority on stock; the client only holds the cart.

pub mod activity;
pub mod api;
pub mod config;
pub mod monitor;
pub mod poller;
pub mod probe;
pub mod session;
pub mod submission;
pub mod types;

pub use activity::ActivityTracker;
pub use api::{Backend, BackendError, HttpBackend};
pub use config::{ApiUrlStore, ClientConfig, ConfigError};
pub use monitor::{ConnectivityMonitor, MonitorHandle};
pub use poller::{AdaptivePoller, PollingConfig};
pub use probe::ConnectionProbe;
pub use session::{Command, Notice, Session};
pub use submission::{SubmissionPipeline, SubmitError};
pub use types::{ConnectivityStatus, SubmissionReport};
