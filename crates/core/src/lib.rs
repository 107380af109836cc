//! `vuzoll-core`
//!
//! **Responsibility:** Item ids, stock actions and the operator identity.
//!
//! No IO, no HTTP, no timers.

pub mod action;
pub mod error;
pub mod id;
pub mod operator;

pub use action::Action;
pub use error::{DomainError, DomainResult};
pub use id::ItemId;
pub use operator::Operator;
