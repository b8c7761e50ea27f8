//! Server-side licensing checks for Tierguard.
//!
//! Wraps snapshot loading and evaluation behind a single service keyed by
//! organization id, and reports every access decision to pluggable hooks.
//!
//! # Main types
//!
//! - [`LicensingService`]: Framework and module checks, listings, prompts and summaries.
//! - [`AccessDecision`]: One recorded framework or module decision.
//! - [`AccessDecisionHook`]: Observer trait for decisions.
//! - [`TracingDecisionHook`]: Logs decisions through `tracing`.
//! - [`DecisionLog`]: Bounded in-memory record of recent decisions.

/// Access decision hooks.
pub mod hooks;
/// The licensing service.
pub mod service;

pub use hooks::{
    AccessDecision, AccessDecisionHook, DecisionHookChain, DecisionLog, TracingDecisionHook,
};
pub use service::{FrameworkAccess, LicensingService, ModuleAccess};
