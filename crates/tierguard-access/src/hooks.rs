use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tierguard_core::{FrameworkCode, FrameworkModule, SnapshotSource};
use tierguard_policy::DenialReason;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// One access decision made by the licensing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Unique id of this decision.
    pub id: Uuid,
    /// Organization the check ran for.
    pub organization_id: String,
    /// Framework that was checked.
    pub framework: FrameworkCode,
    /// `None` for framework-level checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<FrameworkModule>,
    /// Whether access was granted.
    pub allowed: bool,
    /// First failing condition when denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialReason>,
    /// Whether the snapshot came from the store or a fallback.
    pub source: SnapshotSource,
    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
}

impl AccessDecision {
    /// Record a decision; `allowed` is derived from `denial`.
    pub fn new(
        organization_id: &str,
        framework: FrameworkCode,
        module: Option<FrameworkModule>,
        denial: Option<DenialReason>,
        source: SnapshotSource,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id: organization_id.to_string(),
            framework,
            module,
            allowed: denial.is_none(),
            denial,
            source,
            timestamp,
        }
    }
}

/// Observer for access decisions. Hooks see decisions after they are made
/// and cannot change them.
#[async_trait]
pub trait AccessDecisionHook: Send + Sync {
    /// Called once per framework or module check.
    async fn on_decision(&self, decision: &AccessDecision);
}

/// Composite hook that dispatches decisions to multiple hooks.
#[derive(Clone, Default)]
pub struct DecisionHookChain {
    hooks: Vec<Arc<dyn AccessDecisionHook>>,
}

impl DecisionHookChain {
    /// An empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook; hooks run in insertion order.
    pub fn add(&mut self, hook: Arc<dyn AccessDecisionHook>) {
        self.hooks.push(hook);
    }

    /// Emit a decision to all hooks in order.
    pub async fn emit(&self, decision: &AccessDecision) {
        for hook in &self.hooks {
            hook.on_decision(decision).await;
        }
    }

    /// Number of registered hooks.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// Logs grants at `debug` and denials at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDecisionHook;

#[async_trait]
impl AccessDecisionHook for TracingDecisionHook {
    async fn on_decision(&self, decision: &AccessDecision) {
        let module = decision.module.map(|m| m.as_str()).unwrap_or("-");
        match &decision.denial {
            None => debug!(
                organization_id = %decision.organization_id,
                framework = decision.framework.as_str(),
                module,
                source = ?decision.source,
                "Access granted"
            ),
            Some(reason) => info!(
                organization_id = %decision.organization_id,
                framework = decision.framework.as_str(),
                module,
                source = ?decision.source,
                reason = %reason,
                "Access denied"
            ),
        }
    }
}

/// Keeps the most recent decisions in memory, oldest evicted first.
pub struct DecisionLog {
    entries: Arc<RwLock<VecDeque<AccessDecision>>>,
    capacity: usize,
}

impl DecisionLog {
    /// A log retaining at most `capacity` decisions (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity: capacity.max(1),
        }
    }

    /// All retained decisions, oldest first.
    pub async fn entries(&self) -> Vec<AccessDecision> {
        self.entries.read().await.iter().cloned().collect()
    }

    /// Retained denials, oldest first.
    pub async fn denials(&self) -> Vec<AccessDecision> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|d| !d.allowed)
            .cloned()
            .collect()
    }

    /// Number of retained decisions.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no decisions are retained.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AccessDecisionHook for DecisionLog {
    async fn on_decision(&self, decision: &AccessDecision) {
        let mut entries = self.entries.write().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(decision.clone());
    }
}
