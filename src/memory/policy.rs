use super::config::MemoryConfig;
use super::domain::{MemoryScope, MemoryUpdateProposal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidProposal,
    LowConfidence,
    AgentWriteToUserScope,
    InsufficientProjectConfidence,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidProposal => "invalid_proposal",
            Self::LowConfidence => "low_confidence",
            Self::AgentWriteToUserScope => "agent_write_to_user_scope",
            Self::InsufficientProjectConfidence => "insufficient_project_confidence",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Accept { scope: MemoryScope },
    Reject { reason: RejectReason },
}

impl PolicyDecision {
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accept { .. })
    }
}

/// Gate every proposed memory write must pass before it reaches a store.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPolicy {
    min_confidence: f64,
    project_agent_min_confidence: f64,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self::from_config(&MemoryConfig::default())
    }
}

impl MemoryPolicy {
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            project_agent_min_confidence: config.project_agent_min_confidence,
        }
    }

    pub fn evaluate(&self, proposal: &MemoryUpdateProposal) -> PolicyDecision {
        if proposal.validate().is_err() {
            return PolicyDecision::Reject {
                reason: RejectReason::InvalidProposal,
            };
        }
        if proposal.confidence < self.min_confidence {
            return PolicyDecision::Reject {
                reason: RejectReason::LowConfidence,
            };
        }

        let from_agent = proposal.is_agent_originated();
        match proposal.suggested_scope {
            Some(MemoryScope::User) if from_agent => {
                return PolicyDecision::Reject {
                    reason: RejectReason::AgentWriteToUserScope,
                };
            }
            Some(MemoryScope::Project)
                if from_agent && proposal.confidence < self.project_agent_min_confidence =>
            {
                return PolicyDecision::Reject {
                    reason: RejectReason::InsufficientProjectConfidence,
                };
            }
            _ => {}
        }

        PolicyDecision::Accept {
            scope: self.target_scope(proposal),
        }
    }

    pub fn target_scope(&self, proposal: &MemoryUpdateProposal) -> MemoryScope {
        if let Some(scope) = proposal.suggested_scope {
            return scope;
        }
        if proposal.is_agent_originated() {
            MemoryScope::Session
        } else {
            MemoryScope::Execution
        }
    }
}
