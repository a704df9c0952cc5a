use super::domain::MemoryUpdateProposal;
use super::policy::PolicyDecision;
use crate::shared::logging::append_json_event;
use serde_json::Value;
use std::path::Path;

pub(crate) const MEMORY_UPDATE_EVENT: &str = "memory_update";

pub(crate) fn append_proposal_event(
    path: &Path,
    session_id: &str,
    proposal: &MemoryUpdateProposal,
    decision: PolicyDecision,
) -> Result<(), std::io::Error> {
    let (scope, outcome, reason) = match decision {
        PolicyDecision::Accept { scope } => (scope.as_str(), "accepted", Value::Null),
        PolicyDecision::Reject { reason } => ("none", "rejected", Value::from(reason.as_str())),
    };
    append_json_event(
        path,
        MEMORY_UPDATE_EVENT,
        &[
            ("session", Value::from(session_id)),
            ("scope", Value::from(scope)),
            ("key", Value::from(proposal.key.as_str())),
            ("value", proposal.value.clone()),
            ("source", Value::from(proposal.source.as_str())),
            ("confidence", Value::from(proposal.confidence)),
            ("justification", Value::from(proposal.justification.as_str())),
            ("decision", Value::from(outcome)),
            ("reason", reason),
        ],
    )
}
