use botsmith::memory::{
    MemoryConfig, MemoryPolicy, MemoryScope, MemoryUpdateProposal, PolicyDecision, RejectReason,
};
use serde_json::json;

fn proposal(confidence: f64, source: &str, scope: Option<MemoryScope>) -> MemoryUpdateProposal {
    let proposal = MemoryUpdateProposal::new(
        "framework",
        json!("fastapi"),
        confidence,
        "observed during planning",
        source,
    );
    match scope {
        Some(scope) => proposal.with_scope(scope),
        None => proposal,
    }
}

#[test]
fn memory_policy_module_rejects_low_confidence_in_every_scope() {
    let policy = MemoryPolicy::default();
    let scopes = [
        None,
        Some(MemoryScope::Execution),
        Some(MemoryScope::Session),
        Some(MemoryScope::User),
        Some(MemoryScope::Project),
    ];

    for scope in scopes {
        for source in ["agent:planner_define_agents", "user"] {
            let decision = policy.evaluate(&proposal(0.5, source, scope));
            assert_eq!(
                decision,
                PolicyDecision::Reject {
                    reason: RejectReason::LowConfidence
                },
                "scope {scope:?} source {source}"
            );
        }
    }
}

#[test]
fn memory_policy_module_agents_never_write_user_scope() {
    let policy = MemoryPolicy::default();

    let decision = policy.evaluate(&proposal(1.0, "agent:coder_x", Some(MemoryScope::User)));
    assert_eq!(
        decision,
        PolicyDecision::Reject {
            reason: RejectReason::AgentWriteToUserScope
        }
    );

    let decision = policy.evaluate(&proposal(0.8, "user", Some(MemoryScope::User)));
    assert_eq!(
        decision,
        PolicyDecision::Accept {
            scope: MemoryScope::User
        }
    );
}

#[test]
fn memory_policy_module_project_scope_needs_higher_agent_confidence() {
    let policy = MemoryPolicy::default();

    let low = policy.evaluate(&proposal(0.85, "agent:x", Some(MemoryScope::Project)));
    assert_eq!(
        low,
        PolicyDecision::Reject {
            reason: RejectReason::InsufficientProjectConfidence
        }
    );

    let high = policy.evaluate(&proposal(0.95, "agent:x", Some(MemoryScope::Project)));
    assert_eq!(
        high,
        PolicyDecision::Accept {
            scope: MemoryScope::Project
        }
    );

    let human = policy.evaluate(&proposal(0.75, "user", Some(MemoryScope::Project)));
    assert!(human.is_accepted());
}

#[test]
fn memory_policy_module_defaults_scope_by_source() {
    let policy = MemoryPolicy::default();

    assert_eq!(
        policy.evaluate(&proposal(0.8, "agent:planner", None)),
        PolicyDecision::Accept {
            scope: MemoryScope::Session
        }
    );
    assert_eq!(
        policy.evaluate(&proposal(0.8, "system", None)),
        PolicyDecision::Accept {
            scope: MemoryScope::Execution
        }
    );
}

#[test]
fn memory_policy_module_threshold_is_inclusive() {
    let policy = MemoryPolicy::default();
    assert!(policy.evaluate(&proposal(0.7, "user", None)).is_accepted());
    assert!(policy
        .evaluate(&proposal(0.9, "agent:x", Some(MemoryScope::Project)))
        .is_accepted());
}

#[test]
fn memory_policy_module_rejects_malformed_proposals() {
    let policy = MemoryPolicy::default();

    let mut out_of_range = proposal(1.5, "user", None);
    assert_eq!(
        policy.evaluate(&out_of_range),
        PolicyDecision::Reject {
            reason: RejectReason::InvalidProposal
        }
    );

    out_of_range.confidence = 0.9;
    out_of_range.key = "  ".to_string();
    assert!(!policy.evaluate(&out_of_range).is_accepted());
}

#[test]
fn memory_policy_module_honors_configured_thresholds() {
    let config = MemoryConfig {
        min_confidence: 0.4,
        project_agent_min_confidence: 0.6,
        ..MemoryConfig::default()
    };
    let policy = MemoryPolicy::from_config(&config);

    assert!(policy
        .evaluate(&proposal(0.5, "agent:x", Some(MemoryScope::Session)))
        .is_accepted());
    assert!(policy
        .evaluate(&proposal(0.65, "agent:x", Some(MemoryScope::Project)))
        .is_accepted());
}
