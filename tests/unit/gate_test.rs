//! Tests for the precondition gate

use std::sync::Arc;

use tickwarden::core::{
    CommandContext, CommandRegistry, CommandSpec, CooldownPolicy, CooldownScope, CooldownStore,
    GateRejection, InMemoryBypassList, NoBypass, PreconditionGate, ResolveError,
};

fn gate() -> PreconditionGate {
    PreconditionGate::new(Arc::new(CooldownStore::new()), Arc::new(NoBypass))
}

fn spec(seconds: u32) -> CommandSpec {
    CommandSpec::new("roll").with_cooldown(CooldownPolicy::new(seconds, CooldownScope::User))
}

#[tokio::test]
async fn test_allows_then_rejects_with_remaining() {
    let gate = gate();
    let spec = spec(3);
    let ctx = CommandContext::user(1);

    assert!(gate.check(&spec, &ctx).await.is_ok());
    gate.charge(&spec, &ctx).await;

    match gate.check(&spec, &ctx).await {
        Err(GateRejection::CooldownActive { remaining_secs }) => {
            assert!(remaining_secs >= 1);
            assert!(remaining_secs <= 3);
        }
        other => panic!("expected cooldown rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_check_alone_never_charges() {
    let gate = gate();
    let spec = spec(3);
    let ctx = CommandContext::user(1);

    assert!(gate.check(&spec, &ctx).await.is_ok());
    assert!(gate.check(&spec, &ctx).await.is_ok());
    assert!(gate.cooldown_store().is_empty());
}

#[tokio::test]
async fn test_zero_seconds_always_allows() {
    let gate = gate();
    let spec = spec(0);
    let ctx = CommandContext::user(1);

    gate.charge(&spec, &ctx).await;
    assert!(gate.check(&spec, &ctx).await.is_ok());
    assert!(gate.cooldown_store().is_empty());
}

#[tokio::test]
async fn test_no_policy_always_allows() {
    let gate = gate();
    let spec = CommandSpec::new("help");
    let ctx = CommandContext::user(1);

    gate.charge(&spec, &ctx).await;
    assert!(gate.check(&spec, &ctx).await.is_ok());
}

#[test]
fn test_command_policy_beats_module_policy() {
    let spec = CommandSpec::new("roll")
        .with_module_cooldown(CooldownPolicy::new(60, CooldownScope::Guild))
        .with_cooldown(CooldownPolicy::new(2, CooldownScope::User));

    let effective = spec.effective_cooldown().unwrap();
    assert_eq!(effective.seconds, 2);
    assert_eq!(effective.scope, CooldownScope::User);
}

#[test]
fn test_module_policy_used_when_command_has_none() {
    let spec =
        CommandSpec::new("roll").with_module_cooldown(CooldownPolicy::new(60, CooldownScope::Guild));

    let effective = spec.effective_cooldown().unwrap();
    assert_eq!(effective.seconds, 60);
}

#[tokio::test]
async fn test_bypass_skips_check_and_charge() {
    let bypass = Arc::new(InMemoryBypassList::new());
    bypass.add(9);
    let gate = PreconditionGate::new(Arc::new(CooldownStore::new()), bypass);
    let spec = spec(30);
    let ctx = CommandContext::user(9);

    gate.charge(&spec, &ctx).await;
    assert!(gate.check(&spec, &ctx).await.is_ok());
    // Nothing was written for the exempt actor.
    assert!(gate.cooldown_store().is_empty());
}

#[tokio::test]
async fn test_bypass_exempts_role_requirement() {
    let bypass = Arc::new(InMemoryBypassList::new());
    bypass.add(9);
    let gate = PreconditionGate::new(Arc::new(CooldownStore::new()), bypass);
    let spec = CommandSpec::new("purge").require_role(1234);

    let ctx = CommandContext::user(9);
    assert!(gate.check(&spec, &ctx).await.is_ok());
}

#[tokio::test]
async fn test_missing_role_rejected_with_reason() {
    let gate = gate();
    let spec = CommandSpec::new("purge").require_role(1234);

    let ctx = CommandContext::user(1).in_guild(77).with_roles([5678]);
    match gate.check(&spec, &ctx).await {
        Err(GateRejection::Forbidden { reason }) => assert!(!reason.is_empty()),
        other => panic!("expected forbidden rejection, got {other:?}"),
    }

    let ctx = CommandContext::user(1).in_guild(77).with_roles([1234]);
    assert!(gate.check(&spec, &ctx).await.is_ok());
}

#[tokio::test]
async fn test_execute_charges_even_when_body_fails() {
    let gate = gate();
    let spec = spec(5);
    let ctx = CommandContext::user(1);

    let outcome = gate
        .execute(&spec, &ctx, async { Err::<(), _>(anyhow::anyhow!("db down")) })
        .await;
    // The attempt was allowed; the body's own failure is passed back.
    assert!(outcome.unwrap().is_err());

    // The window was still charged for the attempt.
    assert!(matches!(
        gate.check(&spec, &ctx).await,
        Err(GateRejection::CooldownActive { .. })
    ));
}

#[tokio::test]
async fn test_execute_rejection_skips_body_and_charge() {
    let gate = gate();
    let spec = spec(5);
    let ctx = CommandContext::user(1);

    gate.charge(&spec, &ctx).await;

    let ran = std::sync::atomic::AtomicBool::new(false);
    let result = gate
        .execute(&spec, &ctx, async {
            ran.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        })
        .await;

    assert!(result.is_err());
    assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
}

#[tokio::test]
async fn test_rejection_message_names_remaining_seconds() {
    let gate = gate();
    let spec = spec(3);
    let ctx = CommandContext::user(1);
    gate.charge(&spec, &ctx).await;

    let rejection = gate.check(&spec, &ctx).await.unwrap_err();
    let message = rejection.to_string();
    assert!(message.contains("cooldown"));
    assert!(message.contains("3 seconds") || message.contains("2 seconds"));
}

#[test]
fn test_resolution_failure_maps_to_generic_rejection() {
    let failure = ResolveError::NotRegistered {
        type_name: "RollHandler",
    };
    match GateRejection::from(failure) {
        GateRejection::Forbidden { reason } => assert!(!reason.is_empty()),
        other => panic!("expected forbidden rejection, got {other:?}"),
    }
}

#[test]
fn test_command_registry_lookup() {
    let mut registry = CommandRegistry::new();
    registry.insert(spec(3));
    registry.insert(CommandSpec::new("help"));

    assert_eq!(registry.len(), 2);
    assert!(registry.get("roll").is_some());
    assert!(registry.get("missing").is_none());
    assert_eq!(registry.all().count(), 2);

    // Re-inserting replaces rather than duplicates.
    registry.insert(spec(9));
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get("roll").unwrap().cooldown.unwrap().seconds, 9);
}
