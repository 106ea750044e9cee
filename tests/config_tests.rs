//! Unit tests for configuration management
//!
//! These tests verify configuration parsing, defaults and validation
//! without touching the filesystem beyond the shipped template.

use htlc_bridge::config::Config;
use htlc_bridge::{Asset, FillAuthorization, FillPolicy};

#[path = "mod.rs"]
mod test_helpers;

const TEMPLATE: &str = include_str!("../config/htlc.template.toml");

/// Test that the shipped template parses and validates
/// What is tested: Config::from_toml on config/htlc.template.toml
/// Why: The template is what operators copy; it must always load
#[test]
fn test_template_parses() {
    let config = Config::from_toml(TEMPLATE).expect("template should parse");

    assert_eq!(config.engine.local_chain_id, 607);
    assert_eq!(config.engine.fill_policy, FillPolicy::SingleShot);
    assert_eq!(
        config.engine.fill_authorization,
        FillAuthorization::WhitelistedResolver
    );
    assert_eq!(config.api.port, 3340);
    assert_eq!(config.bridges.len(), 1);
    assert_eq!(config.bridges[0].target_chain_id, 11155111);
    assert_eq!(config.bridges[0].source_chain_id, None);
    assert_eq!(config.whitelist.resolvers.len(), 1);
    assert_eq!(config.signers.len(), 3);
    assert_eq!(config.api.event_log_capacity, 10_000);
    assert_eq!(config.balances[0].asset(), Asset::Native);
}

/// Test that default configuration creates a valid structure
/// Why: Verify default config is valid and doesn't panic
#[test]
fn test_default_config_creation() {
    let config = Config::default();

    assert!(config.validate().is_ok());
    assert!(config.bridges.is_empty());
    assert!(config.whitelist.resolvers.is_empty());
    assert_eq!(config.api.host, "127.0.0.1");
}

/// Test that optional sections and fields fall back to defaults
/// What is tested: a config with only [engine] and [api]
/// Why: Minimal configs should start an engine with no routes
#[test]
fn test_minimal_config_defaults() {
    let config = Config::from_toml(
        r#"
        [engine]
        owner = "0:01"
        local_chain_id = 607

        [api]
        host = "0.0.0.0"
        port = 8080
        "#,
    )
    .unwrap();

    assert_eq!(config.engine.fill_policy, FillPolicy::SingleShot);
    assert!(config.bridges.is_empty());
    assert!(config.balances.is_empty());
    assert!(config.signers.is_empty());
    assert_eq!(
        config.api.event_log_capacity,
        htlc_bridge::service::DEFAULT_EVENT_LOG_CAPACITY
    );
}

/// Test that policies and token balances parse from snake_case strings
/// What is tested: partial / any_secret_holder and a token balance
/// Why: Policy names are part of the operator-facing config format
#[test]
fn test_policy_and_token_parsing() {
    let config = Config::from_toml(
        r#"
        [engine]
        owner = "0:01"
        local_chain_id = 607
        fill_policy = "partial"
        fill_authorization = "any_secret_holder"

        [api]
        host = "127.0.0.1"
        port = 3340

        [[balances]]
        account = "0:b2"
        token = "EQ-jetton-master"
        amount = 10
        "#,
    )
    .unwrap();

    let policy = config.engine.policy();
    assert_eq!(policy.fill_policy, FillPolicy::Partial);
    assert_eq!(policy.fill_authorization, FillAuthorization::AnySecretHolder);
    assert_eq!(
        config.balances[0].asset(),
        Asset::Token("EQ-jetton-master".into())
    );
}

/// Test that inverted bridge bounds fail validation
/// What is tested: validate with min_transfer_amount > max_transfer_amount
/// Why: The engine would refuse the route at bootstrap anyway
#[test]
fn test_validate_inverted_bounds() {
    let mut config = test_helpers::build_test_config();
    config.bridges[0].min_transfer_amount = 100;
    config.bridges[0].max_transfer_amount = 1;

    let err = config.validate().unwrap_err();

    assert!(err.to_string().contains("min_transfer_amount"));
}

/// Test that a signer key that is not a valid Ed25519 point fails validation
/// What is tested: validate with a short hex public key
/// Why: Bad keys must be caught when the config loads
#[test]
fn test_validate_bad_signer_key() {
    let mut config = test_helpers::build_test_config();
    config.signers[0].public_key = "not-hex".to_string();

    let err = config.validate().unwrap_err();

    assert!(err.to_string().contains("invalid public_key"));
}

/// Test that a zero event log capacity fails validation
/// Why: The service must retain at least the latest event
#[test]
fn test_validate_zero_event_capacity() {
    let mut config = Config::default();
    config.api.event_log_capacity = 0;

    assert!(config.validate().is_err());
}

/// Test that an empty owner fails validation
/// Why: A registry without an owner could never be administered
#[test]
fn test_validate_empty_owner() {
    let mut config = Config::default();
    config.engine.owner = "  ".to_string();

    assert!(config.validate().is_err());
}

/// Test that a missing file yields a helpful error
/// What is tested: load_from_path on a path that does not exist
/// Why: Operators should be told to copy the template
#[test]
fn test_missing_config_file() {
    let err = Config::load_from_path("does/not/exist.toml").unwrap_err();

    assert!(err.to_string().contains("htlc.template.toml"));
}

/// Test that config can be serialized and deserialized
/// Why: Verify TOML round-trip works correctly
#[test]
fn test_config_serialization() {
    let config = test_helpers::build_test_config();

    let toml = toml::to_string(&config).expect("Should serialize to TOML");
    let deserialized = Config::from_toml(&toml).expect("Should deserialize from TOML");

    assert_eq!(config.engine.owner, deserialized.engine.owner);
    assert_eq!(deserialized.bridges.len(), 1);
    assert_eq!(deserialized.whitelist.resolvers, config.whitelist.resolvers);
    assert_eq!(deserialized.signers.len(), config.signers.len());
}
