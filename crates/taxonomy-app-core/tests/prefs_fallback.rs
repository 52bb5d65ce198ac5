// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Startup prefs loading against an in-memory store.

use taxonomy_app_core::{load_prefs_or_default, ConfigError, GatewayPrefs, MockServicePrefs};
use taxonomy_dry_tests::InMemoryConfigStore;

#[test]
fn first_run_persists_defaults() {
    let store = InMemoryConfigStore::new();
    let prefs: GatewayPrefs = load_prefs_or_default(Ok(store.clone()), "gateway");

    assert_eq!(prefs, GatewayPrefs::default());
    assert_eq!(store.save_count(), 1);
    assert!(store.contains_key("gateway"));
}

#[test]
fn saved_fields_win_and_missing_ones_default() {
    let store = InMemoryConfigStore::with_entry("gateway", r#"{"listen_port": 9090}"#);
    let prefs: GatewayPrefs = load_prefs_or_default(Ok(store.clone()), "gateway");

    assert_eq!(prefs.listen_port, 9090);
    assert_eq!(prefs.backend_addr, GatewayPrefs::default().backend_addr);
    assert_eq!(store.save_count(), 0);
}

#[test]
fn corrupt_value_falls_back_and_is_left_in_place() {
    let store = InMemoryConfigStore::with_entry("mock_service", "{ not json");
    let prefs: MockServicePrefs = load_prefs_or_default(Ok(store.clone()), "mock_service");

    assert_eq!(prefs, MockServicePrefs::default());
    assert_eq!(store.save_count(), 0);
    assert_eq!(store.raw("mock_service").unwrap(), b"{ not json");
}

#[test]
fn failing_load_falls_back_without_writing() {
    let store = InMemoryConfigStore::with_entry("gateway", r#"{"listen_port": 9090}"#);
    store.set_fail_on_load(true);
    let prefs: GatewayPrefs = load_prefs_or_default(Ok(store.clone()), "gateway");

    assert_eq!(prefs, GatewayPrefs::default());
    assert_eq!(store.load_count(), 1);
    assert_eq!(store.save_count(), 0);
}

#[test]
fn failing_save_still_yields_defaults() {
    let store = InMemoryConfigStore::new();
    store.set_fail_on_save(true);
    let prefs: GatewayPrefs = load_prefs_or_default(Ok(store.clone()), "gateway");

    assert_eq!(prefs, GatewayPrefs::default());
    assert!(!store.contains_key("gateway"));
}

#[test]
fn unavailable_store_yields_defaults() {
    let store: Result<InMemoryConfigStore, _> = Err(ConfigError::Other("no config dir".into()));
    let prefs: MockServicePrefs = load_prefs_or_default(store, "mock_service");

    assert_eq!(prefs, MockServicePrefs::default());
}
