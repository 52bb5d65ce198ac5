// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for the taxonomy binaries: a storage-agnostic
//! config service and the preference records each binary persists.
#![forbid(unsafe_code)]

pub mod config;
pub mod prefs;

pub use config::{load_prefs_or_default, ConfigError, ConfigService, ConfigStore};
pub use prefs::{GatewayPrefs, MockServicePrefs};
