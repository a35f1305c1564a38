//! Application settings extracted from Rocket's figment.
//!
//! `lib.rs` layers `BMS_IDENTITY_PROVIDER_KEY` into the figment as
//! `identity_provider_key`; tests merge the key directly.

use rocket::fairing::AdHoc;
use serde::Deserialize;
use subtle::ConstantTimeEq;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Shared secret presented by the identity-provider bridge on login.
    /// Login is refused while unset.
    #[serde(default)]
    pub identity_provider_key: Option<String>,
}

impl AppConfig {
    /// Whether `presented` matches the configured key. The comparison runs in
    /// constant time for keys of equal length.
    pub fn accepts_identity_key(&self, presented: Option<&str>) -> bool {
        match (self.identity_provider_key.as_deref(), presented) {
            (Some(expected), Some(given)) => {
                !expected.is_empty() && bool::from(expected.as_bytes().ct_eq(given.as_bytes()))
            }
            _ => false,
        }
    }
}

/// Extracts [`AppConfig`] into managed state.
pub fn config_fairing() -> AdHoc {
    AdHoc::config::<AppConfig>()
}
