//! Collection-level metadata.

use serde::{Deserialize, Serialize};

fn default_name() -> String {
    "Golden Ticket".to_string()
}

fn default_symbol() -> String {
    "TICKET".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialMetadata {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Prefix for `token_uri`. No URI is reported when unset.
    #[serde(default)]
    pub base_uri: Option<String>,
}

impl Default for CredentialMetadata {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            base_uri: None,
        }
    }
}
