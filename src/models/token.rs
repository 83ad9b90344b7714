//! OAuth token model for storage.

use serde::{Deserialize, Serialize};

/// The only user id the display ever authenticates.
pub const DEFAULT_USER_ID: &str = "default";

/// OAuth2 credentials for one user, persisted as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthTokenRecord {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// When the access token expires (Unix milliseconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_epoch_millis: Option<i64>,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub token_type: String,
}

impl OAuthTokenRecord {
    /// True if the record has an expiry at or before `now_millis + lookahead_millis`.
    pub fn expires_within(&self, now_millis: i64, lookahead_millis: i64) -> bool {
        self.expiry_epoch_millis
            .is_some_and(|expiry| expiry <= now_millis + lookahead_millis)
    }
}
