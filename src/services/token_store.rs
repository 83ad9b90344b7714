// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-backed OAuth token store.
//!
//! The in-memory map is authoritative. Every mutation is followed by a
//! whole-file save (temp file + rename); a failed save is logged and the
//! process keeps running on the in-memory state.

use crate::models::OAuthTokenRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};

/// Current on-disk schema version.
pub const TOKEN_FILE_VERSION: u32 = 1;

/// Token store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Token file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Token file version {0} is newer than this build supports")]
    UnsupportedVersion(u32),
}

/// On-disk layout written by this version.
#[derive(Serialize)]
struct TokenFile<'a> {
    version: u32,
    tokens: BTreeMap<&'a str, &'a OAuthTokenRecord>,
}

/// Layouts accepted on load: versioned, or a bare map from older installs.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTokens {
    Versioned {
        version: u32,
        #[serde(default)]
        tokens: HashMap<String, OAuthTokenRecord>,
    },
    Legacy(HashMap<String, OAuthTokenRecord>),
}

/// userId → token record map with load/save as its only I/O.
pub struct TokenStore {
    path: PathBuf,
    tokens: RwLock<HashMap<String, OAuthTokenRecord>>,
    /// Serializes file writes so the last writer always saves the newest map.
    save_lock: Mutex<()>,
}

impl TokenStore {
    /// Load the store from `path`, starting empty if the file is missing or unreadable.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tokens = match read_token_file(&path).await {
            Ok(tokens) => {
                tracing::info!(path = %path.display(), users = tokens.len(), "Token store loaded");
                tokens
            }
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No token file yet, starting empty");
                HashMap::new()
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load token file, starting with empty in-memory store"
                );
                HashMap::new()
            }
        };

        Self {
            path,
            tokens: RwLock::new(tokens),
            save_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the record for a user.
    pub async fn get(&self, user_id: &str) -> Option<OAuthTokenRecord> {
        self.tokens.read().await.get(user_id).cloned()
    }

    /// Returns true if a record exists for the user.
    pub async fn contains(&self, user_id: &str) -> bool {
        self.tokens.read().await.contains_key(user_id)
    }

    /// Insert or replace the record for a user and persist.
    pub async fn put(&self, user_id: &str, record: OAuthTokenRecord) {
        self.tokens
            .write()
            .await
            .insert(user_id.to_string(), record);
        self.persist().await;
    }

    /// Remove the record for a user and persist the deletion.
    pub async fn remove(&self, user_id: &str) -> Option<OAuthTokenRecord> {
        let removed = self.tokens.write().await.remove(user_id);
        if removed.is_some() {
            self.persist().await;
        }
        removed
    }

    /// Write the current map to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let _guard = self.save_lock.lock().await;

        let json = {
            let tokens = self.tokens.read().await;
            let file = TokenFile {
                version: TOKEN_FILE_VERSION,
                tokens: tokens.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            };
            serde_json::to_vec_pretty(&file)?
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = temp_path(&self.path);
        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    async fn persist(&self) {
        if let Err(e) = self.save().await {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Failed to persist tokens, keeping in-memory state only"
            );
        }
    }
}

async fn read_token_file(path: &Path) -> Result<HashMap<String, OAuthTokenRecord>, StoreError> {
    let bytes = tokio::fs::read(path).await?;
    match serde_json::from_slice::<StoredTokens>(&bytes)? {
        StoredTokens::Versioned { version, tokens } if version <= TOKEN_FILE_VERSION => Ok(tokens),
        StoredTokens::Versioned { version, .. } => Err(StoreError::UnsupportedVersion(version)),
        StoredTokens::Legacy(tokens) => {
            tracing::info!("Token file has no version field, reading legacy layout");
            Ok(tokens)
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "tokens.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
