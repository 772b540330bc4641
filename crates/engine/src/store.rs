// This file is part of Autosend.
//
// Autosend is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Autosend is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Autosend.
// If not, see https://www.gnu.org/licenses/.

//! Durable JSON documents: transfer config and the per-account session cache.
//! Both are read once at startup and rewritten wholesale after each mutation.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::Address;
use anyhow::Context;
use autosend_types::TransferConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Persisted transfer settings, including the iteration counter.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the config document, or the defaults when the file is absent.
    pub fn load(&self) -> anyhow::Result<TransferConfig> {
        if !self.path.exists() {
            info!("no config file at {}, using defaults", self.path.display());
            return Ok(TransferConfig::default());
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let config: TransferConfig = serde_json::from_str(&data)
            .with_context(|| format!("malformed config document {}", self.path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &TransferConfig) -> anyhow::Result<()> {
        write_json(&self.path, config)
    }
}

/// One cached session in the token document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub smart_address: Address,
    pub token: String,
}

/// Session cache keyed by lowercase EOA address, so a later run can resume
/// without logging in again.
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    sessions: HashMap<String, StoredSession>,
}

impl TokenStore {
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let sessions = if path.exists() {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("malformed token document {}", path.display()))?
        } else {
            info!("no token file at {}, starting fresh", path.display());
            HashMap::new()
        };
        Ok(Self { path, sessions })
    }

    pub fn get(&self, address: Address) -> Option<&StoredSession> {
        self.sessions.get(&store_key(address))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Insert or replace a session and rewrite the document.
    pub fn upsert(&mut self, address: Address, session: StoredSession) -> anyhow::Result<()> {
        self.sessions.insert(store_key(address), session);
        write_json(&self.path, &self.sessions)
    }
}

fn store_key(address: Address) -> String {
    format!("{address:#x}")
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let data = serde_json::to_string_pretty(value).context("failed to serialize document")?;
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));

        let mut config = store.load().unwrap();
        assert_eq!(config, TransferConfig::default());

        config.fixed_amount = 0.25;
        config.current_iteration = 3;
        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn test_config_load_rejects_invalid_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"minPercent": 90, "maxPercent": 10}"#).unwrap();
        assert!(ConfigStore::new(path).load().is_err());
    }

    #[test]
    fn test_token_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let address = Address::repeat_byte(0xab);
        let session = StoredSession {
            smart_address: Address::repeat_byte(0xcd),
            token: "bearer".to_string(),
        };

        let mut store = TokenStore::load(&path).unwrap();
        assert!(store.is_empty());
        store.upsert(address, session.clone()).unwrap();

        let reloaded = TokenStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(address), Some(&session));
    }

    #[test]
    fn test_token_keys_are_lowercase_addresses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let mut store = TokenStore::load(&path).unwrap();
        store
            .upsert(
                "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                    .parse()
                    .unwrap(),
                StoredSession {
                    smart_address: Address::ZERO,
                    token: "t".to_string(),
                },
            )
            .unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"));
    }
}
