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

//! Line-oriented input files: private keys, recipients and proxies.

use std::{fs, path::Path};

use alloy_primitives::Address;
use anyhow::{bail, Context};
use autosend_engine::TokenStore;
use autosend_types::Account;
use secrecy::SecretString;
use tracing::{info, warn};

fn lines(data: &str) -> impl Iterator<Item = &str> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Load accounts from a private key file, one key per line. A malformed key
/// is fatal; sending from the wrong account is worse than not starting.
/// Cached sessions from the token store are applied to each account.
pub(crate) fn load_accounts(path: &Path, tokens: &TokenStore) -> anyhow::Result<Vec<Account>> {
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut accounts = Vec::new();
    for line in lines(&data) {
        let key = SecretString::new(line.to_string());
        let mut account = Account::from_private_key(&key)
            .with_context(|| format!("invalid private key on line {}", accounts.len() + 1))?;
        if let Some(session) = tokens.get(account.address()) {
            account.smart_address = Some(session.smart_address);
            account.token = Some(session.token.clone());
        }
        accounts.push(account);
    }
    if accounts.is_empty() {
        bail!("no private keys found in {}", path.display());
    }
    info!("loaded {} accounts from {}", accounts.len(), path.display());
    Ok(accounts)
}

/// Load recipient addresses. Malformed lines are dropped with a warning; a
/// missing file yields an empty list.
pub(crate) fn load_recipients(path: &Path) -> anyhow::Result<Vec<Address>> {
    if !path.exists() {
        warn!("no recipient file at {}", path.display());
        return Ok(Vec::new());
    }
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut recipients = Vec::new();
    for line in lines(&data) {
        match line.parse::<Address>() {
            Ok(address) => recipients.push(address),
            Err(_) => warn!("dropping invalid recipient address: {line}"),
        }
    }
    info!(
        "loaded {} recipients from {}",
        recipients.len(),
        path.display()
    );
    Ok(recipients)
}

/// Load proxy URLs. The file is optional.
pub(crate) fn load_proxies(path: &Path) -> Vec<String> {
    let Ok(data) = fs::read_to_string(path) else {
        info!("no proxy file at {}, running without proxies", path.display());
        return Vec::new();
    };
    let proxies: Vec<String> = lines(&data).map(str::to_string).collect();
    info!("loaded {} proxies from {}", proxies.len(), path.display());
    proxies
}
