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

use std::fmt;

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};

/// A test account: the signing key, its derived EOA address, and the smart
/// wallet session obtained from the identity backend once logged in.
#[derive(Clone)]
pub struct Account {
    signer: PrivateKeySigner,
    address: Address,
    /// Smart wallet address, set once the account is activated
    pub smart_address: Option<Address>,
    /// Session token for the identity backend
    pub token: Option<String>,
}

impl Account {
    pub fn new(signer: PrivateKeySigner) -> Self {
        let address = signer.address();
        Self {
            signer,
            address,
            smart_address: None,
            token: None,
        }
    }

    /// Parse an account from a raw private key string.
    pub fn from_private_key(key: &SecretString) -> anyhow::Result<Self> {
        let signer = key
            .expose_secret()
            .trim()
            .parse::<PrivateKeySigner>()
            .context("failed to parse private key signer")?;
        Ok(Self::new(signer))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// An account is activated once it carries both a smart wallet address and
    /// a session token.
    pub fn is_activated(&self) -> bool {
        self.smart_address.is_some() && self.token.is_some()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("smart_address", &self.smart_address)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_private_key_derives_address() {
        // Well-known anvil dev key.
        let key = SecretString::new(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
        );
        let account = Account::from_private_key(&key).unwrap();
        assert_eq!(
            account.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
        assert!(!account.is_activated());
    }

    #[test]
    fn test_activation_requires_address_and_token() {
        let key = SecretString::new(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
        );
        let mut account = Account::from_private_key(&key).unwrap();
        account.smart_address = Some(Address::ZERO);
        assert!(!account.is_activated());
        account.token = Some("token".to_string());
        assert!(account.is_activated());
    }
}
