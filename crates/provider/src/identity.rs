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

use alloy_primitives::Address;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{
    error::{ProviderError, ProviderResult},
    traits::{IdentityApi, SessionInfo},
};

/// Challenge type the identity backend expects from a wallet client.
const CHALLENGE_TYPE: &str = "BROWSER_EXTENSION";

/// `IdentityApi` backed by the identity backend's REST endpoint.
#[derive(Clone, Debug)]
pub struct RestIdentityClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChallengeEnvelope {
    result: Option<ChallengeResult>,
}

#[derive(Debug, Deserialize)]
struct ChallengeResult {
    challenge: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginEnvelope {
    result: Option<LoginResult>,
}

#[derive(Debug, Deserialize)]
struct LoginResult {
    address: Option<Address>,
    token: Option<String>,
}

impl RestIdentityClient {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl IdentityApi for RestIdentityClient {
    async fn get_challenge(&self, address: Address) -> ProviderResult<Option<String>> {
        let url = format!(
            "{}/api/user/challenge?type={CHALLENGE_TYPE}&address={address:#x}",
            self.base_url
        );
        debug!("requesting login challenge for {address:#x}");

        let envelope: ChallengeEnvelope = autosend_utils::retry::with_retries(
            "request login challenge",
            ProviderError::is_transient,
            || async {
                Ok::<_, ProviderError>(
                    self.client
                        .get(&url)
                        .send()
                        .await?
                        .error_for_status()?
                        .json()
                        .await?,
                )
            },
            Default::default(),
        )
        .await?;

        Ok(envelope.result.and_then(|r| r.challenge))
    }

    async fn login(
        &self,
        challenge: &str,
        signature: &str,
    ) -> ProviderResult<Option<SessionInfo>> {
        let url = format!("{}/api/user/login", self.base_url);
        let payload = json!({
            "type": CHALLENGE_TYPE,
            "challenge": challenge,
            "signature": signature,
        });

        let envelope: LoginEnvelope = autosend_utils::retry::with_retries(
            "log in to identity backend",
            ProviderError::is_transient,
            || async {
                Ok::<_, ProviderError>(
                    self.client
                        .post(&url)
                        .json(&payload)
                        .send()
                        .await?
                        .error_for_status()?
                        .json()
                        .await?,
                )
            },
            Default::default(),
        )
        .await?;

        let Some(result) = envelope.result else {
            return Ok(None);
        };
        match (result.address, result.token) {
            (Some(smart_address), Some(token)) => Ok(Some(SessionInfo {
                token,
                smart_address,
            })),
            _ => Ok(None),
        }
    }
}
