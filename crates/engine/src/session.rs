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

use alloy_primitives::hex;
use alloy_signer::SignerSync;
use autosend_provider::IdentityApi;
use autosend_types::Account;
use autosend_utils::strs::short_address;
use tracing::{debug, info};

use crate::{
    error::TransferError,
    store::{StoredSession, TokenStore},
};

/// Establish a session for the account unless it already has one.
///
/// The handshake is challenge -> EIP-191 signature over the raw challenge
/// string -> login. On success the account is mutated in place and the
/// session is persisted immediately, so a crash after this point does not
/// force a re-login on the next run.
pub async fn ensure_session<I: IdentityApi + ?Sized>(
    account: &mut Account,
    identity: &I,
    tokens: &mut TokenStore,
) -> Result<(), TransferError> {
    if account.is_activated() {
        debug!(
            "account {} already has a session",
            short_address(&account.address())
        );
        return Ok(());
    }

    let address = account.address();
    debug!("requesting login challenge for {}", short_address(&address));
    let challenge = identity
        .get_challenge(address)
        .await?
        .ok_or(TransferError::Registration(address))?;

    let signature = account
        .signer()
        .sign_message_sync(challenge.as_bytes())
        .map_err(|e| TransferError::Signing(e.to_string()))?;
    let signature = format!("0x{}", hex::encode(signature.as_bytes()));
    debug!("submitting signed challenge for {}", short_address(&address));

    let session = identity
        .login(&challenge, &signature)
        .await?
        .ok_or_else(|| TransferError::Login("response lacked address or token".to_string()))?;

    account.smart_address = Some(session.smart_address);
    account.token = Some(session.token.clone());
    tokens.upsert(
        address,
        StoredSession {
            smart_address: session.smart_address,
            token: session.token,
        },
    )?;

    info!(
        "logged in {} with smart wallet {}",
        short_address(&address),
        short_address(&session.smart_address)
    );
    Ok(())
}
