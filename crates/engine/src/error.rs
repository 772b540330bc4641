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
use autosend_provider::ProviderError;

/// Failure kinds for the session, amount and transfer stages. The scheduler
/// catches these per account; none of them aborts a running pass.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The identity backend has no challenge for this address
    #[error("address {0} is not registered with the identity backend")]
    Registration(Address),
    /// The login response lacked a smart wallet address or token
    #[error("login failed: {0}")]
    Login(String),
    /// No code at the smart wallet address
    #[error("smart wallet {0} is not deployed")]
    NotDeployed(Address),
    /// Recipient is not a usable address
    #[error("invalid recipient {0}")]
    InvalidRecipient(Address),
    /// Recipient equals the sending smart wallet
    #[error("refusing to transfer from {0} to itself")]
    SelfTransfer(Address),
    /// Balance does not cover the amount plus the gas buffer
    #[error("balance of {address} too low: have {balance} wei, need {required} wei")]
    InsufficientBalance {
        address: Address,
        balance: alloy_primitives::U256,
        required: alloy_primitives::U256,
    },
    /// The bundler returned no usable gas estimate
    #[error("gas estimation failed: {0}")]
    GasEstimation(String),
    /// The bundler returned no operation hash
    #[error("submission failed: {0}")]
    Submission(String),
    /// Amount policy found nothing left above the gas reserve
    #[error("no funds available above the gas reserve")]
    InsufficientFunds,
    /// Local signing failed
    #[error("signing failed: {0}")]
    Signing(String),
    /// Transport-level failure, surfaced after the retry budget
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
