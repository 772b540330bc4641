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

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_signer::SignerSync;
use autosend_provider::{BundlerApi, EvmReader};
use autosend_types::{
    encode_execute, Account, ChainSpec, RpcUserOperation, UserOperationBuilder,
    UserOperationRequiredFields,
};
use autosend_utils::{
    math::ether_to_wei,
    strs::{short_address, short_hash},
};
use tracing::{info, warn};

use crate::{error::TransferError, nonce::NonceTracker};

/// Fixed balance headroom a transfer must leave for gas: 0.01 native units.
const GAS_BUFFER_WEI: u128 = 10_000_000_000_000_000;

/// Builds, signs and submits one smart wallet transfer as a user operation.
#[derive(Clone, Debug)]
pub struct TransferEngine {
    chain: ChainSpec,
}

impl TransferEngine {
    pub fn new(chain: ChainSpec) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &ChainSpec {
        &self.chain
    }

    /// Send `amount` native units from the account's smart wallet to
    /// `recipient`. Returns the user operation hash on success. The nonce is
    /// committed only after the bundler accepts the submission.
    pub async fn perform_transfer<E: EvmReader + ?Sized, B: BundlerApi + ?Sized>(
        &self,
        account: &Account,
        amount: f64,
        recipient: Address,
        evm: &E,
        bundler: &B,
        nonces: &mut NonceTracker,
    ) -> Result<B256, TransferError> {
        let smart = account
            .smart_address
            .ok_or_else(|| TransferError::Login("account has no session".to_string()))?;

        let code = evm.get_code(smart).await?;
        if code.is_empty() {
            return Err(TransferError::NotDeployed(smart));
        }
        if recipient.is_zero() {
            return Err(TransferError::InvalidRecipient(recipient));
        }
        if recipient == smart {
            return Err(TransferError::SelfTransfer(smart));
        }

        let amount_wei = ether_to_wei(amount)?;
        let required = amount_wei + U256::from(GAS_BUFFER_WEI);
        let balance = evm.get_balance(smart).await?;
        if balance < required {
            return Err(TransferError::InsufficientBalance {
                address: smart,
                balance,
                required,
            });
        }

        let nonce = nonces
            .next_nonce(self.chain.entry_point, smart, evm)
            .await?;
        let call_data = encode_execute(recipient, amount_wei);

        info!(
            "estimating gas for {} -> {} ({amount})",
            short_address(&smart),
            short_address(&recipient)
        );
        let estimate = bundler
            .estimate_user_operation_gas(
                RpcUserOperation::for_estimation(smart, nonce, call_data.clone()),
                self.chain.entry_point,
            )
            .await
            .map_err(|e| TransferError::GasEstimation(e.to_string()))?;

        let fees = match evm.get_fee_data().await {
            Ok(fees) => fees,
            Err(e) => {
                warn!("fee data unavailable, using defaults: {e}");
                Default::default()
            }
        }
        .or_defaults();

        let op = UserOperationBuilder::new(
            self.chain.entry_point,
            self.chain.chain_id,
            UserOperationRequiredFields {
                sender: smart,
                nonce,
                call_data,
                call_gas_limit: estimate.call_gas_limit,
                verification_gas_limit: estimate.verification_gas_limit,
                pre_verification_gas: estimate.pre_verification_gas,
                max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
                max_fee_per_gas: fees.max_fee_per_gas,
                signature: Bytes::new(),
            },
        )
        .build();

        let signature = account
            .signer()
            .sign_message_sync(op.hash().as_slice())
            .map_err(|e| TransferError::Signing(e.to_string()))?;
        let op = op.with_signature(Bytes::from(signature.as_bytes().to_vec()));

        let hash = bundler
            .send_user_operation(op.as_rpc(), self.chain.entry_point)
            .await
            .map_err(|e| TransferError::Submission(e.to_string()))?;

        nonces.commit(smart);
        info!(
            "transfer submitted for {}: {}",
            short_address(&smart),
            short_hash(&hash)
        );
        Ok(hash)
    }
}
