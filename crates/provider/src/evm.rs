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

use alloy_primitives::{aliases::U192, Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use autosend_types::FeeData;

use crate::{
    error::{ProviderError, ProviderResult},
    jsonrpc::JsonRpcClient,
    traits::EvmReader,
};

sol! {
    function getNonce(address sender, uint192 key) returns (uint256 nonce);
}

/// `EvmReader` backed by the node's JSON-RPC endpoint.
#[derive(Clone, Debug)]
pub struct RpcEvmReader {
    rpc: JsonRpcClient,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockFees {
    base_fee_per_gas: Option<U256>,
}

impl RpcEvmReader {
    pub fn new(rpc: JsonRpcClient) -> Self {
        Self { rpc }
    }
}

#[async_trait::async_trait]
impl EvmReader for RpcEvmReader {
    async fn get_balance(&self, address: Address) -> ProviderResult<U256> {
        self.rpc
            .call("eth_getBalance", json!([address, "latest"]))
            .await
    }

    async fn get_code(&self, address: Address) -> ProviderResult<Bytes> {
        self.rpc
            .call("eth_getCode", json!([address, "latest"]))
            .await
    }

    async fn get_entry_point_nonce(
        &self,
        entry_point: Address,
        sender: Address,
        key: U192,
    ) -> ProviderResult<U256> {
        let data = Bytes::from(getNonceCall { sender, key }.abi_encode());
        let ret: Bytes = self
            .rpc
            .call(
                "eth_call",
                json!([{ "to": entry_point, "data": data }, "latest"]),
            )
            .await?;
        let decoded = getNonceCall::abi_decode_returns(&ret, true)
            .map_err(|e| ProviderError::InvalidResponse(format!("bad getNonce return: {e}")))?;
        Ok(decoded.nonce)
    }

    async fn get_fee_data(&self) -> ProviderResult<FeeData> {
        // Fee suggestions are best-effort; a node that lacks either method
        // falls through to the fixed defaults downstream.
        let tip = match self
            .rpc
            .call::<U256>("eth_maxPriorityFeePerGas", json!([]))
            .await
        {
            Ok(tip) => Some(tip.saturating_to::<u128>()),
            Err(e) => {
                warn!("no priority fee suggestion: {e}");
                None
            }
        };

        let base = match self
            .rpc
            .call::<BlockFees>("eth_getBlockByNumber", json!(["latest", false]))
            .await
        {
            Ok(block) => block.base_fee_per_gas.map(|b| b.saturating_to::<u128>()),
            Err(e) => {
                warn!("no base fee from latest block: {e}");
                None
            }
        };

        let max_fee_per_gas = match (base, tip) {
            (Some(base), Some(tip)) => Some(base.saturating_mul(2).saturating_add(tip)),
            _ => None,
        };

        Ok(FeeData {
            max_fee_per_gas,
            max_priority_fee_per_gas: tip,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_nonce_call_encoding() {
        let call = getNonceCall {
            sender: Address::repeat_byte(0x11),
            key: U192::ZERO,
        };
        let data = call.abi_encode();
        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[..4], getNonceCall::SELECTOR);
    }

    #[test]
    fn test_get_nonce_return_decoding() {
        let ret = U256::from(5).to_be_bytes::<32>();
        let decoded = getNonceCall::abi_decode_returns(&ret, true).unwrap();
        assert_eq!(decoded.nonce, U256::from(5));
    }
}
