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
#[cfg(feature = "test-utils")]
use mockall::automock;

use autosend_types::FeeData;

use crate::error::ProviderResult;

/// Read-only view of the chain through the node's JSON-RPC endpoint.
#[cfg_attr(feature = "test-utils", automock)]
#[async_trait::async_trait]
pub trait EvmReader: Send + Sync + 'static {
    /// Get the native balance of an address
    async fn get_balance(&self, address: Address) -> ProviderResult<U256>;

    /// Get the deployed code at an address
    async fn get_code(&self, address: Address) -> ProviderResult<Bytes>;

    /// Read the sender's next nonce from the entry point contract
    async fn get_entry_point_nonce(
        &self,
        entry_point: Address,
        sender: Address,
        key: U192,
    ) -> ProviderResult<U256>;

    /// Current fee suggestions. Either member may be absent when the node
    /// does not offer one.
    async fn get_fee_data(&self) -> ProviderResult<FeeData>;
}
