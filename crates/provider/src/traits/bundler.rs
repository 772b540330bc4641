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

use alloy_primitives::{Address, B256};
#[cfg(feature = "test-utils")]
use mockall::automock;

use autosend_types::{GasEstimate, RpcUserOperation};

use crate::error::ProviderResult;

/// ERC-4337 bundler RPC methods the engine uses.
#[cfg_attr(feature = "test-utils", automock)]
#[async_trait::async_trait]
pub trait BundlerApi: Send + Sync + 'static {
    /// Estimate the gas limits for a user operation
    async fn estimate_user_operation_gas(
        &self,
        op: RpcUserOperation,
        entry_point: Address,
    ) -> ProviderResult<GasEstimate>;

    /// Submit a signed user operation, returning its hash
    async fn send_user_operation(
        &self,
        op: RpcUserOperation,
        entry_point: Address,
    ) -> ProviderResult<B256>;
}
