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

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// Network constants and endpoints for the target chain. Defaults to the
/// Incentiv testnet; every field can be overridden from the CLI.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChainSpec {
    /// Chain id used when hashing user operations
    pub chain_id: u64,
    /// Node JSON-RPC endpoint
    pub rpc_url: String,
    /// Bundler JSON-RPC endpoint
    pub bundler_url: String,
    /// Identity backend REST endpoint
    pub api_url: String,
    /// ERC-4337 entry point address
    pub entry_point: Address,
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self {
            chain_id: 28802,
            rpc_url: "https://rpc1.testnet.incentiv.io".to_string(),
            bundler_url: "https://bundler-testnet.incentiv.io/".to_string(),
            api_url: "https://api.testnet.incentiv.io".to_string(),
            entry_point: address!("9b5d240EF1bc8B4930346599cDDFfBD7d7D56db9"),
        }
    }
}
