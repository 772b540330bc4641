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
#[cfg(feature = "test-utils")]
use mockall::automock;

use crate::error::ProviderResult;

/// Session established with the identity backend after a successful login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionInfo {
    /// Bearer token for subsequent API calls
    pub token: String,
    /// Smart wallet address bound to the EOA
    pub smart_address: Address,
}

/// Identity backend endpoints for the challenge/login handshake.
#[cfg_attr(feature = "test-utils", automock)]
#[async_trait::async_trait]
pub trait IdentityApi: Send + Sync + 'static {
    /// Request a login challenge for an EOA. `None` means the address is not
    /// registered with the backend.
    async fn get_challenge(&self, address: Address) -> ProviderResult<Option<String>>;

    /// Exchange a signed challenge for a session. `None` means the backend
    /// rejected the signature.
    async fn login(&self, challenge: &str, signature: &str)
        -> ProviderResult<Option<SessionInfo>>;
}
