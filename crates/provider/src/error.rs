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

/// Errors surfaced by the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP-level failure: connect, timeout, non-success status
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// JSON-RPC error object returned by the node or bundler
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// Identity backend rejected the request
    #[error("api error: {0}")]
    Api(String),
    /// Response body did not have the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether a retry has a chance of succeeding. Timeouts, connection
    /// failures and gateway errors are transient; everything else is not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => {
                if e.is_timeout() || e.is_connect() {
                    return true;
                }
                matches!(
                    e.status().map(|s| s.as_u16()),
                    Some(502) | Some(503) | Some(504)
                )
            }
            _ => false,
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
