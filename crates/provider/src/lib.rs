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

//! Transports for the external services Autosend talks to: the node, the
//! bundler and the identity backend, with optional per-account proxies.

mod bundler;
pub use bundler::RpcBundler;

mod error;
pub use error::{ProviderError, ProviderResult};

mod evm;
pub use evm::RpcEvmReader;

mod identity;
pub use identity::RestIdentityClient;

mod jsonrpc;
pub use jsonrpc::JsonRpcClient;

mod proxy;
pub use proxy::build_client;

mod traits;
#[cfg(feature = "test-utils")]
pub use traits::{MockBundlerApi, MockEvmReader, MockIdentityApi};
pub use traits::{BundlerApi, EvmReader, IdentityApi, SessionInfo};

use std::sync::Arc;

use autosend_types::ChainSpec;

/// One set of transports sharing an HTTP client, so a proxied account uses
/// its proxy for every service it touches.
#[derive(Clone)]
pub struct Transports<E, B, I> {
    pub evm: E,
    pub bundler: B,
    pub identity: I,
}

/// Maps accounts to transports. With proxies configured, account `i` uses
/// proxy `i % proxies`; without any, every account shares one direct set.
#[derive(Clone)]
pub struct TransportSelector<E, B, I> {
    sets: Vec<Arc<Transports<E, B, I>>>,
}

impl<E, B, I> TransportSelector<E, B, I> {
    pub fn new(sets: Vec<Arc<Transports<E, B, I>>>) -> Self {
        assert!(!sets.is_empty(), "at least one transport set is required");
        Self { sets }
    }

    pub fn for_account(&self, index: usize) -> &Arc<Transports<E, B, I>> {
        &self.sets[index % self.sets.len()]
    }
}

impl TransportSelector<RpcEvmReader, RpcBundler, RestIdentityClient> {
    /// Build the production transports: one set per proxy, or a single
    /// direct set when no proxies are configured.
    pub fn from_chain(chain: &ChainSpec, proxies: &[String]) -> anyhow::Result<Self> {
        let mut sets = Vec::new();
        if proxies.is_empty() {
            sets.push(Arc::new(build_transports(chain, None)?));
        } else {
            for proxy in proxies {
                sets.push(Arc::new(build_transports(chain, Some(proxy))?));
            }
        }
        Ok(Self::new(sets))
    }
}

fn build_transports(
    chain: &ChainSpec,
    proxy: Option<&String>,
) -> anyhow::Result<Transports<RpcEvmReader, RpcBundler, RestIdentityClient>> {
    let client = build_client(proxy.map(String::as_str))?;
    Ok(Transports {
        evm: RpcEvmReader::new(JsonRpcClient::new(client.clone(), chain.rpc_url.clone())),
        bundler: RpcBundler::new(JsonRpcClient::new(client.clone(), chain.bundler_url.clone())),
        identity: RestIdentityClient::new(client, chain.api_url.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(n: usize) -> TransportSelector<u32, u32, u32> {
        let sets = (0..n)
            .map(|i| {
                Arc::new(Transports {
                    evm: i as u32,
                    bundler: i as u32,
                    identity: i as u32,
                })
            })
            .collect();
        TransportSelector::new(sets)
    }

    #[test]
    fn test_accounts_wrap_around_proxies() {
        let selector = selector(3);
        assert_eq!(selector.for_account(0).evm, 0);
        assert_eq!(selector.for_account(2).evm, 2);
        assert_eq!(selector.for_account(3).evm, 0);
        assert_eq!(selector.for_account(7).evm, 1);
    }

    #[test]
    fn test_single_set_serves_all_accounts() {
        let selector = selector(1);
        assert_eq!(selector.for_account(0).evm, 0);
        assert_eq!(selector.for_account(41).evm, 0);
    }
}
