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

use rand::Rng;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Minimal JSON-RPC 2.0 client over HTTP, shared by the node and bundler
/// transports. Transient failures are retried with a linear backoff.
#[derive(Clone, Debug)]
pub struct JsonRpcClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

impl JsonRpcClient {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue a single JSON-RPC call, retrying transient transport failures.
    pub async fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> ProviderResult<R> {
        autosend_utils::retry::with_retries(
            &format!("call {method}"),
            ProviderError::is_transient,
            || self.call_once(method, params.clone()),
            Default::default(),
        )
        .await
    }

    async fn call_once<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> ProviderResult<R> {
        let id: u32 = rand::thread_rng().gen();
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!("rpc request to {}: {method}", self.url);

        let response: RpcResponse = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_response(response)
    }
}

fn parse_response<R: DeserializeOwned>(response: RpcResponse) -> ProviderResult<R> {
    if let Some(error) = response.error {
        return Err(ProviderError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    let result = response
        .result
        .ok_or_else(|| ProviderError::InvalidResponse("missing result field".to_string()))?;
    serde_json::from_value(result)
        .map_err(|e| ProviderError::InvalidResponse(format!("malformed result: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result() {
        let response: RpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":"0x2a"}"#).unwrap();
        let parsed: String = parse_response(response).unwrap();
        assert_eq!(parsed, "0x2a");
    }

    #[test]
    fn test_parse_error_object() {
        let response: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"nope"}}"#,
        )
        .unwrap();
        let parsed: ProviderResult<String> = parse_response(response);
        match parsed {
            Err(ProviderError::Rpc { code, message }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "nope");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_result() {
        let response: RpcResponse = serde_json::from_str(r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
        let parsed: ProviderResult<String> = parse_response(response);
        assert!(matches!(parsed, Err(ProviderError::InvalidResponse(_))));
    }
}
