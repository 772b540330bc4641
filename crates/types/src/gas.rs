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

use serde::{Deserialize, Deserializer};

/// Fallback max fee per gas when the node offers no suggestion: 1.5 gwei.
pub const DEFAULT_MAX_FEE_PER_GAS: u128 = 1_500_000_000;
/// Fallback max priority fee per gas: 1 gwei.
pub const DEFAULT_MAX_PRIORITY_FEE_PER_GAS: u128 = 1_000_000_000;

/// EIP-1559 fee pair attached to a user operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GasFees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Fee suggestions read from the node; either member may be missing.
#[derive(Clone, Copy, Debug, Default)]
pub struct FeeData {
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

impl FeeData {
    /// Resolve missing suggestions to the fixed defaults.
    pub fn or_defaults(self) -> GasFees {
        GasFees {
            max_fee_per_gas: self.max_fee_per_gas.unwrap_or(DEFAULT_MAX_FEE_PER_GAS),
            max_priority_fee_per_gas: self
                .max_priority_fee_per_gas
                .unwrap_or(DEFAULT_MAX_PRIORITY_FEE_PER_GAS),
        }
    }
}

/// Gas limits returned by the bundler's estimation method.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    #[serde(deserialize_with = "deserialize_quantity")]
    pub call_gas_limit: u128,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub verification_gas_limit: u128,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub pre_verification_gas: u128,
}

/// Accept JSON-RPC quantities as hex strings, decimal strings, or numbers.
fn deserialize_quantity<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    // Untagged enums buffer through serde's internal content type, which only
    // carries integers up to u64, so a u128 variant would never match a number.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity {
        Number(u64),
        String(String),
    }

    match Quantity::deserialize(deserializer)? {
        Quantity::Number(value) => Ok(u128::from(value)),
        Quantity::String(value) => {
            let value = value.trim();
            if let Some(hex) = value.strip_prefix("0x").or(value.strip_prefix("0X")) {
                u128::from_str_radix(hex, 16).map_err(D::Error::custom)
            } else {
                value.parse().map_err(D::Error::custom)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_estimate_from_hex_quantities() {
        let estimate: GasEstimate = serde_json::from_str(
            r#"{"callGasLimit":"0x186a0","verificationGasLimit":"0x249f0","preVerificationGas":"0xc350"}"#,
        )
        .unwrap();
        assert_eq!(estimate.call_gas_limit, 100_000);
        assert_eq!(estimate.verification_gas_limit, 150_000);
        assert_eq!(estimate.pre_verification_gas, 50_000);
    }

    #[test]
    fn test_gas_estimate_from_numbers() {
        let estimate: GasEstimate = serde_json::from_str(
            r#"{"callGasLimit":100000,"verificationGasLimit":"150000","preVerificationGas":50000}"#,
        )
        .unwrap();
        assert_eq!(estimate.call_gas_limit, 100_000);
        assert_eq!(estimate.verification_gas_limit, 150_000);
        assert_eq!(estimate.pre_verification_gas, 50_000);
    }

    #[test]
    fn test_fee_data_defaults() {
        let fees = FeeData::default().or_defaults();
        assert_eq!(fees.max_fee_per_gas, DEFAULT_MAX_FEE_PER_GAS);
        assert_eq!(
            fees.max_priority_fee_per_gas,
            DEFAULT_MAX_PRIORITY_FEE_PER_GAS
        );

        let fees = FeeData {
            max_fee_per_gas: Some(7),
            max_priority_fee_per_gas: None,
        }
        .or_defaults();
        assert_eq!(fees.max_fee_per_gas, 7);
        assert_eq!(
            fees.max_priority_fee_per_gas,
            DEFAULT_MAX_PRIORITY_FEE_PER_GAS
        );
    }
}
