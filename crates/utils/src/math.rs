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

//! Math utilities

use alloy_primitives::{
    utils::{format_ether, parse_ether},
    U256,
};
use anyhow::Context;

/// Round a value to a fixed number of decimal places.
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Convert a native-unit amount into wei. The amount is formatted with 9
/// decimal places, which covers everything the amount policy can produce.
pub fn ether_to_wei(amount: f64) -> anyhow::Result<U256> {
    parse_ether(&format!("{amount:.9}")).context("amount should parse as an ether value")
}

/// Convert a wei balance into a native-unit f64, losing sub-float precision.
pub fn wei_to_ether(value: U256) -> f64 {
    format_ether(value).parse().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_decimals() {
        assert_eq!(round_to_decimals(0.123456789, 3), 0.123);
        assert_eq!(round_to_decimals(0.123456789, 6), 0.123457);
        assert_eq!(round_to_decimals(5.0, 3), 5.0);
    }

    #[test]
    fn test_ether_to_wei() {
        assert_eq!(
            ether_to_wei(0.05).unwrap(),
            U256::from(50_000_000_000_000_000u128)
        );
        assert_eq!(ether_to_wei(0.0).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_wei_round_trip() {
        let wei = ether_to_wei(1.234567).unwrap();
        assert!((wei_to_ether(wei) - 1.234567).abs() < 1e-9);
    }
}
