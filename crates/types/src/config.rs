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

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// How the per-account transfer amount is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferMode {
    /// Always send the configured fixed amount
    Fixed,
    /// Send a random percentage of the balance above the gas reserve
    Random,
    /// Send the whole balance above the gas reserve
    SendAll,
}

impl TransferMode {
    /// Cycle to the next mode, in the menu order fixed -> random -> sendAll.
    pub fn next(self) -> Self {
        match self {
            Self::Fixed => Self::Random,
            Self::Random => Self::SendAll,
            Self::SendAll => Self::Fixed,
        }
    }
}

/// Transfer settings and the iteration counter. Persisted as a camelCase JSON
/// document and rewritten wholesale after every mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferConfig {
    pub transfer_mode: TransferMode,
    /// Amount sent in fixed mode, in native units
    pub fixed_amount: f64,
    /// Balance left untouched for gas, in native units
    pub gas_reserve: f64,
    /// Lower percentage bound for random mode
    pub min_percent: f64,
    /// Upper percentage bound for random mode
    pub max_percent: f64,
    /// Pass limit; 0 means unlimited
    pub max_iterations: u32,
    pub current_iteration: u32,
    /// Send account `i` to recipient `i` instead of a random recipient
    pub multi_wallet_mode: bool,
    /// Delay between accounts within a pass, in seconds
    pub account_delay_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            transfer_mode: TransferMode::Random,
            fixed_amount: 0.05,
            gas_reserve: 0.02,
            min_percent: 50.0,
            max_percent: 100.0,
            max_iterations: 0,
            current_iteration: 0,
            multi_wallet_mode: true,
            account_delay_secs: 30,
        }
    }
}

impl TransferConfig {
    /// Validate the invariants the rest of the engine relies on.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fixed_amount <= 0.0 {
            bail!("fixed amount must be positive");
        }
        if self.gas_reserve < 0.0 {
            bail!("gas reserve must not be negative");
        }
        if !(0.0..=100.0).contains(&self.min_percent)
            || !(0.0..=100.0).contains(&self.max_percent)
            || self.min_percent > self.max_percent
        {
            bail!("percentage range must satisfy 0 <= min <= max <= 100");
        }
        Ok(())
    }

    /// Whether the configured pass limit has been reached.
    pub fn iteration_limit_reached(&self) -> bool {
        self.max_iterations > 0 && self.current_iteration >= self.max_iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serde_names() {
        assert_eq!(
            serde_json::to_string(&TransferMode::SendAll).unwrap(),
            "\"sendAll\""
        );
        assert_eq!(
            serde_json::from_str::<TransferMode>("\"fixed\"").unwrap(),
            TransferMode::Fixed
        );
    }

    #[test]
    fn test_config_round_trip() {
        let config = TransferConfig {
            transfer_mode: TransferMode::Fixed,
            fixed_amount: 0.25,
            current_iteration: 7,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let reloaded: TransferConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_validate_rejects_inverted_percent_range() {
        let config = TransferConfig {
            min_percent: 80.0,
            max_percent: 20.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_fixed_amount() {
        let config = TransferConfig {
            fixed_amount: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_iteration_limit() {
        let mut config = TransferConfig {
            max_iterations: 2,
            current_iteration: 1,
            ..Default::default()
        };
        assert!(!config.iteration_limit_reached());
        config.current_iteration = 2;
        assert!(config.iteration_limit_reached());
        config.max_iterations = 0;
        assert!(!config.iteration_limit_reached());
    }
}
