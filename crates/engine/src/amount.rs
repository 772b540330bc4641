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

//! Per-account transfer amount selection.

use autosend_types::{TransferConfig, TransferMode};
use autosend_utils::math::round_to_decimals;
use rand::Rng;

use crate::error::TransferError;

/// Balances within this margin of the gas reserve are skipped for the pass.
pub const MIN_SPENDABLE_MARGIN: f64 = 0.001;

/// Choose the amount to send for one account, in native units.
pub fn compute_amount(config: &TransferConfig, balance: f64) -> Result<f64, TransferError> {
    match config.transfer_mode {
        TransferMode::Fixed => Ok(round_to_decimals(config.fixed_amount, 3)),
        TransferMode::Random => {
            let available = balance - config.gas_reserve;
            if available <= 0.0 {
                return Err(TransferError::InsufficientFunds);
            }
            let percent = rand::thread_rng().gen_range(config.min_percent..=config.max_percent);
            Ok(round_to_decimals(available * percent / 100.0, 6))
        }
        TransferMode::SendAll => Ok(round_to_decimals(
            (balance - config.gas_reserve).max(0.0),
            3,
        )),
    }
}

/// Whether the balance leaves anything to spend above the gas reserve.
/// Fixed-mode transfers skip this check and rely on the engine's own balance
/// precondition instead.
pub fn has_spendable_balance(balance: f64, gas_reserve: f64) -> bool {
    balance >= gas_reserve + MIN_SPENDABLE_MARGIN
}
