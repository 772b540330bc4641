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

//! Formatting helpers for log output

use alloy_primitives::{Address, B256};

/// Shorten a 0x-prefixed hex string to `0xabcd...1234` for log lines.
pub fn short_hex(value: &str) -> String {
    if value.len() <= 12 {
        return value.to_string();
    }
    format!("{}...{}", &value[..6], &value[value.len() - 4..])
}

/// Short display form of an address.
pub fn short_address(address: &Address) -> String {
    short_hex(&format!("{address:#x}"))
}

/// Short display form of a 32-byte hash.
pub fn short_hash(hash: &B256) -> String {
    short_hex(&format!("{hash:#x}"))
}
