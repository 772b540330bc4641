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

//! Data model shared by the Autosend crates: chain constants, accounts,
//! transfer configuration and user operations.

mod account;
pub use account::Account;

mod chain_spec;
pub use chain_spec::ChainSpec;

mod config;
pub use config::{TransferConfig, TransferMode};

mod gas;
pub use gas::{
    FeeData, GasEstimate, GasFees, DEFAULT_MAX_FEE_PER_GAS, DEFAULT_MAX_PRIORITY_FEE_PER_GAS,
};

mod user_operation;
pub use user_operation::{
    dummy_signature, encode_execute, PackedUserOperation, RpcUserOperation, UserOperation,
    UserOperationBuilder, UserOperationRequiredFields,
};
