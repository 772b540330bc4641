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

//! The Autosend engine: session handshake, nonce tracking, amount policy,
//! transfer construction and the iteration scheduler.

pub mod amount;

mod emit;
pub use emit::{IdleReason, PassSummary, SchedulerEvent, SkipReason};

mod error;
pub use error::TransferError;

mod nonce;
pub use nonce::NonceTracker;

mod scheduler;
pub use scheduler::{Command, Scheduler};

mod session;
pub use session::ensure_session;

mod state;
pub use state::{AccountStatus, EngineState, SchedulerStatus, StatusSnapshot};

mod store;
pub use store::{ConfigStore, StoredSession, TokenStore};

mod transfer;
pub use transfer::TransferEngine;
