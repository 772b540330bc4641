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

//! Structured events emitted by the scheduler for the log stream.

use std::fmt::Display;

use alloy_primitives::{Address, B256};
use autosend_utils::strs::{short_address, short_hash};

/// Why an account was skipped for the current pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    SessionFailed(String),
    NoSpendableBalance,
    NoEligibleRecipient,
    AmountPolicy(String),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionFailed(e) => write!(f, "session failed: {e}"),
            Self::NoSpendableBalance => write!(f, "balance below gas reserve"),
            Self::NoEligibleRecipient => write!(f, "no eligible recipient"),
            Self::AmountPolicy(e) => write!(f, "amount policy: {e}"),
        }
    }
}

/// Why the scheduler left the running state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdleReason {
    IterationLimit,
    Stopped,
    Shutdown,
}

/// Per-pass outcome counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub submitted: u32,
    pub skipped: u32,
    pub failed: u32,
}

#[derive(Clone, Debug)]
pub enum SchedulerEvent {
    PassStarted {
        iteration: u32,
        max_iterations: u32,
    },
    PassCompleted {
        iteration: u32,
        summary: PassSummary,
    },
    SessionEstablished {
        address: Address,
        smart_address: Address,
    },
    AccountSkipped {
        address: Address,
        reason: SkipReason,
    },
    TransferSubmitted {
        address: Address,
        recipient: Address,
        amount: f64,
        hash: B256,
    },
    TransferFailed {
        address: Address,
        error: String,
    },
    BalanceUpdated {
        smart_address: Address,
        balance: f64,
    },
    StopRequested,
    BecameIdle {
        reason: IdleReason,
    },
}

impl Display for SchedulerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PassStarted {
                iteration,
                max_iterations,
            } => {
                if *max_iterations == 0 {
                    write!(f, "pass {iteration} started")
                } else {
                    write!(f, "pass {iteration}/{max_iterations} started")
                }
            }
            Self::PassCompleted { iteration, summary } => write!(
                f,
                "pass {iteration} completed: {} submitted, {} skipped, {} failed",
                summary.submitted, summary.skipped, summary.failed
            ),
            Self::SessionEstablished {
                address,
                smart_address,
            } => write!(
                f,
                "session established for {} (smart wallet {})",
                short_address(address),
                short_address(smart_address)
            ),
            Self::AccountSkipped { address, reason } => {
                write!(f, "skipped {}: {reason}", short_address(address))
            }
            Self::TransferSubmitted {
                address,
                recipient,
                amount,
                hash,
            } => write!(
                f,
                "{} sent {amount} to {} ({})",
                short_address(address),
                short_address(recipient),
                short_hash(hash)
            ),
            Self::TransferFailed { address, error } => {
                write!(f, "transfer failed for {}: {error}", short_address(address))
            }
            Self::BalanceUpdated {
                smart_address,
                balance,
            } => write!(
                f,
                "balance of {} is {balance}",
                short_address(smart_address)
            ),
            Self::StopRequested => write!(f, "stop requested"),
            Self::BecameIdle { reason } => match reason {
                IdleReason::IterationLimit => write!(f, "idle: iteration limit reached"),
                IdleReason::Stopped => write!(f, "idle: stopped"),
                IdleReason::Shutdown => write!(f, "idle: shutting down"),
            },
        }
    }
}
