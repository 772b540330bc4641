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

use std::collections::HashMap;

use alloy_primitives::Address;
use anyhow::bail;
use autosend_types::{Account, TransferConfig};

/// Scheduler run state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchedulerStatus {
    #[default]
    Idle,
    Running,
    /// Stop requested; the current account's work finishes first
    Stopping,
}

/// All mutable engine state, owned by the scheduler task. Mutation happens
/// only through command application on that task.
#[derive(Debug)]
pub struct EngineState {
    pub config: TransferConfig,
    pub accounts: Vec<Account>,
    pub recipients: Vec<Address>,
    pub status: SchedulerStatus,
    /// Last observed smart wallet balances, in native units
    pub balances: HashMap<Address, f64>,
}

impl EngineState {
    pub fn new(config: TransferConfig, accounts: Vec<Account>, recipients: Vec<Address>) -> Self {
        Self {
            config,
            accounts,
            recipients,
            status: SchedulerStatus::Idle,
            balances: HashMap::new(),
        }
    }

    pub fn activated_count(&self) -> usize {
        self.accounts.iter().filter(|a| a.is_activated()).count()
    }

    /// Preconditions for entering the running state. A failure leaves all
    /// state untouched.
    pub fn can_start(&self) -> anyhow::Result<()> {
        if self.accounts.is_empty() {
            bail!("no accounts loaded");
        }
        let activated = self.activated_count();
        if activated == 0 {
            bail!("no activated accounts, activate accounts first");
        }
        if self.recipients.is_empty() {
            bail!("no recipient addresses loaded");
        }
        if self.config.multi_wallet_mode && activated != self.recipients.len() {
            bail!(
                "multi-wallet mode needs one recipient per activated account ({} accounts, {} recipients)",
                activated,
                self.recipients.len()
            );
        }
        if self.config.iteration_limit_reached() {
            bail!(
                "iteration limit reached ({}/{})",
                self.config.current_iteration,
                self.config.max_iterations
            );
        }
        Ok(())
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            status: self.status,
            current_iteration: self.config.current_iteration,
            max_iterations: self.config.max_iterations,
            accounts: self
                .accounts
                .iter()
                .map(|a| AccountStatus {
                    address: a.address(),
                    smart_address: a.smart_address,
                    activated: a.is_activated(),
                    balance: a.smart_address.and_then(|s| self.balances.get(&s).copied()),
                })
                .collect(),
        }
    }
}

/// Point-in-time view of the engine for the dashboard.
#[derive(Clone, Debug)]
pub struct StatusSnapshot {
    pub status: SchedulerStatus,
    pub current_iteration: u32,
    pub max_iterations: u32,
    pub accounts: Vec<AccountStatus>,
}

#[derive(Clone, Debug)]
pub struct AccountStatus {
    pub address: Address,
    pub smart_address: Option<Address>,
    pub activated: bool,
    pub balance: Option<f64>,
}
