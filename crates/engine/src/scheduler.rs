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

use std::time::Duration;

use alloy_primitives::Address;
use autosend_provider::{BundlerApi, EvmReader, IdentityApi, TransportSelector};
use autosend_types::TransferMode;
use autosend_utils::{math::wei_to_ether, strs::short_address};
use rand::Rng;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    time,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    amount::{self, compute_amount},
    emit::{IdleReason, PassSummary, SchedulerEvent, SkipReason},
    session::ensure_session,
    state::{EngineState, SchedulerStatus, StatusSnapshot},
    store::{ConfigStore, TokenStore},
    transfer::TransferEngine,
    NonceTracker,
};

/// Pause between passes when running unbounded.
const INTER_PASS_DELAY: Duration = Duration::from_secs(1);
/// Spacing between logins during bulk activation.
const ACTIVATION_DELAY: Duration = Duration::from_secs(2);

/// User intents applied by the scheduler task, which is the single consumer.
#[derive(Debug)]
pub enum Command {
    /// Begin auto-transfer passes
    Start,
    /// Stop after the in-flight account finishes
    Stop,
    /// Log in every account that has no cached session
    Activate,
    SetFixedAmount(f64),
    SetMode(TransferMode),
    ToggleMultiWallet,
    SetPercentRange(f64, f64),
    SetMaxIterations(u32),
    ResetIterations,
    QueryStatus(oneshot::Sender<StatusSnapshot>),
}

/// Outcome of one account within a pass.
#[derive(Debug)]
enum AccountOutcome {
    Submitted,
    Skipped(SkipReason),
    Failed(String),
}

/// Drives auto-transfer passes over the account list, strictly sequentially.
///
/// Commands are applied at loop boundaries and inside the delay primitive;
/// a stop never interrupts an in-flight request.
pub struct Scheduler<E, B, I> {
    state: EngineState,
    engine: TransferEngine,
    transports: TransportSelector<E, B, I>,
    config_store: ConfigStore,
    token_store: TokenStore,
    nonces: NonceTracker,
    events: broadcast::Sender<SchedulerEvent>,
}

impl<E, B, I> Scheduler<E, B, I>
where
    E: EvmReader,
    B: BundlerApi,
    I: IdentityApi,
{
    pub fn new(
        state: EngineState,
        engine: TransferEngine,
        transports: TransportSelector<E, B, I>,
        config_store: ConfigStore,
        token_store: TokenStore,
        events: broadcast::Sender<SchedulerEvent>,
    ) -> Self {
        Self {
            state,
            engine,
            transports,
            config_store,
            token_store,
            nonces: NonceTracker::new(),
            events,
        }
    }

    /// Consume commands until the channel closes or shutdown is signaled.
    /// Returns itself so callers can inspect the final state.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        shutdown: CancellationToken,
    ) -> Self {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                cmd = commands.recv() => {
                    let Some(cmd) = cmd else { break };
                    self.handle_idle_command(cmd, &mut commands, &shutdown).await;
                }
            }
        }
        self
    }

    async fn handle_idle_command(
        &mut self,
        cmd: Command,
        commands: &mut mpsc::Receiver<Command>,
        shutdown: &CancellationToken,
    ) {
        match cmd {
            Command::Start => self.run_auto_transfer(commands, shutdown).await,
            Command::Stop => debug!("stop requested while idle, nothing to do"),
            Command::Activate => self.activate_all(shutdown).await,
            other => self.apply_setting(other),
        }
    }

    /// The running loop: one pass after another until the iteration limit,
    /// a stop request, or shutdown.
    async fn run_auto_transfer(
        &mut self,
        commands: &mut mpsc::Receiver<Command>,
        shutdown: &CancellationToken,
    ) {
        if let Err(e) = self.state.can_start() {
            error!("refusing to start: {e}");
            return;
        }

        self.state.status = SchedulerStatus::Running;
        let stop = CancellationToken::new();
        let reason = loop {
            self.run_pass(commands, shutdown, &stop).await;

            if shutdown.is_cancelled() {
                break IdleReason::Shutdown;
            }
            if stop.is_cancelled() {
                break IdleReason::Stopped;
            }
            if self.state.config.iteration_limit_reached() {
                break IdleReason::IterationLimit;
            }

            self.wait_with_commands(INTER_PASS_DELAY, commands, shutdown, &stop)
                .await;
            if shutdown.is_cancelled() {
                break IdleReason::Shutdown;
            }
            if stop.is_cancelled() {
                break IdleReason::Stopped;
            }
        };

        self.state.status = SchedulerStatus::Idle;
        self.nonces.clear();
        self.emit(SchedulerEvent::BecameIdle { reason });
    }

    async fn run_pass(
        &mut self,
        commands: &mut mpsc::Receiver<Command>,
        shutdown: &CancellationToken,
        stop: &CancellationToken,
    ) {
        self.state.config.current_iteration += 1;
        self.persist_config();
        self.emit(SchedulerEvent::PassStarted {
            iteration: self.state.config.current_iteration,
            max_iterations: self.state.config.max_iterations,
        });

        let mut summary = PassSummary::default();
        let account_count = self.state.accounts.len();
        for index in 0..account_count {
            self.drain_commands(commands, stop);
            if stop.is_cancelled() || shutdown.is_cancelled() {
                break;
            }

            let address = self.state.accounts[index].address();
            match self.process_account(index).await {
                AccountOutcome::Submitted => summary.submitted += 1,
                AccountOutcome::Skipped(reason) => {
                    summary.skipped += 1;
                    self.emit(SchedulerEvent::AccountSkipped { address, reason });
                }
                AccountOutcome::Failed(err) => {
                    summary.failed += 1;
                    self.emit(SchedulerEvent::TransferFailed {
                        address,
                        error: err,
                    });
                }
            }

            if index + 1 < account_count && !stop.is_cancelled() && !shutdown.is_cancelled() {
                let delay = Duration::from_secs(self.state.config.account_delay_secs);
                self.wait_with_commands(delay, commands, shutdown, stop)
                    .await;
            }
        }

        self.emit(SchedulerEvent::PassCompleted {
            iteration: self.state.config.current_iteration,
            summary,
        });
        // fresh on-chain reads next pass, by design of the tracker
        self.nonces.clear();
    }

    /// Full per-account pipeline: session, recipient, balance, amount,
    /// transfer, balance refresh.
    async fn process_account(&mut self, index: usize) -> AccountOutcome {
        let transports = self.transports.for_account(index).clone();

        let was_activated = self.state.accounts[index].is_activated();
        {
            let account = &mut self.state.accounts[index];
            if let Err(e) = ensure_session(account, &transports.identity, &mut self.token_store).await
            {
                return AccountOutcome::Skipped(SkipReason::SessionFailed(e.to_string()));
            }
        }
        let account = self.state.accounts[index].clone();
        let Some(smart) = account.smart_address else {
            return AccountOutcome::Skipped(SkipReason::SessionFailed(
                "no smart wallet address".to_string(),
            ));
        };
        if !was_activated {
            self.emit(SchedulerEvent::SessionEstablished {
                address: account.address(),
                smart_address: smart,
            });
        }

        let Some(recipient) = self.pick_recipient(index, smart) else {
            return AccountOutcome::Skipped(SkipReason::NoEligibleRecipient);
        };

        let balance_wei = match transports.evm.get_balance(smart).await {
            Ok(balance) => balance,
            Err(e) => return AccountOutcome::Failed(format!("balance read failed: {e}")),
        };
        let balance = wei_to_ether(balance_wei);
        self.update_balance(smart, balance);

        // fixed mode relies on the engine's balance precondition instead
        if self.state.config.transfer_mode != TransferMode::Fixed
            && !amount::has_spendable_balance(balance, self.state.config.gas_reserve)
        {
            return AccountOutcome::Skipped(SkipReason::NoSpendableBalance);
        }

        let amount = match compute_amount(&self.state.config, balance) {
            Ok(amount) => amount,
            Err(e) => return AccountOutcome::Skipped(SkipReason::AmountPolicy(e.to_string())),
        };

        let result = self
            .engine
            .perform_transfer(
                &account,
                amount,
                recipient,
                &transports.evm,
                &transports.bundler,
                &mut self.nonces,
            )
            .await;

        match result {
            Ok(hash) => {
                self.emit(SchedulerEvent::TransferSubmitted {
                    address: account.address(),
                    recipient,
                    amount,
                    hash,
                });
                if let Ok(refreshed) = transports.evm.get_balance(smart).await {
                    self.update_balance(smart, wei_to_ether(refreshed));
                }
                AccountOutcome::Submitted
            }
            Err(e) => AccountOutcome::Failed(e.to_string()),
        }
    }

    /// Indexed recipient in multi-wallet mode, uniform random non-self
    /// recipient otherwise.
    fn pick_recipient(&self, index: usize, smart: Address) -> Option<Address> {
        if self.state.config.multi_wallet_mode {
            return self.state.recipients.get(index).copied();
        }
        let candidates: Vec<Address> = self
            .state
            .recipients
            .iter()
            .copied()
            .filter(|r| *r != smart)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rand::thread_rng().gen_range(0..candidates.len())])
    }

    /// Sleep that stays responsive: resolves early on stop or shutdown, and
    /// applies commands that arrive while waiting.
    async fn wait_with_commands(
        &mut self,
        duration: Duration,
        commands: &mut mpsc::Receiver<Command>,
        shutdown: &CancellationToken,
        stop: &CancellationToken,
    ) {
        let sleep = time::sleep(duration);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return,
                _ = stop.cancelled() => return,
                _ = shutdown.cancelled() => return,
                cmd = commands.recv() => {
                    let Some(cmd) = cmd else { return };
                    self.apply_running_command(cmd, stop);
                }
            }
        }
    }

    fn drain_commands(&mut self, commands: &mut mpsc::Receiver<Command>, stop: &CancellationToken) {
        while let Ok(cmd) = commands.try_recv() {
            self.apply_running_command(cmd, stop);
        }
    }

    fn apply_running_command(&mut self, cmd: Command, stop: &CancellationToken) {
        match cmd {
            Command::Start => warn!("already running"),
            Command::Stop => {
                if self.state.status == SchedulerStatus::Running {
                    self.state.status = SchedulerStatus::Stopping;
                    self.emit(SchedulerEvent::StopRequested);
                    stop.cancel();
                }
            }
            Command::Activate => warn!("cannot activate accounts while running"),
            other => self.apply_setting(other),
        }
    }

    /// Config mutations and status queries, valid in any state. Invalid
    /// settings are rejected wholesale and leave the config untouched.
    fn apply_setting(&mut self, cmd: Command) {
        let mut candidate = self.state.config.clone();
        match cmd {
            Command::SetFixedAmount(amount) => candidate.fixed_amount = amount,
            Command::SetMode(mode) => candidate.transfer_mode = mode,
            Command::ToggleMultiWallet => candidate.multi_wallet_mode = !candidate.multi_wallet_mode,
            Command::SetPercentRange(min, max) => {
                candidate.min_percent = min;
                candidate.max_percent = max;
            }
            Command::SetMaxIterations(limit) => candidate.max_iterations = limit,
            Command::ResetIterations => candidate.current_iteration = 0,
            Command::QueryStatus(reply) => {
                let _ = reply.send(self.state.snapshot());
                return;
            }
            Command::Start | Command::Stop | Command::Activate => return,
        }
        if let Err(e) = candidate.validate() {
            warn!("rejected config change: {e}");
            return;
        }
        self.state.config = candidate;
        self.persist_config();
    }

    /// Log in every account without a cached session, with fixed spacing
    /// between attempts.
    async fn activate_all(&mut self, shutdown: &CancellationToken) {
        let mut errors = 0u32;
        let count = self.state.accounts.len();
        for index in 0..count {
            if shutdown.is_cancelled() {
                return;
            }
            if self.state.accounts[index].is_activated() {
                continue;
            }
            let transports = self.transports.for_account(index).clone();
            let account = &mut self.state.accounts[index];
            let address = account.address();
            match ensure_session(account, &transports.identity, &mut self.token_store).await {
                Ok(()) => {
                    let smart = account.smart_address.unwrap_or_default();
                    self.emit(SchedulerEvent::SessionEstablished {
                        address,
                        smart_address: smart,
                    });
                }
                Err(e) => {
                    errors += 1;
                    warn!("activation failed for {}: {e}", short_address(&address));
                }
            }
            if index + 1 < count {
                tokio::select! {
                    _ = time::sleep(ACTIVATION_DELAY) => {}
                    _ = shutdown.cancelled() => return,
                }
            }
        }
        info!(
            "activation finished: {} activated, {errors} failed",
            self.state.activated_count()
        );
    }

    fn update_balance(&mut self, smart: Address, balance: f64) {
        self.state.balances.insert(smart, balance);
        self.emit(SchedulerEvent::BalanceUpdated {
            smart_address: smart,
            balance,
        });
    }

    fn persist_config(&self) {
        if let Err(e) = self.config_store.save(&self.state.config) {
            error!("failed to persist config: {e}");
        }
    }

    fn emit(&self, event: SchedulerEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use alloy_primitives::{Bytes, B256, U256};
    use alloy_signer_local::PrivateKeySigner;
    use autosend_provider::{
        MockBundlerApi, MockEvmReader, MockIdentityApi, Transports,
    };
    use autosend_types::{
        encode_execute, Account, ChainSpec, GasEstimate, TransferConfig,
    };

    use super::*;

    const RECIPIENT: Address = Address::repeat_byte(0xaa);
    const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

    fn activated_account(index: u8) -> Account {
        let mut account = Account::new(PrivateKeySigner::random());
        account.smart_address = Some(Address::repeat_byte(index));
        account.token = Some("token".to_string());
        account
    }

    fn fixed_config() -> TransferConfig {
        TransferConfig {
            transfer_mode: TransferMode::Fixed,
            fixed_amount: 0.05,
            gas_reserve: 0.02,
            multi_wallet_mode: false,
            ..Default::default()
        }
    }

    fn happy_evm() -> MockEvmReader {
        let mut evm = MockEvmReader::new();
        evm.expect_get_code()
            .returning(|_| Ok(Bytes::from(vec![0x60, 0x80])));
        evm.expect_get_balance()
            .returning(|_| Ok(U256::from(ONE_ETHER)));
        evm.expect_get_entry_point_nonce()
            .returning(|_, _, _| Ok(U256::ZERO));
        evm.expect_get_fee_data()
            .returning(|| Ok(Default::default()));
        evm
    }

    fn estimate() -> GasEstimate {
        GasEstimate {
            call_gas_limit: 100_000,
            verification_gas_limit: 150_000,
            pre_verification_gas: 50_000,
        }
    }

    struct Fixture {
        scheduler: Scheduler<MockEvmReader, MockBundlerApi, MockIdentityApi>,
        _dir: tempfile::TempDir,
        config_store: ConfigStore,
    }

    fn fixture(
        config: TransferConfig,
        accounts: Vec<Account>,
        recipients: Vec<Address>,
        evm: MockEvmReader,
        bundler: MockBundlerApi,
    ) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let config_store = ConfigStore::new(dir.path().join("config.json"));
        let token_store = TokenStore::load(dir.path().join("tokens.json")).unwrap();
        let transports = TransportSelector::new(vec![Arc::new(Transports {
            evm,
            bundler,
            identity: MockIdentityApi::new(),
        })]);
        let (events, _) = broadcast::channel(100);
        let scheduler = Scheduler::new(
            EngineState::new(config, accounts, recipients),
            TransferEngine::new(ChainSpec::default()),
            transports,
            config_store.clone(),
            token_store,
            events,
        );
        Fixture {
            scheduler,
            _dir: dir,
            config_store,
        }
    }

    async fn await_idle_with_iteration(commands: &mpsc::Sender<Command>, iteration: u32) {
        loop {
            let (tx, rx) = oneshot::channel();
            commands.send(Command::QueryStatus(tx)).await.unwrap();
            let snapshot = rx.await.unwrap();
            if snapshot.status == SchedulerStatus::Idle && snapshot.current_iteration >= iteration {
                return;
            }
            time::sleep(Duration::from_millis(50)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_refused_on_multi_wallet_mismatch() {
        let config = TransferConfig {
            multi_wallet_mode: true,
            ..fixed_config()
        };
        // no mock expectations: any network call would panic
        let fx = fixture(
            config,
            vec![activated_account(1), activated_account(2)],
            vec![RECIPIENT],
            MockEvmReader::new(),
            MockBundlerApi::new(),
        );

        let (tx, rx) = mpsc::channel(16);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(fx.scheduler.run(rx, shutdown.clone()));

        tx.send(Command::Start).await.unwrap();
        let (stx, srx) = oneshot::channel();
        tx.send(Command::QueryStatus(stx)).await.unwrap();
        let snapshot = srx.await.unwrap();
        assert_eq!(snapshot.status, SchedulerStatus::Idle);
        assert_eq!(snapshot.current_iteration, 0);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_mode_sends_exact_amount() {
        let mut bundler = MockBundlerApi::new();
        bundler
            .expect_estimate_user_operation_gas()
            .returning(|_, _| Ok(estimate()));
        let expected_call_data =
            encode_execute(RECIPIENT, U256::from(50_000_000_000_000_000u128));
        bundler
            .expect_send_user_operation()
            .times(1)
            .withf(move |op, _| op.call_data == expected_call_data)
            .returning(|_, _| Ok(B256::repeat_byte(0x99)));

        let config = TransferConfig {
            max_iterations: 1,
            ..fixed_config()
        };
        let fx = fixture(
            config,
            vec![activated_account(1)],
            vec![RECIPIENT],
            happy_evm(),
            bundler,
        );
        let config_store = fx.config_store.clone();

        let (tx, rx) = mpsc::channel(16);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(fx.scheduler.run(rx, shutdown.clone()));

        tx.send(Command::Start).await.unwrap();
        await_idle_with_iteration(&tx, 1).await;

        shutdown.cancel();
        let scheduler = handle.await.unwrap();
        assert_eq!(scheduler.state.config.current_iteration, 1);
        assert!(scheduler.nonces.is_empty());
        // the incremented counter was persisted before the pass ran
        assert_eq!(config_store.load().unwrap().current_iteration, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_mid_pass_finishes_current_account() {
        let (tx, rx) = mpsc::channel(16);

        let mut bundler = MockBundlerApi::new();
        bundler
            .expect_estimate_user_operation_gas()
            .returning(|_, _| Ok(estimate()));
        let submissions = Arc::new(AtomicU32::new(0));
        let counter = submissions.clone();
        let stop_tx = tx.clone();
        bundler
            .expect_send_user_operation()
            .times(3)
            .returning(move |_, _| {
                if counter.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                    stop_tx.try_send(Command::Stop).unwrap();
                }
                Ok(B256::repeat_byte(0x99))
            });

        let accounts = (1..=5).map(activated_account).collect();
        let fx = fixture(
            fixed_config(),
            accounts,
            vec![RECIPIENT],
            happy_evm(),
            bundler,
        );

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(fx.scheduler.run(rx, shutdown.clone()));

        tx.send(Command::Start).await.unwrap();
        await_idle_with_iteration(&tx, 1).await;

        shutdown.cancel();
        let scheduler = handle.await.unwrap();
        // account 3 ran to completion, 4 and 5 were never touched
        assert_eq!(submissions.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.state.status, SchedulerStatus::Idle);
        assert!(scheduler.nonces.is_empty());
        assert_eq!(scheduler.state.config.current_iteration, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_random_recipient_never_self() {
        let mut bundler = MockBundlerApi::new();
        bundler
            .expect_estimate_user_operation_gas()
            .returning(|_, _| Ok(estimate()));
        bundler
            .expect_send_user_operation()
            .withf(|op, _| {
                // only recipient 0xaa is eligible; 0x01 is the sender itself
                *op.call_data == *encode_execute(RECIPIENT, U256::from(50_000_000_000_000_000u128))
            })
            .returning(|_, _| Ok(B256::repeat_byte(0x99)));

        let config = TransferConfig {
            max_iterations: 1,
            ..fixed_config()
        };
        let fx = fixture(
            config,
            vec![activated_account(1)],
            vec![Address::repeat_byte(1), RECIPIENT],
            happy_evm(),
            bundler,
        );

        let (tx, rx) = mpsc::channel(16);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(fx.scheduler.run(rx, shutdown.clone()));

        tx.send(Command::Start).await.unwrap();
        await_idle_with_iteration(&tx, 1).await;
        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_settings_are_validated_and_persisted() {
        let fx = fixture(
            fixed_config(),
            vec![activated_account(1)],
            vec![RECIPIENT],
            MockEvmReader::new(),
            MockBundlerApi::new(),
        );
        let config_store = fx.config_store.clone();

        let (tx, rx) = mpsc::channel(16);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(fx.scheduler.run(rx, shutdown.clone()));

        tx.send(Command::SetPercentRange(90.0, 10.0)).await.unwrap();
        tx.send(Command::SetFixedAmount(0.25)).await.unwrap();
        tx.send(Command::SetMode(TransferMode::SendAll)).await.unwrap();

        let (stx, srx) = oneshot::channel();
        tx.send(Command::QueryStatus(stx)).await.unwrap();
        srx.await.unwrap();

        shutdown.cancel();
        let scheduler = handle.await.unwrap();
        // inverted range rejected, the rest applied and persisted
        assert_eq!(scheduler.state.config.min_percent, 50.0);
        assert_eq!(scheduler.state.config.fixed_amount, 0.25);
        assert_eq!(
            scheduler.state.config.transfer_mode,
            TransferMode::SendAll
        );
        let persisted = config_store.load().unwrap();
        assert_eq!(persisted.fixed_amount, 0.25);
        assert_eq!(persisted.transfer_mode, TransferMode::SendAll);
    }
}
