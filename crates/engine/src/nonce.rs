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

use alloy_primitives::{aliases::U192, Address, U256};
use autosend_provider::{EvmReader, ProviderResult};

/// Tracks the next entry-point nonce per smart wallet within one pass.
///
/// The on-chain value is read on every call and reconciled with the cache:
/// the cache may run ahead of the chain (operations submitted here but not
/// yet mined) but never behind it.
#[derive(Debug, Default)]
pub struct NonceTracker {
    nonces: HashMap<Address, U256>,
}

impl NonceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The nonce to use for the next operation from `smart_address`.
    pub async fn next_nonce<E: EvmReader + ?Sized>(
        &mut self,
        entry_point: Address,
        smart_address: Address,
        evm: &E,
    ) -> ProviderResult<U256> {
        let fresh = evm
            .get_entry_point_nonce(entry_point, smart_address, U192::ZERO)
            .await?;
        let next = match self.nonces.get(&smart_address) {
            Some(cached) => (*cached).max(fresh),
            None => fresh,
        };
        self.nonces.insert(smart_address, next);
        Ok(next)
    }

    /// Advance past a nonce once the relay has accepted the operation.
    pub fn commit(&mut self, smart_address: Address) {
        if let Some(nonce) = self.nonces.get_mut(&smart_address) {
            *nonce += U256::from(1);
        }
    }

    /// Drop all cached entries. Called at every pass boundary.
    pub fn clear(&mut self) {
        self.nonces.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.nonces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use autosend_provider::MockEvmReader;

    use super::*;

    const ENTRY_POINT: Address = Address::repeat_byte(0xee);
    const SMART: Address = Address::repeat_byte(0x11);

    #[tokio::test]
    async fn test_nonces_increase_across_commits() {
        let mut evm = MockEvmReader::new();
        evm.expect_get_entry_point_nonce()
            .returning(|_, _, _| Ok(U256::from(5)));

        let mut tracker = NonceTracker::new();
        for expected in 5u64..8 {
            let nonce = tracker.next_nonce(ENTRY_POINT, SMART, &evm).await.unwrap();
            assert_eq!(nonce, U256::from(expected));
            tracker.commit(SMART);
        }
    }

    #[tokio::test]
    async fn test_fresh_chain_value_wins_when_ahead() {
        let mut evm = MockEvmReader::new();
        evm.expect_get_entry_point_nonce()
            .returning(|_, _, _| Ok(U256::from(5)));

        let mut tracker = NonceTracker::new();
        assert_eq!(
            tracker.next_nonce(ENTRY_POINT, SMART, &evm).await.unwrap(),
            U256::from(5)
        );

        // another actor advanced the chain past our cache
        let mut evm = MockEvmReader::new();
        evm.expect_get_entry_point_nonce()
            .returning(|_, _, _| Ok(U256::from(9)));
        assert_eq!(
            tracker.next_nonce(ENTRY_POINT, SMART, &evm).await.unwrap(),
            U256::from(9)
        );
    }

    #[tokio::test]
    async fn test_cache_wins_when_chain_lags() {
        let mut evm = MockEvmReader::new();
        evm.expect_get_entry_point_nonce()
            .returning(|_, _, _| Ok(U256::from(5)));

        let mut tracker = NonceTracker::new();
        tracker.next_nonce(ENTRY_POINT, SMART, &evm).await.unwrap();
        tracker.commit(SMART);

        // chain still reports 5; the committed 6 must stand
        assert_eq!(
            tracker.next_nonce(ENTRY_POINT, SMART, &evm).await.unwrap(),
            U256::from(6)
        );
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let mut evm = MockEvmReader::new();
        evm.expect_get_entry_point_nonce()
            .returning(|_, _, _| Ok(U256::ZERO));

        let mut tracker = NonceTracker::new();
        tracker.next_nonce(ENTRY_POINT, SMART, &evm).await.unwrap();
        assert!(!tracker.is_empty());
        tracker.clear();
        assert!(tracker.is_empty());
    }
}
