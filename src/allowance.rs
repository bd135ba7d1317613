//! Allowance tracking
//!
//! Read projection over the on-chain ERC-20 allowance for a fixed owner.
//! Cached values are display hints only; the sequencer always forces a
//! refresh immediately before acting on an approval decision, closing the
//! race where the allowance changed since the last read.

use crate::chain::ChainReader;
use crate::error::EngineResult;

use dashmap::DashMap;
use ethers::types::{Address, U256};
use std::sync::Arc;
use tracing::debug;

/// A snapshot of what an action requires versus what is approved
#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    pub token: Address,
    pub spender: Address,
    pub required: U256,
    pub current: U256,
}

impl ApprovalRequest {
    /// An approval is needed only for a positive requirement exceeding the
    /// current allowance.
    pub fn needs_approval(&self) -> bool {
        !self.required.is_zero() && self.required > self.current
    }
}

/// Tracks allowances granted by one owner across (token, spender) pairs
pub struct AllowanceTracker {
    chain: Arc<dyn ChainReader>,
    owner: Address,
    cache: DashMap<(Address, Address), U256>,
}

impl AllowanceTracker {
    pub fn new(chain: Arc<dyn ChainReader>, owner: Address) -> Self {
        Self {
            chain,
            owner,
            cache: DashMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Force a re-read from chain and update the cache
    pub async fn refresh(&self, token: Address, spender: Address) -> EngineResult<U256> {
        let current = self.chain.allowance(token, self.owner, spender).await?;
        self.cache.insert((token, spender), current);
        debug!(
            "Allowance refreshed: token {:?} spender {:?} -> {}",
            token, spender, current
        );
        Ok(current)
    }

    /// Last refreshed value, if any
    pub fn cached(&self, token: Address, spender: Address) -> Option<U256> {
        self.cache.get(&(token, spender)).map(|v| *v)
    }

    /// Build a fresh approval request for a required amount
    pub async fn request(
        &self,
        token: Address,
        spender: Address,
        required: U256,
    ) -> EngineResult<ApprovalRequest> {
        let current = self.refresh(token, spender).await?;
        Ok(ApprovalRequest {
            token,
            spender,
            required,
            current,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChainReader;

    fn request(required: u64, current: u64) -> ApprovalRequest {
        ApprovalRequest {
            token: Address::repeat_byte(0x01),
            spender: Address::repeat_byte(0x02),
            required: U256::from(required),
            current: U256::from(current),
        }
    }

    #[test]
    fn needs_approval_truth_table() {
        // required > 0 and required > current
        assert!(request(100, 0).needs_approval());
        assert!(request(100, 99).needs_approval());
        // covered by existing allowance
        assert!(!request(100, 100).needs_approval());
        assert!(!request(100, 200).needs_approval());
        // zero requirement never needs approval
        assert!(!request(0, 0).needs_approval());
        assert!(!request(0, 100).needs_approval());
    }

    #[tokio::test]
    async fn refresh_updates_cache() {
        let token = Address::repeat_byte(0x01);
        let spender = Address::repeat_byte(0x02);
        let owner = Address::repeat_byte(0x03);

        let mut chain = MockChainReader::new();
        chain
            .expect_allowance()
            .times(2)
            .returning(|_, _, _| Ok(U256::from(500u64)));

        let tracker = AllowanceTracker::new(Arc::new(chain), owner);
        assert_eq!(tracker.cached(token, spender), None);

        let fresh = tracker.refresh(token, spender).await.unwrap();
        assert_eq!(fresh, U256::from(500u64));
        assert_eq!(tracker.cached(token, spender), Some(U256::from(500u64)));

        let req = tracker
            .request(token, spender, U256::from(600u64))
            .await
            .unwrap();
        assert!(req.needs_approval());
    }
}
