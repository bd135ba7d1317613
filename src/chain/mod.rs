//! Chain module - external collaborator seams
//!
//! The engine treats the wallet and the RPC node as black boxes behind two
//! traits: `WalletProvider` accepts a call specification and returns a
//! transaction hash or rejects; `ChainReader` resolves receipts, chain time,
//! and the contract view reads the action adapters depend on. Live
//! implementations sit in `provider` and `wallet`; tests substitute mocks.

pub mod provider;
pub mod wallet;

pub use provider::RpcChain;
pub use wallet::SigningWallet;

use crate::call::CallSpec;
use crate::error::EngineResult;

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};

#[cfg(test)]
use mockall::automock;

/// Execution outcome of a mined transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Reserves and token pair of a liquidity pool
#[derive(Debug, Clone)]
pub struct PoolState {
    pub token_a: Address,
    pub token_b: Address,
    pub reserve_a: U256,
    pub reserve_b: U256,
}

/// Lifecycle status of a launch project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStatus {
    Upcoming,
    Active,
    Successful,
    Failed,
    Cancelled,
}

impl ProjectStatus {
    pub fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ProjectStatus::Upcoming,
            1 => ProjectStatus::Active,
            2 => ProjectStatus::Successful,
            3 => ProjectStatus::Failed,
            _ => ProjectStatus::Cancelled,
        }
    }

    /// Unsold tokens are withdrawable only once the sale has settled
    pub fn withdrawal_eligible(&self) -> bool {
        matches!(self, ProjectStatus::Successful | ProjectStatus::Failed)
    }
}

/// On-chain view of a launch project
#[derive(Debug, Clone)]
pub struct ProjectInfo {
    pub status: ProjectStatus,
    pub end_time: u64,
    /// Sale-token amount offered, 18 decimals
    pub tokens_for_sale: U256,
    /// Raise-token amount collected, `raise_decimals` precision
    pub total_raised: U256,
    /// Price per sale token in 18-decimal fixed point
    pub token_price: U256,
    /// Sale tokens deposited by the project owner so far
    pub deposited: U256,
    pub sale_token: Address,
    pub raise_decimals: u8,
}

/// Read-only chain access: receipts, chain time, and contract view calls
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Current ERC-20 allowance for a (token, owner, spender) triple
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> EngineResult<U256>;

    /// ERC-20 balance
    async fn balance_of(&self, token: Address, owner: Address) -> EngineResult<U256>;

    /// Timestamp of the latest block. Deadlines are anchored here, never to
    /// the client clock.
    async fn chain_time(&self) -> EngineResult<u64>;

    /// Wait until the transaction is mined and return its execution status.
    /// Unbounded from the engine's perspective.
    async fn wait_for_receipt(&self, tx_hash: H256) -> EngineResult<ReceiptStatus>;

    /// Token pair and reserves of a pool
    async fn pool_state(&self, pool: Address) -> EngineResult<PoolState>;

    /// Total supply of a pool's LP token
    async fn lp_total_supply(&self, pool: Address) -> EngineResult<U256>;

    /// Pool-reported output quote for an exact input
    async fn quote_out(
        &self,
        pool: Address,
        token_in: Address,
        amount_in: U256,
    ) -> EngineResult<U256>;

    /// Launchpad project record
    async fn project_info(&self, launchpad: Address, project_id: U256)
        -> EngineResult<ProjectInfo>;
}

/// Signing provider: accepts a call specification, returns a transaction
/// hash or rejects (user decline, insufficient funds, provider error)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Signer address
    fn address(&self) -> Address;

    /// Sign and broadcast the call
    async fn submit(&self, call: &CallSpec) -> EngineResult<H256>;
}
