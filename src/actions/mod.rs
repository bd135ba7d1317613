//! Action adapters
//!
//! One adapter per domain action. Each supplies the sequencer with the
//! amounts requiring approval, the spender contract, domain validation, and
//! a builder for the final bounded call. The sequencer itself knows nothing
//! about pools or launch projects.

pub mod add_liquidity;
pub mod deposit;
pub mod remove_liquidity;
pub mod swap;
pub mod withdraw;

pub use add_liquidity::{AddLiquidityAction, AddLiquidityParams};
pub use deposit::{DepositAction, DepositParams};
pub use remove_liquidity::{RemoveLiquidityAction, RemoveLiquidityParams};
pub use swap::{SwapAction, SwapParams};
pub use withdraw::{WithdrawAction, WithdrawParams};

use crate::call::CallSpec;
use crate::chain::ChainReader;
use crate::config::{ContractsConfig, EngineConfig};
use crate::error::{EngineError, EngineResult};

use async_trait::async_trait;
use ethers::types::{Address, U256};
use std::str::FromStr;

/// Parsed addresses of the platform contracts
#[derive(Debug, Clone, Copy)]
pub struct Contracts {
    pub router: Address,
    pub launchpad: Address,
}

impl Contracts {
    pub fn from_config(config: &ContractsConfig) -> EngineResult<Self> {
        let router = Address::from_str(&config.router)
            .map_err(|e| EngineError::Config(format!("Invalid router address: {}", e)))?;
        let launchpad = Address::from_str(&config.launchpad)
            .map_err(|e| EngineError::Config(format!("Invalid launchpad address: {}", e)))?;
        Ok(Self { router, launchpad })
    }
}

/// Everything an adapter may consult while preparing or building a call
pub struct ActionContext<'a> {
    pub chain: &'a dyn ChainReader,
    pub engine: &'a EngineConfig,
    pub contracts: Contracts,
    /// Connected wallet address
    pub owner: Address,
}

/// UI labels for an action, consumed by the status projector
#[derive(Debug, Clone, Copy)]
pub struct ActionLabels {
    /// Idle call to action, e.g. "Swap"
    pub idle: &'static str,
    /// Idle call to action when an approval is still needed, e.g. "Approve & Swap"
    pub idle_approve: &'static str,
    /// Shown while submitting or confirming
    pub in_progress: &'static str,
    /// Terminal success label
    pub success: &'static str,
}

/// A single token approval the action depends on
#[derive(Debug, Clone)]
pub struct ApprovalTarget {
    pub token: Address,
    pub spender: Address,
    pub amount: U256,
}

/// A domain action the sequencer can drive
#[async_trait]
pub trait ActionAdapter: Send + Sync {
    /// Caller-supplied action parameters
    type Params: Clone + Send + Sync + 'static;

    /// Short name for logging
    fn name(&self) -> &'static str;

    fn labels(&self) -> ActionLabels;

    /// Validate and normalize the parameters before any transaction is
    /// built. Amounts are clamped to the maximum permissible amount within
    /// the configured rounding slack; anything beyond is rejected.
    async fn prepare(
        &self,
        params: Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<Self::Params>;

    /// Ordered approval requirements, primary first. May be empty.
    async fn approvals(
        &self,
        params: &Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<Vec<ApprovalTarget>>;

    /// Build the final slippage- and deadline-bounded call
    async fn build_call(
        &self,
        params: &Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<CallSpec>;
}
