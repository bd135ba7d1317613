//! Launchflow - transaction orchestration for a token-launch and AMM platform
//!
//! This crate drives multi-step on-chain flows (approve, approve, act,
//! confirm) against a router and a launchpad contract. Each domain action is
//! an [`actions::ActionAdapter`]; an [`engine::Engine`] instance sequences
//! one flow at a time over a [`chain::ChainReader`] and a
//! [`chain::WalletProvider`], and exposes pure status projections for the
//! presentation layer.

pub mod actions;
pub mod allowance;
pub mod amount;
pub mod call;
pub mod chain;
pub mod config;
pub mod engine;
pub mod error;

pub use actions::{
    ActionAdapter, ActionContext, ActionLabels, AddLiquidityAction, ApprovalTarget, Contracts,
    DepositAction, RemoveLiquidityAction, SwapAction, WithdrawAction,
};
pub use allowance::{AllowanceTracker, ApprovalRequest};
pub use chain::{ChainReader, ReceiptStatus, RpcChain, SigningWallet, WalletProvider};
pub use config::Settings;
pub use engine::{ButtonState, Engine, FlowSnapshot, Step, TransactionStatus};
pub use error::{EngineError, EngineResult};
