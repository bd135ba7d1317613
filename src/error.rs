//! Error types for the Launchflow engine

use ethers::types::H256;
use thiserror::Error;

/// Main error type for the orchestration engine
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chain connection error: {0}")]
    ChainConnection(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Transaction declined in wallet: {0}")]
    UserDeclined(String),

    #[error("Approval of token {token} reverted in tx {tx_hash:?}")]
    ApprovalReverted { token: String, tx_hash: H256 },

    #[error("Action reverted in tx {tx_hash:?}")]
    ActionReverted { tx_hash: H256 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: String, need: String },

    #[error("Decoding error: {0}")]
    Decode(String),

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },
}

impl EngineError {
    /// Check if error is retryable at the same step (network-class failures)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::ChainConnection(_) | EngineError::Timeout { .. }
        )
    }

    /// Check if error is a wallet-side decline (informational, not alarming)
    pub fn is_user_declined(&self) -> bool {
        matches!(self, EngineError::UserDeclined(_))
    }

    /// Check if error aborted the whole flow (requires full restart)
    pub fn aborts_flow(&self) -> bool {
        matches!(self, EngineError::ApprovalReverted { .. })
    }

    /// Human-readable message for the status projection
    pub fn user_message(&self) -> String {
        match self {
            EngineError::UserDeclined(_) => "Transaction was declined in your wallet".to_string(),
            EngineError::ApprovalReverted { token, .. } => {
                format!("Approval of {} failed, please start over", token)
            }
            EngineError::ActionReverted { .. } => {
                "Transaction reverted on-chain, you can retry".to_string()
            }
            EngineError::Validation(msg) => msg.clone(),
            EngineError::InsufficientBalance { have, need } => {
                format!("Insufficient balance: have {}, need {}", have, need)
            }
            other => other.to_string(),
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(EngineError::ChainConnection("rpc down".into()).is_retryable());
        assert!(EngineError::Timeout {
            operation: "send".into()
        }
        .is_retryable());
        assert!(!EngineError::UserDeclined("nope".into()).is_retryable());
        assert!(!EngineError::Validation("bad amount".into()).is_retryable());
    }

    #[test]
    fn approval_revert_aborts_flow() {
        let err = EngineError::ApprovalReverted {
            token: "0xabc".into(),
            tx_hash: H256::zero(),
        };
        assert!(err.aborts_flow());
        assert!(!EngineError::ActionReverted {
            tx_hash: H256::zero()
        }
        .aborts_flow());
    }
}
