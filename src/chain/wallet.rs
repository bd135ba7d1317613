//! Signing wallet over an RPC provider
//!
//! Builds, signs and broadcasts the calls the sequencer hands over.
//! Rejections are classified so a wallet-side decline is distinguishable
//! from a provider failure.

use crate::call::CallSpec;
use crate::chain::provider::RpcChain;
use crate::chain::WalletProvider;
use crate::config::{ChainConfig, GasPriceStrategy, WalletConfig};
use crate::error::{EngineError, EngineResult};

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

const DEFAULT_KEY_ENV: &str = "LAUNCHFLOW_PRIVATE_KEY";
const GAS_LIMIT_BUFFER_PERCENT: u64 = 20;

/// Gas pricing for a submission
#[derive(Debug, Clone)]
enum GasPrice {
    Legacy(U256),
    Eip1559 {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
}

/// Local signing wallet implementing the engine's wallet seam
pub struct SigningWallet {
    chain: Arc<RpcChain>,
    wallet: LocalWallet,
    gas_strategy: GasPriceStrategy,
    max_gas_price_gwei: u64,
    submit_timeout: Duration,
}

impl SigningWallet {
    pub fn new(
        chain: Arc<RpcChain>,
        chain_config: &ChainConfig,
        wallet_config: &WalletConfig,
        submit_timeout: Duration,
    ) -> EngineResult<Self> {
        let wallet = Self::load_wallet(wallet_config)?.with_chain_id(chain_config.chain_id);
        info!("Signing wallet initialized: {:?}", wallet.address());

        Ok(Self {
            chain,
            wallet,
            gas_strategy: chain_config.gas_price_strategy.clone(),
            max_gas_price_gwei: chain_config.max_gas_price_gwei,
            submit_timeout,
        })
    }

    /// Load wallet key from the configured environment variable
    fn load_wallet(config: &WalletConfig) -> EngineResult<LocalWallet> {
        let env_name = config
            .private_key_env
            .as_deref()
            .unwrap_or(DEFAULT_KEY_ENV);

        let key = std::env::var(env_name).map_err(|_| {
            EngineError::Wallet(format!("No wallet configured. Set {}", env_name))
        })?;

        key.parse::<LocalWallet>()
            .map_err(|e| EngineError::Wallet(format!("Invalid private key: {}", e)))
    }

    async fn gas_price(&self) -> EngineResult<GasPrice> {
        match self.gas_strategy {
            GasPriceStrategy::Legacy => {
                let price = self
                    .chain
                    .http()
                    .get_gas_price()
                    .await
                    .map_err(|e| EngineError::ChainConnection(e.to_string()))?;
                Ok(GasPrice::Legacy(price))
            }
            GasPriceStrategy::Eip1559 => {
                let block = self
                    .chain
                    .http()
                    .get_block(BlockNumber::Latest)
                    .await
                    .map_err(|e| EngineError::ChainConnection(e.to_string()))?
                    .ok_or_else(|| EngineError::ChainConnection("No latest block".to_string()))?;

                let base_fee = block.base_fee_per_gas.ok_or_else(|| {
                    EngineError::ChainConnection("No base fee in block".to_string())
                })?;

                let priority_fee = U256::from(2_000_000_000u64); // 2 gwei
                // Buffer for block-to-block base fee variability
                let max_fee = base_fee * 2 + priority_fee;

                let cap = U256::from(self.max_gas_price_gwei) * U256::from(1_000_000_000u64);
                let max_fee = std::cmp::min(max_fee, cap);

                Ok(GasPrice::Eip1559 {
                    max_fee_per_gas: max_fee,
                    max_priority_fee_per_gas: priority_fee,
                })
            }
        }
    }

    fn build_tx(
        &self,
        call: &CallSpec,
        nonce: U256,
        gas_limit: U256,
        gas_price: &GasPrice,
    ) -> TypedTransaction {
        match gas_price {
            GasPrice::Legacy(price) => {
                let tx = TransactionRequest::new()
                    .from(self.wallet.address())
                    .to(call.to)
                    .data(call.calldata())
                    .value(call.value)
                    .nonce(nonce)
                    .gas(gas_limit)
                    .gas_price(*price);
                TypedTransaction::Legacy(tx)
            }
            GasPrice::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                let tx = Eip1559TransactionRequest::new()
                    .from(self.wallet.address())
                    .to(call.to)
                    .data(call.calldata())
                    .value(call.value)
                    .nonce(nonce)
                    .gas(gas_limit)
                    .max_fee_per_gas(*max_fee_per_gas)
                    .max_priority_fee_per_gas(*max_priority_fee_per_gas);
                TypedTransaction::Eip1559(tx)
            }
        }
    }
}

#[async_trait]
impl WalletProvider for SigningWallet {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    async fn submit(&self, call: &CallSpec) -> EngineResult<H256> {
        let provider = self.chain.http();

        let nonce = provider
            .get_transaction_count(self.wallet.address(), Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| EngineError::ChainConnection(e.to_string()))?;

        // Estimate against a bare call, then buffer the limit
        let probe: TypedTransaction = TransactionRequest::new()
            .from(self.wallet.address())
            .to(call.to)
            .data(call.calldata())
            .value(call.value)
            .into();
        let estimate = provider
            .estimate_gas(&probe, None)
            .await
            .map_err(|e| EngineError::Wallet(format!("Gas estimation failed: {}", e)))?;
        let gas_limit = estimate + estimate * GAS_LIMIT_BUFFER_PERCENT / 100;

        let gas_price = self.gas_price().await?;
        let tx = self.build_tx(call, nonce, gas_limit, &gas_price);

        let signature = self
            .wallet
            .sign_transaction(&tx)
            .await
            .map_err(|e| classify_wallet_error(&e.to_string()))?;
        let raw = tx.rlp_signed(&signature);

        let result = timeout(self.submit_timeout, provider.send_raw_transaction(raw)).await;

        match result {
            Ok(Ok(pending)) => {
                let tx_hash = pending.tx_hash();
                debug!("Transaction sent: {}", hex::encode(tx_hash));
                Ok(tx_hash)
            }
            Ok(Err(e)) => Err(classify_wallet_error(&e.to_string())),
            Err(_) => Err(EngineError::Timeout {
                operation: "send transaction".to_string(),
            }),
        }
    }
}

/// Classify a wallet/provider error string into the engine taxonomy
fn classify_wallet_error(message: &str) -> EngineError {
    let lower = message.to_lowercase();

    if lower.contains("user rejected")
        || lower.contains("user denied")
        || lower.contains("rejected the request")
    {
        EngineError::UserDeclined(message.to_string())
    } else if lower.contains("insufficient funds") {
        EngineError::InsufficientBalance {
            have: "unknown".to_string(),
            need: "unknown".to_string(),
        }
    } else if lower.contains("connection") || lower.contains("timed out") {
        EngineError::ChainConnection(message.to_string())
    } else {
        EngineError::Wallet(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_user_decline() {
        let err = classify_wallet_error("MetaMask Tx Signature: User denied transaction signature");
        assert!(err.is_user_declined());

        let err = classify_wallet_error("user rejected signing");
        assert!(err.is_user_declined());
    }

    #[test]
    fn classifies_insufficient_funds() {
        let err = classify_wallet_error("insufficient funds for gas * price + value");
        assert!(matches!(err, EngineError::InsufficientBalance { .. }));
    }

    #[test]
    fn classifies_connection_failures_as_retryable() {
        let err = classify_wallet_error("error trying to connect: connection refused");
        assert!(err.is_retryable());
    }
}
