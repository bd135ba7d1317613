//! RPC chain reader with multi-RPC support and automatic failover

use crate::call::{selectors, CallSpec};
use crate::chain::{ChainReader, PoolState, ProjectInfo, ProjectStatus, ReceiptStatus};
use crate::config::ChainConfig;
use crate::error::{EngineError, EngineResult};

use async_trait::async_trait;
use ethers::abi::{decode, ParamType, Token};
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Multi-provider chain reader with automatic failover
pub struct RpcChain {
    chain_id: u64,
    /// HTTP providers (multiple for failover)
    providers: Vec<Provider<Http>>,
    /// Current active provider index
    current: AtomicUsize,
    /// Receipt polling interval
    receipt_poll: Duration,
}

impl RpcChain {
    pub fn new(config: &ChainConfig, receipt_poll: Duration) -> EngineResult<Self> {
        let mut providers = Vec::new();

        for url in &config.rpc_urls {
            match Provider::<Http>::try_from(url.as_str()) {
                Ok(provider) => {
                    providers.push(provider.interval(Duration::from_millis(100)));
                    debug!("Added HTTP provider for chain {}: {}", config.chain_id, url);
                }
                Err(e) => {
                    warn!("Failed to create provider for {}: {}", url, e);
                }
            }
        }

        if providers.is_empty() {
            return Err(EngineError::ChainConnection(
                "No valid RPC providers".to_string(),
            ));
        }

        Ok(Self {
            chain_id: config.chain_id,
            providers,
            current: AtomicUsize::new(0),
            receipt_poll,
        })
    }

    /// Get the active HTTP provider
    pub(crate) fn http(&self) -> &Provider<Http> {
        let idx = self.current.load(Ordering::Relaxed);
        &self.providers[idx % self.providers.len()]
    }

    /// Switch to next available provider
    fn failover(&self) {
        let current = self.current.load(Ordering::Relaxed);
        let next = (current + 1) % self.providers.len();
        self.current.store(next, Ordering::Relaxed);
        warn!("Chain {} failover to provider {}", self.chain_id, next);
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Execute a view call with failover across providers
    async fn view(&self, call: &CallSpec) -> EngineResult<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new()
            .to(call.to)
            .data(call.calldata())
            .into();

        let mut last_error = String::new();
        for _ in 0..self.providers.len() {
            match self.http().call(&tx, None).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    last_error = e.to_string();
                    warn!(
                        "View call to {:?} failed on chain {}: {}",
                        call.to, self.chain_id, last_error
                    );
                    self.failover();
                }
            }
        }

        Err(EngineError::ChainConnection(format!(
            "All providers failed: {}",
            last_error
        )))
    }

    async fn view_uint(&self, call: &CallSpec) -> EngineResult<U256> {
        let out = self.view(call).await?;
        decode_single_uint(&out)
    }

    async fn view_address(&self, call: &CallSpec) -> EngineResult<Address> {
        let out = self.view(call).await?;
        let tokens = decode(&[ParamType::Address], &out)
            .map_err(|e| EngineError::Decode(e.to_string()))?;
        match tokens.into_iter().next() {
            Some(Token::Address(addr)) => Ok(addr),
            _ => Err(EngineError::Decode("expected address".to_string())),
        }
    }
}

#[async_trait]
impl ChainReader for RpcChain {
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> EngineResult<U256> {
        let call = CallSpec::new(
            token,
            *selectors::ALLOWANCE,
            vec![Token::Address(owner), Token::Address(spender)],
        );
        self.view_uint(&call).await
    }

    async fn balance_of(&self, token: Address, owner: Address) -> EngineResult<U256> {
        let call = CallSpec::new(token, *selectors::BALANCE_OF, vec![Token::Address(owner)]);
        self.view_uint(&call).await
    }

    async fn chain_time(&self) -> EngineResult<u64> {
        let block = self
            .http()
            .get_block(BlockNumber::Latest)
            .await
            .map_err(|e| EngineError::ChainConnection(e.to_string()))?
            .ok_or_else(|| EngineError::ChainConnection("No latest block".to_string()))?;
        Ok(block.timestamp.as_u64())
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> EngineResult<ReceiptStatus> {
        loop {
            match self.http().get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    let status = if receipt.status == Some(1.into()) {
                        ReceiptStatus::Success
                    } else {
                        ReceiptStatus::Reverted
                    };
                    debug!("Receipt for {:?}: {:?}", tx_hash, status);
                    return Ok(status);
                }
                Ok(None) => {
                    // Not mined yet
                }
                Err(e) => {
                    warn!("Receipt poll failed for {:?}: {}", tx_hash, e);
                    self.failover();
                }
            }
            tokio::time::sleep(self.receipt_poll).await;
        }
    }

    async fn pool_state(&self, pool: Address) -> EngineResult<PoolState> {
        let token_a = self
            .view_address(&CallSpec::new(pool, *selectors::TOKEN0, vec![]))
            .await?;
        let token_b = self
            .view_address(&CallSpec::new(pool, *selectors::TOKEN1, vec![]))
            .await?;

        let out = self
            .view(&CallSpec::new(pool, *selectors::GET_RESERVES, vec![]))
            .await?;
        let tokens = decode(
            &[
                ParamType::Uint(112),
                ParamType::Uint(112),
                ParamType::Uint(32),
            ],
            &out,
        )
        .map_err(|e| EngineError::Decode(e.to_string()))?;

        let reserve_a = expect_uint(tokens.first())?;
        let reserve_b = expect_uint(tokens.get(1))?;

        Ok(PoolState {
            token_a,
            token_b,
            reserve_a,
            reserve_b,
        })
    }

    async fn lp_total_supply(&self, pool: Address) -> EngineResult<U256> {
        self.view_uint(&CallSpec::new(pool, *selectors::TOTAL_SUPPLY, vec![]))
            .await
    }

    async fn quote_out(
        &self,
        pool: Address,
        token_in: Address,
        amount_in: U256,
    ) -> EngineResult<U256> {
        let call = CallSpec::new(
            pool,
            *selectors::GET_AMOUNT_OUT,
            vec![Token::Address(token_in), Token::Uint(amount_in)],
        );
        self.view_uint(&call).await
    }

    async fn project_info(
        &self,
        launchpad: Address,
        project_id: U256,
    ) -> EngineResult<ProjectInfo> {
        let call = CallSpec::new(launchpad, *selectors::PROJECTS, vec![Token::Uint(project_id)]);
        let out = self.view(&call).await?;

        let tokens = decode(
            &[
                ParamType::Uint(8),   // status
                ParamType::Uint(64),  // end time
                ParamType::Uint(256), // tokens for sale
                ParamType::Uint(256), // total raised
                ParamType::Uint(256), // token price, 18-dec fixed point
                ParamType::Uint(256), // deposited
                ParamType::Address,   // sale token
                ParamType::Uint(8),   // raise token decimals
            ],
            &out,
        )
        .map_err(|e| EngineError::Decode(e.to_string()))?;

        let status = ProjectStatus::from_u8(expect_uint(tokens.first())?.as_u64() as u8);
        let end_time = expect_uint(tokens.get(1))?.as_u64();
        let tokens_for_sale = expect_uint(tokens.get(2))?;
        let total_raised = expect_uint(tokens.get(3))?;
        let token_price = expect_uint(tokens.get(4))?;
        let deposited = expect_uint(tokens.get(5))?;
        let sale_token = match tokens.get(6) {
            Some(Token::Address(addr)) => *addr,
            _ => return Err(EngineError::Decode("expected sale token address".to_string())),
        };
        let raise_decimals = expect_uint(tokens.get(7))?.as_u64() as u8;

        Ok(ProjectInfo {
            status,
            end_time,
            tokens_for_sale,
            total_raised,
            token_price,
            deposited,
            sale_token,
            raise_decimals,
        })
    }
}

fn decode_single_uint(out: &[u8]) -> EngineResult<U256> {
    let tokens =
        decode(&[ParamType::Uint(256)], out).map_err(|e| EngineError::Decode(e.to_string()))?;
    expect_uint(tokens.first())
}

fn expect_uint(token: Option<&Token>) -> EngineResult<U256> {
    match token {
        Some(Token::Uint(value)) => Ok(*value),
        _ => Err(EngineError::Decode("expected uint".to_string())),
    }
}
