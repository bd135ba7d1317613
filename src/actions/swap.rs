//! Token swap adapter

use super::{ActionAdapter, ActionContext, ActionLabels, ApprovalTarget};
use crate::amount::{clamp_with_slack, deadline, min_out};
use crate::call::{selectors, CallSpec};
use crate::error::{EngineError, EngineResult};

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, U256};

#[derive(Debug, Clone)]
pub struct SwapParams {
    pub pool: Address,
    pub token_in: Address,
    pub amount_in: U256,
}

/// Swap an exact input amount against a pool, bounded by the quoted output
/// less slippage and a chain-time deadline.
pub struct SwapAction;

#[async_trait]
impl ActionAdapter for SwapAction {
    type Params = SwapParams;

    fn name(&self) -> &'static str {
        "swap"
    }

    fn labels(&self) -> ActionLabels {
        ActionLabels {
            idle: "Swap",
            idle_approve: "Approve & Swap",
            in_progress: "Swapping tokens",
            success: "Swap complete",
        }
    }

    async fn prepare(
        &self,
        mut params: Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<Self::Params> {
        if params.amount_in.is_zero() {
            return Err(EngineError::Validation("swap amount must be positive".into()));
        }

        let balance = ctx.chain.balance_of(params.token_in, ctx.owner).await?;
        params.amount_in =
            clamp_with_slack(params.amount_in, balance, ctx.engine.amount_slack_bps)?;
        if params.amount_in.is_zero() {
            return Err(EngineError::InsufficientBalance {
                have: balance.to_string(),
                need: "a positive input amount".to_string(),
            });
        }

        Ok(params)
    }

    async fn approvals(
        &self,
        params: &Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<Vec<ApprovalTarget>> {
        Ok(vec![ApprovalTarget {
            token: params.token_in,
            spender: ctx.contracts.router,
            amount: params.amount_in,
        }])
    }

    async fn build_call(
        &self,
        params: &Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<CallSpec> {
        let quote = ctx
            .chain
            .quote_out(params.pool, params.token_in, params.amount_in)
            .await?;
        if quote.is_zero() {
            return Err(EngineError::Validation(
                "pool returned a zero output quote".into(),
            ));
        }

        let min_amount_out = min_out(quote, ctx.engine.slippage_bps);
        let chain_now = ctx.chain.chain_time().await?;
        let deadline_ts = deadline(chain_now, ctx.engine.deadline_minutes)?;

        Ok(CallSpec::new(
            ctx.contracts.router,
            *selectors::SWAP,
            vec![
                Token::Address(params.pool),
                Token::Address(params.token_in),
                Token::Uint(params.amount_in),
                Token::Uint(min_amount_out),
                Token::Uint(U256::from(deadline_ts)),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Contracts;
    use crate::chain::MockChainReader;
    use crate::config::EngineConfig;

    fn ctx_parts() -> (EngineConfig, Contracts, Address) {
        (
            EngineConfig::default(),
            Contracts {
                router: Address::repeat_byte(0xaa),
                launchpad: Address::repeat_byte(0xbb),
            },
            Address::repeat_byte(0x01),
        )
    }

    #[tokio::test]
    async fn bounded_swap_call() {
        // amount_in = 50 (18 dec), quoted 45 in 6-decimal units, 1% slippage,
        // 20 minute deadline from chain time T
        let (engine, contracts, owner) = ctx_parts();
        let chain_now = 1_700_000_000u64;

        let mut chain = MockChainReader::new();
        chain
            .expect_quote_out()
            .returning(|_, _, _| Ok(U256::from(45_000_000u64)));
        chain.expect_chain_time().returning(move || Ok(chain_now));

        let ctx = ActionContext {
            chain: &chain,
            engine: &engine,
            contracts,
            owner,
        };
        let params = SwapParams {
            pool: Address::repeat_byte(0x10),
            token_in: Address::repeat_byte(0x11),
            amount_in: U256::from(50u64) * U256::exp10(18),
        };

        let call = SwapAction.build_call(&params, &ctx).await.unwrap();
        assert_eq!(call.to, contracts.router);
        assert_eq!(call.selector, *selectors::SWAP);
        assert_eq!(call.args[3], Token::Uint(U256::from(44_550_000u64)));
        assert_eq!(call.args[4], Token::Uint(U256::from(chain_now + 1_200)));
    }

    #[tokio::test]
    async fn prepare_rejects_amount_beyond_balance_slack() {
        let (engine, contracts, owner) = ctx_parts();

        let mut chain = MockChainReader::new();
        chain
            .expect_balance_of()
            .returning(|_, _| Ok(U256::from(1_000_000u64)));

        let ctx = ActionContext {
            chain: &chain,
            engine: &engine,
            contracts,
            owner,
        };
        let params = SwapParams {
            pool: Address::repeat_byte(0x10),
            token_in: Address::repeat_byte(0x11),
            amount_in: U256::from(2_000_000u64),
        };

        let err = SwapAction.prepare(params, &ctx).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn prepare_clamps_display_rounding() {
        let (engine, contracts, owner) = ctx_parts();

        let mut chain = MockChainReader::new();
        chain
            .expect_balance_of()
            .returning(|_, _| Ok(U256::from(1_000_000u64)));

        let ctx = ActionContext {
            chain: &chain,
            engine: &engine,
            contracts,
            owner,
        };
        // 0.005% over the balance: inside the 0.01% slack
        let params = SwapParams {
            pool: Address::repeat_byte(0x10),
            token_in: Address::repeat_byte(0x11),
            amount_in: U256::from(1_000_050u64),
        };

        let prepared = SwapAction.prepare(params, &ctx).await.unwrap();
        assert_eq!(prepared.amount_in, U256::from(1_000_000u64));
    }
}
