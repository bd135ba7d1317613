//! Liquidity removal adapter

use super::{ActionAdapter, ActionContext, ActionLabels, ApprovalTarget};
use crate::amount::{clamp_with_slack, deadline, min_out, paired_amount};
use crate::call::{selectors, CallSpec};
use crate::error::{EngineError, EngineResult};

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, U256};

#[derive(Debug, Clone)]
pub struct RemoveLiquidityParams {
    pub pool: Address,
    /// LP token amount to burn
    pub liquidity: U256,
}

pub struct RemoveLiquidityAction;

#[async_trait]
impl ActionAdapter for RemoveLiquidityAction {
    type Params = RemoveLiquidityParams;

    fn name(&self) -> &'static str {
        "remove_liquidity"
    }

    fn labels(&self) -> ActionLabels {
        ActionLabels {
            idle: "Remove Liquidity",
            idle_approve: "Approve & Remove Liquidity",
            in_progress: "Removing liquidity",
            success: "Liquidity removed",
        }
    }

    async fn prepare(
        &self,
        mut params: Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<Self::Params> {
        if params.liquidity.is_zero() {
            return Err(EngineError::Validation(
                "liquidity amount must be positive".into(),
            ));
        }

        // The LP token is the pool contract itself
        let lp_balance = ctx.chain.balance_of(params.pool, ctx.owner).await?;
        params.liquidity =
            clamp_with_slack(params.liquidity, lp_balance, ctx.engine.amount_slack_bps)?;
        if params.liquidity.is_zero() {
            return Err(EngineError::InsufficientBalance {
                have: lp_balance.to_string(),
                need: "a positive LP amount".to_string(),
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
            token: params.pool,
            spender: ctx.contracts.router,
            amount: params.liquidity,
        }])
    }

    async fn build_call(
        &self,
        params: &Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<CallSpec> {
        let pool = ctx.chain.pool_state(params.pool).await?;
        let total_supply = ctx.chain.lp_total_supply(params.pool).await?;

        // Proportional share of each reserve for the burned liquidity
        let expected_a = paired_amount(params.liquidity, total_supply, pool.reserve_a)
            .ok_or_else(|| EngineError::Validation("pool has no liquidity".into()))?;
        let expected_b = paired_amount(params.liquidity, total_supply, pool.reserve_b)
            .ok_or_else(|| EngineError::Validation("pool has no liquidity".into()))?;

        let min_a = min_out(expected_a, ctx.engine.slippage_bps);
        let min_b = min_out(expected_b, ctx.engine.slippage_bps);
        let chain_now = ctx.chain.chain_time().await?;
        let deadline_ts = deadline(chain_now, ctx.engine.deadline_minutes)?;

        Ok(CallSpec::new(
            ctx.contracts.router,
            *selectors::REMOVE_LIQUIDITY,
            vec![
                Token::Address(params.pool),
                Token::Uint(params.liquidity),
                Token::Uint(min_a),
                Token::Uint(min_b),
                Token::Uint(U256::from(deadline_ts)),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Contracts;
    use crate::chain::{MockChainReader, PoolState};
    use crate::config::EngineConfig;

    #[tokio::test]
    async fn proportional_minimums() {
        let engine = EngineConfig::default();
        let mut chain = MockChainReader::new();
        chain.expect_pool_state().returning(|_| {
            Ok(PoolState {
                token_a: Address::repeat_byte(0x11),
                token_b: Address::repeat_byte(0x12),
                reserve_a: U256::from(10_000u64),
                reserve_b: U256::from(20_000u64),
            })
        });
        chain
            .expect_lp_total_supply()
            .returning(|_| Ok(U256::from(1_000u64)));
        chain
            .expect_chain_time()
            .returning(|| Ok(1_700_000_000u64));

        let ctx = ActionContext {
            chain: &chain,
            engine: &engine,
            contracts: Contracts {
                router: Address::repeat_byte(0xaa),
                launchpad: Address::repeat_byte(0xbb),
            },
            owner: Address::repeat_byte(0x01),
        };
        let params = RemoveLiquidityParams {
            pool: Address::repeat_byte(0x10),
            // 10% of the LP supply
            liquidity: U256::from(100u64),
        };

        let call = RemoveLiquidityAction.build_call(&params, &ctx).await.unwrap();
        // expected 1000 / 2000, minus 1% slippage
        assert_eq!(call.args[2], Token::Uint(U256::from(990u64)));
        assert_eq!(call.args[3], Token::Uint(U256::from(1_980u64)));
    }
}
