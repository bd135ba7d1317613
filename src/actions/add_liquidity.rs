//! Pool liquidity provisioning adapter
//!
//! The only dual-approval action: both pool tokens must be approved, and the
//! sequencer confirms the approvals strictly one after the other.

use super::{ActionAdapter, ActionContext, ActionLabels, ApprovalTarget};
use crate::amount::{clamp_with_slack, deadline, min_out, paired_amount};
use crate::call::{selectors, CallSpec};
use crate::error::{EngineError, EngineResult};

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, U256};

#[derive(Debug, Clone)]
pub struct AddLiquidityParams {
    pub pool: Address,
    /// Amount of the pool's first token to provide
    pub amount_a: U256,
    /// Amount of the second token. Derived from the reserve ratio when the
    /// pool is non-empty; required from the caller when it is.
    pub amount_b: Option<U256>,
}

pub struct AddLiquidityAction;

impl AddLiquidityAction {
    fn amount_b(params: &AddLiquidityParams) -> EngineResult<U256> {
        params
            .amount_b
            .ok_or_else(|| EngineError::Validation("paired amount not resolved".into()))
    }
}

#[async_trait]
impl ActionAdapter for AddLiquidityAction {
    type Params = AddLiquidityParams;

    fn name(&self) -> &'static str {
        "add_liquidity"
    }

    fn labels(&self) -> ActionLabels {
        ActionLabels {
            idle: "Add Liquidity",
            idle_approve: "Approve & Add Liquidity",
            in_progress: "Adding liquidity",
            success: "Liquidity added",
        }
    }

    async fn prepare(
        &self,
        mut params: Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<Self::Params> {
        if params.amount_a.is_zero() {
            return Err(EngineError::Validation(
                "liquidity amount must be positive".into(),
            ));
        }

        let pool = ctx.chain.pool_state(params.pool).await?;

        // Clamp before the ratio is applied, so the submitted pair is
        // derived from the exact first amount
        let balance_a = ctx.chain.balance_of(pool.token_a, ctx.owner).await?;
        params.amount_a =
            clamp_with_slack(params.amount_a, balance_a, ctx.engine.amount_slack_bps)?;

        // Constant-ratio rule: a non-empty pool dictates the second amount
        params.amount_b =
            match paired_amount(params.amount_a, pool.reserve_a, pool.reserve_b) {
                Some(paired) => Some(paired),
                None => match params.amount_b {
                    Some(amount) if !amount.is_zero() => Some(amount),
                    _ => {
                        return Err(EngineError::Validation(
                            "empty pool: both token amounts must be provided".into(),
                        ))
                    }
                },
            };
        let amount_b = Self::amount_b(&params)?;

        let balance_b = ctx.chain.balance_of(pool.token_b, ctx.owner).await?;
        if amount_b > balance_b {
            return Err(EngineError::InsufficientBalance {
                have: balance_b.to_string(),
                need: amount_b.to_string(),
            });
        }

        Ok(params)
    }

    async fn approvals(
        &self,
        params: &Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<Vec<ApprovalTarget>> {
        let pool = ctx.chain.pool_state(params.pool).await?;
        Ok(vec![
            ApprovalTarget {
                token: pool.token_a,
                spender: ctx.contracts.router,
                amount: params.amount_a,
            },
            ApprovalTarget {
                token: pool.token_b,
                spender: ctx.contracts.router,
                amount: Self::amount_b(params)?,
            },
        ])
    }

    async fn build_call(
        &self,
        params: &Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<CallSpec> {
        let amount_b = Self::amount_b(params)?;

        let min_a = min_out(params.amount_a, ctx.engine.slippage_bps);
        let min_b = min_out(amount_b, ctx.engine.slippage_bps);
        let chain_now = ctx.chain.chain_time().await?;
        let deadline_ts = deadline(chain_now, ctx.engine.deadline_minutes)?;

        Ok(CallSpec::new(
            ctx.contracts.router,
            *selectors::ADD_LIQUIDITY,
            vec![
                Token::Address(params.pool),
                Token::Uint(params.amount_a),
                Token::Uint(amount_b),
                Token::Uint(min_a),
                Token::Uint(min_b),
                Token::Uint(U256::from(deadline_ts)),
            ],
        ))
    }
}
