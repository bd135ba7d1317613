//! Unsold-token withdrawal adapter
//!
//! After a sale settles, the project owner reclaims whatever was not
//! allocated to buyers. Eligibility requires a settled project status and a
//! delay window past the sale's end time.

use super::{ActionAdapter, ActionContext, ActionLabels, ApprovalTarget};
use crate::amount::scale;
use crate::call::{selectors, CallSpec};
use crate::chain::{ProjectInfo, ProjectStatus};
use crate::error::{EngineError, EngineResult};

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::U256;

#[derive(Debug, Clone)]
pub struct WithdrawParams {
    pub project_id: U256,
}

pub struct WithdrawAction;

/// Sale tokens allocated to buyers, 18 decimals.
///
/// A failed sale allocates nothing. A successful sale converts the raise to
/// 18 decimals first, then divides by the 18-decimal fixed-point price; the
/// two stages keep the division exact over the upscaled value.
pub fn tokens_allocated(project: &ProjectInfo) -> U256 {
    if project.status == ProjectStatus::Failed || project.token_price.is_zero() {
        return U256::zero();
    }
    let raised_wad = scale(project.total_raised, project.raise_decimals, 18);
    match raised_wad.checked_mul(U256::exp10(18)) {
        Some(numerator) => numerator / project.token_price,
        None => U256::MAX,
    }
}

/// Unsold remainder of the sale allocation
pub fn unsold_tokens(project: &ProjectInfo) -> U256 {
    project
        .tokens_for_sale
        .saturating_sub(tokens_allocated(project))
}

#[async_trait]
impl ActionAdapter for WithdrawAction {
    type Params = WithdrawParams;

    fn name(&self) -> &'static str {
        "withdraw"
    }

    fn labels(&self) -> ActionLabels {
        ActionLabels {
            idle: "Withdraw Unsold Tokens",
            idle_approve: "Withdraw Unsold Tokens",
            in_progress: "Withdrawing tokens",
            success: "Tokens withdrawn",
        }
    }

    async fn prepare(
        &self,
        params: Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<Self::Params> {
        let project = ctx
            .chain
            .project_info(ctx.contracts.launchpad, params.project_id)
            .await?;

        if !project.status.withdrawal_eligible() {
            return Err(EngineError::Validation(
                "project has not settled yet".into(),
            ));
        }

        let chain_now = ctx.chain.chain_time().await?;
        let unlock_at = project.end_time + ctx.engine.withdraw_delay_secs;
        if chain_now < unlock_at {
            return Err(EngineError::Validation(format!(
                "unsold tokens unlock at chain time {}",
                unlock_at
            )));
        }

        if unsold_tokens(&project).is_zero() {
            return Err(EngineError::Validation("nothing to withdraw".into()));
        }

        Ok(params)
    }

    async fn approvals(
        &self,
        _params: &Self::Params,
        _ctx: &ActionContext<'_>,
    ) -> EngineResult<Vec<ApprovalTarget>> {
        // Withdrawal moves the launchpad's own holdings; nothing to approve
        Ok(vec![])
    }

    async fn build_call(
        &self,
        params: &Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<CallSpec> {
        Ok(CallSpec::new(
            ctx.contracts.launchpad,
            *selectors::WITHDRAW_UNSOLD,
            vec![Token::Uint(params.project_id)],
        ))
    }
}
