//! Protocol-token deposit adapter
//!
//! A project owner deposits the sale tokens backing a launch. The cumulative
//! deposited amount must not already equal the requirement, and a deposit
//! never exceeds the remaining requirement.

use super::{ActionAdapter, ActionContext, ActionLabels, ApprovalTarget};
use crate::amount::clamp_with_slack;
use crate::call::{selectors, CallSpec};
use crate::error::{EngineError, EngineResult};

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::U256;

#[derive(Debug, Clone)]
pub struct DepositParams {
    pub project_id: U256,
    pub amount: U256,
}

pub struct DepositAction;

#[async_trait]
impl ActionAdapter for DepositAction {
    type Params = DepositParams;

    fn name(&self) -> &'static str {
        "deposit"
    }

    fn labels(&self) -> ActionLabels {
        ActionLabels {
            idle: "Deposit Tokens",
            idle_approve: "Approve & Deposit",
            in_progress: "Depositing tokens",
            success: "Tokens deposited",
        }
    }

    async fn prepare(
        &self,
        mut params: Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<Self::Params> {
        if params.amount.is_zero() {
            return Err(EngineError::Validation(
                "deposit amount must be positive".into(),
            ));
        }

        let project = ctx
            .chain
            .project_info(ctx.contracts.launchpad, params.project_id)
            .await?;

        if project.deposited >= project.tokens_for_sale {
            return Err(EngineError::Validation(
                "project is already fully deposited".into(),
            ));
        }

        let remaining = project.tokens_for_sale - project.deposited;
        params.amount = clamp_with_slack(params.amount, remaining, ctx.engine.amount_slack_bps)?;

        Ok(params)
    }

    async fn approvals(
        &self,
        params: &Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<Vec<ApprovalTarget>> {
        let project = ctx
            .chain
            .project_info(ctx.contracts.launchpad, params.project_id)
            .await?;
        Ok(vec![ApprovalTarget {
            token: project.sale_token,
            spender: ctx.contracts.launchpad,
            amount: params.amount,
        }])
    }

    async fn build_call(
        &self,
        params: &Self::Params,
        ctx: &ActionContext<'_>,
    ) -> EngineResult<CallSpec> {
        Ok(CallSpec::new(
            ctx.contracts.launchpad,
            *selectors::DEPOSIT_TOKENS,
            vec![Token::Uint(params.project_id), Token::Uint(params.amount)],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Contracts;
    use crate::chain::{MockChainReader, ProjectInfo, ProjectStatus};
    use crate::config::EngineConfig;
    use ethers::types::Address;

    fn project(tokens_for_sale: u64, deposited: u64) -> ProjectInfo {
        ProjectInfo {
            status: ProjectStatus::Upcoming,
            end_time: 2_000_000_000,
            tokens_for_sale: U256::from(tokens_for_sale),
            total_raised: U256::zero(),
            token_price: U256::exp10(17),
            deposited: U256::from(deposited),
            sale_token: Address::repeat_byte(0x33),
            raise_decimals: 6,
        }
    }

    fn ctx<'a>(chain: &'a MockChainReader, engine: &'a EngineConfig) -> ActionContext<'a> {
        ActionContext {
            chain,
            engine,
            contracts: Contracts {
                router: Address::repeat_byte(0xaa),
                launchpad: Address::repeat_byte(0xbb),
            },
            owner: Address::repeat_byte(0x01),
        }
    }

    #[tokio::test]
    async fn rejects_when_fully_deposited() {
        let engine = EngineConfig::default();
        let mut chain = MockChainReader::new();
        chain
            .expect_project_info()
            .returning(|_, _| Ok(project(1_000, 1_000)));

        let ctx = ctx(&chain, &engine);
        let err = DepositAction
            .prepare(
                DepositParams {
                    project_id: U256::one(),
                    amount: U256::from(100u64),
                },
                &ctx,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn clamps_to_remaining_requirement() {
        let engine = EngineConfig::default();
        let mut chain = MockChainReader::new();
        chain
            .expect_project_info()
            .returning(|_, _| Ok(project(1_000_000, 400_000)));

        let ctx = ctx(&chain, &engine);
        // Slightly over the remaining 600_000, within the 0.01% slack
        let prepared = DepositAction
            .prepare(
                DepositParams {
                    project_id: U256::one(),
                    amount: U256::from(600_050u64),
                },
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(prepared.amount, U256::from(600_000u64));
    }
}
