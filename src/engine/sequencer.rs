//! The step sequencer
//!
//! Drives one action flow at a time: re-reads allowances, submits the
//! approvals strictly one after the other, submits the bounded action, waits
//! for its receipt, then settles and auto-resets after a dwell window.
//! Ordering between steps is enforced here, not by the caller.

use super::status::{project_button, project_status, ButtonState, FlowSnapshot, TransactionStatus};
use super::step::Step;
use crate::actions::{ActionAdapter, ActionContext, Contracts};
use crate::allowance::AllowanceTracker;
use crate::call::approve_call;
use crate::chain::{ChainReader, ReceiptStatus, WalletProvider};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

use ethers::types::H256;
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Best-effort callback invoked after a confirmed action so the caller can
/// re-synchronize balances and reserves
pub type RefetchHook = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Mutable per-flow state, exclusively owned by one engine instance
struct FlowState<P> {
    step: Step,
    /// Action parameters deferred behind approvals. Created when a flow is
    /// claimed, consumed the moment the action is submitted or the flow
    /// fails.
    pending: Option<P>,
    tx_hash: Option<H256>,
    error: Option<EngineError>,
}

impl<P> FlowState<P> {
    fn new() -> Self {
        Self {
            step: Step::Idle,
            pending: None,
            tx_hash: None,
            error: None,
        }
    }

    fn reset(&mut self) {
        self.step = Step::Idle;
        self.pending = None;
        self.tx_hash = None;
        self.error = None;
    }
}

/// Orchestration engine for one domain action
pub struct Engine<A: ActionAdapter> {
    adapter: A,
    chain: Arc<dyn ChainReader>,
    wallet: Arc<dyn WalletProvider>,
    allowances: AllowanceTracker,
    config: EngineConfig,
    contracts: Contracts,
    flow: Arc<RwLock<FlowState<A::Params>>>,
    settle_timer: Mutex<Option<JoinHandle<()>>>,
    refetch_hooks: Vec<RefetchHook>,
    instance_id: Uuid,
}

impl<A: ActionAdapter> Engine<A> {
    pub fn new(
        adapter: A,
        chain: Arc<dyn ChainReader>,
        wallet: Arc<dyn WalletProvider>,
        config: EngineConfig,
        contracts: Contracts,
    ) -> Self {
        let owner = wallet.address();
        Self {
            adapter,
            allowances: AllowanceTracker::new(chain.clone(), owner),
            chain,
            wallet,
            config,
            contracts,
            flow: Arc::new(RwLock::new(FlowState::new())),
            settle_timer: Mutex::new(None),
            refetch_hooks: Vec::new(),
            instance_id: Uuid::new_v4(),
        }
    }

    /// Register a refetch callback, run after every confirmed action
    pub fn with_refetch_hook(mut self, hook: RefetchHook) -> Self {
        self.refetch_hooks.push(hook);
        self
    }

    pub fn allowances(&self) -> &AllowanceTracker {
        &self.allowances
    }

    /// Execute the action. A second call while a flow is in flight is a
    /// no-op; the existing sequence is unaffected.
    pub async fn execute(&self, params: A::Params) -> EngineResult<()> {
        {
            let mut flow = self.flow.write().await;
            // The step stays Idle through validation and the allowance
            // re-read; the claim itself is `pending`, so the guard must
            // check both.
            if flow.step != Step::Idle || flow.pending.is_some() {
                warn!(
                    instance = %self.instance_id,
                    action = self.adapter.name(),
                    step = ?flow.step,
                    "execute ignored: a flow is already in progress"
                );
                return Ok(());
            }
            // Claiming the flow: from here until settle there is exactly one
            // pending action on this instance.
            flow.pending = Some(params.clone());
            flow.tx_hash = None;
            flow.error = None;
        }
        self.disarm_settle_timer();

        let result = self.drive(params).await;

        {
            let mut flow = self.flow.write().await;
            flow.pending = None;
            if let Err(ref error) = result {
                if error.is_user_declined() {
                    info!(
                        instance = %self.instance_id,
                        action = self.adapter.name(),
                        "flow stopped: declined in wallet"
                    );
                } else {
                    warn!(
                        instance = %self.instance_id,
                        action = self.adapter.name(),
                        %error,
                        "flow failed"
                    );
                }
                flow.step = Step::Error;
                flow.error = Some(error.clone());
            }
        }
        self.arm_settle_timer();

        result
    }

    /// Run the approval(s)-then-action sequence
    async fn drive(&self, params: A::Params) -> EngineResult<()> {
        let ctx = ActionContext {
            chain: self.chain.as_ref(),
            engine: &self.config,
            contracts: self.contracts,
            owner: self.wallet.address(),
        };

        // Validation and clamping happen before any transaction is built
        let params = self.adapter.prepare(params, &ctx).await?;
        self.flow.write().await.pending = Some(params.clone());

        let approvals = self.adapter.approvals(&params, &ctx).await?;
        for (index, target) in approvals.iter().enumerate() {
            // Never trust a stale snapshot: re-read the allowance
            // immediately before acting on it. A confirmed approval from an
            // earlier attempt shows up here, so a retry re-enters at the
            // action without re-approving.
            let request = self
                .allowances
                .request(target.token, target.spender, target.amount)
                .await?;
            if !request.needs_approval() {
                debug!(
                    instance = %self.instance_id,
                    token = ?target.token,
                    "allowance sufficient, skipping approval"
                );
                continue;
            }

            let step = if index == 0 {
                Step::ApprovingPrimary
            } else {
                Step::ApprovingSecondary
            };
            self.set_step(step).await;
            info!(
                instance = %self.instance_id,
                action = self.adapter.name(),
                token = ?target.token,
                amount = %target.amount,
                "submitting approval"
            );

            let call = approve_call(target.token, target.spender, target.amount);
            let tx_hash = self.wallet.submit(&call).await?;
            self.flow.write().await.tx_hash = Some(tx_hash);

            // The next approval (or the action) is not submitted until this
            // one's confirmation is observed.
            match self.chain.wait_for_receipt(tx_hash).await? {
                ReceiptStatus::Success => {
                    // Cache priming only; the next decision re-reads
                    if let Err(error) =
                        self.allowances.refresh(target.token, target.spender).await
                    {
                        warn!(
                            instance = %self.instance_id,
                            token = ?target.token,
                            %error,
                            "allowance refresh after approval failed"
                        );
                    }
                }
                ReceiptStatus::Reverted => {
                    return Err(EngineError::ApprovalReverted {
                        token: format!("{:?}", target.token),
                        tx_hash,
                    });
                }
            }
        }

        self.set_step(Step::Submitting).await;
        let call = self.adapter.build_call(&params, &ctx).await?;
        let tx_hash = self.wallet.submit(&call).await?;
        {
            let mut flow = self.flow.write().await;
            flow.tx_hash = Some(tx_hash);
            flow.step = Step::Confirming;
            // The deferred action is now on-chain
            flow.pending = None;
        }
        info!(
            instance = %self.instance_id,
            action = self.adapter.name(),
            tx_hash = %hex::encode(tx_hash),
            "action submitted"
        );

        match self.chain.wait_for_receipt(tx_hash).await? {
            ReceiptStatus::Success => {
                self.set_step(Step::Confirmed).await;
                info!(
                    instance = %self.instance_id,
                    action = self.adapter.name(),
                    "action confirmed"
                );
                self.run_refetch_hooks().await;
                Ok(())
            }
            ReceiptStatus::Reverted => Err(EngineError::ActionReverted { tx_hash }),
        }
    }

    async fn set_step(&self, step: Step) {
        let mut flow = self.flow.write().await;
        debug!(
            instance = %self.instance_id,
            from = ?flow.step,
            to = ?step,
            "step transition"
        );
        flow.step = step;
        if step == Step::Submitting {
            flow.tx_hash = None;
        }
    }

    /// Best-effort re-synchronization; failures degrade to stale data
    async fn run_refetch_hooks(&self) {
        for hook in &self.refetch_hooks {
            hook().await;
        }
    }

    fn timer_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.settle_timer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Arm the auto-reset for a settled flow, replacing any earlier timer
    fn arm_settle_timer(&self) {
        let dwell = self.config.settle_dwell();
        let flow = Arc::clone(&self.flow);
        let instance_id = self.instance_id;

        let mut slot = self.timer_slot();
        if let Some(handle) = slot.take() {
            handle.abort();
        }
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(dwell).await;
            let mut flow = flow.write().await;
            if flow.step.is_settled() {
                debug!(instance = %instance_id, "settle window elapsed, resetting");
                flow.reset();
            }
        }));
    }

    fn disarm_settle_timer(&self) {
        if let Some(handle) = self.timer_slot().take() {
            handle.abort();
        }
    }

    /// Manually close the settled status display
    pub async fn dismiss(&self) {
        self.disarm_settle_timer();
        let mut flow = self.flow.write().await;
        if flow.step.is_settled() {
            flow.reset();
        }
    }

    /// Detached view of the current flow
    pub async fn snapshot(&self) -> FlowSnapshot {
        let flow = self.flow.read().await;
        FlowSnapshot {
            step: flow.step,
            tx_hash: flow.tx_hash,
            error: flow.error.clone(),
        }
    }

    /// Current progress panel projection
    pub async fn status(&self) -> TransactionStatus {
        project_status(&self.snapshot().await, &self.adapter.labels())
    }

    /// Current call-to-action projection
    pub async fn button(&self, needs_approval: bool, input_valid: bool) -> ButtonState {
        project_button(
            &self.snapshot().await,
            &self.adapter.labels(),
            needs_approval,
            input_valid,
        )
    }
}

impl<A: ActionAdapter> Drop for Engine<A> {
    fn drop(&mut self) {
        // Never leave a bare timer running past the instance
        if let Some(handle) = self.timer_slot().take() {
            handle.abort();
        }
    }
}
