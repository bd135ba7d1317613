//! Status projection
//!
//! Pure derivations from a flow snapshot into the two shapes the
//! presentation layer consumes. The sequencer never hands out raw booleans;
//! everything the UI shows goes through here.

use super::step::Step;
use crate::actions::ActionLabels;
use crate::error::EngineError;

use ethers::types::H256;
use serde::Serialize;

/// Point-in-time view of a flow, detached from the engine's generics
#[derive(Debug, Clone)]
pub struct FlowSnapshot {
    pub step: Step,
    pub tx_hash: Option<H256>,
    pub error: Option<EngineError>,
}

/// Progress panel projection
#[derive(Debug, Clone, Serialize)]
pub struct TransactionStatus {
    pub visible: bool,
    pub hash: Option<String>,
    pub is_pending: bool,
    pub is_confirming: bool,
    pub is_success: bool,
    pub is_error: bool,
    pub error: Option<String>,
    pub message: String,
}

/// Call-to-action button projection
#[derive(Debug, Clone, Serialize)]
pub struct ButtonState {
    pub label: String,
    pub disabled: bool,
    pub loading: bool,
}

/// Derive the progress panel from a snapshot
pub fn project_status(snapshot: &FlowSnapshot, labels: &ActionLabels) -> TransactionStatus {
    let hash = snapshot.tx_hash.map(|h| format!("{:?}", h));

    let (is_pending, is_confirming, is_success, is_error, message) = match snapshot.step {
        Step::Idle => (false, false, false, false, String::new()),
        Step::ApprovingPrimary => (true, false, false, false, "Approving token".to_string()),
        Step::ApprovingSecondary => {
            (true, false, false, false, "Approving second token".to_string())
        }
        Step::Submitting => (
            true,
            false,
            false,
            false,
            "Waiting for wallet signature".to_string(),
        ),
        Step::Confirming => (
            false,
            true,
            false,
            false,
            "Waiting for confirmation".to_string(),
        ),
        Step::Confirmed => (false, false, true, false, labels.success.to_string()),
        Step::Error => {
            let message = snapshot
                .error
                .as_ref()
                .map(|e| e.user_message())
                .unwrap_or_else(|| "Transaction failed".to_string());
            (false, false, false, true, message)
        }
    };

    TransactionStatus {
        visible: snapshot.step != Step::Idle,
        hash,
        is_pending,
        is_confirming,
        is_success,
        is_error,
        error: snapshot.error.as_ref().map(|e| e.user_message()),
        message,
    }
}

/// Derive the call-to-action button from a snapshot.
///
/// `needs_approval` and `input_valid` come from the caller's latest
/// allowance read and form validation.
pub fn project_button(
    snapshot: &FlowSnapshot,
    labels: &ActionLabels,
    needs_approval: bool,
    input_valid: bool,
) -> ButtonState {
    match snapshot.step {
        Step::Error => ButtonState {
            label: "Try Again".to_string(),
            disabled: false,
            loading: false,
        },
        step if step.is_approving() => ButtonState {
            label: "Approving token".to_string(),
            disabled: true,
            loading: true,
        },
        Step::Submitting | Step::Confirming => ButtonState {
            label: labels.in_progress.to_string(),
            disabled: true,
            loading: true,
        },
        Step::Confirmed => ButtonState {
            label: labels.success.to_string(),
            disabled: true,
            loading: false,
        },
        _ => ButtonState {
            label: if needs_approval {
                labels.idle_approve.to_string()
            } else {
                labels.idle.to_string()
            },
            disabled: !input_valid,
            loading: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: ActionLabels = ActionLabels {
        idle: "Swap",
        idle_approve: "Approve & Swap",
        in_progress: "Swapping tokens",
        success: "Swap complete",
    };

    fn snapshot(step: Step) -> FlowSnapshot {
        FlowSnapshot {
            step,
            tx_hash: None,
            error: None,
        }
    }

    #[test]
    fn idle_status_is_hidden() {
        let status = project_status(&snapshot(Step::Idle), &LABELS);
        assert!(!status.visible);
        assert!(!status.is_pending && !status.is_error && !status.is_success);
    }

    #[test]
    fn confirming_carries_hash() {
        let mut snap = snapshot(Step::Confirming);
        snap.tx_hash = Some(H256::repeat_byte(0xab));
        let status = project_status(&snap, &LABELS);
        assert!(status.visible);
        assert!(status.is_confirming);
        assert!(status.hash.unwrap().starts_with("0xabab"));
    }

    #[test]
    fn error_status_surfaces_user_message() {
        let mut snap = snapshot(Step::Error);
        snap.error = Some(EngineError::UserDeclined("denied".into()));
        let status = project_status(&snap, &LABELS);
        assert!(status.is_error);
        assert_eq!(
            status.message,
            "Transaction was declined in your wallet"
        );
    }

    #[test]
    fn button_switches_on_needs_approval() {
        let button = project_button(&snapshot(Step::Idle), &LABELS, true, true);
        assert_eq!(button.label, "Approve & Swap");
        assert!(!button.disabled);

        let button = project_button(&snapshot(Step::Idle), &LABELS, false, true);
        assert_eq!(button.label, "Swap");
    }

    #[test]
    fn invalid_input_disables_idle_button() {
        let button = project_button(&snapshot(Step::Idle), &LABELS, false, false);
        assert!(button.disabled);
        assert!(!button.loading);
    }

    #[test]
    fn error_button_enables_retry() {
        let button = project_button(&snapshot(Step::Error), &LABELS, false, true);
        assert_eq!(button.label, "Try Again");
        assert!(!button.disabled);
    }

    #[test]
    fn in_flight_buttons_are_loading() {
        for step in [
            Step::ApprovingPrimary,
            Step::ApprovingSecondary,
            Step::Submitting,
            Step::Confirming,
        ] {
            let button = project_button(&snapshot(step), &LABELS, false, true);
            assert!(button.disabled, "{:?}", step);
            assert!(button.loading, "{:?}", step);
        }
    }

    #[test]
    fn confirmed_button_is_terminal() {
        let button = project_button(&snapshot(Step::Confirmed), &LABELS, false, true);
        assert_eq!(button.label, "Swap complete");
        assert!(button.disabled);
        assert!(!button.loading);
    }

    #[test]
    fn status_serializes_for_the_presentation_layer() {
        let mut snap = snapshot(Step::Confirming);
        snap.tx_hash = Some(H256::repeat_byte(0xab));
        let json = serde_json::to_value(project_status(&snap, &LABELS)).unwrap();
        assert_eq!(json["visible"], true);
        assert_eq!(json["is_confirming"], true);
        assert_eq!(json["message"], "Waiting for confirmation");

        assert_eq!(
            serde_json::to_value(Step::ApprovingPrimary).unwrap(),
            "approving_primary"
        );
    }
}
