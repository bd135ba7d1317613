//! Flow steps

use serde::Serialize;

/// The single step an engine instance occupies at any moment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Idle,
    ApprovingPrimary,
    ApprovingSecondary,
    Submitting,
    Confirming,
    Confirmed,
    Error,
}

impl Step {
    /// A transaction is being prepared, signed, or awaited
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Step::ApprovingPrimary | Step::ApprovingSecondary | Step::Submitting | Step::Confirming
        )
    }

    /// The flow has finished, successfully or not, and will auto-reset
    pub fn is_settled(&self) -> bool {
        matches!(self, Step::Confirmed | Step::Error)
    }

    pub fn is_approving(&self) -> bool {
        matches!(self, Step::ApprovingPrimary | Step::ApprovingSecondary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_and_settled_are_disjoint() {
        let all = [
            Step::Idle,
            Step::ApprovingPrimary,
            Step::ApprovingSecondary,
            Step::Submitting,
            Step::Confirming,
            Step::Confirmed,
            Step::Error,
        ];
        for step in all {
            assert!(!(step.is_busy() && step.is_settled()), "{:?}", step);
        }
        assert!(!Step::Idle.is_busy());
        assert!(!Step::Idle.is_settled());
    }
}
