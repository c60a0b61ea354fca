//! Role matrix for the credit workflow.
//!
//! Affiliates submit and withdraw their own applications; analysts and
//! admins run evaluations and decisions. The PENDING-only state gate is a
//! separate check owned by the domain and the service layer: both must
//! hold for a mutating operation to proceed.

use super::domain::{CreditAction, Role};

/// First-class authorization outcome, so callers can tell a role denial
/// apart from a state denial when building user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied { reason: String },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }
}

/// Pure (role, action) matrix. Ownership refinements (an affiliate may
/// only touch their own applications) are enforced by the service on top
/// of this.
pub fn authorize(role: Role, action: CreditAction) -> AccessDecision {
    if permits(role, action) {
        AccessDecision::Allowed
    } else {
        AccessDecision::Denied {
            reason: format!("role {role} may not {action} credit applications"),
        }
    }
}

fn permits(role: Role, action: CreditAction) -> bool {
    match role {
        Role::Afiliado => matches!(
            action,
            CreditAction::Submit | CreditAction::Cancel | CreditAction::View | CreditAction::ListOwn
        ),
        Role::Analista => matches!(
            action,
            CreditAction::Evaluate
                | CreditAction::Approve
                | CreditAction::Reject
                | CreditAction::View
                | CreditAction::ListAll
        ),
        // Admins cover both sides of the desk except cancellation, which is
        // requester-initiated only.
        Role::Admin => !matches!(action, CreditAction::Cancel),
    }
}
