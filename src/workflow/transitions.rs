//! Role-gated transition tables for requests and purchase orders.
//!
//! Every guard lives here as a pure function so the full table can be
//! checked exhaustively without touching storage.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::WorkflowError;
use super::status::{PurchaseOrderStatus, RequestStatus, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

/// What a caller is trying to do to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    Decide(Decision),
    IssuePurchaseOrder,
    MarkProcessed,
    Receive,
}

impl RequestAction {
    pub const ALL: [RequestAction; 5] = [
        RequestAction::Decide(Decision::Approve),
        RequestAction::Decide(Decision::Reject),
        RequestAction::IssuePurchaseOrder,
        RequestAction::MarkProcessed,
        RequestAction::Receive,
    ];

    fn describe(&self) -> &'static str {
        match self {
            RequestAction::Decide(Decision::Approve) => "approve",
            RequestAction::Decide(Decision::Reject) => "reject",
            RequestAction::IssuePurchaseOrder => "issue a purchase order for",
            RequestAction::MarkProcessed => "mark as processed",
            RequestAction::Receive => "receive goods for",
        }
    }
}

/// One-way audit flag recorded next to an approval decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditFlag {
    ApprovedByTeamLead,
    RejectedByTeamLead,
    ApprovedByAdmin,
    RejectedByAdmin,
}

impl AuditFlag {
    pub fn column(&self) -> &'static str {
        match self {
            AuditFlag::ApprovedByTeamLead => "approved_by_team_lead",
            AuditFlag::RejectedByTeamLead => "rejected_by_team_lead",
            AuditFlag::ApprovedByAdmin => "approved_by_admin",
            AuditFlag::RejectedByAdmin => "rejected_by_admin",
        }
    }

    /// The flag that accompanies `to`, if it is a decision status.
    pub fn for_status(to: RequestStatus) -> Option<AuditFlag> {
        match to {
            RequestStatus::ApprovedByTeamLead => Some(AuditFlag::ApprovedByTeamLead),
            RequestStatus::RejectedByTeamLead => Some(AuditFlag::RejectedByTeamLead),
            RequestStatus::ApprovedByAdmin => Some(AuditFlag::ApprovedByAdmin),
            RequestStatus::RejectedByAdmin => Some(AuditFlag::RejectedByAdmin),
            _ => None,
        }
    }
}

/// Target status of `action` performed by `role` on a request in `from`.
pub fn next_request_status(
    role: Role,
    action: RequestAction,
    from: RequestStatus,
) -> Result<RequestStatus, WorkflowError> {
    use Decision::*;
    use RequestAction::*;
    use RequestStatus::*;

    let to = match (role, action, from) {
        (Role::TeamLead, Decide(Approve), Pending) => Some(ApprovedByTeamLead),
        (Role::TeamLead, Decide(Reject), Pending) => Some(RejectedByTeamLead),
        (Role::Admin, Decide(Approve), ApprovedByTeamLead) => Some(ApprovedByAdmin),
        (Role::Admin, Decide(Reject), ApprovedByTeamLead) => Some(RejectedByAdmin),
        (r, IssuePurchaseOrder, ApprovedByAdmin) if r.is_purchasing() => Some(PoIssued),
        (r, MarkProcessed, PoIssued) if r.is_purchasing() => Some(Processed),
        (r, Receive, PoIssued | Processed) if r.is_purchasing() => Some(Completed),
        _ => None,
    };

    to.ok_or_else(|| {
        WorkflowError::forbidden(format!(
            "a {role} may not {} a request that is {from}",
            action.describe()
        ))
    })
}

/// Target of a purchase-order shipment update or receipt.
pub fn next_order_status(
    role: Role,
    from: PurchaseOrderStatus,
    to: PurchaseOrderStatus,
) -> Result<PurchaseOrderStatus, WorkflowError> {
    use PurchaseOrderStatus::*;

    let allowed = role.is_purchasing()
        && matches!(
            (from, to),
            (Issued, Shipped) | (Issued | Shipped, Delivered) | (Issued | Shipped | Delivered, Received)
        );

    if allowed {
        Ok(to)
    } else {
        Err(WorkflowError::forbidden(format!(
            "a {role} may not move a purchase order from {from} to {to}"
        )))
    }
}

/// Order statuses from which goods may still be received.
pub const RECEIVABLE_ORDER_STATUSES: [PurchaseOrderStatus; 3] = [
    PurchaseOrderStatus::Issued,
    PurchaseOrderStatus::Shipped,
    PurchaseOrderStatus::Delivered,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(role: Role, action: RequestAction, from: RequestStatus) -> Option<RequestStatus> {
        use Decision::*;
        use RequestAction::*;
        use RequestStatus::*;
        let purchasing = matches!(role, Role::ProcurementOfficer | Role::Admin);
        match (role, action, from) {
            (Role::TeamLead, Decide(Approve), Pending) => Some(ApprovedByTeamLead),
            (Role::TeamLead, Decide(Reject), Pending) => Some(RejectedByTeamLead),
            (Role::Admin, Decide(Approve), ApprovedByTeamLead) => Some(ApprovedByAdmin),
            (Role::Admin, Decide(Reject), ApprovedByTeamLead) => Some(RejectedByAdmin),
            (_, IssuePurchaseOrder, ApprovedByAdmin) if purchasing => Some(PoIssued),
            (_, MarkProcessed, PoIssued) if purchasing => Some(Processed),
            (_, Receive, PoIssued) if purchasing => Some(Completed),
            (_, Receive, Processed) if purchasing => Some(Completed),
            _ => None,
        }
    }

    #[test]
    fn every_unlisted_pairing_is_rejected() {
        let mut accepted = 0;
        for role in Role::ALL {
            for action in RequestAction::ALL {
                for from in RequestStatus::ALL {
                    let result = next_request_status(*role, action, *from);
                    match allowed(*role, action, *from) {
                        Some(expected) => {
                            accepted += 1;
                            assert_eq!(result.unwrap(), expected, "{role:?} {action:?} {from:?}");
                        }
                        None => assert!(
                            matches!(result, Err(WorkflowError::Authorization(_))),
                            "{role:?} {action:?} {from:?} should be rejected"
                        ),
                    }
                }
            }
        }
        // 4 decisions + 2 roles x (issue, process, 2 receive sources)
        assert_eq!(accepted, 12);
    }

    #[test]
    fn terminal_statuses_never_move() {
        for role in Role::ALL {
            for action in RequestAction::ALL {
                for from in RequestStatus::ALL.iter().filter(|s| s.is_terminal()) {
                    assert!(next_request_status(*role, action, *from).is_err());
                }
            }
        }
    }

    #[test]
    fn admin_cannot_skip_team_lead() {
        let err = next_request_status(Role::Admin, RequestAction::Decide(Decision::Approve), RequestStatus::Pending)
            .unwrap_err();
        assert!(err.to_string().contains("pending"));
    }

    #[test]
    fn audit_flags_follow_decision_statuses() {
        assert_eq!(AuditFlag::for_status(RequestStatus::RejectedByAdmin), Some(AuditFlag::RejectedByAdmin));
        assert_eq!(AuditFlag::for_status(RequestStatus::PoIssued), None);
        assert_eq!(AuditFlag::ApprovedByTeamLead.column(), "approved_by_team_lead");
    }

    #[test]
    fn order_statuses_only_move_forward() {
        use PurchaseOrderStatus::*;
        let officer = Role::ProcurementOfficer;
        assert_eq!(next_order_status(officer, Issued, Shipped).unwrap(), Shipped);
        assert_eq!(next_order_status(officer, Shipped, Delivered).unwrap(), Delivered);
        assert_eq!(next_order_status(Role::Admin, Issued, Received).unwrap(), Received);
        assert!(next_order_status(officer, Delivered, Shipped).is_err());
        assert!(next_order_status(officer, Received, Received).is_err());
        assert!(next_order_status(Role::TeamLead, Issued, Shipped).is_err());
        assert!(next_order_status(Role::Employee, Issued, Received).is_err());
    }
}
