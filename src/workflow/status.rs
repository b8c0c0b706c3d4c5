use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Raised when a stored or submitted status string names no known state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
}

/// Lower-cases and folds `_` to a space so `Approved_By_Admin`,
/// `approved by admin` and `APPROVED BY ADMIN` compare equal.
fn normalize(raw: &str) -> String {
    raw.trim()
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generates the string plumbing shared by every closed enumeration:
/// canonical `as_str`, case-insensitive `FromStr`, and the `String`
/// conversions used by serde and by `sqlx(try_from = "String")`.
macro_rules! string_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseStatusError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let wanted = normalize(raw);
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str() == wanted)
                    .ok_or_else(|| ParseStatusError { kind: $kind, value: raw.to_string() })
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ParseStatusError;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                raw.parse()
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.as_str().to_string()
            }
        }
    };
}

/// Lifecycle of a procurement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RequestStatus {
    Pending,
    ApprovedByTeamLead,
    RejectedByTeamLead,
    ApprovedByAdmin,
    RejectedByAdmin,
    PoIssued,
    Processed,
    Completed,
}

string_enum!(RequestStatus, "request status", {
    Pending => "pending",
    ApprovedByTeamLead => "approved by team lead",
    RejectedByTeamLead => "rejected by team lead",
    ApprovedByAdmin => "approved by admin",
    RejectedByAdmin => "rejected by admin",
    PoIssued => "po issued",
    Processed => "processed",
    Completed => "completed",
});

impl RequestStatus {
    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::RejectedByTeamLead | RequestStatus::RejectedByAdmin | RequestStatus::Completed
        )
    }
}

/// Fulfilment state of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PurchaseOrderStatus {
    Issued,
    Shipped,
    Delivered,
    Received,
}

string_enum!(PurchaseOrderStatus, "purchase order status", {
    Issued => "issued",
    Shipped => "shipped",
    Delivered => "delivered",
    Received => "received",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

string_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    Paid => "paid",
});

/// The single authorization dimension of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    TeamLead,
    ProcurementOfficer,
    Admin,
}

string_enum!(Role, "role", {
    Employee => "employee",
    TeamLead => "team lead",
    ProcurementOfficer => "procurement officer",
    Admin => "admin",
});

impl Role {
    /// Snake-case form stored in `profiles.role`.
    pub fn db_value(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::TeamLead => "team_lead",
            Role::ProcurementOfficer => "procurement_officer",
            Role::Admin => "admin",
        }
    }

    /// Roles that act on purchase orders.
    pub fn is_purchasing(&self) -> bool {
        matches!(self, Role::ProcurementOfficer | Role::Admin)
    }
}
