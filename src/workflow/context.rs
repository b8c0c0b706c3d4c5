use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::WorkflowError;
use super::status::Role;

/// Who is acting. Resolved per request by the auth middleware and handed to
/// every workflow operation; nothing in the engine reads ambient session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
    pub team_id: Option<Uuid>,
}

impl AuthContext {
    pub fn new(user_id: Uuid, role: Role, team_id: Option<Uuid>) -> Self {
        Self { user_id, role, team_id }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_team_lead_of(&self, team_id: Uuid) -> bool {
        self.role == Role::TeamLead && self.team_id == Some(team_id)
    }

    /// Fails unless the caller holds one of `roles`.
    pub fn require_any(&self, roles: &[Role], action: &str) -> Result<(), WorkflowError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(WorkflowError::forbidden(format!("a {} may not {action}", self.role)))
        }
    }

    pub fn require_purchasing(&self, action: &str) -> Result<(), WorkflowError> {
        self.require_any(&[Role::ProcurementOfficer, Role::Admin], action)
    }

    pub fn require_admin(&self, action: &str) -> Result<(), WorkflowError> {
        self.require_any(&[Role::Admin], action)
    }
}
