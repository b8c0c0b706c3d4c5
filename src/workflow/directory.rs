//! Vendors, teams, profiles and stock levels: the reference data the
//! workflow points at.

use uuid::Uuid;

use crate::db::models::inventory::InventoryItem;
use crate::db::models::profile::{Profile, ProfileUpdate};
use crate::db::models::team::{NewTeam, Team};
use crate::db::models::vendor::{NewVendor, Vendor};
use crate::db::store::ProcurementStore;
use crate::workflow::context::AuthContext;
use crate::workflow::error::WorkflowError;

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn list_vendors(store: &dyn ProcurementStore) -> Result<Vec<Vendor>, WorkflowError> {
    Ok(store.list_vendors().await?)
}

pub async fn create_vendor(
    store: &dyn ProcurementStore,
    ctx: &AuthContext,
    vendor: NewVendor,
) -> Result<Vendor, WorkflowError> {
    ctx.require_purchasing("add vendors")?;
    let name = vendor.name.trim().to_string();
    let contact_info = vendor.contact_info.trim().to_string();
    if name.is_empty() || contact_info.is_empty() {
        return Err(WorkflowError::validation("vendor name and contact info are required"));
    }
    let vendor = NewVendor {
        name,
        contact_info,
        contact_person: trimmed(vendor.contact_person),
        email: trimmed(vendor.email),
        phone: trimmed(vendor.phone),
        address: trimmed(vendor.address),
    };
    Ok(store.create_vendor(Uuid::new_v4(), vendor).await?)
}

pub async fn delete_vendor(store: &dyn ProcurementStore, ctx: &AuthContext, id: Uuid) -> Result<(), WorkflowError> {
    ctx.require_purchasing("delete vendors")?;
    Ok(store.delete_vendor(id).await?)
}

pub async fn list_inventory(store: &dyn ProcurementStore, ctx: &AuthContext) -> Result<Vec<InventoryItem>, WorkflowError> {
    ctx.require_purchasing("view inventory")?;
    Ok(store.list_inventory().await?)
}

pub async fn list_teams(store: &dyn ProcurementStore) -> Result<Vec<Team>, WorkflowError> {
    Ok(store.list_teams().await?)
}

pub async fn create_team(store: &dyn ProcurementStore, ctx: &AuthContext, team: NewTeam) -> Result<Team, WorkflowError> {
    ctx.require_admin("create teams")?;
    let name = team.name.trim().to_string();
    if name.is_empty() {
        return Err(WorkflowError::validation("team name is required"));
    }
    let team = NewTeam { name, description: trimmed(team.description) };
    Ok(store.create_team(Uuid::new_v4(), team).await?)
}

pub async fn delete_team(store: &dyn ProcurementStore, ctx: &AuthContext, id: Uuid) -> Result<(), WorkflowError> {
    ctx.require_admin("delete teams")?;
    Ok(store.delete_team(id).await?)
}

pub async fn my_profile(store: &dyn ProcurementStore, ctx: &AuthContext) -> Result<Profile, WorkflowError> {
    store
        .get_profile(ctx.user_id)
        .await?
        .ok_or_else(|| WorkflowError::not_found("profile not found"))
}

pub async fn list_profiles(store: &dyn ProcurementStore, ctx: &AuthContext) -> Result<Vec<Profile>, WorkflowError> {
    ctx.require_admin("list profiles")?;
    Ok(store.list_profiles().await?)
}

/// Role and team edits. The caller must drop any cached context for `id`.
pub async fn update_profile(
    store: &dyn ProcurementStore,
    ctx: &AuthContext,
    id: Uuid,
    update: ProfileUpdate,
) -> Result<Profile, WorkflowError> {
    ctx.require_admin("edit profiles")?;
    if let Some(team_id) = update.team_id {
        let teams = store.list_teams().await?;
        if !teams.iter().any(|team| team.id == team_id) {
            return Err(WorkflowError::validation(format!("unknown team {team_id}")));
        }
    }
    let update = ProfileUpdate { full_name: trimmed(update.full_name), ..update };
    Ok(store.update_profile(id, update).await?)
}
