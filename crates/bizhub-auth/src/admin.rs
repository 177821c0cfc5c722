//! Owner-only administration of roles, role membership and route grants.
//!
//! Every operation is scoped to the caller's business and audited.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use bizhub_core::error::AppError;
use bizhub_core::result::AppResult;
use bizhub_database::{AccessStore, AccountStore};
use bizhub_entity::access::{AccountRole, RouteRole};
use bizhub_entity::audit::{AuditContext, CreateAuditLogEntry};
use bizhub_entity::role::{CreateRole, Role};

use crate::audit::AuditRecorder;
use crate::gateway::{AuthGateway, ClientContext, Principal};
use crate::permission::routes::{is_public_route, validate_route};

const MAX_ROLE_NAME_LEN: usize = 50;

/// Role and route-grant administration for company owners.
#[derive(Debug, Clone)]
pub struct AccessAdmin {
    gateway: Arc<AuthGateway>,
    accounts: Arc<dyn AccountStore>,
    access: Arc<dyn AccessStore>,
    audit: Arc<AuditRecorder>,
}

impl AccessAdmin {
    pub fn new(
        gateway: Arc<AuthGateway>,
        accounts: Arc<dyn AccountStore>,
        access: Arc<dyn AccessStore>,
        audit: Arc<AuditRecorder>,
    ) -> Self {
        Self {
            gateway,
            accounts,
            access,
            audit,
        }
    }

    /// Active roles of the owner's business.
    pub async fn list_roles(&self, owner: &Principal) -> AppResult<Vec<Role>> {
        self.gateway.require_owner(owner).await?;
        self.access.list_roles(owner.business_id).await
    }

    /// Creates a role.
    pub async fn create_role(
        &self,
        owner: &Principal,
        name: &str,
        color: Option<String>,
        client: &ClientContext,
    ) -> AppResult<Role> {
        self.gateway.require_owner(owner).await?;

        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_ROLE_NAME_LEN {
            return Err(AppError::validation(format!(
                "Role name must be between 1 and {MAX_ROLE_NAME_LEN} characters"
            )));
        }
        if let Some(color) = color.as_deref() {
            validate_color(color)?;
        }

        let role = self
            .access
            .create_role(CreateRole {
                business_id: owner.business_id,
                name: name.to_string(),
                color,
            })
            .await?;

        self.record(
            owner,
            client,
            AuditContext::RoleCreate,
            format!("Role '{}' created", role.name),
            serde_json::json!({ "role_id": role.id }),
        )
        .await;
        info!(role_id = %role.id, business_id = %owner.business_id, "Role created");
        Ok(role)
    }

    /// Soft-deletes a role. Its grants stop applying immediately.
    pub async fn delete_role(
        &self,
        owner: &Principal,
        role_id: Uuid,
        client: &ClientContext,
    ) -> AppResult<()> {
        self.gateway.require_owner(owner).await?;

        if !self.access.deactivate_role(owner.business_id, role_id).await? {
            return Err(AppError::not_found("Role not found"));
        }

        self.record(
            owner,
            client,
            AuditContext::RoleDelete,
            "Role deactivated".to_string(),
            serde_json::json!({ "role_id": role_id }),
        )
        .await;
        info!(role_id = %role_id, business_id = %owner.business_id, "Role deactivated");
        Ok(())
    }

    /// Active roles held by an account of the owner's business.
    pub async fn account_roles(&self, owner: &Principal, account_id: Uuid) -> AppResult<Vec<Role>> {
        self.gateway.require_owner(owner).await?;
        self.require_account(owner.business_id, account_id).await?;
        self.access.account_roles(owner.business_id, account_id).await
    }

    /// Gives an account a role.
    pub async fn assign_role(
        &self,
        owner: &Principal,
        account_id: Uuid,
        role_id: Uuid,
        client: &ClientContext,
    ) -> AppResult<AccountRole> {
        self.gateway.require_owner(owner).await?;
        self.require_account(owner.business_id, account_id).await?;
        self.require_role(owner.business_id, role_id).await?;

        let grant = self
            .access
            .assign_role(owner.business_id, account_id, role_id)
            .await?;

        self.record(
            owner,
            client,
            AuditContext::AccountRoleAdd,
            "Role assigned to account".to_string(),
            serde_json::json!({ "account_id": account_id, "role_id": role_id }),
        )
        .await;
        Ok(grant)
    }

    /// Takes a role away from an account.
    pub async fn remove_role(
        &self,
        owner: &Principal,
        account_id: Uuid,
        role_id: Uuid,
        client: &ClientContext,
    ) -> AppResult<()> {
        self.gateway.require_owner(owner).await?;

        if !self
            .access
            .remove_role(owner.business_id, account_id, role_id)
            .await?
        {
            return Err(AppError::not_found("Role assignment not found"));
        }

        self.record(
            owner,
            client,
            AuditContext::AccountRoleRemove,
            "Role removed from account".to_string(),
            serde_json::json!({ "account_id": account_id, "role_id": role_id }),
        )
        .await;
        Ok(())
    }

    /// Active roles granted `route`.
    pub async fn roles_for_route(&self, owner: &Principal, route: &str) -> AppResult<Vec<Role>> {
        self.gateway.require_owner(owner).await?;
        validate_route(route)?;
        self.access.roles_for_route(owner.business_id, route).await
    }

    /// Grants `route` to a role. A duplicate grant is a conflict.
    pub async fn grant_route(
        &self,
        owner: &Principal,
        route: &str,
        role_id: Uuid,
        client: &ClientContext,
    ) -> AppResult<RouteRole> {
        self.gateway.require_owner(owner).await?;
        validate_route(route)?;
        if is_public_route(route) {
            return Err(AppError::validation("Public routes cannot be granted to a role"));
        }
        self.require_role(owner.business_id, role_id).await?;

        let grant = self
            .access
            .grant_route(owner.business_id, route, role_id)
            .await?;

        self.record(
            owner,
            client,
            AuditContext::RoleUpdate,
            format!("Route {route} granted to role"),
            serde_json::json!({ "route": route, "role_id": role_id, "action": "grant" }),
        )
        .await;
        info!(route = route, role_id = %role_id, "Route permission granted");
        Ok(grant)
    }

    /// Revokes `route` from a role.
    pub async fn revoke_route(
        &self,
        owner: &Principal,
        route: &str,
        role_id: Uuid,
        client: &ClientContext,
    ) -> AppResult<()> {
        self.gateway.require_owner(owner).await?;
        validate_route(route)?;

        if !self
            .access
            .revoke_route(owner.business_id, route, role_id)
            .await?
        {
            return Err(AppError::not_found("Route permission not found"));
        }

        self.record(
            owner,
            client,
            AuditContext::RoleUpdate,
            format!("Route {route} revoked from role"),
            serde_json::json!({ "route": route, "role_id": role_id, "action": "revoke" }),
        )
        .await;
        info!(route = route, role_id = %role_id, "Route permission revoked");
        Ok(())
    }

    async fn require_account(&self, business_id: Uuid, account_id: Uuid) -> AppResult<()> {
        match self.accounts.find_active(account_id, business_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("Account not found")),
        }
    }

    async fn require_role(&self, business_id: Uuid, role_id: Uuid) -> AppResult<Role> {
        self.access
            .find_role(business_id, role_id)
            .await?
            .ok_or_else(|| AppError::not_found("Role not found"))
    }

    async fn record(
        &self,
        owner: &Principal,
        client: &ClientContext,
        context: AuditContext,
        description: String,
        data: serde_json::Value,
    ) {
        self.audit
            .record(
                CreateAuditLogEntry::new(owner.business_id, Some(owner.account_id), context, description)
                    .with_client(Some(client.ip_address.clone()), client.user_agent.clone())
                    .with_data(data),
            )
            .await;
    }
}

/// `#RRGGBB`.
fn validate_color(color: &str) -> AppResult<()> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(AppError::validation("Color must be a hex value like #1A2B3C"))
    }
}
