//! Route permission resolver.
//!
//! Resolution order:
//! 1. The account must be active in an active business.
//! 2. `/profile` and its sub-paths are open to every such account.
//! 3. Company owners reach every route, before any role is consulted.
//! 4. Otherwise the route must be granted to one of the account's active roles.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use bizhub_core::error::AppError;
use bizhub_database::{AccessStore, AccountStore};

use super::routes::{PROFILE_ROUTE, ROUTE_CATALOGUE, is_profile_route};

/// Why access was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantSource {
    /// The route is the profile route or beneath it.
    Profile,
    /// The account is the company owner.
    Owner,
    /// One of the account's active roles is granted the route.
    Role,
}

/// Why access was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// The account is unknown, inactive, or its business is inactive.
    InactiveAccount,
    /// The account holds no active role.
    NoRoles,
    /// None of the account's roles is granted the route.
    NotGranted,
}

/// Outcome of a route permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Authorized(GrantSource),
    Denied(DenialReason),
}

impl AccessDecision {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }
}

/// Decides whether an account may reach a route within its business.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    accounts: Arc<dyn AccountStore>,
    access: Arc<dyn AccessStore>,
}

impl PermissionResolver {
    pub fn new(accounts: Arc<dyn AccountStore>, access: Arc<dyn AccessStore>) -> Self {
        Self { accounts, access }
    }

    /// Decide whether `account_id` may reach `route` in `business_id`.
    ///
    /// Store failures are returned as errors; callers fail closed.
    pub async fn can_access(
        &self,
        account_id: Uuid,
        business_id: Uuid,
        route: &str,
    ) -> Result<AccessDecision, AppError> {
        let Some(account) = self.accounts.find_active(account_id, business_id).await? else {
            return Ok(AccessDecision::Denied(DenialReason::InactiveAccount));
        };

        if is_profile_route(route) {
            return Ok(AccessDecision::Authorized(GrantSource::Profile));
        }

        if account.is_company_owner {
            return Ok(AccessDecision::Authorized(GrantSource::Owner));
        }

        let role_ids = self.access.active_role_ids(business_id, account_id).await?;
        if role_ids.is_empty() {
            debug!(account_id = %account_id, route = route, "No active roles");
            return Ok(AccessDecision::Denied(DenialReason::NoRoles));
        }

        if self
            .access
            .route_granted(business_id, route, &role_ids)
            .await?
        {
            Ok(AccessDecision::Authorized(GrantSource::Role))
        } else {
            Ok(AccessDecision::Denied(DenialReason::NotGranted))
        }
    }

    /// Whether the account is the active owner of the business.
    pub async fn is_owner(&self, account_id: Uuid, business_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .accounts
            .find_active(account_id, business_id)
            .await?
            .is_some_and(|account| account.is_company_owner))
    }

    /// Every route the account can reach, for building navigation.
    pub async fn list_accessible_routes(
        &self,
        account_id: Uuid,
        business_id: Uuid,
    ) -> Result<BTreeSet<String>, AppError> {
        let Some(account) = self.accounts.find_active(account_id, business_id).await? else {
            return Ok(BTreeSet::new());
        };

        if account.is_company_owner {
            return Ok(ROUTE_CATALOGUE.iter().map(|r| r.to_string()).collect());
        }

        let role_ids = self.access.active_role_ids(business_id, account_id).await?;
        let mut routes: BTreeSet<String> = self
            .access
            .granted_routes(business_id, &role_ids)
            .await?
            .into_iter()
            .collect();
        routes.insert(PROFILE_ROUTE.to_string());
        Ok(routes)
    }
}
