//! In-memory accounts, roles and grants for single-node deployments and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use bizhub_core::error::AppError;
use bizhub_core::result::AppResult;
use bizhub_entity::access::{AccountRole, RouteRole};
use bizhub_entity::account::{
    Account, AccountProfile, BusinessRegistration, CreateBusinessOwner,
};
use bizhub_entity::business::Business;
use bizhub_entity::preference::{AccountPreference, Theme};
use bizhub_entity::role::{CreateRole, Role};

use crate::repositories::{AccessStore, AccountStore};

#[derive(Debug, Default)]
struct DirectoryState {
    businesses: HashMap<Uuid, Business>,
    accounts: HashMap<Uuid, Account>,
    preferences: HashMap<(Uuid, Uuid), AccountPreference>,
    roles: HashMap<Uuid, Role>,
    account_roles: Vec<AccountRole>,
    route_roles: Vec<RouteRole>,
}

impl DirectoryState {
    fn live_account(&self, account_id: Uuid, business_id: Uuid) -> Option<&Account> {
        let account = self.accounts.get(&account_id)?;
        let business = self.businesses.get(&business_id)?;
        (account.business_id == business_id && account.active && business.active)
            .then_some(account)
    }

    fn live_role(&self, business_id: Uuid, role_id: Uuid) -> Option<&Role> {
        self.roles
            .get(&role_id)
            .filter(|r| r.business_id == business_id && r.active)
    }

    fn profile(&self, account: &Account) -> Option<AccountProfile> {
        let business = self.businesses.get(&account.business_id)?;
        let profile = AccountProfile {
            account: account.clone(),
            business: business.clone(),
        };
        profile.is_active().then_some(profile)
    }

    fn sorted(mut roles: Vec<Role>) -> Vec<Role> {
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }
}

/// In-memory implementation of [`AccountStore`] and [`AccessStore`].
///
/// Enforces the same constraints as the relational schema: one active role
/// name per business, no duplicate grants, and same-business joins.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    state: RwLock<DirectoryState>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a business.
    pub async fn add_business(&self, name: &str) -> Business {
        let now = Utc::now();
        let business = Business {
            id: Uuid::new_v4(),
            name: name.to_string(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state.businesses.insert(business.id, business.clone());
        business
    }

    /// Register an account in an existing business.
    pub async fn add_account(
        &self,
        business_id: Uuid,
        email: &str,
        password_hash: &str,
        is_company_owner: bool,
    ) -> AppResult<Account> {
        let mut state = self.state.write().await;
        if !state.businesses.contains_key(&business_id) {
            return Err(AppError::not_found("Business not found"));
        }
        let email = email.trim().to_lowercase();
        if state.accounts.values().any(|a| a.email == email) {
            return Err(AppError::conflict("Email already registered"));
        }
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            business_id,
            email,
            password_hash: password_hash.to_string(),
            name: None,
            active: true,
            is_company_owner,
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    /// Flip an account's active flag.
    pub async fn set_account_active(&self, account_id: Uuid, active: bool) {
        let mut state = self.state.write().await;
        if let Some(account) = state.accounts.get_mut(&account_id) {
            account.active = active;
            account.updated_at = Utc::now();
        }
    }

    /// Flip a business's active flag.
    pub async fn set_business_active(&self, business_id: Uuid, active: bool) {
        let mut state = self.state.write().await;
        if let Some(business) = state.businesses.get_mut(&business_id) {
            business.active = active;
            business.updated_at = Utc::now();
        }
    }

    /// Whether the account and its business are both active.
    pub async fn is_account_live(&self, account_id: Uuid, business_id: Uuid) -> bool {
        self.state
            .read()
            .await
            .live_account(account_id, business_id)
            .is_some()
    }
}

#[async_trait]
impl AccountStore for MemoryDirectory {
    async fn create_business_with_owner(
        &self,
        input: CreateBusinessOwner,
    ) -> AppResult<BusinessRegistration> {
        let mut state = self.state.write().await;
        let email = input.email.trim().to_lowercase();
        if state.accounts.values().any(|a| a.email == email) {
            return Err(AppError::conflict("Email already registered"));
        }

        let now = Utc::now();
        let business = Business {
            id: Uuid::new_v4(),
            name: input.business_name,
            active: true,
            created_at: now,
            updated_at: now,
        };
        let account = Account {
            id: Uuid::new_v4(),
            business_id: business.id,
            email,
            password_hash: input.password_hash,
            name: Some(input.owner_name),
            active: true,
            is_company_owner: true,
            created_at: now,
            updated_at: now,
        };
        let preferences = AccountPreference {
            business_id: business.id,
            account_id: account.id,
            theme: Theme::Light,
            created_at: now,
            updated_at: now,
        };

        state.businesses.insert(business.id, business.clone());
        state.accounts.insert(account.id, account.clone());
        state
            .preferences
            .insert((business.id, account.id), preferences.clone());

        Ok(BusinessRegistration {
            profile: AccountProfile { account, business },
            preferences,
        })
    }

    async fn find_login_candidate(&self, email: &str) -> AppResult<Option<AccountProfile>> {
        let needle = email.trim().to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .filter(|a| a.email == needle)
            .find_map(|a| state.profile(a)))
    }

    async fn find_active(&self, account_id: Uuid, business_id: Uuid) -> AppResult<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.live_account(account_id, business_id).cloned())
    }

    async fn find_profile(
        &self,
        account_id: Uuid,
        business_id: Uuid,
    ) -> AppResult<Option<AccountProfile>> {
        let state = self.state.read().await;
        Ok(state
            .live_account(account_id, business_id)
            .and_then(|a| state.profile(a)))
    }

    async fn ensure_preferences(
        &self,
        business_id: Uuid,
        account_id: Uuid,
    ) -> AppResult<AccountPreference> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let pref = state
            .preferences
            .entry((business_id, account_id))
            .or_insert_with(|| AccountPreference {
                business_id,
                account_id,
                theme: Theme::Light,
                created_at: now,
                updated_at: now,
            });
        Ok(pref.clone())
    }
}

#[async_trait]
impl AccessStore for MemoryDirectory {
    async fn active_role_ids(&self, business_id: Uuid, account_id: Uuid) -> AppResult<Vec<Uuid>> {
        let state = self.state.read().await;
        Ok(state
            .account_roles
            .iter()
            .filter(|ar| ar.business_id == business_id && ar.account_id == account_id)
            .filter(|ar| state.live_role(business_id, ar.role_id).is_some())
            .map(|ar| ar.role_id)
            .collect())
    }

    async fn route_granted(
        &self,
        business_id: Uuid,
        route: &str,
        role_ids: &[Uuid],
    ) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state.route_roles.iter().any(|rr| {
            rr.business_id == business_id
                && rr.route == route
                && role_ids.contains(&rr.role_id)
                && state.live_role(business_id, rr.role_id).is_some()
        }))
    }

    async fn granted_routes(&self, business_id: Uuid, role_ids: &[Uuid]) -> AppResult<Vec<String>> {
        let state = self.state.read().await;
        let mut routes: Vec<String> = state
            .route_roles
            .iter()
            .filter(|rr| rr.business_id == business_id && role_ids.contains(&rr.role_id))
            .filter(|rr| state.live_role(business_id, rr.role_id).is_some())
            .map(|rr| rr.route.clone())
            .collect();
        routes.sort();
        routes.dedup();
        Ok(routes)
    }

    async fn create_role(&self, role: CreateRole) -> AppResult<Role> {
        let mut state = self.state.write().await;
        let duplicate = state
            .roles
            .values()
            .any(|r| r.business_id == role.business_id && r.active && r.name == role.name);
        if duplicate {
            return Err(AppError::conflict(format!(
                "A role named '{}' already exists",
                role.name
            )));
        }
        let now = Utc::now();
        let created = Role {
            id: Uuid::new_v4(),
            business_id: role.business_id,
            name: role.name,
            color: role.color,
            active: true,
            created_at: now,
            updated_at: now,
        };
        state.roles.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_role(&self, business_id: Uuid, role_id: Uuid) -> AppResult<Option<Role>> {
        let state = self.state.read().await;
        Ok(state.live_role(business_id, role_id).cloned())
    }

    async fn list_roles(&self, business_id: Uuid) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;
        Ok(DirectoryState::sorted(
            state
                .roles
                .values()
                .filter(|r| r.business_id == business_id && r.active)
                .cloned()
                .collect(),
        ))
    }

    async fn deactivate_role(&self, business_id: Uuid, role_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.write().await;
        match state.roles.get_mut(&role_id) {
            Some(role) if role.business_id == business_id && role.active => {
                role.active = false;
                role.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn assign_role(
        &self,
        business_id: Uuid,
        account_id: Uuid,
        role_id: Uuid,
    ) -> AppResult<AccountRole> {
        let mut state = self.state.write().await;
        let same_business = state
            .accounts
            .get(&account_id)
            .is_some_and(|a| a.business_id == business_id)
            && state
                .roles
                .get(&role_id)
                .is_some_and(|r| r.business_id == business_id);
        if !same_business {
            return Err(AppError::validation(
                "Account and role must belong to the same business",
            ));
        }
        let duplicate = state.account_roles.iter().any(|ar| {
            ar.business_id == business_id && ar.account_id == account_id && ar.role_id == role_id
        });
        if duplicate {
            return Err(AppError::conflict("The account already holds this role"));
        }
        let grant = AccountRole {
            business_id,
            account_id,
            role_id,
            created_at: Utc::now(),
        };
        state.account_roles.push(grant.clone());
        Ok(grant)
    }

    async fn remove_role(
        &self,
        business_id: Uuid,
        account_id: Uuid,
        role_id: Uuid,
    ) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let before = state.account_roles.len();
        state.account_roles.retain(|ar| {
            !(ar.business_id == business_id && ar.account_id == account_id && ar.role_id == role_id)
        });
        Ok(state.account_roles.len() < before)
    }

    async fn grant_route(
        &self,
        business_id: Uuid,
        route: &str,
        role_id: Uuid,
    ) -> AppResult<RouteRole> {
        let mut state = self.state.write().await;
        if !state
            .roles
            .get(&role_id)
            .is_some_and(|r| r.business_id == business_id)
        {
            return Err(AppError::validation("Role must belong to the same business"));
        }
        let duplicate = state.route_roles.iter().any(|rr| {
            rr.business_id == business_id && rr.route == route && rr.role_id == role_id
        });
        if duplicate {
            return Err(AppError::conflict(
                "This role already has permission for this route",
            ));
        }
        let grant = RouteRole {
            business_id,
            route: route.to_string(),
            role_id,
            created_at: Utc::now(),
        };
        state.route_roles.push(grant.clone());
        Ok(grant)
    }

    async fn revoke_route(&self, business_id: Uuid, route: &str, role_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let before = state.route_roles.len();
        state.route_roles.retain(|rr| {
            !(rr.business_id == business_id && rr.route == route && rr.role_id == role_id)
        });
        Ok(state.route_roles.len() < before)
    }

    async fn roles_for_route(&self, business_id: Uuid, route: &str) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;
        Ok(DirectoryState::sorted(
            state
                .route_roles
                .iter()
                .filter(|rr| rr.business_id == business_id && rr.route == route)
                .filter_map(|rr| state.live_role(business_id, rr.role_id).cloned())
                .collect(),
        ))
    }

    async fn account_roles(&self, business_id: Uuid, account_id: Uuid) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;
        Ok(DirectoryState::sorted(
            state
                .account_roles
                .iter()
                .filter(|ar| ar.business_id == business_id && ar.account_id == account_id)
                .filter_map(|ar| state.live_role(business_id, ar.role_id).cloned())
                .collect(),
        ))
    }
}
