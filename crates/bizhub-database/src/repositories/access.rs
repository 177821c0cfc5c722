//! Access store: roles, account-role grants and route-role grants.
//!
//! Every query that walks from an account or a route to a role joins
//! `roles` with `active = TRUE` and the same `business_id`. Callers never
//! see grants carried by a deactivated role or by another tenant's role.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use bizhub_core::error::{AppError, ErrorKind};
use bizhub_core::result::AppResult;
use bizhub_entity::access::{AccountRole, RouteRole};
use bizhub_entity::role::{CreateRole, Role};

use super::map_write_error;

/// Tenant-scoped role membership and route grants.
#[async_trait]
pub trait AccessStore: Send + Sync + std::fmt::Debug + 'static {
    /// Ids of the active roles the account holds in this business.
    async fn active_role_ids(&self, business_id: Uuid, account_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Whether `route` is granted to any of `role_ids` (active roles only).
    async fn route_granted(
        &self,
        business_id: Uuid,
        route: &str,
        role_ids: &[Uuid],
    ) -> AppResult<bool>;

    /// Distinct routes granted to any of `role_ids` (active roles only).
    async fn granted_routes(&self, business_id: Uuid, role_ids: &[Uuid]) -> AppResult<Vec<String>>;

    /// Create a role. Fails with `Conflict` if an active role already has the name.
    async fn create_role(&self, role: CreateRole) -> AppResult<Role>;

    /// Find an active role of this business.
    async fn find_role(&self, business_id: Uuid, role_id: Uuid) -> AppResult<Option<Role>>;

    /// List the business's active roles ordered by name.
    async fn list_roles(&self, business_id: Uuid) -> AppResult<Vec<Role>>;

    /// Soft-delete a role. Returns `false` if no active role matched.
    async fn deactivate_role(&self, business_id: Uuid, role_id: Uuid) -> AppResult<bool>;

    /// Give an account a role. Fails with `Conflict` on a duplicate grant.
    async fn assign_role(
        &self,
        business_id: Uuid,
        account_id: Uuid,
        role_id: Uuid,
    ) -> AppResult<AccountRole>;

    /// Take a role away from an account. Returns `false` if it was not held.
    async fn remove_role(&self, business_id: Uuid, account_id: Uuid, role_id: Uuid)
    -> AppResult<bool>;

    /// Grant a route to a role. Fails with `Conflict` on a duplicate grant.
    async fn grant_route(&self, business_id: Uuid, route: &str, role_id: Uuid)
    -> AppResult<RouteRole>;

    /// Revoke a route from a role. Returns `false` if it was not granted.
    async fn revoke_route(&self, business_id: Uuid, route: &str, role_id: Uuid) -> AppResult<bool>;

    /// Active roles granted `route`.
    async fn roles_for_route(&self, business_id: Uuid, route: &str) -> AppResult<Vec<Role>>;

    /// Active roles held by an account.
    async fn account_roles(&self, business_id: Uuid, account_id: Uuid) -> AppResult<Vec<Role>>;
}

/// PostgreSQL implementation of [`AccessStore`].
#[derive(Debug, Clone)]
pub struct AccessRepository {
    pool: PgPool,
}

impl AccessRepository {
    /// Create a new access repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessStore for AccessRepository {
    async fn active_role_ids(&self, business_id: Uuid, account_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT ar.role_id FROM account_roles ar \
             JOIN roles r ON r.id = ar.role_id AND r.business_id = ar.business_id \
             WHERE ar.business_id = $1 AND ar.account_id = $2 AND r.active = TRUE",
        )
        .bind(business_id)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load account roles", e))
    }

    async fn route_granted(
        &self,
        business_id: Uuid,
        route: &str,
        role_ids: &[Uuid],
    ) -> AppResult<bool> {
        if role_ids.is_empty() {
            return Ok(false);
        }
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                SELECT 1 FROM route_roles rr \
                JOIN roles r ON r.id = rr.role_id AND r.business_id = rr.business_id \
                WHERE rr.business_id = $1 AND rr.route = $2 AND rr.role_id = ANY($3) \
                  AND r.active = TRUE \
             )",
        )
        .bind(business_id)
        .bind(route)
        .bind(role_ids)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check route grant", e))
    }

    async fn granted_routes(&self, business_id: Uuid, role_ids: &[Uuid]) -> AppResult<Vec<String>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT rr.route FROM route_roles rr \
             JOIN roles r ON r.id = rr.role_id AND r.business_id = rr.business_id \
             WHERE rr.business_id = $1 AND rr.role_id = ANY($2) AND r.active = TRUE \
             ORDER BY rr.route",
        )
        .bind(business_id)
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list granted routes", e))
    }

    async fn create_role(&self, role: CreateRole) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO roles (id, business_id, name, color) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(role.business_id)
        .bind(&role.name)
        .bind(&role.color)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                "Failed to create role",
                &format!("A role named '{}' already exists", role.name),
            )
        })
    }

    async fn find_role(&self, business_id: Uuid, role_id: Uuid) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE id = $1 AND business_id = $2 AND active = TRUE",
        )
        .bind(role_id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find role", e))
    }

    async fn list_roles(&self, business_id: Uuid) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE business_id = $1 AND active = TRUE ORDER BY name",
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list roles", e))
    }

    async fn deactivate_role(&self, business_id: Uuid, role_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE roles SET active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND business_id = $2 AND active = TRUE",
        )
        .bind(role_id)
        .bind(business_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to deactivate role", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn assign_role(
        &self,
        business_id: Uuid,
        account_id: Uuid,
        role_id: Uuid,
    ) -> AppResult<AccountRole> {
        sqlx::query_as::<_, AccountRole>(
            "INSERT INTO account_roles (business_id, account_id, role_id) VALUES ($1, $2, $3) \
             RETURNING *",
        )
        .bind(business_id)
        .bind(account_id)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(e, "Failed to assign role", "The account already holds this role")
        })
    }

    async fn remove_role(
        &self,
        business_id: Uuid,
        account_id: Uuid,
        role_id: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM account_roles WHERE business_id = $1 AND account_id = $2 AND role_id = $3",
        )
        .bind(business_id)
        .bind(account_id)
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to remove role", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn grant_route(
        &self,
        business_id: Uuid,
        route: &str,
        role_id: Uuid,
    ) -> AppResult<RouteRole> {
        sqlx::query_as::<_, RouteRole>(
            "INSERT INTO route_roles (business_id, route, role_id) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(business_id)
        .bind(route)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                "Failed to grant route",
                "This role already has permission for this route",
            )
        })
    }

    async fn revoke_route(&self, business_id: Uuid, route: &str, role_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM route_roles WHERE business_id = $1 AND route = $2 AND role_id = $3",
        )
        .bind(business_id)
        .bind(route)
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke route", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn roles_for_route(&self, business_id: Uuid, route: &str) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, Role>(
            "SELECT r.* FROM route_roles rr \
             JOIN roles r ON r.id = rr.role_id AND r.business_id = rr.business_id \
             WHERE rr.business_id = $1 AND rr.route = $2 AND r.active = TRUE \
             ORDER BY r.name",
        )
        .bind(business_id)
        .bind(route)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list roles for route", e)
        })
    }

    async fn account_roles(&self, business_id: Uuid, account_id: Uuid) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, Role>(
            "SELECT r.* FROM account_roles ar \
             JOIN roles r ON r.id = ar.role_id AND r.business_id = ar.business_id \
             WHERE ar.business_id = $1 AND ar.account_id = $2 AND r.active = TRUE \
             ORDER BY r.name",
        )
        .bind(business_id)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list account roles", e))
    }
}
