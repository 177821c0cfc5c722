//! Account store: registration, login lookup, active-account lookup and preferences.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use bizhub_core::error::{AppError, ErrorKind};
use bizhub_core::result::AppResult;
use bizhub_entity::account::{
    Account, AccountProfile, BusinessRegistration, CreateBusinessOwner,
};
use bizhub_entity::business::Business;
use bizhub_entity::preference::AccountPreference;

use super::map_write_error;

/// Accounts and their businesses.
///
/// Every lookup is scoped to a business and only returns active rows.
#[async_trait]
pub trait AccountStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create a business, its owner account and the owner's default
    /// preferences as one unit. A taken email fails with `Conflict` and
    /// leaves nothing behind.
    async fn create_business_with_owner(
        &self,
        input: CreateBusinessOwner,
    ) -> AppResult<BusinessRegistration>;

    /// Find the active account with this email inside an active business.
    /// The email is compared case-insensitively.
    async fn find_login_candidate(&self, email: &str) -> AppResult<Option<AccountProfile>>;

    /// Find an active account of an active business.
    async fn find_active(&self, account_id: Uuid, business_id: Uuid) -> AppResult<Option<Account>>;

    /// Find an active account together with its active business.
    async fn find_profile(
        &self,
        account_id: Uuid,
        business_id: Uuid,
    ) -> AppResult<Option<AccountProfile>>;

    /// Return the account's preferences, creating the default row if missing.
    async fn ensure_preferences(
        &self,
        business_id: Uuid,
        account_id: Uuid,
    ) -> AppResult<AccountPreference>;
}

/// PostgreSQL implementation of [`AccountStore`].
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Create a new account repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_business(&self, business_id: Uuid) -> AppResult<Option<Business>> {
        sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE id = $1 AND active = TRUE")
            .bind(business_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find business", e))
    }
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn create_business_with_owner(
        &self,
        input: CreateBusinessOwner,
    ) -> AppResult<BusinessRegistration> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to start registration", e)
        })?;

        let business = sqlx::query_as::<_, Business>(
            "INSERT INTO businesses (id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&input.business_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create business", e))?;

        let account = sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (id, business_id, email, password_hash, name, is_company_owner) \
             VALUES ($1, $2, $3, $4, $5, TRUE) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(business.id)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.owner_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            map_write_error(e, "Failed to create account", "Email already registered")
        })?;

        let preferences = sqlx::query_as::<_, AccountPreference>(
            "INSERT INTO account_preferences (business_id, account_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(business.id)
        .bind(account.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create preferences", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit registration", e)
        })?;

        Ok(BusinessRegistration {
            profile: AccountProfile { account, business },
            preferences,
        })
    }

    async fn find_login_candidate(&self, email: &str) -> AppResult<Option<AccountProfile>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT a.* FROM accounts a \
             JOIN businesses b ON b.id = a.business_id \
             WHERE LOWER(a.email) = LOWER($1) AND a.active = TRUE AND b.active = TRUE",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find account by email", e)
        })?;

        let Some(account) = account else {
            return Ok(None);
        };
        let business = self.find_business(account.business_id).await?;
        Ok(business.map(|business| AccountProfile { account, business }))
    }

    async fn find_active(&self, account_id: Uuid, business_id: Uuid) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>(
            "SELECT a.* FROM accounts a \
             JOIN businesses b ON b.id = a.business_id \
             WHERE a.id = $1 AND a.business_id = $2 AND a.active = TRUE AND b.active = TRUE",
        )
        .bind(account_id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find account", e))
    }

    async fn find_profile(
        &self,
        account_id: Uuid,
        business_id: Uuid,
    ) -> AppResult<Option<AccountProfile>> {
        let Some(account) = self.find_active(account_id, business_id).await? else {
            return Ok(None);
        };
        let business = self.find_business(business_id).await?;
        Ok(business.map(|business| AccountProfile { account, business }))
    }

    async fn ensure_preferences(
        &self,
        business_id: Uuid,
        account_id: Uuid,
    ) -> AppResult<AccountPreference> {
        sqlx::query(
            "INSERT INTO account_preferences (business_id, account_id) VALUES ($1, $2) \
             ON CONFLICT (business_id, account_id) DO NOTHING",
        )
        .bind(business_id)
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create preferences", e)
        })?;

        sqlx::query_as::<_, AccountPreference>(
            "SELECT * FROM account_preferences WHERE business_id = $1 AND account_id = $2",
        )
        .bind(business_id)
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load preferences", e))
    }
}
