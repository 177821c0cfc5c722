//! Authentication gateway: per-request identity and route checks, registration,
//! login and logout.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use bizhub_core::config::AuthConfig;
use bizhub_core::error::{AppError, ErrorKind};
use bizhub_database::AccountStore;
use bizhub_entity::account::{AccountProfile, BusinessRegistration, CreateBusinessOwner};
use bizhub_entity::audit::{AuditContext, CreateAuditLogEntry};
use bizhub_entity::preference::AccountPreference;

use crate::audit::AuditRecorder;
use crate::error::{AuthError, LoginError, LogoutError, RegisterError, TokenError};
use crate::password::PasswordHasher;
use crate::permission::{AccessDecision, GrantSource, PermissionResolver};
use crate::rate_limit::{RateDecision, RateLimiter};
use crate::revocation::RevocationStore;
use crate::session::SessionRegistry;
use crate::token::{Claims, TokenCodec, TokenHasher, TokenSubject};

/// Shortest password accepted at registration, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Network identity of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    /// Best-effort client address; also the login rate-limit key.
    pub ip_address: String,
    pub user_agent: Option<String>,
}

impl ClientContext {
    pub fn new(ip_address: impl Into<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            user_agent,
        }
    }

    /// A caller whose address could not be determined.
    pub fn unknown() -> Self {
        Self::new("unknown", None)
    }

    fn stamp(&self, entry: CreateAuditLogEntry) -> CreateAuditLogEntry {
        entry.with_client(Some(self.ip_address.clone()), self.user_agent.clone())
    }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub account_id: Uuid,
    pub business_id: Uuid,
    pub email: String,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            account_id: claims.account_id,
            business_id: claims.business_id,
            email: claims.email,
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    /// Bearer token for subsequent requests.
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub principal: Principal,
    /// The account and its business.
    pub profile: AccountProfile,
    pub preferences: AccountPreference,
}

/// Entry point for every authentication and authorization decision.
#[derive(Clone)]
pub struct AuthGateway {
    codec: Arc<TokenCodec>,
    revocations: Arc<RevocationStore>,
    sessions: Arc<SessionRegistry>,
    resolver: Arc<PermissionResolver>,
    accounts: Arc<dyn AccountStore>,
    passwords: Arc<dyn PasswordHasher>,
    rate_limiter: Arc<dyn RateLimiter>,
    audit: Arc<AuditRecorder>,
    token_ttl: Duration,
    login_limit: u32,
    login_window: Duration,
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGateway")
            .field("token_ttl", &self.token_ttl)
            .field("login_limit", &self.login_limit)
            .field("login_window", &self.login_window)
            .finish()
    }
}

impl AuthGateway {
    /// Creates a new gateway.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        codec: Arc<TokenCodec>,
        revocations: Arc<RevocationStore>,
        sessions: Arc<SessionRegistry>,
        resolver: Arc<PermissionResolver>,
        accounts: Arc<dyn AccountStore>,
        passwords: Arc<dyn PasswordHasher>,
        rate_limiter: Arc<dyn RateLimiter>,
        audit: Arc<AuditRecorder>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            codec,
            revocations,
            sessions,
            resolver,
            accounts,
            passwords,
            rate_limiter,
            audit,
            token_ttl: config.token_ttl(),
            login_limit: config.login_rate_limit.limit,
            login_window: config.login_rate_limit.window(),
        }
    }

    /// Extracts the token from an `Authorization: Bearer <token>` value.
    pub fn bearer_token(header: Option<&str>) -> Option<&str> {
        let (scheme, token) = header?.trim().split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
    }

    /// Authenticates a request from its `Authorization` header value.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, AuthError> {
        let raw = Self::bearer_token(authorization).ok_or(AuthError::MissingToken)?;
        self.authenticate_token(raw).await
    }

    /// Authenticates a raw bearer token.
    ///
    /// Steps, each rejecting before the next runs:
    /// 1. Verify signature and expiry
    /// 2. Check the revocation cache
    /// 3. Require a live session record in the token's business
    pub async fn authenticate_token(&self, raw: &str) -> Result<Principal, AuthError> {
        // 1. Signature, then expiry
        let claims = self.codec.verify(raw)?;

        // 2. Fast-path revocation; the registry below stays authoritative
        match self.revocations.is_revoked(raw).await {
            Ok(true) => return Err(AuthError::Revoked),
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "Revocation cache unavailable, relying on session registry");
            }
        }

        // 3. Durable session record
        let digest = TokenHasher::digest(raw);
        let record = self
            .sessions
            .live_record(&digest, claims.account_id)
            .await
            .map_err(AuthError::Unavailable)?;

        match record {
            Some(record) if record.business_id == claims.business_id => Ok(claims.into()),
            _ => Err(AuthError::SessionInactive),
        }
    }

    /// Checks that `principal` may reach `route`. Denials are audited.
    pub async fn authorize(
        &self,
        principal: &Principal,
        route: &str,
        client: &ClientContext,
    ) -> Result<GrantSource, AuthError> {
        let decision = self
            .resolver
            .can_access(principal.account_id, principal.business_id, route)
            .await
            .map_err(AuthError::Unavailable)?;

        match decision {
            AccessDecision::Authorized(source) => {
                debug!(account_id = %principal.account_id, route = route, ?source, "Access granted");
                Ok(source)
            }
            AccessDecision::Denied(reason) => {
                info!(
                    account_id = %principal.account_id,
                    business_id = %principal.business_id,
                    route = route,
                    ?reason,
                    "Access denied"
                );
                self.audit
                    .record(
                        client.stamp(
                            CreateAuditLogEntry::new(
                                principal.business_id,
                                Some(principal.account_id),
                                AuditContext::AuthDeny,
                                format!("Access denied to {route}"),
                            )
                            .with_data(serde_json::json!({ "route": route, "reason": reason })),
                        ),
                    )
                    .await;
                Err(AuthError::Forbidden {
                    route: route.to_string(),
                })
            }
        }
    }

    /// Requires `principal` to be the company owner of its business.
    pub async fn require_owner(&self, principal: &Principal) -> Result<(), AuthError> {
        let is_owner = self
            .resolver
            .is_owner(principal.account_id, principal.business_id)
            .await
            .map_err(AuthError::Unavailable)?;

        if is_owner {
            Ok(())
        } else {
            Err(AuthError::OwnerRequired)
        }
    }

    /// Routes `principal` can reach.
    pub async fn accessible_routes(&self, principal: &Principal) -> Result<BTreeSet<String>, AuthError> {
        self.resolver
            .list_accessible_routes(principal.account_id, principal.business_id)
            .await
            .map_err(AuthError::Unavailable)
    }

    /// The account and business behind `principal`.
    pub async fn profile(&self, principal: &Principal) -> Result<AccountProfile, AuthError> {
        self.accounts
            .find_profile(principal.account_id, principal.business_id)
            .await
            .map_err(AuthError::Unavailable)?
            .ok_or(AuthError::SessionInactive)
    }

    /// Preferences of `principal`, created with defaults on first read.
    pub async fn preferences(&self, principal: &Principal) -> Result<AccountPreference, AuthError> {
        self.accounts
            .ensure_preferences(principal.business_id, principal.account_id)
            .await
            .map_err(AuthError::Unavailable)
    }

    /// Opens a new business with `email` as its company owner.
    ///
    /// Steps:
    /// 1. Normalize and check the input
    /// 2. Hash the password
    /// 3. Create business, owner and default preferences as one unit
    /// 4. Audit the business and the account creation
    pub async fn register(
        &self,
        business_name: &str,
        owner_name: &str,
        email: &str,
        password: &str,
        client: &ClientContext,
    ) -> Result<BusinessRegistration, RegisterError> {
        // 1. Input
        let business_name = business_name.trim();
        let owner_name = owner_name.trim();
        let email = email.trim().to_lowercase();
        if business_name.is_empty() || owner_name.is_empty() || email.is_empty() {
            return Err(RegisterError::Invalid(
                "Business name, name and email are required".into(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(RegisterError::Invalid(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        // 2. Password hash
        let password_hash = self
            .passwords
            .hash(password)
            .map_err(RegisterError::Unavailable)?;

        // 3. Business, owner, preferences
        let registration = self
            .accounts
            .create_business_with_owner(CreateBusinessOwner {
                business_name: business_name.to_string(),
                owner_name: owner_name.to_string(),
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e.kind {
                ErrorKind::Conflict => RegisterError::EmailTaken,
                _ => RegisterError::Unavailable(e),
            })?;

        // 4. Audit
        let account = &registration.profile.account;
        let business = &registration.profile.business;
        self.audit
            .record(
                client.stamp(
                    CreateAuditLogEntry::new(
                        business.id,
                        Some(account.id),
                        AuditContext::BusinessCreate,
                        format!("Business \"{}\" created during registration", business.name),
                    )
                    .with_data(serde_json::json!({
                        "business_name": business.name,
                        "created_by": account.email,
                    })),
                ),
            )
            .await;
        self.audit
            .record(
                client.stamp(
                    CreateAuditLogEntry::new(
                        business.id,
                        Some(account.id),
                        AuditContext::AccountCreate,
                        format!("Owner account created for \"{}\"", business.name),
                    )
                    .with_data(serde_json::json!({
                        "account_email": account.email,
                        "business_name": business.name,
                    })),
                ),
            )
            .await;

        info!(
            business_id = %business.id,
            account_id = %account.id,
            ip = %client.ip_address,
            "Business registered"
        );
        Ok(registration)
    }

    /// Performs the login flow.
    ///
    /// Steps:
    /// 1. Count the attempt against the client's rate limit
    /// 2. Find the active account by normalized email
    /// 3. Verify the password
    /// 4. Sign a token
    /// 5. Ensure default preferences exist
    /// 6. Record the session (last durable write)
    /// 7. Audit the login
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientContext,
    ) -> Result<LoginResult, LoginError> {
        // 1. Rate limit
        if let RateDecision::Denied { retry_after } = self
            .rate_limiter
            .check(&client.ip_address, self.login_limit, self.login_window)
            .await
        {
            warn!(ip = %client.ip_address, ?retry_after, "Login rate limited");
            return Err(LoginError::RateLimited { retry_after });
        }

        // 2. Candidate lookup
        let email = email.trim().to_lowercase();
        let profile = self
            .accounts
            .find_login_candidate(&email)
            .await
            .map_err(LoginError::Unavailable)?;

        let Some(profile) = profile else {
            warn!(ip = %client.ip_address, "Login failed: unknown or inactive account");
            return Err(LoginError::InvalidCredentials);
        };
        if !profile.is_active() {
            warn!(account_id = %profile.account.id, "Login failed: inactive account");
            return Err(LoginError::InvalidCredentials);
        }
        let account = &profile.account;

        // 3. Password
        let matches = match self.passwords.verify(password, &account.password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                error!(account_id = %account.id, error = %e, "Stored password hash is unusable");
                false
            }
        };
        if !matches {
            warn!(account_id = %account.id, ip = %client.ip_address, "Login failed: wrong password");
            self.audit
                .record(client.stamp(CreateAuditLogEntry::new(
                    account.business_id,
                    Some(account.id),
                    AuditContext::AuthDeny,
                    "Login failed: invalid password",
                )))
                .await;
            return Err(LoginError::InvalidCredentials);
        }

        // 4. Token
        let issued = self
            .codec
            .issue(
                &TokenSubject {
                    account_id: account.id,
                    business_id: account.business_id,
                    email: account.email.clone(),
                },
                self.token_ttl,
            )
            .map_err(|e| LoginError::Unavailable(AppError::internal(e.to_string())))?;

        // 5. Preferences
        let preferences = self
            .accounts
            .ensure_preferences(account.business_id, account.id)
            .await
            .map_err(LoginError::Unavailable)?;

        // 6. Session record
        self.sessions
            .create(
                account.business_id,
                account.id,
                &TokenHasher::digest(&issued.token),
                issued.expires_at,
            )
            .await
            .map_err(LoginError::Unavailable)?;

        // 7. Audit
        self.audit
            .record(client.stamp(CreateAuditLogEntry::new(
                account.business_id,
                Some(account.id),
                AuditContext::AuthLogin,
                "User logged in",
            )))
            .await;

        info!(
            account_id = %account.id,
            business_id = %account.business_id,
            ip = %client.ip_address,
            "User logged in"
        );

        let principal = Principal {
            account_id: account.id,
            business_id: account.business_id,
            email: account.email.clone(),
        };

        Ok(LoginResult {
            token: issued.token,
            expires_at: issued.expires_at,
            principal,
            profile,
            preferences,
        })
    }

    /// Logs out the session behind `raw`. Idempotent.
    ///
    /// Steps:
    /// 1. Deactivate the session record owned by the principal
    /// 2. Revoke the token for its remaining lifetime
    /// 3. Audit the logout
    pub async fn logout(
        &self,
        raw: &str,
        principal: &Principal,
        client: &ClientContext,
    ) -> Result<(), LogoutError> {
        // 1. Durable deactivation first; this is what makes logout stick
        let changed = self
            .sessions
            .deactivate(&TokenHasher::digest(raw), principal.account_id)
            .await
            .map_err(LogoutError::Unavailable)?;

        // 2. Fast-path revocation
        let remaining = self.codec.remaining_lifetime(raw);
        if let Err(e) = self.revocations.revoke(raw, remaining).await {
            warn!(
                account_id = %principal.account_id,
                error = %e,
                "Failed to revoke token in cache; session already deactivated"
            );
        }

        // 3. Audit
        self.audit
            .record(client.stamp(CreateAuditLogEntry::new(
                principal.business_id,
                Some(principal.account_id),
                AuditContext::AuthLogout,
                "User logged out",
            )))
            .await;

        info!(
            account_id = %principal.account_id,
            session_changed = changed,
            "User logged out"
        );
        Ok(())
    }

    /// Logs out using only the raw token.
    ///
    /// The signature must verify. An expired token has nothing left to
    /// revoke and succeeds without side effects.
    pub async fn logout_token(&self, raw: &str, client: &ClientContext) -> Result<(), LogoutError> {
        let principal: Principal = match self.codec.verify(raw) {
            Ok(claims) => claims.into(),
            Err(TokenError::Expired) => {
                debug!("Logout with expired token");
                return Ok(());
            }
            Err(_) => return Err(LogoutError::InvalidToken),
        };
        self.logout(raw, &principal, client).await
    }
}
