//! Shared harness: the whole auth core wired over in-memory stores and a
//! manual clock.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use bizhub_auth::{
    AccessAdmin, AuditRecorder, AuthGateway, ClientContext, MemoryRateLimiter, PasswordHasher,
    PermissionResolver, RevocationStore, SessionRegistry, TokenCodec,
};
use bizhub_cache::memory::MemoryCacheProvider;
use bizhub_cache::provider::CacheManager;
use bizhub_core::config::{AuthConfig, MemoryCacheConfig};
use bizhub_core::error::AppError;
use bizhub_core::result::AppResult;
use bizhub_core::traits::{CacheProvider, ManualClock};
use bizhub_database::{AccessStore, MemoryAuditSink, MemoryDirectory, MemorySessionStore};
use bizhub_entity::access::{AccountRole, RouteRole};
use bizhub_entity::account::Account;
use bizhub_entity::business::Business;
use bizhub_entity::role::{CreateRole, Role};

pub const SECRET: &str = "test-secret-please-change";

/// Stores `plain:<password>`; Argon2 is exercised in its own unit tests.
#[derive(Debug)]
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, AppError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        Ok(hash == format!("plain:{password}"))
    }
}

/// Cache that can be switched off to simulate an outage.
#[derive(Debug)]
pub struct FlakyCache {
    inner: MemoryCacheProvider,
    down: AtomicBool,
}

impl FlakyCache {
    fn new() -> Self {
        Self {
            inner: MemoryCacheProvider::new(&MemoryCacheConfig { max_capacity: 10_000 }, 300),
            down: AtomicBool::new(false),
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(AppError::cache("cache offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheProvider for FlakyCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.check()?;
        self.inner.exists(key).await
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        self.check()?;
        self.inner.incr(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        self.check()?;
        self.inner.expire(key, ttl).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.check()?;
        Ok(true)
    }
}

/// Access store that counts role and grant lookups.
#[derive(Debug)]
pub struct CountingAccess {
    inner: Arc<MemoryDirectory>,
    role_queries: AtomicUsize,
}

impl CountingAccess {
    pub fn role_queries(&self) -> usize {
        self.role_queries.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.role_queries.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccessStore for CountingAccess {
    async fn active_role_ids(&self, business_id: Uuid, account_id: Uuid) -> AppResult<Vec<Uuid>> {
        self.bump();
        self.inner.active_role_ids(business_id, account_id).await
    }

    async fn route_granted(&self, business_id: Uuid, route: &str, role_ids: &[Uuid]) -> AppResult<bool> {
        self.bump();
        self.inner.route_granted(business_id, route, role_ids).await
    }

    async fn granted_routes(&self, business_id: Uuid, role_ids: &[Uuid]) -> AppResult<Vec<String>> {
        self.bump();
        self.inner.granted_routes(business_id, role_ids).await
    }

    async fn create_role(&self, role: CreateRole) -> AppResult<Role> {
        self.inner.create_role(role).await
    }

    async fn find_role(&self, business_id: Uuid, role_id: Uuid) -> AppResult<Option<Role>> {
        self.inner.find_role(business_id, role_id).await
    }

    async fn list_roles(&self, business_id: Uuid) -> AppResult<Vec<Role>> {
        self.inner.list_roles(business_id).await
    }

    async fn deactivate_role(&self, business_id: Uuid, role_id: Uuid) -> AppResult<bool> {
        self.inner.deactivate_role(business_id, role_id).await
    }

    async fn assign_role(&self, business_id: Uuid, account_id: Uuid, role_id: Uuid) -> AppResult<AccountRole> {
        self.inner.assign_role(business_id, account_id, role_id).await
    }

    async fn remove_role(&self, business_id: Uuid, account_id: Uuid, role_id: Uuid) -> AppResult<bool> {
        self.inner.remove_role(business_id, account_id, role_id).await
    }

    async fn grant_route(&self, business_id: Uuid, route: &str, role_id: Uuid) -> AppResult<RouteRole> {
        self.inner.grant_route(business_id, route, role_id).await
    }

    async fn revoke_route(&self, business_id: Uuid, route: &str, role_id: Uuid) -> AppResult<bool> {
        self.inner.revoke_route(business_id, route, role_id).await
    }

    async fn roles_for_route(&self, business_id: Uuid, route: &str) -> AppResult<Vec<Role>> {
        self.inner.roles_for_route(business_id, route).await
    }

    async fn account_roles(&self, business_id: Uuid, account_id: Uuid) -> AppResult<Vec<Role>> {
        self.inner.account_roles(business_id, account_id).await
    }
}

pub struct Harness {
    pub gateway: Arc<AuthGateway>,
    pub admin: AccessAdmin,
    pub resolver: Arc<PermissionResolver>,
    pub codec: Arc<TokenCodec>,
    pub registry: Arc<SessionRegistry>,
    pub directory: Arc<MemoryDirectory>,
    pub sessions: Arc<MemorySessionStore>,
    pub access: Arc<CountingAccess>,
    pub audit: Arc<MemoryAuditSink>,
    pub cache: Arc<FlakyCache>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::default());
        let directory = Arc::new(MemoryDirectory::new());
        let sessions = Arc::new(MemorySessionStore::new(directory.clone()));
        let access = Arc::new(CountingAccess {
            inner: directory.clone(),
            role_queries: AtomicUsize::new(0),
        });
        let audit = Arc::new(MemoryAuditSink::new());
        let cache = Arc::new(FlakyCache::new());
        let cache_manager = Arc::new(CacheManager::from_provider(cache.clone()));

        let config = AuthConfig {
            jwt_secret: SECRET.to_string(),
            ..AuthConfig::default()
        };

        let codec = Arc::new(TokenCodec::new(&config.jwt_secret, clock.clone()));
        let registry = Arc::new(SessionRegistry::new(sessions.clone(), clock.clone()));
        let resolver = Arc::new(PermissionResolver::new(directory.clone(), access.clone()));
        let recorder = Arc::new(AuditRecorder::new(audit.clone(), config.audit_timeout()));

        let gateway = Arc::new(AuthGateway::new(
            codec.clone(),
            Arc::new(RevocationStore::new(cache_manager, clock.clone())),
            registry.clone(),
            resolver.clone(),
            directory.clone(),
            Arc::new(PlainHasher),
            Arc::new(MemoryRateLimiter::new(
                clock.clone(),
                config.login_rate_limit.sweep_interval(),
            )),
            recorder.clone(),
            &config,
        ));
        let admin = AccessAdmin::new(gateway.clone(), directory.clone(), access.clone(), recorder);

        Self {
            gateway,
            admin,
            resolver,
            codec,
            registry,
            directory,
            sessions,
            access,
            audit,
            cache,
            clock,
        }
    }

    pub async fn business(&self, name: &str) -> Business {
        self.directory.add_business(name).await
    }

    pub async fn account(&self, business: &Business, email: &str, password: &str, owner: bool) -> Account {
        let hash = PlainHasher.hash(password).unwrap();
        self.directory
            .add_account(business.id, email, &hash, owner)
            .await
            .unwrap()
    }

    pub async fn role(&self, business: &Business, name: &str) -> Role {
        self.directory
            .create_role(CreateRole {
                business_id: business.id,
                name: name.to_string(),
                color: None,
            })
            .await
            .unwrap()
    }
}

pub fn client(ip: &str) -> ClientContext {
    ClientContext::new(ip, Some("integration-test".to_string()))
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
