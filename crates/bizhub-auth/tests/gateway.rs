//! Login, per-request authentication and logout over in-memory stores.

mod common;

use chrono::Duration;

use bizhub_auth::{AuthError, LoginError, RegisterError, TokenCodec};
use bizhub_auth::token::TokenSubject;
use bizhub_core::traits::Clock;
use bizhub_entity::audit::AuditContext;
use bizhub_entity::preference::Theme;

use common::{Harness, bearer, client};

#[tokio::test]
async fn test_login_then_authenticate() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    let account = h.account(&acme, "ana@acme.test", "s3cret", false).await;

    let login = h
        .gateway
        .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
        .await
        .unwrap();

    assert_eq!(login.principal.account_id, account.id);
    assert_eq!(login.principal.business_id, acme.id);
    assert_eq!(login.profile.business.id, acme.id);
    assert_eq!(login.preferences.theme, Theme::Light);
    assert_eq!(login.expires_at, {
        let claims = h.codec.verify(&login.token).unwrap();
        claims.expires_at()
    });

    let records = h.sessions.records_for(account.id).await;
    assert_eq!(records.len(), 1);
    assert!(records[0].active);
    assert_ne!(records[0].token_digest, login.token);

    let principal = h
        .gateway
        .authenticate(Some(&bearer(&login.token)))
        .await
        .unwrap();
    assert_eq!(principal, login.principal);

    assert_eq!(h.audit.contexts().await, vec![AuditContext::AuthLogin]);
    let entry = &h.audit.entries().await[0];
    assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.1"));
    assert_eq!(entry.account_id, Some(account.id));
}

#[tokio::test]
async fn test_login_normalizes_email() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    h.account(&acme, "ana@acme.test", "s3cret", false).await;

    let login = h
        .gateway
        .login("  Ana@ACME.test ", "s3cret", &client("10.0.0.1"))
        .await
        .unwrap();
    assert_eq!(login.principal.email, "ana@acme.test");
}

#[tokio::test]
async fn test_wrong_password_is_audited_and_creates_no_session() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    let account = h.account(&acme, "ana@acme.test", "s3cret", false).await;

    let err = h
        .gateway
        .login("ana@acme.test", "nope", &client("10.0.0.1"))
        .await
        .unwrap_err();

    assert!(matches!(err, LoginError::InvalidCredentials));
    assert!(h.sessions.records_for(account.id).await.is_empty());
    assert_eq!(h.audit.contexts().await, vec![AuditContext::AuthDeny]);
}

#[tokio::test]
async fn test_unknown_or_inactive_accounts_cannot_log_in() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    let ana = h.account(&acme, "ana@acme.test", "s3cret", false).await;

    assert!(matches!(
        h.gateway
            .login("ghost@acme.test", "s3cret", &client("10.0.0.1"))
            .await,
        Err(LoginError::InvalidCredentials)
    ));

    h.directory.set_account_active(ana.id, false).await;
    assert!(matches!(
        h.gateway
            .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
            .await,
        Err(LoginError::InvalidCredentials)
    ));

    h.directory.set_account_active(ana.id, true).await;
    h.directory.set_business_active(acme.id, false).await;
    assert!(matches!(
        h.gateway
            .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
            .await,
        Err(LoginError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_login_rate_limit_per_client() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    h.account(&acme, "ana@acme.test", "s3cret", false).await;

    for _ in 0..5 {
        let _ = h
            .gateway
            .login("ana@acme.test", "wrong", &client("10.0.0.1"))
            .await;
    }

    // The sixth attempt is refused even with the right password.
    match h
        .gateway
        .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
        .await
    {
        Err(LoginError::RateLimited { retry_after }) => {
            assert!(retry_after <= std::time::Duration::from_secs(60));
        }
        other => panic!("expected rate limit, got {other:?}"),
    }

    // Another client is unaffected.
    assert!(
        h.gateway
            .login("ana@acme.test", "s3cret", &client("10.0.0.2"))
            .await
            .is_ok()
    );

    // The window resets.
    h.clock.advance(Duration::seconds(60));
    assert!(
        h.gateway
            .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_authentication_failures() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    h.account(&acme, "ana@acme.test", "s3cret", false).await;
    let login = h
        .gateway
        .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
        .await
        .unwrap();

    assert!(matches!(
        h.gateway.authenticate(None).await,
        Err(AuthError::MissingToken)
    ));
    assert!(matches!(
        h.gateway.authenticate(Some("Basic abc")).await,
        Err(AuthError::MissingToken)
    ));
    assert!(matches!(
        h.gateway.authenticate(Some("Bearer not.a.token")).await,
        Err(AuthError::InvalidToken)
    ));

    let foreign = TokenCodec::new("some-other-secret", h.clock.clone())
        .issue(
            &TokenSubject {
                account_id: login.principal.account_id,
                business_id: login.principal.business_id,
                email: login.principal.email.clone(),
            },
            Duration::hours(1),
        )
        .unwrap();
    assert!(matches!(
        h.gateway.authenticate(Some(&bearer(&foreign.token))).await,
        Err(AuthError::InvalidToken)
    ));

    h.clock.advance(Duration::days(7));
    assert!(matches!(
        h.gateway.authenticate(Some(&bearer(&login.token))).await,
        Err(AuthError::ExpiredToken)
    ));
}

#[tokio::test]
async fn test_signed_token_without_session_is_rejected() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    let ana = h.account(&acme, "ana@acme.test", "s3cret", false).await;

    let issued = h
        .codec
        .issue(
            &TokenSubject {
                account_id: ana.id,
                business_id: acme.id,
                email: ana.email.clone(),
            },
            Duration::hours(1),
        )
        .unwrap();

    assert!(matches!(
        h.gateway.authenticate(Some(&bearer(&issued.token))).await,
        Err(AuthError::SessionInactive)
    ));
}

#[tokio::test]
async fn test_deactivation_ends_live_sessions() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    let ana = h.account(&acme, "ana@acme.test", "s3cret", false).await;
    let login = h
        .gateway
        .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
        .await
        .unwrap();

    h.directory.set_account_active(ana.id, false).await;
    assert!(matches!(
        h.gateway.authenticate(Some(&bearer(&login.token))).await,
        Err(AuthError::SessionInactive)
    ));

    h.directory.set_account_active(ana.id, true).await;
    h.directory.set_business_active(acme.id, false).await;
    assert!(matches!(
        h.gateway.authenticate(Some(&bearer(&login.token))).await,
        Err(AuthError::SessionInactive)
    ));
}

#[tokio::test]
async fn test_logout_revokes_and_is_idempotent() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    let ana = h.account(&acme, "ana@acme.test", "s3cret", false).await;
    let login = h
        .gateway
        .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
        .await
        .unwrap();

    h.gateway
        .logout(&login.token, &login.principal, &client("10.0.0.1"))
        .await
        .unwrap();

    assert!(matches!(
        h.gateway.authenticate(Some(&bearer(&login.token))).await,
        Err(AuthError::Revoked)
    ));
    assert!(!h.sessions.records_for(ana.id).await[0].active);

    h.gateway
        .logout(&login.token, &login.principal, &client("10.0.0.1"))
        .await
        .unwrap();
    h.gateway
        .logout_token(&login.token, &client("10.0.0.1"))
        .await
        .unwrap();

    assert_eq!(
        h.audit.contexts().await,
        vec![
            AuditContext::AuthLogin,
            AuditContext::AuthLogout,
            AuditContext::AuthLogout,
            AuditContext::AuthLogout,
        ]
    );
}

#[tokio::test]
async fn test_logout_only_ends_that_session() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    h.account(&acme, "ana@acme.test", "s3cret", false).await;
    let laptop = h
        .gateway
        .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
        .await
        .unwrap();
    let phone = h
        .gateway
        .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
        .await
        .unwrap();
    assert_ne!(laptop.token, phone.token);

    h.gateway
        .logout(&laptop.token, &laptop.principal, &client("10.0.0.1"))
        .await
        .unwrap();

    assert!(h.gateway.authenticate(Some(&bearer(&laptop.token))).await.is_err());
    assert!(h.gateway.authenticate(Some(&bearer(&phone.token))).await.is_ok());
}

#[tokio::test]
async fn test_logout_sticks_while_cache_is_down() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    h.account(&acme, "ana@acme.test", "s3cret", false).await;
    let login = h
        .gateway
        .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
        .await
        .unwrap();

    h.cache.set_down(true);
    h.gateway
        .logout(&login.token, &login.principal, &client("10.0.0.1"))
        .await
        .unwrap();

    assert!(matches!(
        h.gateway.authenticate(Some(&bearer(&login.token))).await,
        Err(AuthError::SessionInactive)
    ));

    h.cache.set_down(false);
    assert!(h.gateway.authenticate(Some(&bearer(&login.token))).await.is_err());
}

#[tokio::test]
async fn test_live_session_survives_cache_outage() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    h.account(&acme, "ana@acme.test", "s3cret", false).await;
    let login = h
        .gateway
        .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
        .await
        .unwrap();

    h.cache.set_down(true);
    assert!(h.gateway.authenticate(Some(&bearer(&login.token))).await.is_ok());
}

#[tokio::test]
async fn test_audit_failure_does_not_fail_login_or_logout() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    h.account(&acme, "ana@acme.test", "s3cret", false).await;
    h.audit.set_failing(true);

    let login = h
        .gateway
        .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
        .await
        .unwrap();
    h.gateway
        .logout(&login.token, &login.principal, &client("10.0.0.1"))
        .await
        .unwrap();
    assert!(h.audit.entries().await.is_empty());
}

#[tokio::test]
async fn test_logout_token_rejects_foreign_signature() {
    let h = Harness::new();
    let foreign = TokenCodec::new("some-other-secret", h.clock.clone())
        .issue(
            &TokenSubject {
                account_id: uuid::Uuid::new_v4(),
                business_id: uuid::Uuid::new_v4(),
                email: "x@y.z".into(),
            },
            Duration::hours(1),
        )
        .unwrap();
    assert!(
        h.gateway
            .logout_token(&foreign.token, &client("10.0.0.1"))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_expired_sessions_are_swept() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    let ana = h.account(&acme, "ana@acme.test", "s3cret", false).await;
    h.gateway
        .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
        .await
        .unwrap();

    h.clock.advance(Duration::days(8));
    assert!(h.clock.now() > h.sessions.records_for(ana.id).await[0].expires_at);
    assert_eq!(h.registry.deactivate_expired().await.unwrap(), 1);
    assert!(h.sessions.records_for(ana.id).await.is_empty());
}

#[tokio::test]
async fn test_register_opens_business_for_owner() {
    let h = Harness::new();
    let ip = client("10.0.0.9");

    let registered = h
        .gateway
        .register(" Acme Ltda ", "Bia", "Bia@Acme.test", "s3cret", &ip)
        .await
        .unwrap();
    let account = &registered.profile.account;
    let business = &registered.profile.business;
    assert_eq!(business.name, "Acme Ltda");
    assert_eq!(account.email, "bia@acme.test");
    assert!(account.is_company_owner);
    assert_eq!(account.password_hash, "plain:s3cret");
    assert_eq!(registered.preferences.theme, Theme::Light);

    assert_eq!(
        h.audit.contexts().await,
        vec![AuditContext::BusinessCreate, AuditContext::AccountCreate]
    );
    let entries = h.audit.entries().await;
    assert!(entries.iter().all(|e| e.business_id == business.id));
    assert!(entries.iter().all(|e| e.ip_address.as_deref() == Some("10.0.0.9")));

    let login = h.gateway.login("bia@acme.test", "s3cret", &ip).await.unwrap();
    assert_eq!(login.principal.business_id, business.id);
    h.gateway.require_owner(&login.principal).await.unwrap();
    assert!(
        h.gateway
            .accessible_routes(&login.principal)
            .await
            .unwrap()
            .contains("/business-admin")
    );
}

#[tokio::test]
async fn test_register_rejects_taken_email() {
    let h = Harness::new();
    let acme = h.business("Acme").await;
    h.account(&acme, "ana@acme.test", "s3cret", false).await;

    let err = h
        .gateway
        .register("Other", "Ana", "ANA@acme.test", "another", &client("10.0.0.1"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegisterError::EmailTaken));
    assert!(h.audit.contexts().await.is_empty());

    // The original account still signs in with its own password.
    let login = h
        .gateway
        .login("ana@acme.test", "s3cret", &client("10.0.0.1"))
        .await
        .unwrap();
    assert_eq!(login.principal.business_id, acme.id);
}

#[tokio::test]
async fn test_register_rejects_short_password_and_blank_fields() {
    let h = Harness::new();
    let ip = client("10.0.0.1");

    let err = h
        .gateway
        .register("Acme", "Bia", "bia@acme.test", "12345", &ip)
        .await
        .unwrap_err();
    assert!(matches!(err, RegisterError::Invalid(_)));

    let err = h
        .gateway
        .register("   ", "Bia", "bia@acme.test", "123456", &ip)
        .await
        .unwrap_err();
    assert!(matches!(err, RegisterError::Invalid(_)));

    assert!(matches!(
        h.gateway.login("bia@acme.test", "123456", &ip).await,
        Err(LoginError::InvalidCredentials)
    ));
}
