//! # bizhub-entity
//!
//! Domain entity models for BizHub. Every struct in this crate represents
//! a database table row or a domain value object. All entities derive
//! `Debug`, `Clone`, `Serialize`, `Deserialize`, and database entities
//! additionally derive `sqlx::FromRow`.
//!
//! Tenant-owned rows carry a `business_id`, and rows that are soft-deleted
//! carry an `active` flag instead of being removed.

pub mod access;
pub mod account;
pub mod audit;
pub mod business;
pub mod preference;
pub mod role;
pub mod session;
