//! # bizhub-core
//!
//! Core crate for BizHub. Contains configuration schemas, the unified
//! error system, and the collaborator traits (cache, clock) that the
//! authentication core consumes.
//!
//! This crate has **no** internal dependencies on other BizHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
