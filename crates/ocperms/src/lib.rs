//! Onchain Permissions Standard request and grant validation.
//!
//! A wallet or permission-granting service receives permission requests from
//! applications and answers with grants. This crate checks both payloads at
//! the boundary and hands back typed, trusted values.
//!
//! # Crate Structure
//!
//! - [`schema`]: record shapes, v1/v2 wire dispatch and per-type data validators
//!
//! The `ocperms` command-line tool is built with the `cli` feature.

/// Re-export schema types.
pub mod schema {
    pub use ocperms_schema::*;
}
