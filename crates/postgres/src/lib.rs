//! # Postgres
//!
//! This crate provides the PostgreSQL plumbing for the campground booking API:
//! pool creation, a connectivity check and the embedded schema migrations.

/// Database client for the campground booking application.
pub mod database;
