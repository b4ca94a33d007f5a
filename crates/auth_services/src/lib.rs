//! # Auth Services
//!
//! This crate provides authentication services for the campground booking API.
//! It includes JWT token handling, middleware for request authentication, role checks
//! and the user store.

/// JWT token handling.
pub mod jwt;
/// Middleware for request authentication and the authenticated-user extractor.
pub mod middleware;
/// Service definitions for user registration and credential checks.
pub mod service;
/// Types and structures used in authentication services.
pub mod types;
