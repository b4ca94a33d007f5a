//! # Web Handlers for the Campground Booking API
//!
//! This crate provides the request handlers, request/response types and database
//! services behind the campground, appointment, favorite and auth routes.

/// Shared error envelope and extractor error handlers
pub mod errors;

/// Campground models, requests and errors
pub mod campground_types;
/// Campground listing query parsing
pub mod campground_query;
/// Campground storage
pub mod campground_service;
/// Availability calendar
pub mod availability;

/// Appointment models, requests, errors and booking rules
pub mod appointment_types;
/// Appointment storage
pub mod appointment_service;

/// Favorite models and errors
pub mod favorite_types;
/// Favorite storage
pub mod favorite_service;

/// Authentication handlers (register, login, me, logout)
mod auth_handlers;
pub use auth_handlers::*;

/// Campground handlers, including availability
mod campground_handlers;
pub use campground_handlers::*;

/// Appointment handlers, shared by the `/bookings` routes
mod appointment_handlers;
pub use appointment_handlers::*;

/// Favorite handlers
mod favorite_handlers;
pub use favorite_handlers::*;

/// Health check
mod health_handlers;
pub use health_handlers::*;
