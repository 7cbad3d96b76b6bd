//! Authentication module for managing user sessions and access control.
//!
//! This module provides the public interface for authentication-related
//! functionality such as login, registration, token management, request
//! identity resolution and authorization middleware.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
