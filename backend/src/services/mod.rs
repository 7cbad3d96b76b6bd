//! Module for core business logic services.
//!
//! Encapsulates operations that orchestrate repositories and enforce
//! business rules, separate from HTTP handling.

pub mod user_service;
