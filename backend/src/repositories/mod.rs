//! Data-access layer: repositories wrapping all direct database queries.

pub mod role_repository;
pub mod user_repository;
