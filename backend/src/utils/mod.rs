//! Collection of general utility modules.
//!
//! Hosts the token codec and the cookie builders shared by the
//! authentication handlers and middleware.

pub mod cookies;
pub mod jwt;
