pub mod appointment;
pub mod auth;
pub mod error;
pub mod health;
pub mod pass;
pub mod session;
