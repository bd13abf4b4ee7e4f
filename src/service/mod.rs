pub mod appointment;
pub mod auth;
pub mod pass;
