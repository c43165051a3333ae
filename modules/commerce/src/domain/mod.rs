pub mod auth;
pub mod catalog;
pub mod error;
pub mod orders;
pub mod payments;
pub mod ports;
pub mod repo;
