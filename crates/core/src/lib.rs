//! Core business logic for the mock election service.

pub mod services;

pub use services::*;
