//! Core use-case services.
//!
//! # Responsibility
//! - Turn form-level input (`name`, `email`) into store operations.
//! - Keep UI/FFI layers unaware of id generation and store wiring.

pub mod user_service;
