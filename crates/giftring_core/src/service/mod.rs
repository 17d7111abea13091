//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate registry calls and the assignment engine into use cases.
//! - Keep the request layer decoupled from storage details.

pub mod exchange_service;
