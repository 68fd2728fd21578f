//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate pet mutations together with their repository writes.
//! - Keep CLI callers decoupled from storage details.

pub mod pet_service;
