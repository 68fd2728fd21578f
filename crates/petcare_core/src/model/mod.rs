//! Domain model for the tracked pet and its care routines.
//!
//! # Responsibility
//! - Define the in-memory aggregate (`PetState`) and routine scheduler.
//! - Enforce value constraints before any field changes.
//!
//! # Invariants
//! - Model types never parse strings and never touch storage.
//! - All date reads go through the injected `Clock`.

pub mod pet;
pub mod routine;
pub mod validation;
