//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persistence contract the pet core writes through.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories hold no pet state of their own.
//! - Repository APIs return semantic errors (`InvalidData`) in addition to
//!   DB transport errors.

pub mod pet_repo;
