//! Declarative macros shared by the simulation core.
//!
//! These keep the registry identifier types uniform without pulling in a
//! procedural macro crate.

pub mod id_macros;
