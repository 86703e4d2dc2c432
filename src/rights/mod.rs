//! Right taxonomy, policy tables, and the hierarchical access resolver.
//!
//! This module provides:
//! - The closed [`Right`] enumeration with its frozen policy tables
//!   (tie-break, inheritance direction, per-level enablement, implied
//!   rights, baked-in defaults)
//! - [`AccessLevel`], the interned right-to-state mapping for one
//!   (identity, entity) pair
//! - [`RightsObject`] rule records and per-level [`RuleEntry`] sets
//! - [`AccessResolver`], the pure conflict-resolution algorithm

mod access;
mod resolver;
mod rules;
mod types;

pub use access::{AccessLevel, AccessLevelBuilder};
pub use resolver::AccessResolver;
pub use rules::{RightsObject, RuleEntry};
pub use types::{HierarchyLevel, Right, RightSet, RightState};
