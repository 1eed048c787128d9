//! Authorization module - role-scoped visibility engine
//!
//! Every request resolves to an [`Actor`] (id, role, manager assignment) and
//! every resource operation is checked against one rule table keyed by
//! `(role, resource, operation)`. List and Read share a single predicate per
//! role/resource pair, so a record is listable exactly when it is readable.

mod actor;
mod engine;
mod ownership;

pub use actor::{Actor, Role};
pub use engine::{authorize, list_scope, require, Decision, Operation, Resource, Scope};
pub use ownership::Ownership;

/// Reasons the engine denies an operation. `NotYourTeam` is an ownership
/// denial and is surfaced as 404 so out-of-scope records do not leak their
/// existence; the others map to 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    InsufficientRole,
    NotYourTeam,
    AdminOnly,
    FieldsNotAllowed,
}
