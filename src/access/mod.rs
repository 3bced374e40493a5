//! Access Module
//!
//! Identities, per-entry access predicates and the evaluator that combines
//! them with reader/writer lists and the admin override.

mod evaluator;
mod identity;
mod predicate;

pub use evaluator::{AccessControlled, AccessEvaluator, AccessKind};
pub use identity::Identity;
pub use predicate::{AccessPredicate, AccessRule, AccessRules};
