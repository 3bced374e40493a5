//! Named Operation Module
//!
//! Named operation definitions and the access-controlled registry that
//! stores them.

mod detail;
mod registry;


pub use detail::{NamedOperationDetail, NamedOperationDetailBuilder, ParameterDetail};
pub use registry::{NamedOperationRegistry, RegistryConfig};
