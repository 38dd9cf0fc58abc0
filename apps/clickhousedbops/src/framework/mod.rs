//! # Lifecycle framework
//!
//! The host drives every managed object through
//! `modify_plan -> create | update | delete` and refreshes it with `read`.
//! Resources implement [`Resource`] over a typed model; the blanket
//! [`DynResource`] impl erases that model to JSON so the provider can keep
//! one registry of every resource kind. Data sources follow the same split.

pub mod data_source;
pub mod diagnostics;
pub mod resource;

pub use data_source::{DataSource, DynDataSource};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use resource::{
    parse_import_id, DynResource, PlanModification, Resource, ResourceError, ResourceResultExt,
};
