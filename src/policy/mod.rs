//! Ownership-scoped access and validation, shared by every resource.
//!
//! A resource is described once by a static [`Table`]; [`authorize`] decides
//! whether a caller may perform an [`Operation`] on a record and
//! [`ScopedAccess`] runs the full list/retrieve/create/update/delete flow
//! against a [`RecordStore`](crate::store::RecordStore).

mod access;
mod evaluator;
pub mod rules;
mod table;
pub mod window;

pub use access::ScopedAccess;
pub use evaluator::{authorize, persistence_fault, Operation};
pub use rules::{FieldErrors, FieldRule, Fallback};
pub use table::{Access, Direction, FailureClass, Table};

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("No {0} matches the given query.")]
    NotFound(&'static str),

    #[error("Not authorized to {} this {}", .op.verb(), .label)]
    Forbidden { label: &'static str, op: Operation },

    #[error("{0}")]
    Invalid(FieldErrors),

    #[error("An error occurred while {} the {}", .op.gerund(), .label)]
    Store {
        label: &'static str,
        op: Operation,
        fault: FailureClass,
        #[source]
        source: anyhow::Error,
    },
}

impl PolicyError {
    pub(crate) fn store(table: &'static Table, op: Operation, source: anyhow::Error) -> Self {
        PolicyError::Store {
            label: table.label,
            op,
            fault: persistence_fault(table, op),
            source,
        }
    }
}
