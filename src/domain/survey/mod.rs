//! Survey module - the form schema model.
//!
//! A `Schema` is an ordered list of `Field`s. Snapshots are immutable values:
//! each reconciliation pass produces a fresh one.

mod answer_set;
mod field;
mod form_reference;
mod reconciliation;
mod schema;

pub use answer_set::{AnswerSet, QuestionAnswer};
pub use field::{Field, FieldKind};
pub use form_reference::FormReference;
pub use reconciliation::{Contradiction, ReconciliationOutcome, RecordError};
pub use schema::Schema;
