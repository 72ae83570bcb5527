//! Relational Association Editor
//!
//! Scalar and association fields of one record, the baseline they are
//! diffed against, and the engine that turns them into one write.

mod association;
mod diff;
mod form;
mod schema;
mod schemas;
mod submit;
mod value;

pub use association::AssociationSet;
pub use diff::{create_payload, diff, update_payload, PayloadContext};
pub use form::FormDraft;
pub use schema::{
    ConstValue, DerivedField, EntitySchema, FieldMap, FieldSpec, Mode, Required, WireConstant,
};
pub use schemas::{schema_for, DEPARTMENT, EMPLOYEE, PROJECT, TASK};
pub use submit::{SubmitEngine, SubmitOutcome, Target, DEFAULT_SUBMIT_TIMEOUT};
pub use value::{parse_date, FieldKind, FieldValue};

pub(crate) use submit::bounded;
