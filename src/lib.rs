//! staffdesk
//!
//! Client library for the staffing dashboard backend. Its core is a
//! relational association editor: one dialog per entity kind that loads
//! reference collections, edits scalar and many-to-many fields against a
//! baseline, writes exactly the changed fields and then re-reads every list
//! the write could have touched.
//!
//! Layers, leaves first:
//!
//! - [`domain`]: records, entity kinds and canonical IDs
//! - [`api`]: the [`Backend`] trait and its HTTP implementation
//! - [`editor`]: schemas, association sets, form drafts, diff and submit
//! - [`fetcher`], [`store`], [`refresh`]: reference data and list reconciliation
//! - [`dialog`], [`controller`], [`dashboard`]: the per-dialog state machine and
//!   the session facade
//! - [`views`]: read-only projections used by the task and project pages

pub mod api;
pub mod config;
pub mod controller;
pub mod credential;
pub mod dashboard;
pub mod dialog;
pub mod domain;
pub mod editor;
pub mod error;
pub mod fetcher;
pub mod refresh;
pub mod store;
pub mod views;

#[cfg(test)]
mod testing;

pub use api::{Backend, HttpBackend};
pub use config::ClientConfig;
pub use controller::{Editor, SubmitReport};
pub use credential::Credential;
pub use dashboard::{Artifact, Dashboard};
pub use dialog::Phase;
pub use domain::{EntityKind, RecordId};
pub use error::{
    DialogError, DownloadError, EditorError, FetchError, FormError, LookupError, SubmitError, ValidationError,
};
pub use editor::{SubmitOutcome, Target};
pub use refresh::RefreshReport;
