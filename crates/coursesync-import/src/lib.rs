//! Coursesync import pipeline
//!
//! Two phases over one in-memory pass of the source:
//!
//! ```text
//! load:     bytes ─► decode ─► tokenize ─► header check ─► default category
//!                                                  │
//!                                                  ▼
//!                                       ImportRecord per row
//!
//! execute:  ImportRecord ─► ReconciliationEngine ─► Backend writes
//!                                 │        │
//!                                 │        └─► CompletionWirer
//!                                 ▼
//!                           ResultTracker ─► OutputSink
//! ```
//!
//! The backend is injected; nothing here keeps global state.

pub mod category;
pub mod completion;
pub mod error;
pub mod importer;
pub mod reconcile;
pub mod source;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use category::CategoryResolver;
pub use completion::{CompletionWirer, Wiring};
pub use error::{ImportError, RecordError};
pub use importer::{ImportOrchestrator, ImportReport};
pub use reconcile::{plan, CoursePlan, PagePlan, Plan, ReconciliationEngine};
pub use source::{
    check_encoding, decode, encoding_for, tokenize, Delimiter, ImportOptions, SourceTable,
};
pub use tracker::{
    Action, ImportOutcome, OutputSink, PlainTextSink, ResultTracker, RunSummary, SilentSink,
    StructuredReport, StructuredSink,
};
