//! Schemaform - schema-driven form state engine
//!
//! Turns a structural schema plus a submission handler into per-field edit
//! state, field and form level error views that stay in sync, and a guarded
//! submission lifecycle. Rendering is left to the caller: the engine only
//! produces state and the handlers a frontend binds to.

pub mod config;
pub mod error;
pub mod forms;
pub mod schema;

pub use config::FormConfig;
pub use error::{FormError, Result};
pub use forms::{
    FieldProps, Form, FormBuilder, FormErrorMap, FormField, FormOptions, FormStateSnapshot,
    SubmitErrors, SubmitEvent, SubmitHandler, SubmitOutcome, SUBMIT_ERROR_PATH,
};
pub use schema::{FieldEquality, ObjectSchema, Property, Record, Schema, Violation};
