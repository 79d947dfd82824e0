//! Form domain layer
//!
//! A [`Form`] composes one [`FormField`] per schema property, keeps field and
//! form level errors in sync, and runs the submission lifecycle against a
//! [`SubmitHandler`].

mod errors;
mod field;
mod form_state;
mod submit;

pub use errors::{FormErrorMap, SUBMIT_ERROR_PATH};
pub use field::{FieldCallback, FieldProps, FormField};
pub use form_state::{Form, FormBuilder, FormOptions, FormStateSnapshot, DEFAULT_SUBMIT_ERROR};
pub use submit::{SubmitErrors, SubmitEvent, SubmitHandler, SubmitOutcome};
