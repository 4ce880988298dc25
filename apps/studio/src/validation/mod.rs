pub mod form;
pub mod rules;

pub use form::{profile_validator, profile_values, FieldError, FormValidator};
