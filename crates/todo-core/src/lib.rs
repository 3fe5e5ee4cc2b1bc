//! # Todo Core
//!
//! The domain layer of the Todo API.
//! This crate contains entities, validation rules and port traits, with zero
//! infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;

pub use domain::ValidationErrors;
pub use error::RepoError;
