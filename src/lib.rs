//! Contract-testing harness for JSONPlaceholder-style REST APIs.
//!
//! A [`Session`] talks to the target, [`schema`] describes what a conforming
//! body looks like, and [`testing`] turns both into runnable checks.

pub mod config;
pub mod error;
pub mod http;
pub mod resources;
pub mod schema;
pub mod testing;

pub use config::HarnessConfig;
pub use error::{HarnessError, Result};
pub use http::{CallResult, HttpMethod, Session};
pub use resources::ResourceKind;
pub use schema::{Failure, FailureKind, Schema, ValidationResult, validate};
