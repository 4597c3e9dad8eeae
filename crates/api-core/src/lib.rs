//! API core functionality: authentication extractor and OpenAPI scaffolding.

pub mod auth;
pub mod openapi;

pub use auth::*;
pub use openapi::*;
