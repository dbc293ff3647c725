//! Typed inputs and outputs of the HTTP endpoints.
//!
//! Each type carries its OpenAPI description and converts into the domain type
//! the controller hands to the business layer.

pub(crate) mod project;
pub(crate) mod sdk;
