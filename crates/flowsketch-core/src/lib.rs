//! Flowsketch Core Types and Definitions
//!
//! This crate provides the data model shared by every stage of the Flowsketch
//! pipeline. It includes:
//!
//! - **Model**: The [`model::DiagramModel`] record extracted from a data-flow
//!   diagram image, together with its element and flow records
//! - **Validate**: Structural completeness checks for an extracted model
//!   ([`validate`] module)

pub mod model;
pub mod validate;

mod lenient;
