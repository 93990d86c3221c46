//! Pipeline module.
//!
//! The main analysis pipeline and its builder.

mod builder;

pub use builder::{GENERATION_COLUMN, Pipeline, PipelineBuilder, ROLE_LABEL_COLUMN};
