//! IELTS writing coach - AI feedback and model answers for IELTS essays
//!
//! Builds a multi-part request (topic, task type, typed or photographed essay,
//! optional Task 1 chart) for a generative model, and renders the model's
//! markdown reply into display sections.

pub mod ai;
pub mod app;
pub mod assembler;
pub mod encoder;
pub mod error;
pub mod models;
pub mod prompts;
pub mod render;
pub mod session;
pub mod validation;

pub use error::{Error, Result};
