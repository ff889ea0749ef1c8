//! sf-core: Shared types and errors for SpeechForge
//!
//! This crate provides the foundational types used across all SpeechForge crates.

mod error;
mod sample;

pub use error::*;
pub use sample::*;
