//! The capability contract every LLM backend adapter fulfills.
//!
//! This crate establishes an unified protocol for agents to talk to
//! various LLM backends, so that an agent can be bound to any of them
//! without the orchestration layer knowing about wire formats.
//!
//! An adapter is a [`ModelProvider`]: it generates completions (either
//! all at once or as a lazy event stream), and it knows how to render
//! tool declarations and tool-call records in its backend's own shape.
//!
//! Apart from folding a streamed response into a [`ModelCompletion`],
//! types in this crate don't define any behavior. They are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod config;
mod error;
mod provider;
mod request;
mod response;

pub use config::*;
pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
