//! An out-of-the-box relay of agents that assembles demo tools and model
//! providers.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to get a ready-made router agent, which looks up the
//! weather on its own and hands translation requests off to a translator.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

mod session;
pub mod tools;

pub use session::{ROUTER, Session, SessionBuilder, TRANSLATOR};

/// Re-exports of [`agent_relay_core`] crate.
pub mod core {
    pub use agent_relay_core::*;
}

/// Re-exports of [`agent_relay_model`] crate.
pub mod model {
    pub use agent_relay_model::*;
}

/// Re-exports of [`agent_relay_openai_model`] crate.
pub mod openai {
    pub use agent_relay_openai_model::*;
}
