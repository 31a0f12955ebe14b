//! Driven adapters for the identity ports.
//!
//! The original deployment backs these ports with a hosted identity
//! service and document store; those transports are out of scope here,
//! so the crate ships in-memory adapters suitable for embedding,
//! demos, and tests.

pub mod memory;

pub use self::memory::{InMemoryCredentialProvider, InMemoryUserDirectory};
