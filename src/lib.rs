//! # Mnemosyne
//!
//! Mnemosyne is a versioned, append-only RDF resource store with
//! time-travel retrieval.
//!
//! The name "Mnemosyne" comes from the Greek titaness of memory: the store
//! never forgets. Every mutation of a resource is appended to a journal of
//! timestamped quad additions and deletions, and any past state of the
//! resource can be reconstructed by replaying the journal up to the
//! requested instant.
//!
//! ## Features
//!
//! - Append-only RDF patch journal with point-in-time replay
//! - Cached latest-state snapshots that can always be rebuilt from the journal
//! - A resource service façade with per-resource cross-process locking
//! - An event-driven stream topology for containment, inbound-reference and
//!   coalesced cache maintenance
//!
//! ## Example
//!
//! ```rust
//! use mnemosyne::Result;
//!
//! fn example() -> Result<()> {
//!     println!("Mnemosyne versioned RDF store");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Core RDF data structures and vocabulary constants
pub mod core;

/// Journal line parsing
pub mod parsing;

/// The append-only RDF patch journal codec
pub mod journal;

/// On-disk resource directory layout
pub mod storage;

/// Versioned and cached resource views
pub mod resource;

/// Per-resource cross-process locking
pub mod locking;

/// Change events and the notification sink
pub mod events;

/// The resource service façade
pub mod service;

/// The event stream topology
pub mod stream;

pub mod error {
    //! Error types and result definitions

    use std::fmt;

    /// Result type alias for store operations
    pub type Result<T> = std::result::Result<T, Error>;

    /// Main error type for the store
    #[derive(Debug)]
    pub enum Error {
        /// IO error
        Io(std::io::Error),
        /// A per-resource lock could not be acquired in time
        LockTimeout(String),
        /// A file was structurally unreadable
        Corrupt(String),
        /// The operation is not implemented
        Unsupported(String),
        /// Configuration error
        Config(String),
        /// An event could not be published
        Publish(String),
    }

    impl fmt::Display for Error {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Error::Io(err) => write!(f, "IO error: {}", err),
                Error::LockTimeout(msg) => write!(f, "Lock timeout: {}", msg),
                Error::Corrupt(msg) => write!(f, "Corrupt file: {}", msg),
                Error::Unsupported(msg) => write!(f, "Unsupported operation: {}", msg),
                Error::Config(msg) => write!(f, "Configuration error: {}", msg),
                Error::Publish(msg) => write!(f, "Publish error: {}", msg),
            }
        }
    }

    impl std::error::Error for Error {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                Error::Io(err) => Some(err),
                _ => None,
            }
        }
    }

    impl From<std::io::Error> for Error {
        fn from(err: std::io::Error) -> Self {
            Error::Io(err)
        }
    }
}

// Re-export commonly used types
pub use error::{Error, Result};
