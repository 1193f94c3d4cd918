//! `checkin` - Event attendance registration
//!
//! Attendees pre-register with their name, open every document the organizers
//! linked, fill in their contact details and sign on a drawing surface. The
//! admin console manages the document links, builds the address shared with
//! attendees and exports the collected registrations as a PDF report.
//!
//! Everything runs against a [`KeyValueStore`]: [`SqliteStore`] for the CLI,
//! [`MemoryStore`] for tests.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod admin;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod registration;
pub mod review;
pub mod router;
pub mod signature;
pub mod storage;
pub mod store;
pub mod validate;
pub mod workflow;

pub use admin::AdminConsole;
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use registration::{CompletedRegistration, PartialRegistration, SignatureImage};
pub use review::ReviewTracker;
pub use router::{Router, View};
pub use signature::{InputEvent, SignaturePad};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use store::Store;
pub use validate::{ContactForm, ValidationErrors};
pub use workflow::{Step, StepKind, Workflow};
