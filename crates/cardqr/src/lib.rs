//! `cardqr` - Digital business cards as QR codes
//!
//! This library keeps a book of contact profiles, encodes them as vCard 3.0
//! text, renders that text as QR codes (SVG, PNG, terminal), and decodes QR
//! codes back from image frames.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod book;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod photo;
pub mod profile;
pub mod scan;
pub mod store;
pub mod theme;
pub mod vcard;

pub use book::{BookEvent, ProfileBook};
pub use config::Config;
pub use error::{Error, Result};
pub use export::{ExportFormat, QrExporter};
pub use logging::init_logging;
pub use profile::{Profile, ProfileId};
pub use scan::{ScanSession, ScanState, Scanner};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use theme::Theme;
