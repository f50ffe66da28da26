//! Configuration and schema-file loading for tablemap backends.
//!
//! - [`DbConfig`]: YAML connection settings (driver, location, retry
//!   timing, pool size).
//! - [`SchemaFile`]: YAML table descriptions turned into a
//!   [`Registry`](tablemap_core::Registry) of dynamic entities.
//!
//! # Quick start
//!
//! ```no_run
//! use tablemap_db::{DbConfig, SchemaFile};
//!
//! let config = DbConfig::load("db.yml").unwrap();
//! config.validate().unwrap();
//!
//! let registry = SchemaFile::open("schema/").unwrap().registry().unwrap();
//! println!("{} tables declared", registry.len());
//! ```

mod config;
mod error;
mod loader;

pub use config::{DbConfig, Driver, MEMORY_DATABASE};
pub use error::{DatabaseError, Result};
pub use loader::{SchemaFile, SchemaSource};
