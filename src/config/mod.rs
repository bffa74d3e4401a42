//! Configuration resolution and layering.
//!
//! Merges command-line flags, an optional JSON/YAML config file and the
//! schema's declared defaults into one `clap::Parser` struct. The config
//! file's location comes from a command-line flag or, failing that, from a
//! caller-named environment variable.

pub mod error;
pub mod layer;
pub mod loader;
pub mod resolver;
pub mod schema;

pub use error::{ErrorKind, ResolveError};
pub use layer::FileLayer;
pub use loader::ConfigFormat;
pub use resolver::{parse, resolve, ConfigLocation, ConfigTarget, PathOrigin, Resolver};
