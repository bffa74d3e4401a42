//! layerconf — layered CLI configuration (library crate).
//!
//! Command-line flags override values from a JSON or YAML config file,
//! which override the defaults declared on a `clap::Parser` struct. The
//! config file is found through a flag on the struct or, if that is empty,
//! a caller-named environment variable.

pub mod config;
pub mod constants;
pub mod env;

pub use config::{
    parse, resolve, ConfigFormat, ConfigLocation, ConfigTarget, ErrorKind, PathOrigin,
    ResolveError, Resolver,
};
pub use env::Env;
