//! Two-pass layered resolution.
//!
//! Priority (highest to lowest):
//! 1. Flags given on the command line
//! 2. Values from the config file (path from `--config`-style flag, else
//!    from a caller-named environment variable)
//! 3. Defaults declared on the target's schema
//!
//! Pass 1 parses the command line alone, only to learn the config path.
//! Pass 2 parses the same command line again through a freshly built
//! grammar whose defaults come from the file, so explicit flags win.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use clap::{Command, FromArgMatches, Parser};

use super::error::ResolveError;
use super::layer::FileLayer;
use super::schema;
use crate::env::Env;

/// A parsed configuration struct that can report the config-file path
/// supplied on its command line.
///
/// Implemented by the caller's `clap::Parser` type:
///
/// ```
/// use std::path::{Path, PathBuf};
/// use clap::Parser;
/// use layerconf::ConfigTarget;
///
/// #[derive(Parser)]
/// struct Args {
///     #[arg(long)]
///     config: Option<PathBuf>,
///     #[arg(long, default_value_t = 8000)]
///     port: u16,
/// }
///
/// impl ConfigTarget for Args {
///     fn config_path(&self) -> Option<&Path> {
///         self.config.as_deref()
///     }
/// }
/// ```
pub trait ConfigTarget {
    /// Config-file path from the command line, if any. An empty path is
    /// treated the same as `None`.
    fn config_path(&self) -> Option<&Path>;

    /// Id of the argument holding the config path. It is never filled
    /// from the config file itself.
    fn config_arg() -> &'static str
    where
        Self: Sized,
    {
        "config"
    }
}

/// Where the config-file path came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOrigin {
    CommandLine,
    Environment { var: String },
}

impl fmt::Display for PathOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathOrigin::CommandLine => write!(f, "command line"),
            PathOrigin::Environment { var } => write!(f, "${var}"),
        }
    }
}

/// A located config file and the source of its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub origin: PathOrigin,
}

/// Layered config resolver.
///
/// Holds only its inputs (argument vector, environment, variable name);
/// nothing carries over between calls.
#[derive(Debug, Clone)]
pub struct Resolver {
    env_var: String,
    env: Env,
    args: Option<Vec<OsString>>,
}

impl Resolver {
    /// Resolver reading the process arguments and environment, falling back
    /// to `env_var` for the config path.
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
            env: Env::real(),
            args: None,
        }
    }

    /// Use `env` instead of the process environment.
    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    /// Use `args` instead of the process arguments. The program name must
    /// not be included.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Resolve into `target`.
    ///
    /// On success `target` holds the merged configuration. On failure it
    /// is left untouched.
    pub fn resolve<T>(&self, target: &mut T) -> Result<(), ResolveError>
    where
        T: Parser + ConfigTarget,
    {
        *target = self.parse()?;
        Ok(())
    }

    /// Resolve a fresh `T`.
    pub fn parse<T>(&self) -> Result<T, ResolveError>
    where
        T: Parser + ConfigTarget,
    {
        let cmd = T::command();
        schema::validate(&cmd)?;

        let argv = self.argv(&cmd);

        // Pass 1: command line only, to discover the config path.
        let first: T = parse_with(cmd, &argv)?;

        let Some(location) = self.locate(&first) else {
            tracing::debug!(
                env_var = %self.env_var,
                "no config file located; using command-line values and defaults"
            );
            return Ok(first);
        };
        tracing::debug!(
            path = %location.path.display(),
            origin = %location.origin,
            "config file located"
        );

        let layer = FileLayer::load(&location.path)?;
        tracing::debug!(
            path = %layer.path().display(),
            format = %layer.format(),
            keys = layer.values().len(),
            "config file decoded"
        );

        // Pass 2: fresh grammar with file values as defaults, same argv.
        let cmd = layer.apply(T::command(), T::config_arg())?;
        parse_with(cmd, &argv)
    }

    /// Determine the config path for a target that has been through pass 1.
    ///
    /// The command-line value wins; the environment variable is consulted
    /// only when it is absent or empty, and only if set to a non-empty value.
    pub fn locate<T: ConfigTarget>(&self, target: &T) -> Option<ConfigLocation> {
        if let Some(path) = target.config_path().filter(|p| !p.as_os_str().is_empty()) {
            return Some(ConfigLocation {
                path: path.to_path_buf(),
                origin: PathOrigin::CommandLine,
            });
        }

        self.env.non_empty(&self.env_var).map(|value| ConfigLocation {
            path: PathBuf::from(value),
            origin: PathOrigin::Environment {
                var: self.env_var.clone(),
            },
        })
    }

    fn argv(&self, cmd: &Command) -> Vec<OsString> {
        let bin = cmd.get_bin_name().unwrap_or(cmd.get_name());
        let args = match &self.args {
            Some(args) => args.clone(),
            None => std::env::args_os().skip(1).collect(),
        };
        std::iter::once(OsString::from(bin)).chain(args).collect()
    }
}

/// Resolve into `target` from the process arguments and environment.
pub fn resolve<T>(target: &mut T, env_var: &str) -> Result<(), ResolveError>
where
    T: Parser + ConfigTarget,
{
    Resolver::new(env_var).resolve(target)
}

/// Resolve a fresh `T` from the process arguments and environment.
pub fn parse<T>(env_var: &str) -> Result<T, ResolveError>
where
    T: Parser + ConfigTarget,
{
    Resolver::new(env_var).parse()
}

/// Parse `argv` through `cmd` without ever exiting the process.
fn parse_with<T: FromArgMatches>(mut cmd: Command, argv: &[OsString]) -> Result<T, ResolveError> {
    let mut matches = cmd.try_get_matches_from_mut(argv.iter().cloned())?;
    T::from_arg_matches_mut(&mut matches).map_err(|e| ResolveError::Argument(e.format(&mut cmd)))
}
