//! Errors surfaced by config resolution.

use std::path::PathBuf;

use thiserror::Error;

use super::loader::ConfigFormat;

/// Errors during layered config resolution.
///
/// Every variant is terminal: the resolver never retries or recovers, and
/// the target is left as it was before the call.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The target's declared argument schema is malformed.
    #[error("invalid configuration schema: {message}")]
    Schema { message: String },

    /// The command line was rejected, or asked for `--help`/`--version`.
    #[error(transparent)]
    Argument(#[from] clap::Error),

    #[error(
        "unsupported config format {} for file {} (expected .json, .yaml or .yml)",
        describe_extension(.extension),
        .path.display()
    )]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("failed to read config file {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {format} config file {}: {message}", .path.display())]
    FileFormat {
        path: PathBuf,
        format: ConfigFormat,
        message: String,
    },
}

/// Payload-free discriminant of [`ResolveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Schema,
    Argument,
    UnsupportedFormat,
    FileAccess,
    FileFormat,
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::Schema { .. } => ErrorKind::Schema,
            ResolveError::Argument(_) => ErrorKind::Argument,
            ResolveError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            ResolveError::FileAccess { .. } => ErrorKind::FileAccess,
            ResolveError::FileFormat { .. } => ErrorKind::FileFormat,
        }
    }

    /// `true` when the command line asked for help or version output
    /// rather than containing a mistake.
    pub fn is_display_request(&self) -> bool {
        use clap::error::ErrorKind as ClapKind;
        match self {
            ResolveError::Argument(e) => matches!(
                e.kind(),
                ClapKind::DisplayHelp
                    | ClapKind::DisplayVersion
                    | ClapKind::DisplayHelpOnMissingArgumentOrSubcommand
            ),
            _ => false,
        }
    }
}

fn describe_extension(extension: &str) -> String {
    if extension.is_empty() {
        "(no extension)".to_string()
    } else {
        format!("'{extension}'")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_names_extension_and_path() {
        let err = ResolveError::UnsupportedFormat {
            path: PathBuf::from("/etc/app/config.toml"),
            extension: ".toml".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'.toml'"), "got: {msg}");
        assert!(msg.contains("/etc/app/config.toml"), "got: {msg}");
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn unsupported_format_without_extension() {
        let err = ResolveError::UnsupportedFormat {
            path: PathBuf::from("config"),
            extension: String::new(),
        };
        assert!(err.to_string().contains("(no extension)"));
    }

    #[test]
    fn file_format_mentions_format_and_path() {
        let err = ResolveError::FileFormat {
            path: PathBuf::from("app.yaml"),
            format: ConfigFormat::Yaml,
            message: "bad indentation".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("YAML"), "got: {msg}");
        assert!(msg.contains("app.yaml"), "got: {msg}");
        assert!(msg.contains("bad indentation"), "got: {msg}");
    }

    #[test]
    fn file_access_keeps_io_source() {
        let err = ResolveError::FileAccess {
            path: PathBuf::from("missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.kind(), ErrorKind::FileAccess);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("read"));
    }

    #[test]
    fn display_request_only_for_help_and_version() {
        let help = clap::Error::new(clap::error::ErrorKind::DisplayHelp);
        assert!(ResolveError::Argument(help).is_display_request());

        let unknown = clap::Error::new(clap::error::ErrorKind::UnknownArgument);
        assert!(!ResolveError::Argument(unknown).is_display_request());

        let schema = ResolveError::Schema {
            message: "dup".to_string(),
        };
        assert!(!schema.is_display_request());
    }
}
