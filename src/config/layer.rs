//! Feeding decoded config-file values into the argument grammar.
//!
//! A [`FileLayer`] turns file values into *defaults* on a freshly built
//! `clap::Command`. Parsing the command line through that command then
//! yields the precedence "explicit flag > file value > declared default"
//! without any hand-written merge: clap only falls back to a default when
//! the flag is absent from the argument vector.
//!
//! Key lookup for a flag `--listen-addr` tries, in order:
//! `listen-addr`, `listen_addr`, `listenAddr`, the argument id, and the
//! nested path `listen: { addr: ... }`. Flags of a subcommand are looked up
//! in a mapping keyed by the subcommand name first, then at the top level.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use clap::{Arg, ArgAction, Command};
use heck::{ToLowerCamelCase, ToSnakeCase};
use serde_json::{Map, Value};

use super::error::ResolveError;
use super::loader::{self, ConfigFormat};

/// Values decoded from one config file.
#[derive(Debug, Clone)]
pub struct FileLayer {
    path: PathBuf,
    format: ConfigFormat,
    values: Map<String, Value>,
}

/// One mapping searched for flag values, with its dotted path in the file.
#[derive(Debug, Clone)]
struct Scope<'a> {
    label: String,
    values: &'a Map<String, Value>,
}

impl Scope<'_> {
    fn path_of(&self, key: &str) -> String {
        if self.label.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.label)
        }
    }

    fn unused(&self, used: &HashSet<(String, String)>) -> Vec<String> {
        self.values
            .keys()
            .filter(|key| !used.contains(&(self.label.clone(), (*key).clone())))
            .map(|key| self.path_of(key))
            .collect()
    }
}

/// Defaults to install on one command, and recursively on its subcommands.
#[derive(Debug, Default)]
struct Plan {
    args: Vec<(String, Vec<String>)>,
    subcommands: Vec<(String, Plan)>,
}

impl FileLayer {
    /// Select the decoder for `path`, read the file and decode it.
    pub fn load(path: &Path) -> Result<Self, ResolveError> {
        let (format, values) = loader::load_document(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            format,
            values,
        })
    }

    /// Build a layer from already-decoded values.
    pub fn from_values(path: impl Into<PathBuf>, format: ConfigFormat, values: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            format,
            values,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ConfigFormat {
        self.format
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Install file values as defaults on `cmd`.
    ///
    /// `skip` names the argument carrying the config path; it is never
    /// filled from the file. Values of the wrong shape or type for their
    /// flag fail with [`ResolveError::FileFormat`].
    pub fn apply(&self, cmd: Command, skip: &str) -> Result<Command, ResolveError> {
        let (plan, unused) = self.plan_all(&cmd, skip)?;

        for key in &unused {
            tracing::debug!(
                path = %self.path.display(),
                key = %key,
                "config key does not match any flag; ignoring"
            );
        }

        Ok(install(cmd, plan))
    }

    /// Plan the whole command tree. Also returns the dotted paths of file
    /// keys that matched nothing.
    fn plan_all(&self, cmd: &Command, skip: &str) -> Result<(Plan, Vec<String>), ResolveError> {
        let top = Scope {
            label: String::new(),
            values: &self.values,
        };
        let mut used = HashSet::new();
        let mut unused = Vec::new();
        let plan = self.plan(cmd, std::slice::from_ref(&top), skip, &mut used, &mut unused)?;
        unused.extend(top.unused(&used));
        Ok((plan, unused))
    }

    fn plan<'a>(
        &self,
        cmd: &Command,
        scopes: &[Scope<'a>],
        skip: &str,
        used: &mut HashSet<(String, String)>,
        unused: &mut Vec<String>,
    ) -> Result<Plan, ResolveError> {
        let mut plan = Plan::default();
        let innermost = &scopes[scopes.len() - 1];

        for arg in cmd.get_arguments() {
            if !fillable(arg) || arg.get_id().as_str() == skip {
                continue;
            }

            // Innermost scope wins.
            let found = scopes
                .iter()
                .rev()
                .find_map(|scope| lookup(scope.values, arg).map(|hit| (scope, hit)));
            let Some((scope, (key, value))) = found else {
                continue;
            };
            used.insert((scope.label.clone(), key.clone()));

            if let Some(defaults) = self.defaults_for(arg, &key, value)? {
                tracing::trace!(arg = arg.get_id().as_str(), key = %key, ?defaults, "filling flag from config file");
                plan.args.push((arg.get_id().as_str().to_string(), defaults));
            }
        }

        for sub in cmd.get_subcommands() {
            let name = sub.get_name();
            let own = match innermost.values.get(name) {
                Some(Value::Object(map)) => {
                    used.insert((innermost.label.clone(), name.to_string()));
                    Some(Scope {
                        label: innermost.path_of(name),
                        values: map,
                    })
                }
                _ => None,
            };

            let mut nested = scopes.to_vec();
            nested.extend(own.clone());
            let sub_plan = self.plan(sub, &nested, skip, used, unused)?;

            // Global flags are declared on the root only, so a global set
            // inside a subcommand mapping lands here too.
            if let Some(scope) = &own {
                unused.extend(scope.unused(used));
            }
            if !sub_plan.args.is_empty() || !sub_plan.subcommands.is_empty() {
                plan.subcommands.push((name.to_string(), sub_plan));
            }
        }

        Ok(plan)
    }

    /// Convert a file value into the default strings for `arg`.
    ///
    /// `Ok(None)` means the value is `null` and the declared default stays.
    fn defaults_for(&self, arg: &Arg, key: &str, value: &Value) -> Result<Option<Vec<String>>, ResolveError> {
        let raw = match value {
            Value::Null => return Ok(None),
            Value::Array(items) => items
                .iter()
                .map(|item| scalar_text(item).ok_or_else(|| self.shape_error(key, item)))
                .collect::<Result<Vec<_>, _>>()?,
            other => vec![scalar_text(other).ok_or_else(|| self.shape_error(key, other))?],
        };

        if raw.len() > 1 && !takes_many(arg) {
            return Err(self.format_error(format!(
                "key '{key}' holds a list but flag '{}' takes a single value",
                flag_name(arg)
            )));
        }

        self.check_count(arg, key, raw.len())?;

        for text in &raw {
            self.check_value(arg, key, text)?;
        }

        Ok(Some(raw))
    }

    /// Reject a number of values the flag's declared `num_args` forbids.
    ///
    /// Appending flags take any whole number of occurrences; all others
    /// take exactly one.
    fn check_count(&self, arg: &Arg, key: &str, count: usize) -> Result<(), ResolveError> {
        let Some(range) = arg.get_num_args() else {
            return Ok(());
        };
        if arg.get_value_delimiter().is_some() {
            return Ok(());
        }
        let (min, max) = (range.min_values(), range.max_values());

        let ok = if matches!(arg.get_action(), ArgAction::Append) {
            if min > 0 && min == max {
                count % min == 0
            } else {
                count >= min
            }
        } else {
            (min..=max).contains(&count)
        };
        if ok {
            return Ok(());
        }

        let expected = if min == max {
            format!("{min}")
        } else if max == usize::MAX {
            format!("at least {min}")
        } else {
            format!("{min} to {max}")
        };
        let per = if matches!(arg.get_action(), ArgAction::Append) {
            " per occurrence"
        } else {
            ""
        };
        Err(self.format_error(format!(
            "key '{key}' holds {count} value(s) but flag '{}' takes {expected}{per}",
            flag_name(arg)
        )))
    }

    /// Validate one value with the flag's own parser.
    ///
    /// clap does not report bad defaults as errors (debug builds panic), so
    /// each value is run through a throwaway command first.
    fn check_value(&self, arg: &Arg, key: &str, text: &str) -> Result<(), ResolveError> {
        let ok = match arg.get_action() {
            ArgAction::SetTrue | ArgAction::SetFalse => matches!(text, "true" | "false"),
            ArgAction::Count => text.parse::<u8>().is_ok(),
            _ => {
                let mut probe = Arg::new("value")
                    .long("value")
                    .num_args(1)
                    .action(ArgAction::Set)
                    .allow_hyphen_values(true)
                    .value_parser(arg.get_value_parser().clone());
                if let Some(delim) = arg.get_value_delimiter() {
                    probe = probe.value_delimiter(delim).num_args(1..);
                }
                Command::new("probe")
                    .no_binary_name(true)
                    .arg(probe)
                    .try_get_matches_from([OsStr::new("--value"), OsStr::new(text)])
                    .is_ok()
            }
        };

        if ok {
            return Ok(());
        }

        let mut message = format!(
            "invalid value '{text}' for key '{key}' (flag '{}')",
            flag_name(arg)
        );
        match arg.get_action() {
            ArgAction::SetTrue | ArgAction::SetFalse => message.push_str("; expected true or false"),
            ArgAction::Count => message.push_str("; expected a small non-negative integer"),
            _ => {
                if let Some(possible) = arg.get_value_parser().possible_values() {
                    let names: Vec<String> = possible
                        .filter(|p| !p.is_hide_set())
                        .map(|p| p.get_name().to_string())
                        .collect();
                    if !names.is_empty() {
                        message.push_str(&format!("; possible values: {}", names.join(", ")));
                    }
                }
            }
        }
        Err(self.format_error(message))
    }

    fn shape_error(&self, key: &str, value: &Value) -> ResolveError {
        self.format_error(format!(
            "key '{key}' must hold a scalar or a list of scalars, found {}",
            loader::value_kind(value)
        ))
    }

    fn format_error(&self, message: String) -> ResolveError {
        ResolveError::FileFormat {
            path: self.path.clone(),
            format: self.format,
            message,
        }
    }
}

fn install(mut cmd: Command, plan: Plan) -> Command {
    for (id, defaults) in plan.args {
        cmd = cmd.mut_arg(id, |arg| arg.required(false).default_values(defaults));
    }
    for (name, sub_plan) in plan.subcommands {
        cmd = cmd.mut_subcommand(name, |sub| install(sub, sub_plan));
    }
    cmd
}

/// Named flags only; positionals and help/version never come from a file.
fn fillable(arg: &Arg) -> bool {
    !arg.is_positional()
        && !matches!(
            arg.get_action(),
            ArgAction::Help | ArgAction::HelpShort | ArgAction::HelpLong | ArgAction::Version
        )
}

fn takes_many(arg: &Arg) -> bool {
    matches!(arg.get_action(), ArgAction::Append)
        || arg.get_value_delimiter().is_some()
        || arg.get_num_args().is_some_and(|range| range.max_values() > 1)
}

fn flag_name(arg: &Arg) -> String {
    match (arg.get_long(), arg.get_short()) {
        (Some(long), _) => format!("--{long}"),
        (None, Some(short)) => format!("-{short}"),
        (None, None) => arg.get_id().as_str().to_string(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Candidate keys for `arg`, most specific first, without duplicates.
fn candidate_keys(arg: &Arg) -> Vec<String> {
    let id = arg.get_id().as_str();
    let name = arg.get_long().unwrap_or(id);

    let mut keys: Vec<String> = Vec::with_capacity(4);
    for key in [
        name.to_string(),
        name.to_snake_case(),
        name.to_lower_camel_case(),
        id.to_string(),
    ] {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Find the entry for `arg` in one scope, returning the scope-level key.
fn lookup<'a>(scope: &'a Map<String, Value>, arg: &Arg) -> Option<(String, &'a Value)> {
    for key in candidate_keys(arg) {
        if let Some(value) = scope.get(&key) {
            return Some((key, value));
        }
    }

    // Nested form: `listen-addr` → listen: { addr: ... }
    let name = arg.get_long().unwrap_or(arg.get_id().as_str());
    let mut segments = name.split('-');
    let first = segments.next()?;
    let rest: Vec<&str> = segments.collect();
    if rest.is_empty() {
        return None;
    }
    let mut current = scope.get(first)?;
    for segment in rest {
        current = current.as_object()?.get(segment)?;
    }
    Some((first.to_string(), current))
}
