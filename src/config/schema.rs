//! Sanity checks on a target's declared argument schema.
//!
//! clap only detects these mistakes through debug assertions at build time,
//! which panic. Checking the unbuilt command first turns them into a
//! [`ResolveError::Schema`] the caller can report.

use std::collections::HashSet;

use clap::Command;

use super::error::ResolveError;

/// Validate `cmd` and all of its subcommands.
///
/// Rejects duplicate argument ids, duplicate long flags and duplicate short
/// flags within one command. Global arguments are checked against every
/// subcommand they propagate into.
pub fn validate(cmd: &Command) -> Result<(), ResolveError> {
    validate_scope(cmd, &[], cmd.get_name())
}

fn validate_scope(
    cmd: &Command,
    inherited: &[&clap::Arg],
    path: &str,
) -> Result<(), ResolveError> {
    let mut ids = HashSet::new();
    let mut longs = HashSet::new();
    let mut shorts = HashSet::new();

    let own: Vec<&clap::Arg> = cmd.get_arguments().collect();
    // An inherited global shadowed by a same-id local arg is clap's normal
    // propagation rule, not a conflict.
    let own_ids: HashSet<&str> = own.iter().map(|a| a.get_id().as_str()).collect();
    let visible = own.iter().copied().chain(
        inherited
            .iter()
            .copied()
            .filter(|a| !own_ids.contains(a.get_id().as_str())),
    );

    for arg in visible {
        let id = arg.get_id().as_str();
        if !ids.insert(id) {
            return Err(schema_error(path, format!("argument id '{id}' is declared twice")));
        }
        if let Some(long) = arg.get_long() {
            if !longs.insert(long) {
                return Err(schema_error(
                    path,
                    format!("long flag '--{long}' is used by more than one argument"),
                ));
            }
        }
        if let Some(short) = arg.get_short() {
            if !shorts.insert(short) {
                return Err(schema_error(
                    path,
                    format!("short flag '-{short}' is used by more than one argument"),
                ));
            }
        }
    }

    let mut globals: Vec<&clap::Arg> = inherited.to_vec();
    globals.extend(own.iter().copied().filter(|a| a.is_global_set()));

    for sub in cmd.get_subcommands() {
        let sub_path = format!("{path} {}", sub.get_name());
        validate_scope(sub, &globals, &sub_path)?;
    }

    Ok(())
}

fn schema_error(path: &str, detail: String) -> ResolveError {
    ResolveError::Schema {
        message: format!("{detail} (in '{path}')"),
    }
}
