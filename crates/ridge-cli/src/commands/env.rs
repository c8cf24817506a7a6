use miette::{IntoDiagnostic, Result};
use ridge_core::dev::{load_env, resolve_env_prefix};
use ridge_core::version::OUTPUT_SCHEMA_VERSION;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Serialize)]
struct EnvOutput<'a> {
    schema_version: u32,
    mode: &'a str,
    prefixes: &'a [String],
    vars: &'a BTreeMap<String, String>,
    user_node_env: Option<&'a str>,
}

/// Run the env command.
///
/// JSON output is a single object; text output is one `KEY=value` line per
/// exposed variable.
pub fn run(mode: &str, dir: &Path, prefixes: &[String], json: bool) -> Result<()> {
    let prefixes = resolve_env_prefix(prefixes).into_diagnostic()?;
    let loaded = load_env(mode, dir, &prefixes).into_diagnostic()?;
    tracing::debug!(mode, dir = %dir.display(), count = loaded.vars.len(), "loaded env");

    if json {
        let output = EnvOutput {
            schema_version: OUTPUT_SCHEMA_VERSION,
            mode,
            prefixes: &prefixes,
            vars: &loaded.vars,
            user_node_env: loaded.user_node_env.as_deref(),
        };
        let json = serde_json::to_string_pretty(&output).into_diagnostic()?;
        println!("{json}");
    } else {
        for (key, value) in &loaded.vars {
            println!("{key}={value}");
        }
        if let Some(node_env) = &loaded.user_node_env {
            println!("# NODE_ENV={node_env}");
        }
    }
    Ok(())
}
