//! `.env` file loading.
//!
//! Loads `.env`, `.env.local`, `.env.[mode]`, `.env.[mode].local` from the env
//! directory in that order (later files win), expands `$VAR` references and
//! exposes only prefixed keys. Process variables carrying an exposed prefix
//! override file values.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::EnvError;

/// Prefix exposed when none is configured.
pub const DEFAULT_ENV_PREFIX: &str = "VITE_";

/// Process variable that, when already set, suppresses `user_node_env`.
pub const USER_NODE_ENV_VAR: &str = "VITE_USER_NODE_ENV";

/// Result of [`load_env`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedEnv {
    /// Exposed variables.
    pub vars: BTreeMap<String, String>,
    /// `NODE_ENV` declared by an env file, for the caller to apply.
    pub user_node_env: Option<String>,
}

/// Parse a `.env` file's contents into key-value pairs, in file order.
///
/// Supports:
/// - `KEY=value` (unquoted, ` #` starts an inline comment)
/// - `KEY="value"` (double-quoted, with escape sequences)
/// - `KEY='value'` (single-quoted, literal and never expanded)
/// - an optional `export ` prefix
#[must_use]
pub fn parse_env_file(content: &str) -> Vec<(String, EnvValue)> {
    let mut env = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some(eq_pos) = line.find('=') else {
            continue;
        };

        let key = line[..eq_pos].trim();
        let key = key.strip_prefix("export ").unwrap_or(key).trim();
        if key.is_empty() {
            continue;
        }

        let raw_value = line[eq_pos + 1..].trim();
        let value = if raw_value.starts_with('"') {
            EnvValue::Expandable(parse_double_quoted(raw_value))
        } else if raw_value.starts_with('\'') {
            EnvValue::Literal(parse_single_quoted(raw_value))
        } else {
            EnvValue::Expandable(parse_unquoted(raw_value))
        };

        env.push((key.to_string(), value));
    }

    env
}

/// A parsed value, tagged with whether `$VAR` expansion applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    Expandable(String),
    Literal(String),
}

impl EnvValue {
    fn raw(&self) -> &str {
        match self {
            Self::Expandable(s) | Self::Literal(s) => s,
        }
    }
}

fn parse_double_quoted(raw: &str) -> String {
    let inner = &raw[1..];

    let mut result = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => break,
            '\\' => {
                if let Some(escaped) = chars.next() {
                    match escaped {
                        'n' => result.push('\n'),
                        'r' => result.push('\r'),
                        't' => result.push('\t'),
                        '\\' => result.push('\\'),
                        '"' => result.push('"'),
                        other => {
                            // kept for the expander (`\$`)
                            result.push('\\');
                            result.push(other);
                        }
                    }
                }
            }
            _ => result.push(c),
        }
    }

    result
}

fn parse_single_quoted(raw: &str) -> String {
    let inner = &raw[1..];
    match inner.find('\'') {
        Some(end) => inner[..end].to_string(),
        None => inner.to_string(),
    }
}

fn parse_unquoted(raw: &str) -> String {
    match raw.find(" #") {
        Some(comment_pos) => raw[..comment_pos].trim_end().to_string(),
        None => raw.to_string(),
    }
}

/// Expand `$VAR` and `${VAR}` in `value`.
///
/// Process variables take precedence over parsed ones; unknown names expand
/// to the empty string and `\$` yields a literal `$`. References are followed
/// through parsed values up to a fixed depth, which also stops cycles.
fn expand(
    value: &str,
    parsed: &HashMap<String, EnvValue>,
    process: &BTreeMap<String, String>,
    depth: usize,
) -> String {
    const MAX_DEPTH: usize = 16;

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'$') => {
                chars.next();
                out.push('$');
            }
            '$' => {
                let braced = chars.peek() == Some(&'{');
                if braced {
                    chars.next();
                }
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if next == '_' || next.is_ascii_alphanumeric() {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if braced {
                    if chars.peek() == Some(&'}') {
                        chars.next();
                    } else {
                        // unterminated: keep the text as written
                        out.push_str("${");
                        out.push_str(&name);
                        continue;
                    }
                }
                if name.is_empty() {
                    out.push('$');
                    if braced {
                        out.push_str("{}");
                    }
                    continue;
                }
                if let Some(value) = process.get(&name) {
                    out.push_str(value);
                } else if let Some(value) = parsed.get(&name) {
                    match value {
                        EnvValue::Expandable(raw) => {
                            if depth < MAX_DEPTH {
                                out.push_str(&expand(raw, parsed, process, depth + 1));
                            }
                        }
                        EnvValue::Literal(raw) => out.push_str(raw),
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Validate configured prefixes; an empty list means [`DEFAULT_ENV_PREFIX`].
pub fn resolve_env_prefix(prefixes: &[String]) -> Result<Vec<String>, EnvError> {
    if prefixes.is_empty() {
        return Ok(vec![DEFAULT_ENV_PREFIX.to_string()]);
    }
    if prefixes.iter().any(String::is_empty) {
        return Err(EnvError::EmptyPrefix);
    }
    Ok(prefixes.to_vec())
}

/// Load env files for `mode` from `env_dir` against the current process environment.
pub fn load_env(mode: &str, env_dir: &Path, prefixes: &[String]) -> Result<LoadedEnv, EnvError> {
    let process: BTreeMap<String, String> = std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect();
    load_env_with(mode, env_dir, prefixes, &process)
}

/// [`load_env`] with an explicit process environment.
pub fn load_env_with(
    mode: &str,
    env_dir: &Path,
    prefixes: &[String],
    process: &BTreeMap<String, String>,
) -> Result<LoadedEnv, EnvError> {
    if mode == "local" {
        return Err(EnvError::ReservedMode);
    }
    let prefixes = resolve_env_prefix(prefixes)?;

    let files = [
        ".env".to_string(),
        ".env.local".to_string(),
        format!(".env.{mode}"),
        format!(".env.{mode}.local"),
    ];

    let mut order: Vec<String> = Vec::new();
    let mut parsed: HashMap<String, EnvValue> = HashMap::new();
    for file in &files {
        let path = env_dir.join(file);
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        tracing::debug!(path = %path.display(), "loaded env file");
        for (key, value) in parse_env_file(&content) {
            if !parsed.contains_key(&key) {
                order.push(key.clone());
            }
            parsed.insert(key, value);
        }
    }

    let user_node_env = match parsed.get("NODE_ENV") {
        Some(value) if !process.contains_key(USER_NODE_ENV_VAR) => Some(value.raw().to_string()),
        _ => None,
    };

    let exposed = |key: &str| prefixes.iter().any(|prefix| key.starts_with(prefix.as_str()));

    let mut vars = BTreeMap::new();
    for key in order.iter().filter(|key| exposed(key)) {
        let value = match &parsed[key] {
            EnvValue::Expandable(raw) => expand(raw, &parsed, process, 0),
            EnvValue::Literal(raw) => raw.clone(),
        };
        vars.insert(key.clone(), value);
    }

    // inline process variables win over files
    for (key, value) in process {
        if exposed(key) {
            vars.insert(key.clone(), value.clone());
        }
    }

    Ok(LoadedEnv {
        vars,
        user_node_env,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    fn value_of(env: &[(String, EnvValue)], key: &str) -> String {
        env.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.raw().to_string())
            .unwrap()
    }

    fn prefixes() -> Vec<String> {
        vec!["VITE_".to_string()]
    }

    #[test]
    fn test_parse_forms() {
        let env = parse_env_file(
            "# comment\n\nA=value # inline\nexport B=1\nC=\"line1\\nline2\"\nD='$literal'\nE=a=b=c\nF=\n",
        );
        assert_eq!(value_of(&env, "A"), "value");
        assert_eq!(value_of(&env, "B"), "1");
        assert_eq!(value_of(&env, "C"), "line1\nline2");
        assert_eq!(value_of(&env, "D"), "$literal");
        assert_eq!(value_of(&env, "E"), "a=b=c");
        assert_eq!(value_of(&env, "F"), "");
        assert!(matches!(env[3].1, EnvValue::Literal(_)));
    }

    #[test]
    fn test_files_merge_in_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".env"), "VITE_X=base\nVITE_BASE=1").unwrap();
        fs::write(dir.path().join(".env.local"), "VITE_X=local").unwrap();
        fs::write(dir.path().join(".env.staging"), "VITE_X=staging").unwrap();
        fs::write(dir.path().join(".env.staging.local"), "VITE_X=staging_local").unwrap();

        let env = load_env_with("staging", dir.path(), &prefixes(), &BTreeMap::new()).unwrap();
        assert_eq!(env.vars.get("VITE_X").unwrap(), "staging_local");
        assert_eq!(env.vars.get("VITE_BASE").unwrap(), "1");
    }

    #[test]
    fn test_only_prefixed_keys_are_exposed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".env"), "VITE_PUBLIC=1\nDB_PASSWORD=secret").unwrap();

        let env = load_env_with("development", dir.path(), &prefixes(), &BTreeMap::new()).unwrap();
        assert_eq!(env.vars.len(), 1);
        assert!(env.vars.contains_key("VITE_PUBLIC"));
    }

    #[test]
    fn test_expansion() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(".env"),
            "HOST=localhost\nPORT=3000\nVITE_URL=http://${HOST}:$PORT/\nVITE_PRICE=\\$5\nVITE_RAW='$HOST'\nVITE_MISSING=[$NOPE]\nVITE_HOME=$HOME",
        )
        .unwrap();
        let process = BTreeMap::from([("HOME".to_string(), "/home/me".to_string())]);

        let env = load_env_with("development", dir.path(), &prefixes(), &process).unwrap();
        assert_eq!(env.vars["VITE_URL"], "http://localhost:3000/");
        assert_eq!(env.vars["VITE_PRICE"], "$5");
        assert_eq!(env.vars["VITE_RAW"], "$HOST");
        assert_eq!(env.vars["VITE_MISSING"], "[]");
        assert_eq!(env.vars["VITE_HOME"], "/home/me");
    }

    #[test]
    fn test_self_reference_terminates() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".env"), "VITE_A=$VITE_B\nVITE_B=$VITE_A").unwrap();
        let env = load_env_with("development", dir.path(), &prefixes(), &BTreeMap::new()).unwrap();
        assert_eq!(env.vars["VITE_A"], "");
    }

    #[test]
    fn test_process_env_overrides_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".env"), "VITE_MODE_NAME=file").unwrap();
        let process = BTreeMap::from([
            ("VITE_MODE_NAME".to_string(), "inline".to_string()),
            ("VITE_ONLY_PROCESS".to_string(), "yes".to_string()),
            ("PATH".to_string(), "/bin".to_string()),
        ]);

        let env = load_env_with("development", dir.path(), &prefixes(), &process).unwrap();
        assert_eq!(env.vars["VITE_MODE_NAME"], "inline");
        assert_eq!(env.vars["VITE_ONLY_PROCESS"], "yes");
        assert!(!env.vars.contains_key("PATH"));
    }

    #[test]
    fn test_user_node_env() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".env.production"), "NODE_ENV=development").unwrap();

        let env = load_env_with("production", dir.path(), &prefixes(), &BTreeMap::new()).unwrap();
        assert_eq!(env.user_node_env.as_deref(), Some("development"));

        let preset = BTreeMap::from([(USER_NODE_ENV_VAR.to_string(), "test".to_string())]);
        let env = load_env_with("production", dir.path(), &prefixes(), &preset).unwrap();
        assert_eq!(env.user_node_env, None);
    }

    #[test]
    fn test_local_mode_is_rejected() {
        let dir = tempdir().unwrap();
        assert_eq!(
            load_env_with("local", dir.path(), &prefixes(), &BTreeMap::new()),
            Err(EnvError::ReservedMode)
        );
    }

    #[test]
    fn test_resolve_env_prefix() {
        assert_eq!(resolve_env_prefix(&[]).unwrap(), vec![DEFAULT_ENV_PREFIX]);
        assert_eq!(
            resolve_env_prefix(&["APP_".to_string(), String::new()]),
            Err(EnvError::EmptyPrefix)
        );
    }

    #[test]
    #[serial]
    fn test_load_env_reads_process_environment() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".env"), "RIDGE_TEST_FROM_FILE=file").unwrap();
        std::env::set_var("RIDGE_TEST_FROM_PROCESS", "process");

        let env = load_env("development", dir.path(), &["RIDGE_TEST_".to_string()]).unwrap();
        std::env::remove_var("RIDGE_TEST_FROM_PROCESS");

        assert_eq!(env.vars["RIDGE_TEST_FROM_FILE"], "file");
        assert_eq!(env.vars["RIDGE_TEST_FROM_PROCESS"], "process");
    }
}
