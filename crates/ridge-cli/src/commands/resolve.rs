use miette::{miette, IntoDiagnostic, Result};
use ridge_core::dev::DevSession;
use ridge_core::version::OUTPUT_SCHEMA_VERSION;
use ridge_core::{Config, ResolveOutcome, ResolvePlugin};
use ridge_util::path::{normalize_path, resolve};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Parsed `ridge resolve` arguments.
#[derive(Debug)]
pub struct ResolveAction {
    pub specifier: String,
    pub importer: Option<String>,
    pub build: bool,
    pub ssr: bool,
    pub src: bool,
    pub dedupe: Vec<String>,
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ResolveOutput {
    Resolved {
        schema_version: u32,
        id: String,
        kind: &'static str,
        module_side_effects: Option<bool>,
    },
    NotApplicable {
        schema_version: u32,
    },
    Error {
        schema_version: u32,
        usage_error: bool,
        message: String,
    },
}

pub fn run(config: &Config, action: ResolveAction, json: bool) -> Result<()> {
    let mut options = config
        .resolve
        .clone()
        .with_build(action.build || config.resolve.is_build)
        .with_ssr(action.ssr || config.resolve.ssr)
        .with_as_src(action.src || config.resolve.as_src);
    if !action.dedupe.is_empty() {
        options = options.with_dedupe(action.dedupe);
    }

    let root = options.root.clone();
    let mut plugin = ResolvePlugin::new(options);
    if let Some(dir) = action.cache_dir {
        let session = DevSession::load(root.join(dir)).into_diagnostic()?;
        plugin.configure_server(Arc::new(session));
    }

    // relative importers are taken from the project root
    let importer = action
        .importer
        .map(|importer| normalize_path(&resolve(&root, &importer)));

    match plugin.resolve_id(&action.specifier, importer.as_deref()) {
        Ok(ResolveOutcome::Resolved(resolved)) => {
            if json {
                print_json(&ResolveOutput::Resolved {
                    schema_version: OUTPUT_SCHEMA_VERSION,
                    id: resolved.id.to_string(),
                    kind: resolved.id.kind(),
                    module_side_effects: resolved.module_side_effects,
                })?;
            } else {
                println!("{}", resolved.id);
            }
            Ok(())
        }
        Ok(ResolveOutcome::NotApplicable) => {
            if json {
                print_json(&ResolveOutput::NotApplicable {
                    schema_version: OUTPUT_SCHEMA_VERSION,
                })?;
            } else {
                println!("(not handled by {})", ResolvePlugin::NAME);
            }
            Ok(())
        }
        Err(err) => {
            if json {
                print_json(&ResolveOutput::Error {
                    schema_version: OUTPUT_SCHEMA_VERSION,
                    usage_error: err.is_usage_error(),
                    message: err.to_string(),
                })?;
            }
            Err(miette!("failed to resolve \"{}\": {err}", action.specifier))
        }
    }
}

fn print_json(output: &ResolveOutput) -> Result<()> {
    let json = serde_json::to_string_pretty(output).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
