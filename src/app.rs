use crate::cli::{Cli, Commands};
use crate::discover::RegistrySource;
use crate::events::NullEvents;
use crate::graph::GraphBuilder;
use crate::model::manifest;
use crate::schema::ddl::DdlSchema;
use crate::schema::SchemaBackend;
use crate::store::DocumentStore;
use crate::utils::config;
use clap::CommandFactory;
use clap_complete::generate;
use std::io;
use std::sync::Arc;

/// Run the CLI logic in-process.
///
/// Returns an exit code (0 = success).
#[must_use]
pub fn run_cli(cli: Cli) -> i32 {
    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let bin_name = env!("CARGO_PKG_NAME");
            let mut out = io::stdout();
            generate(shell, &mut cmd, bin_name, &mut out);
            0
        }
        Commands::Generate { manifest, schema, config: config_path, output, force, dry_run, pretty } => {
            let cfg = match &config_path {
                Some(p) => match config::load_config_at(p) {
                    Some(cfg) => cfg,
                    None => {
                        eprintln!("Failed to load config {}", p.display());
                        return 1;
                    }
                },
                None => config::GraphConfig::default(),
            };

            let registry = match manifest::load_manifest(&manifest) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Failed to load manifest {}: {e}", manifest.display());
                    return 1;
                }
            };

            let backend: Option<Box<dyn SchemaBackend>> = match &schema {
                Some(p) => match DdlSchema::from_path(p) {
                    Ok(s) => Some(Box::new(s)),
                    Err(e) => {
                        eprintln!("Failed to load schema dump {}: {e}", p.display());
                        return 1;
                    }
                },
                None => None,
            };

            let mut builder = GraphBuilder::new(
                cfg.clone(),
                Arc::new(registry),
                Box::new(RegistrySource),
                backend,
                Arc::new(NullEvents),
            );

            let document = match builder.generate(None, None) {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("Generate failed: {e}");
                    return 1;
                }
            };

            if dry_run {
                match document.to_json(pretty) {
                    Ok(json) => {
                        println!("{json}");
                        return 0;
                    }
                    Err(e) => {
                        eprintln!("JSON encode error: {e}");
                        return 1;
                    }
                }
            }

            let out_path = output.unwrap_or_else(|| cfg.output_path.clone());
            let store = DocumentStore::new();
            if let Err(e) = store.write(&document, &out_path, force, pretty) {
                eprintln!("Failed to write {}: {e}", out_path.display());
                return 1;
            }

            if !cli.quiet {
                for warning in &document.warnings {
                    eprintln!("warning: {warning}");
                }
                println!(
                    "Model graph written to {} ({} models, {} relationships, {} loops)",
                    out_path.display(),
                    document.total_models,
                    document.total_relationships,
                    document.loops.len()
                );
            }
            0
        }
    }
}
