#![forbid(unsafe_code)]
#![allow(unused_assignments)]

mod config;
mod input;
mod report;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use miette::{Diagnostic, IntoDiagnostic};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use loom_simplify::{
    can_prove_with, simplify_expr_with_options, simplify_exprs, simplify_stmt_with_options, simplify_test,
};

use crate::config::{LoomConfig, load_config, load_config_file};
use crate::input::{InputError, Tree, read_tree};
use crate::report::{InputReport, PROVE_SCHEMA, ProveReport, SIMPLIFY_SCHEMA, SelfTestSummary, SimplifyReport};

#[derive(Parser, Debug)]
#[command(name = "loom", version, about = "Algebraic simplifier and prover for the loom IR")]
struct Cli {
    /// Log every rule that fires (overrides LOOM_LOG).
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    /// Use this config file instead of searching for loom.toml next to each input.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Simplify JSON-encoded expressions or statements.
    Simplify {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Keep `let` bindings even when nothing references them.
        #[arg(long, default_value_t = false)]
        keep_dead_lets: bool,

        /// Simplify each expression of a statement on its own, without facts from
        /// enclosing statements. Expression inputs are rejected.
        #[arg(long, default_value_t = false)]
        exprs_only: bool,

        /// Print a machine-readable report instead of the simplified trees.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Try to prove that a boolean expression always holds.
    Prove {
        file: PathBuf,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Run the built-in rewrite and proof checks.
    SelfTest {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Debug, Error, Diagnostic)]
#[error("could not prove {goal}")]
#[diagnostic(
    code(loom::prove),
    help("a failed proof is not a counterexample; add bounds or alignment facts to loom.toml")
)]
struct NotProved {
    goal: String,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("LOOM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Cmd::Simplify {
            files,
            keep_dead_lets,
            exprs_only,
            json,
        } => {
            let started = Instant::now();
            let inputs = files
                .par_iter()
                .map(|path| simplify_file(path, cli.config.as_deref(), keep_dead_lets, exprs_only))
                .collect::<miette::Result<Vec<_>>>()?;
            info!(inputs = inputs.len(), elapsed_ms = started.elapsed().as_millis() as u64, "simplified");

            let mut out = io::stdout().lock();
            if json {
                let report = SimplifyReport {
                    schema: SIMPLIFY_SCHEMA,
                    inputs,
                };
                writeln!(out, "{}", serde_json::to_string_pretty(&report).into_diagnostic()?).into_diagnostic()?;
            } else {
                for r in &inputs {
                    if files.len() > 1 {
                        writeln!(out, "// {}", r.input).into_diagnostic()?;
                    }
                    writeln!(out, "{}", r.text).into_diagnostic()?;
                }
            }
            Ok(())
        }
        Cmd::Prove { file, json } => {
            let cfg = resolve_config(&file, cli.config.as_deref())?;
            let goal = match read_tree(&file)? {
                Tree::Expr(e) => e,
                Tree::Stmt(_) => {
                    return Err(InputError {
                        message: format!("{} holds a statement; `prove` takes a boolean expression", file.display()),
                    }
                    .into());
                }
            };
            let proved = can_prove_with(&goal, &cfg.bounds_scope(), &cfg.alignment_scope());
            debug!(goal = %goal, proved, "prove");

            if json {
                let report = ProveReport {
                    schema: PROVE_SCHEMA,
                    input: file.display().to_string(),
                    config: cfg.path.as_ref().map(|p| p.display().to_string()),
                    goal: goal.to_string(),
                    proved,
                };
                println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
            } else if proved {
                println!("proved: {goal}");
            }
            if proved {
                Ok(())
            } else {
                Err(NotProved {
                    goal: goal.to_string(),
                }
                .into())
            }
        }
        Cmd::SelfTest { json } => {
            let report = simplify_test()?;
            if json {
                let summary = SelfTestSummary::from(report);
                println!("{}", serde_json::to_string_pretty(&summary).into_diagnostic()?);
            } else {
                println!("self-test: {}/{} checks passed", report.passed, report.total);
            }
            Ok(())
        }
    }
}

fn resolve_config(input: &Path, explicit: Option<&Path>) -> miette::Result<LoomConfig> {
    let cfg = match explicit {
        Some(path) => load_config_file(path)?,
        None => load_config(input)?,
    };
    Ok(cfg)
}

/// One task per input; each builds its own fact stores.
fn simplify_file(
    path: &Path,
    explicit_config: Option<&Path>,
    keep_dead_lets: bool,
    exprs_only: bool,
) -> miette::Result<InputReport> {
    let mut cfg = resolve_config(path, explicit_config)?;
    if keep_dead_lets {
        cfg.options.remove_dead_lets = false;
    }
    let tree = read_tree(path)?;
    debug!(input = %path.display(), kind = tree.kind(), "simplifying");

    let bounds = cfg.bounds_scope();
    let align = cfg.alignment_scope();
    let output = match (&tree, exprs_only) {
        (Tree::Stmt(s), true) => Tree::Stmt(simplify_exprs(s)),
        (Tree::Stmt(s), false) => Tree::Stmt(simplify_stmt_with_options(s, &cfg.options, &bounds, &align)),
        (Tree::Expr(e), false) => Tree::Expr(simplify_expr_with_options(e, &cfg.options, &bounds, &align)),
        (Tree::Expr(_), true) => {
            return Err(InputError {
                message: format!("{}: --exprs-only takes statements, this file holds an expression", path.display()),
            }
            .into());
        }
    };
    Ok(InputReport::new(path, cfg.path.as_deref(), &tree, output))
}
