#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use loom_ir::{Interval, ModulusRemainder, Scope};
use loom_simplify::SimplifyOptions;
use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_FILE: &str = "loom.toml";

#[derive(Debug, Error, Diagnostic)]
#[error("config error: {message}")]
#[diagnostic(code(loom::config))]
pub struct ConfigError {
    pub message: String,
}

/// Options and caller facts for one run.
#[derive(Clone, Debug, Default)]
pub struct LoomConfig {
    pub path: Option<PathBuf>,
    pub options: SimplifyOptions,
    pub bounds: BTreeMap<String, Interval>,
    pub alignment: BTreeMap<String, ModulusRemainder>,
}

impl LoomConfig {
    pub fn bounds_scope(&self) -> Scope<Interval> {
        self.bounds.iter().map(|(name, iv)| (name.clone(), *iv)).collect()
    }

    pub fn alignment_scope(&self) -> Scope<ModulusRemainder> {
        self.alignment.iter().map(|(name, mr)| (name.clone(), *mr)).collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    simplify: SimplifyOptions,
    bounds: BTreeMap<String, RawBounds>,
    alignment: BTreeMap<String, RawAlignment>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBounds {
    #[serde(default)]
    min: Option<i64>,
    #[serde(default)]
    max: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAlignment {
    modulus: i64,
    #[serde(default)]
    remainder: i64,
}

/// Nearest `loom.toml` at or above `start`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut cur = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    loop {
        let candidate = cur.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        match cur.parent() {
            Some(p) => cur = p.to_path_buf(),
            None => return None,
        }
    }
}

/// Loads the config that governs `start`, or defaults when there is none.
pub fn load_config(start: &Path) -> Result<LoomConfig, ConfigError> {
    match find_config(start) {
        Some(path) => load_config_file(&path),
        None => {
            debug!(start = %start.display(), "no {CONFIG_FILE} found, using defaults");
            Ok(LoomConfig::default())
        }
    }
}

pub fn load_config_file(path: &Path) -> Result<LoomConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|e| ConfigError {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    let mut cfg = parse_config(&raw).map_err(|e| ConfigError {
        message: format!("{}: {}", path.display(), e.message),
    })?;
    debug!(path = %path.display(), bounds = cfg.bounds.len(), alignment = cfg.alignment.len(), "loaded config");
    cfg.path = Some(path.to_path_buf());
    Ok(cfg)
}

pub fn parse_config(raw: &str) -> Result<LoomConfig, ConfigError> {
    let parsed: RawConfig = toml::from_str(raw).map_err(|e| ConfigError {
        message: format!("failed to parse: {e}"),
    })?;

    let mut bounds = BTreeMap::new();
    for (name, b) in parsed.bounds {
        if let (Some(lo), Some(hi)) = (b.min, b.max) {
            if lo > hi {
                return Err(ConfigError {
                    message: format!("bounds for `{name}` are empty: min {lo} exceeds max {hi}"),
                });
            }
        }
        bounds.insert(name, Interval { min: b.min, max: b.max });
    }

    let mut alignment = BTreeMap::new();
    for (name, a) in parsed.alignment {
        if a.modulus <= 0 {
            return Err(ConfigError {
                message: format!("alignment for `{name}` needs a positive modulus, got {}", a.modulus),
            });
        }
        alignment.insert(name, ModulusRemainder::new(a.modulus, a.remainder));
    }

    if parsed.simplify.max_rewrites == 0 {
        return Err(ConfigError {
            message: "simplify.max_rewrites must be at least 1".to_string(),
        });
    }

    Ok(LoomConfig {
        path: None,
        options: parsed.simplify,
        bounds,
        alignment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_every_table() {
        let cfg = parse_config(
            r#"
[simplify]
remove_dead_lets = false
max_rewrites = 4

[bounds.x]
min = 0
max = 100

[bounds.n]
min = 1

[alignment.x]
modulus = 4
remainder = 6
"#,
        )
        .unwrap();
        assert!(!cfg.options.remove_dead_lets);
        assert_eq!(cfg.options.max_rewrites, 4);
        assert_eq!(cfg.options.max_rewrite_depth, SimplifyOptions::default().max_rewrite_depth);
        assert_eq!(cfg.bounds["x"], Interval::bounded(0, 100));
        assert_eq!(cfg.bounds["n"], Interval::at_least(1));
        assert_eq!(cfg.alignment["x"], ModulusRemainder::new(4, 2));

        let scope = cfg.bounds_scope();
        assert_eq!(scope.get("x"), Some(&Interval::bounded(0, 100)));
        assert_eq!(cfg.alignment_scope().len(), 1);
    }

    #[test]
    fn empty_file_means_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.options, SimplifyOptions::default());
        assert!(cfg.bounds.is_empty());
        assert!(cfg.alignment.is_empty());
    }

    #[test]
    fn rejects_bad_facts() {
        let err = parse_config("[bounds.x]\nmin = 5\nmax = 1\n").unwrap_err();
        assert!(err.message.contains("`x`"), "{}", err.message);
        assert!(parse_config("[alignment.y]\nmodulus = 0\n").is_err());
        assert!(parse_config("[alignment.y]\nmodulus = -4\n").is_err());
        assert!(parse_config("[bounds.x]\nlow = 1\n").is_err());
        assert!(parse_config("[simplify]\nmax_rewrites = 0\n").is_err());
        assert!(parse_config("[extras]\n").is_err());
    }

    #[test]
    fn finds_config_in_an_ancestor() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let input = nested.join("tree.json");
        fs::write(&input, "{}").unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[bounds.x]\nmin = 0\nmax = 7\n").unwrap();

        assert_eq!(find_config(&input), Some(dir.path().join(CONFIG_FILE)));
        let cfg = load_config(&input).unwrap();
        assert_eq!(cfg.path.as_deref(), Some(dir.path().join(CONFIG_FILE).as_path()));
        assert_eq!(cfg.bounds["x"], Interval::bounded(0, 7));
    }

    #[test]
    fn nearest_config_wins() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("inner");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[bounds.x]\nmin = 0\nmax = 7\n").unwrap();
        fs::write(nested.join(CONFIG_FILE), "[bounds.x]\nmin = 1\nmax = 2\n").unwrap();

        let cfg = load_config(&nested).unwrap();
        assert_eq!(cfg.bounds["x"], Interval::bounded(1, 2));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[bounds.x]\nmin = 9\nmax = 0\n").unwrap();
        let err = load_config_file(&path).unwrap_err();
        assert!(err.message.contains(CONFIG_FILE), "{}", err.message);
    }
}
