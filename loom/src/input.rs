#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use std::fs;
use std::path::Path;

use loom_ir::{Expr, Stmt, check_well_scoped_expr, check_well_scoped_stmt};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("input error: {message}")]
#[diagnostic(code(loom::input), help("inputs are JSON-encoded `Expr` or `Stmt` trees"))]
pub struct InputError {
    pub message: String,
}

/// A tree read from disk. Expression and statement node names are
/// disjoint, so the JSON shape alone decides which one it is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tree {
    Expr(Expr),
    Stmt(Stmt),
}

impl Tree {
    pub fn kind(&self) -> &'static str {
        match self {
            Tree::Expr(_) => "expr",
            Tree::Stmt(_) => "stmt",
        }
    }
}

impl std::fmt::Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tree::Expr(e) => e.fmt(f),
            Tree::Stmt(s) => s.fmt(f),
        }
    }
}

/// Reads and scope-checks one input file.
pub fn read_tree(path: &Path) -> Result<Tree, InputError> {
    let raw = fs::read_to_string(path).map_err(|e| InputError {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    parse_tree(&raw).map_err(|e| InputError {
        message: format!("{}: {}", path.display(), e.message),
    })
}

pub fn parse_tree(raw: &str) -> Result<Tree, InputError> {
    let tree: Tree = serde_json::from_str(raw).map_err(|e| InputError {
        message: format!("not an expression or statement: {e}"),
    })?;
    let checked = match &tree {
        Tree::Expr(e) => check_well_scoped_expr(e),
        Tree::Stmt(s) => check_well_scoped_stmt(s),
    };
    checked.map_err(|v| InputError { message: v.to_string() })?;
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_decides_the_kind() {
        let e = Expr::add(Expr::var("x"), Expr::int(1));
        let s = Stmt::store("buf", Expr::int(0), e.clone());
        let te = parse_tree(&serde_json::to_string(&e).unwrap()).unwrap();
        let ts = parse_tree(&serde_json::to_string(&s).unwrap()).unwrap();
        assert_eq!(te, Tree::Expr(e));
        assert_eq!(ts.kind(), "stmt");
        assert_eq!(ts, Tree::Stmt(s));
    }

    #[test]
    fn rejects_garbage_and_bad_scoping() {
        assert!(parse_tree("{\"Nope\": 1}").is_err());
        let inner = Expr::let_in("x", Expr::int(1), Expr::var("x"));
        let e = Expr::let_in("x", Expr::int(2), inner);
        let err = parse_tree(&serde_json::to_string(&e).unwrap()).unwrap_err();
        assert!(err.message.contains("more than once"), "{}", err.message);
    }
}
