#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// One self-test check whose result did not match.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("{name}: {detail}")]
#[diagnostic(code(loom::selftest))]
pub struct SelfTestFailure {
    pub name: &'static str,
    pub detail: String,
}

#[derive(Debug, Error, Diagnostic)]
#[error("self-test failed: {} of {total} checks did not hold", failures.len())]
#[diagnostic(code(loom::selftest), help("run with LOOM_LOG=loom_simplify=debug to see every rule firing"))]
pub struct SelfTestError {
    pub total: usize,
    #[related]
    pub failures: Vec<SelfTestFailure>,
}
