#![forbid(unsafe_code)]

use std::path::Path;

use serde::Serialize;

use crate::input::Tree;

pub const SIMPLIFY_SCHEMA: &str = "loom.simplify.v1";
pub const PROVE_SCHEMA: &str = "loom.prove.v1";
pub const SELF_TEST_SCHEMA: &str = "loom.self-test.v1";

#[derive(Debug, Clone, Serialize)]
pub struct SimplifyReport {
    pub schema: &'static str,
    pub inputs: Vec<InputReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputReport {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    pub kind: &'static str,
    pub changed: bool,
    /// Printed form of `output`.
    pub text: String,
    pub output: Tree,
}

impl InputReport {
    pub fn new(input: &Path, config: Option<&Path>, before: &Tree, output: Tree) -> Self {
        Self {
            input: input.display().to_string(),
            config: config.map(|p| p.display().to_string()),
            kind: output.kind(),
            changed: *before != output,
            text: output.to_string(),
            output,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProveReport {
    pub schema: &'static str,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    pub goal: String,
    /// `false` means not proved, not disproved.
    pub proved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelfTestSummary {
    pub schema: &'static str,
    pub passed: usize,
    pub total: usize,
}

impl From<loom_simplify::SelfTestReport> for SelfTestSummary {
    fn from(r: loom_simplify::SelfTestReport) -> Self {
        Self {
            schema: SELF_TEST_SCHEMA,
            passed: r.passed,
            total: r.total,
        }
    }
}
