//! Validation runner for the CLI.
//!
//! Work is split so that nothing touches the network until input is known to
//! be good: `plan` reads and checks every document locally, and only then
//! does the caller connect an analyzer and hand the plan to `run_plan`.

use crate::analyzer::PolicyAnalyzer;
use crate::models::{ExtractedPolicy, Outcome, PolicyReport, PolicyType, ValidationRun};
use crate::source::{InputError, PolicySource};
use crate::template::{self, TemplateError};
use std::path::PathBuf;

/// Report name used when a single document is validated.
pub const SINGLE_POLICY_NAME: &str = "Policy";

pub const EXIT_OK: i32 = 0;
pub const EXIT_FINDINGS: i32 = 1;
pub const EXIT_EMPTY_TEMPLATE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_ERROR: i32 = 3;

#[derive(Debug, Clone)]
/// What the user asked to validate.
pub enum Input {
    Policy(PolicySource),
    Template(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("Failed to extract policies from template: {0}")]
    Template(#[from] TemplateError),
    #[error("No IAM policies found in template")]
    EmptyTemplate,
}

impl PlanError {
    /// Template problems always fail the process; input problems only when
    /// the caller opted in to `fail_on_error`.
    pub fn exit_code(&self, fail_on_error: bool) -> i32 {
        match self {
            PlanError::Template(_) | PlanError::EmptyTemplate => EXIT_EMPTY_TEMPLATE,
            PlanError::Input(_) if fail_on_error => EXIT_ERROR,
            PlanError::Input(_) => EXIT_OK,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub policies: Vec<ExtractedPolicy>,
    pub template: bool,
}

/// Read and check every document. Never performs network access.
pub fn plan(input: &Input, policy_type: PolicyType) -> Result<Plan, PlanError> {
    match input {
        Input::Policy(src) => {
            let document = src.load()?;
            Ok(Plan {
                policies: vec![ExtractedPolicy {
                    name: SINGLE_POLICY_NAME.to_string(),
                    document,
                    policy_type,
                }],
                template: false,
            })
        }
        Input::Template(path) => {
            let policies = template::extract_from_file(path)?;
            if policies.is_empty() {
                return Err(PlanError::EmptyTemplate);
            }
            Ok(Plan {
                policies,
                template: true,
            })
        }
    }
}

/// Validate each planned policy in order, one remote call at a time.
pub async fn run_plan(analyzer: &dyn PolicyAnalyzer, plan: &Plan) -> ValidationRun {
    let mut reports = Vec::with_capacity(plan.policies.len());
    for p in &plan.policies {
        tracing::info!(policy = %p.name, policy_type = %p.policy_type, "validating policy");
        let outcome = match analyzer.validate_policy(&p.document, p.policy_type).await {
            Ok(findings) => Outcome::Findings(findings),
            Err(e) => {
                tracing::warn!(policy = %p.name, error = %e, "validation failed");
                Outcome::Error(e.to_string())
            }
        };
        reports.push(PolicyReport {
            name: p.name.clone(),
            policy_type: p.policy_type,
            outcome,
        });
    }
    ValidationRun::from_reports(reports)
}

/// Exit status for a completed run.
///
/// Findings fail the process only with `fail_on_findings`; remote errors only
/// with `fail_on_error`. Everything else exits 0.
pub fn exit_code(run: &ValidationRun, fail_on_findings: bool, fail_on_error: bool) -> i32 {
    if fail_on_findings && run.summary.findings > 0 {
        EXIT_FINDINGS
    } else if fail_on_error && run.summary.errors > 0 {
        EXIT_ERROR
    } else {
        EXIT_OK
    }
}
