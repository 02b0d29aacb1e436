//! Shared data models for validation input, findings, and run reports.

pub mod finding;
pub mod policy;

pub use finding::{Finding, FindingKind, Severity};
pub use policy::{ExtractedPolicy, PolicyDocument, PolicyType};

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
/// Either the findings for a policy or the message explaining why there are none.
pub enum Outcome {
    Findings(Vec<Finding>),
    Error(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
/// Result of validating one named policy.
pub struct PolicyReport {
    pub name: String,
    pub policy_type: PolicyType,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
/// Aggregated counts used by printers and exit codes.
pub struct Summary {
    pub policies: usize,
    pub findings: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Serialize)]
/// All reports produced by one CLI run.
pub struct ValidationRun {
    #[serde(rename = "results")]
    pub reports: Vec<PolicyReport>,
    pub summary: Summary,
}

impl ValidationRun {
    pub fn from_reports(reports: Vec<PolicyReport>) -> Self {
        let mut summary = Summary {
            policies: reports.len(),
            ..Summary::default()
        };
        for r in &reports {
            match &r.outcome {
                Outcome::Findings(f) => summary.findings += f.len(),
                Outcome::Error(_) => summary.errors += 1,
            }
        }
        Self { reports, summary }
    }
}
