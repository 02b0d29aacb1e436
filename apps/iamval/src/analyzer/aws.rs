//! IAM Access Analyzer + STS implementation of `PolicyAnalyzer`.

use super::{AnalyzerError, CallerIdentity, ConnectionSettings, Connector, PolicyAnalyzer};
use crate::models::{Finding, FindingKind, PolicyDocument, PolicyType};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_accessanalyzer::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_accessanalyzer::types::{PolicyType as AwsPolicyType, ValidatePolicyFinding};
use std::sync::Arc;

pub struct AwsAnalyzer {
    access_analyzer: aws_sdk_accessanalyzer::Client,
    sts: aws_sdk_sts::Client,
}

impl AwsAnalyzer {
    /// Resolve shared config for the settings. Credential problems surface on
    /// the first call, not here.
    pub async fn connect(settings: &ConnectionSettings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));
        if let Some(profile) = settings.profile.as_deref() {
            loader = loader.profile_name(profile);
        }
        let shared = loader.load().await;
        tracing::debug!(profile = %settings.profile_label(), region = %settings.region, "aws clients configured");
        Self {
            access_analyzer: aws_sdk_accessanalyzer::Client::new(&shared),
            sts: aws_sdk_sts::Client::new(&shared),
        }
    }
}

#[async_trait]
impl PolicyAnalyzer for AwsAnalyzer {
    async fn validate_policy(
        &self,
        document: &PolicyDocument,
        policy_type: PolicyType,
    ) -> Result<Vec<Finding>, AnalyzerError> {
        let mut findings = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .access_analyzer
                .validate_policy()
                .policy_document(document.as_str())
                .policy_type(to_aws_policy_type(policy_type))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(classify_sdk_error)?;
            findings.extend(page.findings().iter().map(finding_from_aws));
            match page.next_token() {
                Some(t) if !t.is_empty() => next_token = Some(t.to_string()),
                _ => break,
            }
        }
        tracing::debug!(policy_type = %policy_type, findings = findings.len(), "ValidatePolicy returned");
        Ok(findings)
    }

    async fn caller_identity(&self) -> Result<CallerIdentity, AnalyzerError> {
        let out = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(classify_sdk_error)?;
        Ok(CallerIdentity {
            account: out.account().map(str::to_string),
            arn: out.arn().map(str::to_string),
            user_id: out.user_id().map(str::to_string),
        })
    }
}

/// Connects `AwsAnalyzer`s; used by every shell outside tests.
pub struct AwsConnector;

#[async_trait]
impl Connector for AwsConnector {
    async fn connect(&self, settings: &ConnectionSettings) -> Arc<dyn PolicyAnalyzer> {
        Arc::new(AwsAnalyzer::connect(settings).await)
    }
}

fn to_aws_policy_type(t: PolicyType) -> AwsPolicyType {
    match t {
        PolicyType::IdentityPolicy => AwsPolicyType::IdentityPolicy,
        PolicyType::ResourcePolicy => AwsPolicyType::ResourcePolicy,
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn finding_from_aws(f: &ValidatePolicyFinding) -> Finding {
    Finding {
        kind: non_empty(f.finding_type().as_str()).map(FindingKind::from),
        code: non_empty(f.issue_code()),
        detail: non_empty(f.finding_details()),
        reference: non_empty(f.learn_more_link()),
    }
}

/// Map an SDK failure onto the crate's error taxonomy.
fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> AnalyzerError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    if let SdkError::ServiceError(_) = &err {
        let code = err.code().unwrap_or("Unknown").to_string();
        let message = err.message().unwrap_or("no message").to_string();
        return match code.as_str() {
            "AccessDeniedException" | "AccessDenied" => AnalyzerError::AccessDenied(message),
            "ValidationException" | "InvalidParameterException" => {
                AnalyzerError::InvalidRequest(message)
            }
            "ExpiredTokenException" | "UnrecognizedClientException" | "InvalidClientTokenId" => {
                AnalyzerError::Credentials(message)
            }
            _ => AnalyzerError::Service { code, message },
        };
    }
    let detail = DisplayErrorContext(&err).to_string();
    let lowered = detail.to_ascii_lowercase();
    if lowered.contains("credential") || lowered.contains("profile") {
        AnalyzerError::Credentials(detail)
    } else {
        AnalyzerError::Transport(detail)
    }
}
