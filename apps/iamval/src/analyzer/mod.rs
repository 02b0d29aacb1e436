//! Remote validation seam.
//!
//! `PolicyAnalyzer` is the one place the crate talks to the network: a
//! `validate_policy` call and a `caller_identity` lookup. Shells hold an
//! `ActiveAnalyzer`, which is replaced wholesale on profile switch and never
//! mutated in place.

pub mod aws;
pub mod fake;

use crate::models::{Finding, PolicyDocument, PolicyType};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Explicit connection parameters; `profile = None` means the ambient
/// credential chain.
pub struct ConnectionSettings {
    pub profile: Option<String>,
    pub region: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            profile: None,
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl ConnectionSettings {
    pub fn profile_label(&self) -> &str {
        self.profile.as_deref().unwrap_or("default")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Who the active credentials belong to. Display only.
pub struct CallerIdentity {
    pub account: Option<String>,
    pub arn: Option<String>,
    pub user_id: Option<String>,
}

impl CallerIdentity {
    pub fn describe(&self) -> String {
        format!(
            "{} (Account: {})",
            self.arn.as_deref().unwrap_or("Unknown"),
            self.account.as_deref().unwrap_or("Unknown")
        )
    }
}

#[derive(Debug, Clone, thiserror::Error)]
/// Classified remote failures. Each renders as a user-facing message.
pub enum AnalyzerError {
    #[error("AWS credentials could not be resolved: {0}. Configure credentials with 'aws configure' or select a different profile.")]
    Credentials(String),
    #[error("Access denied: {0}. Ensure your AWS user/role has 'access-analyzer:ValidatePolicy' permission.")]
    AccessDenied(String),
    #[error("Invalid policy format or parameters: {0}")]
    InvalidRequest(String),
    #[error("AWS API Error ({code}): {message}")]
    Service { code: String, message: String },
    #[error("Unexpected error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait PolicyAnalyzer: Send + Sync + 'static {
    /// Validate one document. Findings come back in service order.
    async fn validate_policy(
        &self,
        document: &PolicyDocument,
        policy_type: PolicyType,
    ) -> Result<Vec<Finding>, AnalyzerError>;

    async fn caller_identity(&self) -> Result<CallerIdentity, AnalyzerError>;
}

#[async_trait]
/// Builds analyzers from settings so shells can swap credentials.
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, settings: &ConnectionSettings) -> Arc<dyn PolicyAnalyzer>;
}

struct Active {
    settings: ConnectionSettings,
    analyzer: Arc<dyn PolicyAnalyzer>,
}

/// The single analyzer handle a long-lived shell works with.
pub struct ActiveAnalyzer {
    connector: Arc<dyn Connector>,
    current: RwLock<Active>,
}

impl ActiveAnalyzer {
    pub async fn connect(connector: Arc<dyn Connector>, settings: ConnectionSettings) -> Self {
        let analyzer = connector.connect(&settings).await;
        Self {
            connector,
            current: RwLock::new(Active { settings, analyzer }),
        }
    }

    /// Clone the current handle; no lock is held across a remote call.
    pub async fn snapshot(&self) -> (ConnectionSettings, Arc<dyn PolicyAnalyzer>) {
        let cur = self.current.read().await;
        (cur.settings.clone(), Arc::clone(&cur.analyzer))
    }

    /// Build a fresh analyzer for `profile` and swap it in.
    pub async fn switch_profile(&self, profile: Option<String>) -> ConnectionSettings {
        let region = self.current.read().await.settings.region.clone();
        let settings = ConnectionSettings { profile, region };
        let analyzer = self.connector.connect(&settings).await;
        tracing::info!(profile = %settings.profile_label(), region = %settings.region, "switched analyzer profile");
        let mut cur = self.current.write().await;
        *cur = Active {
            settings: settings.clone(),
            analyzer,
        };
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{StaticAnalyzer, StaticConnector};
    use super::*;

    #[tokio::test]
    async fn test_switch_profile_replaces_handle_and_keeps_region() {
        let connector = Arc::new(StaticConnector::new(StaticAnalyzer::with_findings(vec![])));
        let active = ActiveAnalyzer::connect(
            connector.clone(),
            ConnectionSettings {
                profile: None,
                region: "eu-west-1".into(),
            },
        )
        .await;
        let settings = active.switch_profile(Some("spoke".into())).await;
        assert_eq!(settings.region, "eu-west-1");
        assert_eq!(active.snapshot().await.0.profile.as_deref(), Some("spoke"));
        assert_eq!(connector.connected_profiles(), vec![None, Some("spoke".to_string())]);
    }

    #[test]
    fn test_identity_describe_placeholders() {
        let id = CallerIdentity::default();
        assert_eq!(id.describe(), "Unknown (Account: Unknown)");
    }
}
