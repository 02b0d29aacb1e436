//! In-process analyzer for tests and offline runs. Never touches the network.

use super::{AnalyzerError, CallerIdentity, ConnectionSettings, Connector, PolicyAnalyzer};
use crate::models::{Finding, PolicyDocument, PolicyType};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub document: String,
    pub policy_type: PolicyType,
}

#[derive(Clone)]
/// Returns a fixed response and records every call it receives.
pub struct StaticAnalyzer {
    response: Result<Vec<Finding>, AnalyzerError>,
    identity: CallerIdentity,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StaticAnalyzer {
    pub fn with_findings(findings: Vec<Finding>) -> Self {
        Self {
            response: Ok(findings),
            identity: CallerIdentity {
                account: Some("123456789012".into()),
                arn: Some("arn:aws:iam::123456789012:user/tester".into()),
                user_id: Some("AIDATESTER".into()),
            },
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: AnalyzerError) -> Self {
        Self {
            response: Err(error),
            ..Self::with_findings(Vec::new())
        }
    }

    /// Hold every validation for `delay` before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        locked(&self.calls).clone()
    }
}

#[async_trait]
impl PolicyAnalyzer for StaticAnalyzer {
    async fn validate_policy(
        &self,
        document: &PolicyDocument,
        policy_type: PolicyType,
    ) -> Result<Vec<Finding>, AnalyzerError> {
        locked(&self.calls).push(RecordedCall {
            document: document.as_str().to_string(),
            policy_type,
        });
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        self.response.clone()
    }

    async fn caller_identity(&self) -> Result<CallerIdentity, AnalyzerError> {
        match &self.response {
            Err(AnalyzerError::Credentials(m)) => Err(AnalyzerError::Credentials(m.clone())),
            _ => Ok(self.identity.clone()),
        }
    }
}

/// Hands out clones of one `StaticAnalyzer` (sharing its call log).
pub struct StaticConnector {
    analyzer: StaticAnalyzer,
    profiles: Mutex<Vec<Option<String>>>,
}

impl StaticConnector {
    pub fn new(analyzer: StaticAnalyzer) -> Self {
        Self {
            analyzer,
            profiles: Mutex::new(Vec::new()),
        }
    }

    pub fn analyzer(&self) -> &StaticAnalyzer {
        &self.analyzer
    }

    pub fn connected_profiles(&self) -> Vec<Option<String>> {
        locked(&self.profiles).clone()
    }
}

#[async_trait]
impl Connector for StaticConnector {
    async fn connect(&self, settings: &ConnectionSettings) -> Arc<dyn PolicyAnalyzer> {
        locked(&self.profiles).push(settings.profile.clone());
        Arc::new(self.analyzer.clone())
    }
}
