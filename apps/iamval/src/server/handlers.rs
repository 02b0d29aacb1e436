use super::page::render_index;
use super::AppState;
use crate::examples::example_policies;
use crate::models::{PolicyDocument, PolicyType};
use crate::output::render_findings_html;
use crate::profiles::list_profiles;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct ValidateBody {
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(rename = "type", default)]
    pub policy_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetProfileBody {
    #[serde(default)]
    pub profile: Option<String>,
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

async fn identity_label(state: &AppState) -> String {
    let (_, analyzer) = state.analyzer.snapshot().await;
    match analyzer.caller_identity().await {
        Ok(id) => id.arn.unwrap_or_else(|| "Unknown".to_string()),
        Err(e) => format!("Error: {}", e),
    }
}

pub async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&identity_label(&state).await))
}

pub async fn healthz_handler() -> &'static str {
    "ok"
}

pub async fn profiles_handler() -> Json<serde_json::Value> {
    Json(json!({ "profiles": list_profiles() }))
}

pub async fn set_profile_handler(
    State(state): State<AppState>,
    Json(body): Json<SetProfileBody>,
) -> Response {
    let profile = body.profile.filter(|p| !p.trim().is_empty());
    state.analyzer.switch_profile(profile).await;
    let identity = identity_label(&state).await;
    Json(json!({ "success": true, "identity": identity })).into_response()
}

pub async fn validate_handler(
    State(state): State<AppState>,
    Json(body): Json<ValidateBody>,
) -> Response {
    let text = match body.policy {
        Some(p) if !p.trim().is_empty() => p,
        _ => return bad_request("Policy document is required".to_string()),
    };
    let policy_type = match body.policy_type.as_deref() {
        None => PolicyType::default(),
        Some(raw) => match raw.parse::<PolicyType>() {
            Ok(t) => t,
            Err(e) => return bad_request(e),
        },
    };
    let document = match PolicyDocument::parse(text) {
        Ok(d) => d,
        Err(e) => return bad_request(e.to_string()),
    };

    let (_, analyzer) = state.analyzer.snapshot().await;
    match analyzer.validate_policy(&document, policy_type).await {
        Ok(findings) => {
            let html = render_findings_html(&findings);
            Json(json!({ "findings": findings, "html": html })).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "web validation failed");
            Json(json!({ "error": e.to_string() })).into_response()
        }
    }
}

pub async fn examples_handler() -> Json<serde_json::Value> {
    Json(serde_json::Value::Object(example_policies()))
}
