//! # handler: flag-preview requests, independent of any HTTP framework
//!
//! [`handle_flag_preview`] takes the JSON body the flag-management UI posts
//! (`{ variation: { value }, config?: { contentstack } }`) and returns a status
//! plus JSON body. The HTTP server in the CLI crate is a thin wrapper around it.
//!
//! Credentials come from the request's `config.contentstack` when present,
//! otherwise from the process defaults. The delivery client is built per
//! request by the caller-supplied `connect` function.
//!
//! | outcome                                   | status | `error`               |
//! |-------------------------------------------|--------|-----------------------|
//! | preview built                             | 200    |                       |
//! | request credentials incomplete            | 400    | Configuration Error   |
//! | variation missing or invalid              | 400    | Invalid Request       |
//! | CMS rejected credentials (401/403)        | 401    | Authentication Failed |
//! | entry/asset not found                     | 404    | Content Not Found     |
//! | content type invalid (422)                | 422    | Content Type Error    |
//! | no credentials configured anywhere        | 500    | Configuration Error   |
//! | anything else                             | 500    | per error kind        |

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::client::DeliveryApi;
use crate::error::{ErrorKind, PreviewError};
use crate::model::{ContentReference, Credentials};
use crate::preview::{preview_content, PreviewOptions};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct FlagPreviewRequest {
    #[serde(default)]
    pub variation: Option<Variation>,
    #[serde(default)]
    pub config: Option<RequestConfig>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Variation {
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RequestConfig {
    #[serde(default)]
    pub contentstack: Option<CredentialsInput>,
}

/// Caller-supplied credentials; any field may be missing.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsInput {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub delivery_token: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
}

impl From<&CredentialsInput> for Credentials {
    fn from(input: &CredentialsInput) -> Self {
        Credentials::new(
            input.api_key.clone().unwrap_or_default(),
            input.delivery_token.clone().unwrap_or_default(),
            input.environment.clone().unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Value,
}

impl HandlerResponse {
    fn error(status: u16, error: &str, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": error, "detail": detail.into() }),
        }
    }

    fn from_error(e: &PreviewError) -> Self {
        let kind = e.kind();
        let detail = match kind {
            ErrorKind::Auth => "Invalid Contentstack credentials".to_string(),
            _ => e.to_string(),
        };
        Self::error(kind.http_status(), kind.label(), detail)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn select_credentials(
    request_config: Option<&CredentialsInput>,
    defaults: Option<&Credentials>,
) -> Result<Credentials, HandlerResponse> {
    if let Some(input) = request_config {
        let credentials = Credentials::from(input);
        let missing = credentials.missing_fields();
        if !missing.is_empty() {
            warn!(?missing, "Request-supplied credentials incomplete");
            return Err(HandlerResponse::error(
                400,
                ErrorKind::Configuration.label(),
                format!("Missing Contentstack configuration: {}", missing.join(", ")),
            ));
        }
        return Ok(credentials);
    }

    match defaults {
        Some(credentials) if credentials.missing_fields().is_empty() => Ok(credentials.clone()),
        _ => {
            error!("No complete Contentstack credentials in request or process configuration");
            Err(HandlerResponse::error(
                500,
                ErrorKind::Configuration.label(),
                "Missing Contentstack configuration: apiKey, deliveryToken and environment are required",
            ))
        }
    }
}

/// Handle one flag-preview request end to end.
pub async fn handle_flag_preview<A, F>(
    request: FlagPreviewRequest,
    defaults: Option<&Credentials>,
    options: &PreviewOptions,
    connect: F,
) -> HandlerResponse
where
    A: DeliveryApi,
    F: FnOnce(&Credentials) -> Result<A, PreviewError>,
{
    let request_config = request
        .config
        .as_ref()
        .and_then(|c| c.contentstack.as_ref());
    let credentials = match select_credentials(request_config, defaults) {
        Ok(credentials) => credentials,
        Err(response) => return response,
    };

    let value = request
        .variation
        .and_then(|v| v.value)
        .unwrap_or(Value::Null);
    let reference = match ContentReference::from_variation(&value) {
        Ok(reference) => reference,
        Err(e) => {
            warn!(error = %e, "Rejected flag preview request");
            return HandlerResponse::from_error(&e);
        }
    };

    info!(
        entry_id = %reference.entry_id,
        environment = %reference.environment,
        content_type = reference.content_type.as_deref().unwrap_or("<discover>"),
        "Processing flag preview request"
    );

    let api = match connect(&credentials) {
        Ok(api) => api,
        Err(e) => {
            error!(error = %e, "Failed to construct delivery client");
            return HandlerResponse::from_error(&e);
        }
    };

    match preview_content(&api, &reference, &credentials, options).await {
        Ok(preview) => {
            info!(entry_id = %reference.entry_id, "Successfully fetched preview");
            HandlerResponse {
                status: 200,
                body: json!({ "preview": preview }),
            }
        }
        Err(e) => {
            error!(entry_id = %reference.entry_id, error = %e, kind = ?e.kind(), "Flag preview failed");
            HandlerResponse::from_error(&e)
        }
    }
}
