//! Single-item retrieval: one delivery API call, then unwrap `entry`/`asset`.

use serde_json::Value;
use tracing::{error, info};

use crate::client::DeliveryApi;
use crate::error::PreviewError;
use crate::model::{LocationKind, RawPayload, ResolvedLocation};

/// Fetch the raw `entry` or `asset` object at `location`.
///
/// Issues exactly one request. A 2xx response without the expected object
/// fails with [`PreviewError::ContentMissing`].
pub async fn fetch_item<A>(api: &A, location: &ResolvedLocation) -> Result<RawPayload, PreviewError>
where
    A: DeliveryApi + ?Sized,
{
    let (document, key) = match &location.kind {
        LocationKind::Asset => (
            api.get_asset(&location.entry_id, &location.environment).await,
            "asset",
        ),
        LocationKind::Entry { content_type } => (
            api.get_entry(
                content_type,
                &location.entry_id,
                &location.environment,
                location.preview,
            )
            .await,
            "entry",
        ),
    };

    let document = document.map_err(|e| {
        error!(
            entry_id = %location.entry_id,
            content_type = location.content_type_bucket(),
            error = %e,
            "Failed to fetch content"
        );
        e
    })?;

    let payload = extract(document, key)?;
    info!(
        entry_id = %location.entry_id,
        content_type = location.content_type_bucket(),
        fields = payload.len(),
        "Fetched content"
    );
    Ok(payload)
}

fn extract(document: Value, key: &'static str) -> Result<RawPayload, PreviewError> {
    match document {
        Value::Object(mut body) => match body.remove(key) {
            Some(Value::Object(payload)) => Ok(payload),
            _ => Err(PreviewError::ContentMissing { key }),
        },
        _ => Err(PreviewError::ContentMissing { key }),
    }
}
