//! Resolve → fetch → normalize, for one content reference.

use tracing::info;

use crate::client::DeliveryApi;
use crate::error::PreviewError;
use crate::fetch::fetch_item;
use crate::lookup::resolve_location;
use crate::model::{ContentReference, Credentials, ItemMetadata, PreviewRecord};
use crate::normalize;

/// Content type tried when discovery finds no match.
pub const DEFAULT_FALLBACK_CONTENT_TYPE: &str = "page";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOptions {
    /// `None` turns an unresolved content type into a not-found error.
    pub fallback_content_type: Option<String>,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            fallback_content_type: Some(DEFAULT_FALLBACK_CONTENT_TYPE.to_string()),
        }
    }
}

/// Build the preview record for `reference`.
pub async fn preview_content<A>(
    api: &A,
    reference: &ContentReference,
    credentials: &Credentials,
    options: &PreviewOptions,
) -> Result<PreviewRecord, PreviewError>
where
    A: DeliveryApi + ?Sized,
{
    let location = resolve_location(api, reference, credentials, options).await?;
    let payload = fetch_item(api, &location).await?;
    let record = normalize::normalize(&payload, location.is_asset());
    info!(
        entry_id = %location.entry_id,
        content_type = location.content_type_bucket(),
        title = %record.title,
        has_image = record.image_url.is_some(),
        "Preview formatted"
    );
    Ok(record)
}

/// Title and thumbnail for `reference`, for list views.
pub async fn item_metadata<A>(
    api: &A,
    reference: &ContentReference,
    credentials: &Credentials,
    options: &PreviewOptions,
) -> Result<ItemMetadata, PreviewError>
where
    A: DeliveryApi + ?Sized,
{
    let location = resolve_location(api, reference, credentials, options).await?;
    let payload = fetch_item(api, &location).await?;
    Ok(normalize::metadata(&payload, location.is_asset()))
}
