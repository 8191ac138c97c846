//! # lookup: content-type discovery for entries
//!
//! An entry can only be addressed through its content type. When a flag
//! variation does not name one, [`find_content_type`] lists the content types
//! of the environment and probes each one for the entry, in listing order,
//! stopping at the first success. That is one listing call plus at most one
//! probe per content type, all sequential.
//!
//! "Nothing matched" is a legitimate answer (`None`), not an error: callers
//! decide whether to fall back to a default content type or fail.

use tracing::{debug, info, warn};

use crate::client::DeliveryApi;
use crate::error::PreviewError;
use crate::model::{ContentReference, Credentials, Discovery, ResolvedLocation};
use crate::preview::PreviewOptions;

/// Content type uids available in `environment`, in API order.
///
/// Rows without a uid are dropped so the rest of the listing stays usable.
pub async fn list_content_types<A>(api: &A, environment: &str) -> Result<Vec<String>, PreviewError>
where
    A: DeliveryApi + ?Sized,
{
    let listing = api.list_content_types(environment).await?;
    let total = listing.len();
    let uids: Vec<String> = listing
        .into_iter()
        .map(|ct| ct.uid)
        .filter(|uid| !uid.trim().is_empty())
        .collect();
    if uids.len() < total {
        warn!(
            environment,
            skipped = total - uids.len(),
            "Ignoring listed content types without a uid"
        );
    }
    Ok(uids)
}

/// Find the content type under which `entry_id` is published.
///
/// Fails closed: if the listing itself fails the result is `None`.
pub async fn find_content_type<A>(api: &A, entry_id: &str, environment: &str) -> Option<String>
where
    A: DeliveryApi + ?Sized,
{
    info!(entry_id, environment, "Discovering content type for entry");

    let content_types = match list_content_types(api, environment).await {
        Ok(content_types) => content_types,
        Err(e) => {
            warn!(entry_id, error = %e, "Content type listing failed, discovery aborted");
            return None;
        }
    };
    debug!(count = content_types.len(), "Content types to probe");

    for content_type in content_types {
        match api.get_entry(&content_type, entry_id, environment, false).await {
            Ok(_) => {
                info!(entry_id, content_type = %content_type, "Found matching content type");
                return Some(content_type);
            }
            Err(e) => {
                debug!(entry_id, content_type = %content_type, error = %e, "Entry not under content type");
            }
        }
    }

    info!(entry_id, "No matching content type found for entry");
    None
}

/// Like [`find_content_type`], and also fetch the matched content type's definition.
pub async fn find_content_type_with_metadata<A>(
    api: &A,
    entry_id: &str,
    environment: &str,
) -> Discovery
where
    A: DeliveryApi + ?Sized,
{
    let Some(content_type) = find_content_type(api, entry_id, environment).await else {
        return Discovery::default();
    };

    let metadata = match api.get_content_type(&content_type, environment).await {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            warn!(content_type = %content_type, error = %e, "Failed to fetch content type metadata");
            None
        }
    };

    Discovery {
        content_type: Some(content_type),
        metadata,
    }
}

/// Run discovery for several entries one after another, preserving input order.
pub async fn find_content_types_for_entries<A, S>(
    api: &A,
    entry_ids: &[S],
    environment: &str,
) -> Vec<(String, Option<String>)>
where
    A: DeliveryApi + ?Sized,
    S: AsRef<str>,
{
    let mut results = Vec::with_capacity(entry_ids.len());
    for entry_id in entry_ids {
        let entry_id = entry_id.as_ref();
        let content_type = find_content_type(api, entry_id, environment).await;
        results.push((entry_id.to_string(), content_type));
    }
    info!(
        entries = results.len(),
        resolved = results.iter().filter(|(_, ct)| ct.is_some()).count(),
        "Batch content type discovery complete"
    );
    results
}

/// Turn a reference into a fetchable location, discovering the content type if needed.
///
/// Discovery lists content types in the credentials' environment. When it finds
/// nothing, `options.fallback_content_type` is used if set.
pub async fn resolve_location<A>(
    api: &A,
    reference: &ContentReference,
    credentials: &Credentials,
    options: &PreviewOptions,
) -> Result<ResolvedLocation, PreviewError>
where
    A: DeliveryApi + ?Sized,
{
    let preview = reference.preview.unwrap_or(false);

    if reference.is_asset() {
        return Ok(ResolvedLocation::asset(&reference.entry_id, &reference.environment)
            .with_preview(preview));
    }

    let content_type = match &reference.content_type {
        Some(content_type) => content_type.clone(),
        None => {
            match find_content_type(api, &reference.entry_id, &credentials.environment).await {
                Some(found) => found,
                None => match &options.fallback_content_type {
                    Some(fallback) => {
                        warn!(
                            entry_id = %reference.entry_id,
                            fallback = %fallback,
                            "Could not discover content type, using fallback"
                        );
                        fallback.clone()
                    }
                    None => {
                        return Err(PreviewError::NotFound(format!(
                            "Unable to resolve content type for entry {}",
                            reference.entry_id
                        )))
                    }
                },
            }
        }
    };

    Ok(
        ResolvedLocation::entry(&reference.entry_id, &reference.environment, content_type)
            .with_preview(preview),
    )
}
