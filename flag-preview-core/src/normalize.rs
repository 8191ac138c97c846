//! # normalize: raw Contentstack payloads into preview records
//!
//! Pure and deterministic: the same payload always yields the same
//! [`PreviewRecord`]. The raw payload is carried through untouched as
//! `structured_data`.
//!
//! ## Entries
//! - `title` ← `title`, else [`DEFAULT_ENTRY_TITLE`]
//! - `summary` ← `summary`, else `description`, else an excerpt of `content`, else `""`
//! - `html` ← `body`, else `""`
//! - `image_url` ← `image.url`
//!
//! ## Assets
//! - `title` ← `title`, else `filename`, else [`DEFAULT_ASSET_TITLE`]
//! - `file_url`/`image_url` ← `url`, `file_name` ← `filename`, `file_size` ← `file_size`
//! - `mime_type` ← `content_type`, `asset_type` from the mime prefix
//! - `dimensions` ← `dimension.{width,height}`

use serde_json::Value;

use crate::model::{AssetType, Dimensions, ItemMetadata, PreviewRecord, RawPayload};

pub const DEFAULT_ENTRY_TITLE: &str = "Entry";
pub const DEFAULT_ASSET_TITLE: &str = "Asset";

/// Characters of `content` kept when it stands in for a summary.
pub const SUMMARY_EXCERPT_CHARS: usize = 200;

fn str_field<'a>(payload: &'a RawPayload, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
}

fn image_url(payload: &RawPayload) -> Option<String> {
    payload
        .get("image")
        .and_then(|image| image.get("url"))
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Classify a mime type into the four asset kinds the preview UI renders.
pub fn asset_type_for(mime_type: Option<&str>) -> AssetType {
    match mime_type {
        Some(m) if m.starts_with("image/") => AssetType::Image,
        Some(m) if m.starts_with("video/") => AssetType::Video,
        Some(m) if m.starts_with("audio/") => AssetType::Audio,
        _ => AssetType::File,
    }
}

/// First [`SUMMARY_EXCERPT_CHARS`] characters of `content`, with `...` when cut.
pub fn excerpt(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(SUMMARY_EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn dimensions(payload: &RawPayload) -> Option<Dimensions> {
    let dimension = payload.get("dimension")?.as_object()?;
    let side = |key: &str| {
        dimension
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    };
    Some(Dimensions {
        width: side("width"),
        height: side("height"),
    })
}

/// Map a raw `entry` or `asset` object to a [`PreviewRecord`].
pub fn normalize(payload: &RawPayload, is_asset: bool) -> PreviewRecord {
    if is_asset {
        normalize_asset(payload)
    } else {
        normalize_entry(payload)
    }
}

fn normalize_entry(payload: &RawPayload) -> PreviewRecord {
    // Authored summaries win; the content excerpt only fills an otherwise empty summary.
    let summary = str_field(payload, "summary")
        .or_else(|| str_field(payload, "description"))
        .map(str::to_string)
        .or_else(|| str_field(payload, "content").map(excerpt))
        .unwrap_or_default();

    PreviewRecord {
        title: str_field(payload, "title")
            .unwrap_or(DEFAULT_ENTRY_TITLE)
            .to_string(),
        summary: Some(summary),
        html: Some(str_field(payload, "body").unwrap_or_default().to_string()),
        image_url: image_url(payload),
        structured_data: payload.clone(),
        asset_type: None,
        file_name: None,
        file_size: None,
        file_url: None,
        mime_type: None,
        dimensions: None,
    }
}

fn normalize_asset(payload: &RawPayload) -> PreviewRecord {
    let file_name = str_field(payload, "filename");
    let url = str_field(payload, "url").map(str::to_string);
    let mime_type = str_field(payload, "content_type");

    let summary = match file_name {
        Some(name) => format!("Asset: {name}"),
        None => DEFAULT_ASSET_TITLE.to_string(),
    };

    PreviewRecord {
        title: str_field(payload, "title")
            .or(file_name)
            .unwrap_or(DEFAULT_ASSET_TITLE)
            .to_string(),
        summary: Some(summary),
        html: None,
        image_url: url.clone(),
        structured_data: payload.clone(),
        asset_type: Some(asset_type_for(mime_type)),
        file_name: file_name.map(str::to_string),
        file_size: payload.get("file_size").and_then(file_size),
        file_url: url,
        mime_type: mime_type.map(str::to_string),
        dimensions: dimensions(payload),
    }
}

// Contentstack reports file_size as a string on some stacks.
fn file_size(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Card data (title and thumbnail) for an entry or asset.
pub fn metadata(payload: &RawPayload, is_asset: bool) -> ItemMetadata {
    if is_asset {
        let url = str_field(payload, "url").map(str::to_string);
        ItemMetadata {
            title: str_field(payload, "title")
                .or_else(|| str_field(payload, "filename"))
                .map(str::to_string),
            thumbnail: url.clone(),
            file_url: url,
        }
    } else {
        ItemMetadata {
            title: str_field(payload, "title").map(str::to_string),
            thumbnail: image_url(payload),
            file_url: None,
        }
    }
}
