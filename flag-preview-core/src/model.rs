//! Data model shared by lookup, fetch, normalization and the request handler.
//!
//! Wire shapes (flag variation values, request credentials, preview records)
//! use camelCase to match what the flag-management UI sends and expects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PreviewError;

/// Content type hint that marks a reference as an asset rather than an entry.
pub const ASSET_CONTENT_TYPE: &str = "asset";

/// Untyped `entry`/`asset` object as returned by the delivery API.
pub type RawPayload = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CmsKind {
    Contentstack,
}

/// One addressable item in the CMS, as stored in a flag variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentReference {
    pub cms_type: CmsKind,
    pub entry_id: String,
    pub environment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<bool>,
}

/// Lenient shape used to validate a variation field by field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariationFields {
    cms_type: Option<String>,
    entry_id: Option<String>,
    environment: Option<String>,
    content_type: Option<String>,
    preview: Option<bool>,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

impl ContentReference {
    pub fn entry(entry_id: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            cms_type: CmsKind::Contentstack,
            entry_id: entry_id.into(),
            environment: environment.into(),
            content_type: None,
            preview: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = Some(preview);
        self
    }

    /// Validate an untyped flag variation value.
    ///
    /// Checks run in a fixed order: `entryId`, `environment`, then `cmsType`.
    pub fn from_variation(value: &Value) -> Result<Self, PreviewError> {
        if !value.is_object() {
            return Err(PreviewError::Validation(
                "Missing variation in request body".to_string(),
            ));
        }
        let fields: VariationFields = serde_json::from_value(value.clone())
            .map_err(|e| PreviewError::Validation(format!("Malformed variation: {e}")))?;

        let entry_id = non_empty(fields.entry_id).ok_or_else(|| {
            PreviewError::Validation("Missing entryId in variation".to_string())
        })?;
        let environment = non_empty(fields.environment).ok_or_else(|| {
            PreviewError::Validation("Missing environment in variation".to_string())
        })?;
        if fields.cms_type.as_deref() != Some("contentstack") {
            return Err(PreviewError::Validation(
                "Invalid cmsType. Only \"contentstack\" is supported.".to_string(),
            ));
        }

        Ok(Self {
            cms_type: CmsKind::Contentstack,
            entry_id,
            environment,
            content_type: non_empty(fields.content_type),
            preview: fields.preview,
        })
    }

    pub fn is_asset(&self) -> bool {
        self.content_type.as_deref() == Some(ASSET_CONTENT_TYPE)
    }
}

/// Delivery API credentials for one stack and environment.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub api_key: String,
    pub delivery_token: String,
    pub environment: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key_set", &!self.api_key.is_empty())
            .field("delivery_token_set", &!self.delivery_token.is_empty())
            .field("environment", &self.environment)
            .finish()
    }
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        delivery_token: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            delivery_token: delivery_token.into(),
            environment: environment.into(),
        }
    }

    /// Names of the fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.trim().is_empty() {
            missing.push("apiKey");
        }
        if self.delivery_token.trim().is_empty() {
            missing.push("deliveryToken");
        }
        if self.environment.trim().is_empty() {
            missing.push("environment");
        }
        missing
    }

    pub fn validate(&self) -> Result<(), PreviewError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PreviewError::Validation(format!(
                "Configuration Error: {} required",
                missing.join(", ")
            )))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationKind {
    Asset,
    Entry { content_type: String },
}

/// A content reference whose bucket is known; lives for one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub entry_id: String,
    pub environment: String,
    pub kind: LocationKind,
    pub preview: bool,
}

impl ResolvedLocation {
    pub fn asset(entry_id: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            environment: environment.into(),
            kind: LocationKind::Asset,
            preview: false,
        }
    }

    pub fn entry(
        entry_id: impl Into<String>,
        environment: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            entry_id: entry_id.into(),
            environment: environment.into(),
            kind: LocationKind::Entry {
                content_type: content_type.into(),
            },
            preview: false,
        }
    }

    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn is_asset(&self) -> bool {
        matches!(self.kind, LocationKind::Asset)
    }

    pub fn content_type_bucket(&self) -> &str {
        match &self.kind {
            LocationKind::Asset => ASSET_CONTENT_TYPE,
            LocationKind::Entry { content_type } => content_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Video,
    Audio,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Normalized, UI-facing representation of an entry or asset.
///
/// `title` is always set; every other field is omitted when the source
/// payload lacks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRecord {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub structured_data: RawPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<AssetType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

/// Lightweight card data for an entry or asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

/// One content type as listed by the delivery API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeSummary {
    /// Empty when the API row carries no uid; such rows cannot be probed.
    #[serde(default)]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Result of content-type discovery with the matched type's metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discovery {
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ContentTypeSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn variation_validation_checks_fields_in_order() {
        let err = ContentReference::from_variation(&json!({"cmsType": "other"})).unwrap_err();
        assert!(err.to_string().contains("entryId"));

        let err = ContentReference::from_variation(&json!({"entryId": "blt1", "cmsType": "other"}))
            .unwrap_err();
        assert!(err.to_string().contains("environment"));

        let err = ContentReference::from_variation(
            &json!({"entryId": "blt1", "environment": "preview", "cmsType": "other"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("cmsType"));
    }

    #[test]
    fn variation_with_hint_and_preview_is_accepted() {
        let reference = ContentReference::from_variation(&json!({
            "cmsType": "contentstack",
            "entryId": "blt211dac063fd6e948",
            "environment": "preview",
            "contentType": "asset",
            "preview": true
        }))
        .unwrap();
        assert!(reference.is_asset());
        assert_eq!(reference.preview, Some(true));
    }

    #[test]
    fn empty_content_type_counts_as_absent() {
        let reference = ContentReference::from_variation(&json!({
            "cmsType": "contentstack",
            "entryId": "blt1",
            "environment": "preview",
            "contentType": ""
        }))
        .unwrap();
        assert_eq!(reference.content_type, None);
    }

    #[test]
    fn credentials_report_empty_fields() {
        let creds = Credentials::new("", "token", "preview");
        assert_eq!(creds.missing_fields(), vec!["apiKey"]);
        assert!(creds.validate().is_err());
        assert!(!format!("{creds:?}").contains("token\""));
    }
}
