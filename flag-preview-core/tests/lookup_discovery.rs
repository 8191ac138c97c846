use flag_preview_core::client::MockDeliveryApi;
use flag_preview_core::lookup::{
    find_content_type, find_content_type_with_metadata, find_content_types_for_entries,
    resolve_location,
};
use flag_preview_core::model::{ContentReference, ContentTypeSummary, Credentials, LocationKind};
use flag_preview_core::preview::{item_metadata, preview_content, PreviewOptions};
use flag_preview_core::{ErrorKind, PreviewError};
use mockall::Sequence;
use serde_json::json;

fn summary(uid: &str) -> ContentTypeSummary {
    ContentTypeSummary {
        uid: uid.to_string(),
        title: None,
        description: None,
    }
}

fn not_found() -> PreviewError {
    PreviewError::FetchFailed {
        status_code: 404,
        raw_body: r#"{"error_message":"The requested object doesn't exist."}"#.to_string(),
    }
}

fn credentials() -> Credentials {
    Credentials::new("api-key", "delivery-token", "preview")
}

#[tokio::test]
async fn discovery_probes_in_listing_order_and_stops_at_first_match() {
    let mut api = MockDeliveryApi::new();
    let mut seq = Sequence::new();

    api.expect_list_content_types()
        .withf(|environment: &str| environment == "preview")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(vec![summary("blog"), summary("page"), summary("article")]));
    api.expect_get_entry()
        .withf(|content_type: &str, _: &str, _: &str, _: &bool| content_type == "blog")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _, _| Err(not_found()));
    api.expect_get_entry()
        .withf(|content_type: &str, entry_id: &str, _: &str, preview: &bool| {
            content_type == "page" && entry_id == "blt0f6ddaddb7222b8d" && !*preview
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _, _| Ok(json!({"entry": {"uid": "blt0f6ddaddb7222b8d"}})));
    api.expect_get_entry()
        .withf(|content_type: &str, _: &str, _: &str, _: &bool| content_type == "article")
        .times(0);

    let found = find_content_type(&api, "blt0f6ddaddb7222b8d", "preview").await;
    assert_eq!(found.as_deref(), Some("page"));
}

#[tokio::test]
async fn discovery_returns_none_after_probing_every_content_type() {
    let mut api = MockDeliveryApi::new();
    api.expect_list_content_types()
        .times(1)
        .returning(|_| Ok(vec![summary("page"), summary("blog")]));
    // Any non-success, not just 404, means "try the next one".
    api.expect_get_entry()
        .times(2)
        .returning(|content_type: &str, _, _, _| {
            if content_type == "page" {
                Err(not_found())
            } else {
                Err(PreviewError::Transport("connection reset".into()))
            }
        });

    assert_eq!(find_content_type(&api, "invalid-entry-id", "preview").await, None);
}

#[tokio::test]
async fn discovery_fails_closed_when_listing_is_unavailable() {
    let mut api = MockDeliveryApi::new();
    api.expect_list_content_types()
        .times(1)
        .returning(|_| Err(PreviewError::DiscoveryUnavailable { status_code: 401 }));
    api.expect_get_entry().times(0);

    assert_eq!(find_content_type(&api, "blt1", "preview").await, None);
}

#[tokio::test]
async fn discovery_with_empty_listing_makes_no_probes() {
    let mut api = MockDeliveryApi::new();
    api.expect_list_content_types().times(1).returning(|_| Ok(vec![]));
    api.expect_get_entry().times(0);

    assert_eq!(find_content_type(&api, "blt1", "preview").await, None);
}

#[tokio::test]
async fn discovery_never_probes_blank_uids() {
    let mut api = MockDeliveryApi::new();
    api.expect_list_content_types()
        .times(1)
        .returning(|_| Ok(vec![summary(""), summary("page")]));
    api.expect_get_entry()
        .withf(|content_type: &str, _: &str, _: &str, _: &bool| content_type.is_empty())
        .times(0);
    api.expect_get_entry()
        .withf(|content_type: &str, _: &str, _: &str, _: &bool| content_type == "page")
        .times(1)
        .returning(|_, _, _, _| Ok(json!({"entry": {"uid": "blt1"}})));

    assert_eq!(
        find_content_type(&api, "blt1", "preview").await.as_deref(),
        Some("page")
    );
}

#[tokio::test]
async fn discovery_with_metadata_describes_the_match() {
    let mut api = MockDeliveryApi::new();
    api.expect_list_content_types()
        .returning(|_| Ok(vec![summary("page")]));
    api.expect_get_entry()
        .returning(|_, _, _, _| Ok(json!({"entry": {}})));
    api.expect_get_content_type()
        .withf(|content_type: &str, environment: &str| {
            content_type == "page" && environment == "preview"
        })
        .times(1)
        .returning(|_, _| {
            Ok(ContentTypeSummary {
                uid: "page".into(),
                title: Some("Page".into()),
                description: Some("Landing pages".into()),
            })
        });

    let discovery = find_content_type_with_metadata(&api, "blt1", "preview").await;
    assert_eq!(discovery.content_type.as_deref(), Some("page"));
    let metadata = discovery.metadata.expect("metadata fetched");
    assert_eq!(metadata.title.as_deref(), Some("Page"));
}

#[tokio::test]
async fn discovery_with_metadata_tolerates_metadata_failure() {
    let mut api = MockDeliveryApi::new();
    api.expect_list_content_types()
        .returning(|_| Ok(vec![summary("page")]));
    api.expect_get_entry()
        .returning(|_, _, _, _| Ok(json!({"entry": {}})));
    api.expect_get_content_type()
        .returning(|_, _| Err(PreviewError::Transport("timed out".into())));

    let discovery = find_content_type_with_metadata(&api, "blt1", "preview").await;
    assert_eq!(discovery.content_type.as_deref(), Some("page"));
    assert_eq!(discovery.metadata, None);
}

#[tokio::test]
async fn batch_discovery_preserves_input_order() {
    let mut api = MockDeliveryApi::new();
    api.expect_list_content_types()
        .times(3)
        .returning(|_| Ok(vec![summary("page"), summary("blog")]));
    api.expect_get_entry()
        .returning(|content_type: &str, entry_id: &str, _, _| {
            match (content_type, entry_id) {
                ("blog", "blt-blog") | ("page", "blt-page") => Ok(json!({"entry": {}})),
                _ => Err(not_found()),
            }
        });

    let results =
        find_content_types_for_entries(&api, &["blt-blog", "blt-missing", "blt-page"], "preview")
            .await;
    assert_eq!(
        results,
        vec![
            ("blt-blog".to_string(), Some("blog".to_string())),
            ("blt-missing".to_string(), None),
            ("blt-page".to_string(), Some("page".to_string())),
        ]
    );
}

#[tokio::test]
async fn hinted_references_resolve_without_network_calls() {
    let mut api = MockDeliveryApi::new();
    api.expect_list_content_types().times(0);
    api.expect_get_entry().times(0);

    let asset = ContentReference::entry("blt211dac063fd6e948", "preview").with_content_type("asset");
    let location = resolve_location(&api, &asset, &credentials(), &PreviewOptions::default())
        .await
        .unwrap();
    assert_eq!(location.kind, LocationKind::Asset);

    let page = ContentReference::entry("blt0f6ddaddb7222b8d", "preview")
        .with_content_type("page")
        .with_preview(true);
    let location = resolve_location(&api, &page, &credentials(), &PreviewOptions::default())
        .await
        .unwrap();
    assert_eq!(location.content_type_bucket(), "page");
    assert!(location.preview);
}

#[tokio::test]
async fn unresolved_content_type_uses_fallback_or_fails_not_found() {
    let mut api = MockDeliveryApi::new();
    api.expect_list_content_types().returning(|_| Ok(vec![summary("blog")]));
    api.expect_get_entry().returning(|_, _, _, _| Err(not_found()));

    let reference = ContentReference::entry("invalid-entry-id", "preview");

    let location = resolve_location(&api, &reference, &credentials(), &PreviewOptions::default())
        .await
        .unwrap();
    assert_eq!(location.content_type_bucket(), "page");

    let strict = PreviewOptions {
        fallback_content_type: None,
    };
    let err = resolve_location(&api, &reference, &credentials(), &strict)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn hinted_preview_issues_exactly_one_request() {
    let mut api = MockDeliveryApi::new();
    api.expect_list_content_types().times(0);
    api.expect_get_entry()
        .withf(|content_type: &str, entry_id: &str, environment: &str, preview: &bool| {
            content_type == "page"
                && entry_id == "blt0f6ddaddb7222b8d"
                && environment == "preview"
                && *preview
        })
        .times(1)
        .returning(|_, _, _, _| {
            Ok(json!({"entry": {"title": "Home", "summary": "Welcome", "body": "<p>Hi</p>"}}))
        });

    let reference = ContentReference::entry("blt0f6ddaddb7222b8d", "preview")
        .with_content_type("page")
        .with_preview(true);
    let record = preview_content(&api, &reference, &credentials(), &PreviewOptions::default())
        .await
        .unwrap();
    assert_eq!(record.title, "Home");
    assert_eq!(record.html.as_deref(), Some("<p>Hi</p>"));
}

#[tokio::test]
async fn asset_metadata_uses_url_as_thumbnail() {
    let mut api = MockDeliveryApi::new();
    api.expect_get_asset()
        .withf(|asset_id: &str, environment: &str| {
            asset_id == "blt211dac063fd6e948" && environment == "preview"
        })
        .times(1)
        .returning(|_, _| {
            Ok(json!({"asset": {
                "filename": "hero.png",
                "url": "https://images.contentstack.io/hero.png"
            }}))
        });

    let reference =
        ContentReference::entry("blt211dac063fd6e948", "preview").with_content_type("asset");
    let metadata = item_metadata(&api, &reference, &credentials(), &PreviewOptions::default())
        .await
        .unwrap();
    assert_eq!(metadata.title.as_deref(), Some("hero.png"));
    assert_eq!(
        metadata.thumbnail.as_deref(),
        Some("https://images.contentstack.io/hero.png")
    );
    assert_eq!(metadata.file_url, metadata.thumbnail);
}
