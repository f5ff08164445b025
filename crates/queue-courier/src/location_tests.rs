//! Tests for blob locations, location sets, and offload sub-paths.

use super::*;

// ============================================================================
// Pointer Format Tests
// ============================================================================

#[test]
fn test_pointer_encoding() {
    let location = BlobLocation::new("eu-west-1", "overflow", "20240101/abcdef");
    assert_eq!(location.to_pointer(), "eu-west-1:overflow:20240101/abcdef");
    assert_eq!(location.to_string(), location.to_pointer());
}

#[test]
fn test_parse_pointer_round_trips() {
    let parsed = BlobLocation::parse_pointer("eu-west-1:overflow:20240101/abcdef").unwrap();
    assert_eq!(
        parsed,
        BlobLocation::new("eu-west-1", "overflow", "20240101/abcdef")
    );
}

#[test]
fn test_parse_pointer_key_keeps_colons_and_slashes() {
    let parsed = BlobLocation::parse_pointer("r:c:a/b:c").unwrap();
    assert_eq!(parsed.region, "r");
    assert_eq!(parsed.container, "c");
    assert_eq!(parsed.key, "a/b:c");
}

#[test]
fn test_parse_pointer_allows_an_empty_key() {
    let parsed = BlobLocation::parse_pointer("r:c:").unwrap();
    assert_eq!(parsed.key, "");
}

#[test]
fn test_parse_pointer_rejects_missing_fields() {
    assert!(BlobLocation::parse_pointer("").is_err());
    assert!(BlobLocation::parse_pointer("r").is_err());
    assert!(BlobLocation::parse_pointer("r:c").is_err());
    assert!(BlobLocation::parse_pointer(":c:k").is_err());
    assert!(BlobLocation::parse_pointer("r::k").is_err());
}

#[test]
fn test_parse_pointer_error_carries_the_value() {
    let error = BlobLocation::parse_pointer("junk").unwrap_err();
    assert_eq!(error.value, "junk");

    let from_str: Result<BlobLocation, _> = "junk".parse();
    assert!(from_str.is_err());
}

// ============================================================================
// Location Set Tests
// ============================================================================

#[test]
fn test_join_key_appends_verbatim() {
    let prefix = BlobLocation::new("eu-west-1", "overflow", "bodies/");
    let object = prefix.join_key("20240101/abc");
    assert_eq!(object.key, "bodies/20240101/abc");
    assert_eq!(object.region, "eu-west-1");
    assert_eq!(object.container, "overflow");

    let bare = BlobLocation::new("eu-west-1", "overflow", "");
    assert_eq!(bare.join_key("20240101/abc").key, "20240101/abc");
}

#[test]
fn test_location_set_resolve_preserves_order() {
    let set = BlobLocationSet::new(BlobLocation::new("eu-west-1", "overflow", "a/"))
        .with_backup(BlobLocation::new("eu-central-1", "overflow-dr", "b/"));

    let resolved = set.resolve("sub");
    assert_eq!(resolved.primary().key, "a/sub");
    assert_eq!(resolved.backups()[0].key, "b/sub");
    assert_eq!(resolved.locations().len(), 2);
}

// ============================================================================
// Sub-Path Tests
// ============================================================================

#[test]
fn test_offload_sub_path_is_date_then_digest() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let path = offload_sub_path(date, b"hello world");
    assert_eq!(
        path,
        "20240115/b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
}

#[test]
fn test_offload_sub_path_depends_on_content() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    assert_ne!(offload_sub_path(date, b"a"), offload_sub_path(date, b"b"));
    assert_eq!(offload_sub_path(date, b"a"), offload_sub_path(date, b"a"));
}
