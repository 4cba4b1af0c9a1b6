//! Snapshot files on disk.
//!
//! These tests verify that:
//! - a stored registry loads back content-equal, with a working index
//! - truncated and bit-flipped files are rejected
//! - a missing file is an I/O error

use std::fs;

use namesake::{OrgDictionary, PersonRegistry, PositionHint, RegistryConfig, StorageError};
use tempfile::tempdir;

fn sample() -> PersonRegistry {
    let config = RegistryConfig {
        skip_aliases: vec!["rjr".to_string()],
        ..RegistryConfig::default()
    };
    let dictionary =
        OrgDictionary::from_json_str(r#"{"Philip Morris": ["PM"]}"#).unwrap();
    let mut registry = PersonRegistry::with_config(dictionary, config).unwrap();
    registry.add_person_raw("Dunn, WL", 2, PositionHint::from("PM"));
    registry.add_person_raw("Dunn, William L", 4, PositionHint::None);
    registry.add_person_raw("Henson, A (PM)", 1, PositionHint::None);
    registry.add_person_raw("Smith, John", 3, PositionHint::None);
    registry.merge_duplicates().unwrap();
    registry
}

#[test]
fn test_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.nmsk");
    let registry = sample();
    registry.store_to_path(&path).unwrap();
    assert!(!dir.path().join("people.tmp").exists());

    let loaded = PersonRegistry::load_from_path(&path).unwrap();
    assert!(loaded.content_eq(&registry));
    assert_eq!(loaded.config(), registry.config());
    assert_eq!(loaded.alias_count(), registry.alias_count());

    let dunn = loaded.person_for_alias("william l dunn").unwrap();
    assert_eq!(dunn.count(), 6);
    assert_eq!(dunn.most_likely_position(), "PHILIP MORRIS");
}

#[test]
fn test_overwrites_existing_snapshot() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.nmsk");
    PersonRegistry::default().store_to_path(&path).unwrap();
    sample().store_to_path(&path).unwrap();

    let loaded = PersonRegistry::load_from_path(&path).unwrap();
    assert_eq!(loaded.len(), 3);
}

#[test]
fn test_truncated_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.nmsk");
    sample().store_to_path(&path).unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() * 4 / 5]).unwrap();

    let err = PersonRegistry::load_from_path(&path).unwrap_err();
    assert!(matches!(err, StorageError::Corrupt(_)), "got {err}");
}

#[test]
fn test_flipped_byte_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.nmsk");
    sample().store_to_path(&path).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 10;
    bytes[last] ^= 0x01;
    fs::write(&path, &bytes).unwrap();

    let err = PersonRegistry::load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("CRC"), "got {err}");
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = PersonRegistry::load_from_path(dir.path().join("absent.nmsk")).unwrap_err();
    assert!(matches!(err, StorageError::Io(_)));
}
