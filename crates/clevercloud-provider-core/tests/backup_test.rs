// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Backup selection tests.

use chrono::{TimeZone, Utc};
use clevercloud_provider_core::backup::{self, BackupRecord, Selector};
use clevercloud_provider_core::{BackupError, BackupNotFoundError};
use uuid::Uuid;

fn record(n: u128, year: i32, month: u32, day: u32) -> BackupRecord {
    let created = Utc.with_ymd_and_hms(year, month, day, 2, 30, 0).unwrap();
    BackupRecord {
        id: Uuid::from_u128(n),
        creation_date: created,
        deletion_date: created + chrono::Duration::days(7),
        download_url: format!("https://backups.example/pg/{n}.dump"),
    }
}

/// Three monthly backups, deliberately unordered.
fn monthly() -> Vec<BackupRecord> {
    vec![
        record(2, 2024, 2, 1),
        record(3, 2024, 3, 1),
        record(1, 2024, 1, 1),
    ]
}

#[test]
fn test_latest_picks_most_recent() {
    let records = monthly();

    let selected = backup::select(&records, &Selector::Latest).unwrap();

    assert_eq!(selected.id, Uuid::from_u128(3));
}

#[test]
fn test_before_or_at_picks_most_recent_not_after_cutoff() {
    let records = monthly();
    let cutoff = Utc.with_ymd_and_hms(2024, 2, 15, 0, 0, 0).unwrap();

    let selected = backup::select(&records, &Selector::BeforeOrAt(cutoff)).unwrap();

    assert_eq!(selected.id, Uuid::from_u128(2));
}

#[test]
fn test_before_or_at_includes_exact_instant() {
    let records = monthly();
    let exact = records[0].creation_date;

    let selected = backup::select(&records, &Selector::BeforeOrAt(exact)).unwrap();

    assert_eq!(selected.id, records[0].id);
}

#[test]
fn test_before_or_at_older_than_everything() {
    let records = monthly();
    let cutoff = Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap();

    let err = backup::select(&records, &Selector::BeforeOrAt(cutoff)).unwrap_err();

    assert_eq!(
        err,
        BackupNotFoundError::NoneBeforeDate {
            cutoff,
            oldest: records[2].creation_date,
        }
    );
    assert!(err.to_string().contains("2024-01-01"));
}

#[test]
fn test_by_id_hit_and_miss() {
    let records = monthly();

    let hit = backup::select(&records, &Selector::ById(Uuid::from_u128(1))).unwrap();
    assert_eq!(hit.download_url, "https://backups.example/pg/1.dump");

    let missing = Uuid::from_u128(99);
    assert_eq!(
        backup::select(&records, &Selector::ById(missing)).unwrap_err(),
        BackupNotFoundError::IdNotFound { id: missing }
    );
}

#[test]
fn test_empty_collection_for_every_selector() {
    let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    for selector in [
        Selector::Latest,
        Selector::ById(Uuid::from_u128(1)),
        Selector::BeforeOrAt(cutoff),
    ] {
        assert_eq!(
            backup::select(&[], &selector).unwrap_err(),
            BackupNotFoundError::NoBackups
        );
    }
}

#[test]
fn test_not_found_messages_are_distinct() {
    let cutoff = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let messages = [
        BackupNotFoundError::NoBackups.to_string(),
        BackupNotFoundError::IdNotFound {
            id: Uuid::from_u128(7),
        }
        .to_string(),
        BackupNotFoundError::NoneBeforeDate {
            cutoff,
            oldest: cutoff,
        }
        .to_string(),
    ];

    assert_ne!(messages[0], messages[1]);
    assert_ne!(messages[1], messages[2]);
    assert_ne!(messages[0], messages[2]);
}

#[test]
fn test_select_str_resolves_each_selector_form() {
    let records = monthly();

    let latest = backup::select_str(&records, "latest").unwrap();
    assert_eq!(latest.id, Uuid::from_u128(3));

    let by_id = backup::select_str(&records, &Uuid::from_u128(2).to_string()).unwrap();
    assert_eq!(by_id.id, Uuid::from_u128(2));

    let by_time = backup::select_str(&records, "2024-02-15T00:00:00Z").unwrap();
    assert_eq!(by_time.id, Uuid::from_u128(2));

    let by_date = backup::select_str(&records, "2024-03-01").unwrap();
    assert_eq!(by_date.id, Uuid::from_u128(3));
}

#[test]
fn test_select_str_keeps_parse_and_lookup_errors_apart() {
    let records = monthly();

    let parse = backup::select_str(&records, "last tuesday").unwrap_err();
    assert!(matches!(parse, BackupError::Parse(ref e) if e.input == "last tuesday"));

    let lookup = backup::select_str(&records, "2023-06-01").unwrap_err();
    assert!(matches!(
        lookup,
        BackupError::NotFound(BackupNotFoundError::NoneBeforeDate { .. })
    ));
}

#[test]
fn test_record_deserializes_platform_field_names() {
    let json = r#"{
        "backup_id": "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d",
        "creation_date": "2024-02-01T02:30:00Z",
        "delete_at": "2024-02-08T02:30:00Z",
        "download_url": "https://backups.example/pg/latest.dump"
    }"#;

    let record: BackupRecord = serde_json::from_str(json).unwrap();

    assert_eq!(
        record.id,
        Uuid::parse_str("9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d").unwrap()
    );
    assert_eq!(
        record.creation_date,
        Utc.with_ymd_and_hms(2024, 2, 1, 2, 30, 0).unwrap()
    );
    assert_eq!(record.deletion_date - record.creation_date, chrono::Duration::days(7));
}
