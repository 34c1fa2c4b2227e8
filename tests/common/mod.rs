#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use equilink_admin::client::MemoryBackend;
use equilink_admin::domain::{Record, Resource};

/// Fixed timestamps, `minutes` after a base instant.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
        + Duration::minutes(minutes)
}

pub fn category(id: &str, name: &str, minutes: i64) -> Record {
    Record::new(id, at(minutes))
        .with_field("name", name)
        .with_field("is_featured", false)
}

pub fn sub_category(id: &str, name: &str, parent: &str, minutes: i64) -> Record {
    Record::new(id, at(minutes))
        .with_field("name", name)
        .with_field("category_id", parent)
}

/// Two categories with two subcategories each.
pub fn two_by_two() -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend
        .seed(
            Resource::BusinessCategories,
            vec![category("c1", "Farriers", 1), category("c2", "Saddlery", 2)],
        )
        .unwrap();
    backend
        .seed(
            Resource::BusinessSubCategories,
            vec![
                sub_category("s1", "Hot shoeing", "c1", 3),
                sub_category("s2", "Cold shoeing", "c1", 4),
                sub_category("s3", "English saddles", "c2", 5),
                sub_category("s4", "Western saddles", "c2", 6),
            ],
        )
        .unwrap();
    backend
}

/// `n` customers named `Rider {i}`, oldest first.
pub fn customers(n: usize) -> MemoryBackend {
    let backend = MemoryBackend::new();
    let rows = (0..n)
        .map(|i| {
            Record::new(format!("cus-{i}"), at(i as i64))
                .with_field("name", format!("Rider {i}"))
                .with_field("email", format!("rider{i}@example.com"))
                .with_field("country", if i % 2 == 0 { "Ireland" } else { "France" })
        })
        .collect();
    backend.seed(Resource::Customers, rows).unwrap();
    backend
}

/// `n` subscriptions of distinct users to business `b1`, oldest first.
pub fn subscribers(n: usize) -> MemoryBackend {
    let backend = MemoryBackend::new();
    let rows = (0..n)
        .map(|i| {
            Record::new(format!("sub-{i}"), at(i as i64))
                .with_field("user_id", format!("user-{i}"))
                .with_field("business_id", "b1")
        })
        .collect();
    backend.seed(Resource::Subscribers, rows).unwrap();
    backend
}
