//! Make/model vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::new_id;

/// A vehicle manufacturer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Make {
    /// Unique identifier.
    pub id: String,
    /// Manufacturer name, unique case-insensitively.
    pub name: String,
    /// Optional logo URL.
    pub logo: Option<String>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Make {
    /// Creates a new make. The name is trimmed.
    pub fn new(name: impl AsRef<str>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.as_ref().trim().to_string(),
            logo: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A vehicle model owned by exactly one make.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier.
    pub id: String,
    /// Model name, unique per make case-insensitively.
    pub name: String,
    /// Owning make.
    pub make_id: String,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Creates a new model under the given make. The name is trimmed.
    pub fn new(make_id: impl Into<String>, name: impl AsRef<str>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.as_ref().trim().to_string(),
            make_id: make_id.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Aggregate counts attached to make and model listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealCount {
    pub car_deals: i64,
}

/// A make annotated with the number of deals referencing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeWithCount {
    #[serde(flatten)]
    pub make: Make,
    #[serde(rename = "_count")]
    pub count: DealCount,
}

/// A model with its make embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelWithMake {
    #[serde(flatten)]
    pub model: Model,
    pub make: Make,
}

/// A model with its make embedded and the number of deals referencing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelWithCount {
    #[serde(flatten)]
    pub model: Model,
    pub make: Make,
    #[serde(rename = "_count")]
    pub count: DealCount,
}

/// Case-insensitive name comparison used for duplicate detection.
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_name_is_trimmed() {
        let make = Make::new("  Toyota ");
        assert_eq!(make.name, "Toyota");
        assert!(make.logo.is_none());
    }

    #[test]
    fn test_same_name_ignores_case() {
        assert!(same_name("Toyota", "toyota"));
        assert!(same_name("CR-V ", "cr-v"));
        assert!(!same_name("Camry", "Corolla"));
    }

    #[test]
    fn test_make_with_count_serialization() {
        let listed = MakeWithCount {
            make: Make::new("Honda"),
            count: DealCount { car_deals: 3 },
        };
        let json = serde_json::to_value(&listed).unwrap();
        assert_eq!(json["name"], "Honda");
        assert_eq!(json["_count"]["carDeals"], 3);
        assert!(json.get("createdAt").is_some());
    }
}
