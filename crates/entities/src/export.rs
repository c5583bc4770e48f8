//! Administrative export snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DealWithRelations, Make, ModelWithMake, User};

/// Format version written into every snapshot.
pub const EXPORT_FORMAT_VERSION: &str = "1.0";

/// A deal as it appears in the export, including guest attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDeal {
    #[serde(flatten)]
    pub deal: DealWithRelations,
    pub guest_id: Option<String>,
    pub guest_ip_hash: Option<String>,
}

impl From<DealWithRelations> for ExportedDeal {
    fn from(deal: DealWithRelations) -> Self {
        Self {
            guest_id: deal.deal.guest_id.clone(),
            guest_ip_hash: deal.deal.guest_ip_hash.clone(),
            deal,
        }
    }
}

/// Snapshot metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub export_date: DateTime<Utc>,
    pub version: String,
    pub total_deals: usize,
    pub total_makes: usize,
    pub total_models: usize,
    pub total_users: usize,
}

/// Snapshot payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    pub deals: Vec<ExportedDeal>,
    pub makes: Vec<Make>,
    pub models: Vec<ModelWithMake>,
    pub users: Vec<User>,
}

/// A complete point-in-time dump of all tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub metadata: ExportMetadata,
    pub data: ExportData,
}

impl ExportSnapshot {
    /// Assembles a snapshot and fills in the per-entity counts.
    pub fn new(
        deals: Vec<DealWithRelations>,
        makes: Vec<Make>,
        models: Vec<ModelWithMake>,
        users: Vec<User>,
        export_date: DateTime<Utc>,
    ) -> Self {
        Self {
            metadata: ExportMetadata {
                export_date,
                version: EXPORT_FORMAT_VERSION.to_string(),
                total_deals: deals.len(),
                total_makes: makes.len(),
                total_models: models.len(),
                total_users: users.len(),
            },
            data: ExportData {
                deals: deals.into_iter().map(ExportedDeal::from).collect(),
                makes,
                models,
                users,
            },
        }
    }

    /// Download filename, stamped with the export date.
    pub fn file_name(&self) -> String {
        format!(
            "cardeals-backup-{}.json",
            self.metadata.export_date.format("%Y-%m-%d")
        )
    }
}
