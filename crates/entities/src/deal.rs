//! Deal entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{UserSummary, new_id, savings_cents, savings_percentage};

/// A single price report. Monetary fields are integer cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    /// Owner; may reference the shared guest row.
    pub user_id: String,
    pub make_id: String,
    pub model_id: String,
    pub year: i32,
    pub trim: Option<String>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub msrp: i64,
    pub selling_price: i64,
    pub otd_price: Option<i64>,
    pub rebates: Option<i64>,
    pub down_payment: Option<i64>,
    pub monthly_payment: Option<i64>,
    pub dealer_name: Option<String>,
    pub dealer_location: Option<String>,
    pub deal_date: DateTime<Utc>,
    /// Annual percentage rate.
    pub financing_rate: Option<f64>,
    /// Financing term in months.
    pub financing_term: Option<i32>,
    pub notes: Option<String>,
    pub is_leased: bool,
    pub lease_term_months: Option<i32>,
    pub mileage_allowance: Option<i32>,
    /// Never set by the application.
    pub verified: bool,
    pub is_public: bool,
    /// Guest device token. Only exposed through the admin export.
    #[serde(skip)]
    pub guest_id: Option<String>,
    /// One-way hash of the guest's source address. Only exposed through the
    /// admin export.
    #[serde(skip)]
    pub guest_ip_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    /// Builds a stored deal from normalized creation input.
    pub fn from_new(new: NewDeal) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            user_id: new.user_id,
            make_id: new.make_id,
            model_id: new.model_id,
            year: new.year,
            trim: new.trim,
            exterior_color: new.exterior_color,
            interior_color: new.interior_color,
            msrp: new.msrp,
            selling_price: new.selling_price,
            otd_price: new.otd_price,
            rebates: new.rebates,
            down_payment: new.down_payment,
            monthly_payment: new.monthly_payment,
            dealer_name: new.dealer_name,
            dealer_location: new.dealer_location,
            deal_date: new.deal_date,
            financing_rate: new.financing_rate,
            financing_term: new.financing_term,
            notes: new.notes,
            is_leased: new.is_leased,
            lease_term_months: new.lease_term_months,
            mileage_allowance: new.mileage_allowance,
            verified: false,
            is_public: new.is_public,
            guest_id: new.guest_id,
            guest_ip_hash: new.guest_ip_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// MSRP minus selling price, in cents.
    pub fn savings(&self) -> i64 {
        savings_cents(self.msrp, self.selling_price)
    }
}

/// Normalized input for a new deal. Monetary values are already in cents.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeal {
    pub user_id: String,
    pub make_id: String,
    pub model_id: String,
    pub year: i32,
    pub trim: Option<String>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub msrp: i64,
    pub selling_price: i64,
    pub otd_price: Option<i64>,
    pub rebates: Option<i64>,
    pub down_payment: Option<i64>,
    pub monthly_payment: Option<i64>,
    pub dealer_name: Option<String>,
    pub dealer_location: Option<String>,
    pub deal_date: DateTime<Utc>,
    pub financing_rate: Option<f64>,
    pub financing_term: Option<i32>,
    pub notes: Option<String>,
    pub is_leased: bool,
    pub lease_term_months: Option<i32>,
    pub mileage_allowance: Option<i32>,
    pub is_public: bool,
    pub guest_id: Option<String>,
    pub guest_ip_hash: Option<String>,
}

/// Sparse update. Only `Some` fields are rewritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealPatch {
    pub make_id: Option<String>,
    pub model_id: Option<String>,
    pub year: Option<i32>,
    pub trim: Option<String>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub msrp: Option<i64>,
    pub selling_price: Option<i64>,
    pub otd_price: Option<i64>,
    pub rebates: Option<i64>,
    pub down_payment: Option<i64>,
    pub monthly_payment: Option<i64>,
    pub dealer_name: Option<String>,
    pub dealer_location: Option<String>,
    pub deal_date: Option<DateTime<Utc>>,
    pub financing_rate: Option<f64>,
    pub financing_term: Option<i32>,
    pub notes: Option<String>,
    pub is_leased: Option<bool>,
    pub lease_term_months: Option<i32>,
    pub mileage_allowance: Option<i32>,
    pub is_public: Option<bool>,
}

impl DealPatch {
    /// Returns true when no field is supplied.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the supplied fields to a deal and bumps `updated_at`.
    pub fn apply(&self, deal: &mut Deal) {
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = &self.$field {
                        deal.$field = value.clone();
                    }
                )*
            };
        }
        macro_rules! set_optional {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = &self.$field {
                        deal.$field = Some(value.clone());
                    }
                )*
            };
        }

        set!(make_id, model_id, year, msrp, selling_price, deal_date, is_leased, is_public);
        set_optional!(
            trim,
            exterior_color,
            interior_color,
            otd_price,
            rebates,
            down_payment,
            monthly_payment,
            dealer_name,
            dealer_location,
            financing_rate,
            financing_term,
            notes,
            lease_term_months,
            mileage_allowance,
        );
        deal.updated_at = Utc::now();
    }
}

/// Embedded make reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeRef {
    pub id: String,
    pub name: String,
}

/// Embedded model reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRef {
    pub id: String,
    pub name: String,
}

/// A deal joined with its make, model and owner display fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealWithRelations {
    #[serde(flatten)]
    pub deal: Deal,
    pub make: MakeRef,
    pub model: ModelRef,
    pub user: Option<UserSummary>,
    /// MSRP minus selling price, in cents. May be negative.
    pub savings: i64,
    /// Savings as a percentage of MSRP, one decimal place.
    pub savings_percentage: f64,
}

impl DealWithRelations {
    /// Joins a deal with its relations and computes the derived fields.
    pub fn new(deal: Deal, make: MakeRef, model: ModelRef, user: Option<UserSummary>) -> Self {
        let savings = deal.savings();
        let savings_percentage = savings_percentage(deal.msrp, deal.selling_price);
        Self {
            deal,
            make,
            model,
            user,
            savings,
            savings_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_new_deal() -> NewDeal {
        NewDeal {
            user_id: "user-1".to_string(),
            make_id: "make-1".to_string(),
            model_id: "model-1".to_string(),
            year: 2024,
            trim: Some("SE".to_string()),
            exterior_color: None,
            interior_color: None,
            msrp: 3_500_000,
            selling_price: 3_200_000,
            otd_price: None,
            rebates: None,
            down_payment: None,
            monthly_payment: None,
            dealer_name: None,
            dealer_location: None,
            deal_date: Utc::now(),
            financing_rate: None,
            financing_term: None,
            notes: None,
            is_leased: false,
            lease_term_months: None,
            mileage_allowance: None,
            is_public: true,
            guest_id: Some("device-token".to_string()),
            guest_ip_hash: Some("abc".to_string()),
        }
    }

    #[test]
    fn test_from_new_defaults() {
        let deal = Deal::from_new(sample_new_deal());
        assert!(!deal.verified);
        assert!(deal.is_public);
        assert_eq!(deal.savings(), 300_000);
        assert_eq!(deal.created_at, deal.updated_at);
    }

    #[test]
    fn test_patch_applies_only_supplied_fields() {
        let mut deal = Deal::from_new(sample_new_deal());
        let patch = DealPatch {
            selling_price: Some(3_100_000),
            notes: Some("Tint included".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());

        patch.apply(&mut deal);
        assert_eq!(deal.selling_price, 3_100_000);
        assert_eq!(deal.notes.as_deref(), Some("Tint included"));
        assert_eq!(deal.msrp, 3_500_000);
        assert_eq!(deal.trim.as_deref(), Some("SE"));
    }

    #[test]
    fn test_empty_patch() {
        assert!(DealPatch::default().is_empty());
    }

    #[test]
    fn test_view_hides_guest_attribution() {
        let deal = Deal::from_new(sample_new_deal());
        let view = DealWithRelations::new(
            deal,
            MakeRef { id: "make-1".into(), name: "Toyota".into() },
            ModelRef { id: "model-1".into(), name: "Camry".into() },
            None,
        );
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["sellingPrice"], 3_200_000);
        assert_eq!(json["make"]["name"], "Toyota");
        assert_eq!(json["savings"], 300_000);
        assert_eq!(json["savingsPercentage"], 8.6);
        assert!(json.get("guestId").is_none());
        assert!(json.get("guestIpHash").is_none());
    }
}
