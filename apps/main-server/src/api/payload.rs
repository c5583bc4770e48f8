//! Deal request payloads and their validation.
//!
//! Clients send prices in whole dollars. Validation collects every failing
//! field before rejecting, then converts the payload to cents.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use entities::{DealPatch, MAX_DOLLARS, NewDeal, dollars_to_cents, is_valid_dollars, optional_cents};
use serde::Deserialize;

use crate::error::{FieldError, ServerError, ServerResult};

/// Earliest accepted model year.
pub const MIN_MODEL_YEAR: i32 = 1990;

/// Latest accepted model year relative to the current year.
fn max_model_year() -> i32 {
    Utc::now().year() + 2
}

/// Body of `POST /api/deals`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDealRequest {
    pub make_id: Option<String>,
    pub model_id: Option<String>,
    pub year: Option<i32>,
    pub trim: Option<String>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub msrp: Option<f64>,
    pub selling_price: Option<f64>,
    pub otd_price: Option<f64>,
    pub rebates: Option<f64>,
    pub down_payment: Option<f64>,
    pub monthly_payment: Option<f64>,
    pub dealer_name: Option<String>,
    pub dealer_location: Option<String>,
    pub deal_date: Option<String>,
    pub financing_rate: Option<f64>,
    pub financing_term: Option<i32>,
    pub notes: Option<String>,
    pub is_leased: Option<bool>,
    pub lease_term_months: Option<i32>,
    pub mileage_allowance: Option<i32>,
    pub is_public: Option<bool>,
}

/// Body of `PUT /api/deals/{id}`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDealRequest {
    pub make_id: Option<String>,
    pub model_id: Option<String>,
    pub year: Option<i32>,
    pub trim: Option<String>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub msrp: Option<f64>,
    pub selling_price: Option<f64>,
    pub otd_price: Option<f64>,
    pub rebates: Option<f64>,
    pub down_payment: Option<f64>,
    pub monthly_payment: Option<f64>,
    pub dealer_name: Option<String>,
    pub dealer_location: Option<String>,
    pub deal_date: Option<String>,
    pub financing_rate: Option<f64>,
    pub financing_term: Option<i32>,
    pub notes: Option<String>,
    pub is_leased: Option<bool>,
    pub lease_term_months: Option<i32>,
    pub mileage_allowance: Option<i32>,
    pub is_public: Option<bool>,
}

/// Accumulates field errors.
#[derive(Debug, Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    fn required_id(&mut self, field: &str, value: Option<&str>) {
        if value.is_none_or(|v| v.trim().is_empty()) {
            self.fail(field, "Required");
        }
    }

    fn optional_id(&mut self, field: &str, value: Option<&str>) {
        if value.is_some_and(|v| v.trim().is_empty()) {
            self.fail(field, "Must not be empty");
        }
    }

    fn year(&mut self, value: i32) {
        let max = max_model_year();
        if !(MIN_MODEL_YEAR..=max).contains(&value) {
            self.fail(
                "year",
                &format!("Must be between {MIN_MODEL_YEAR} and {max}"),
            );
        }
    }

    fn positive(&mut self, field: &str, value: f64) {
        if !value.is_finite() || value <= 0.0 {
            self.fail(field, "Must be a positive number");
        } else if !is_valid_dollars(value) {
            self.too_large(field);
        }
    }

    /// Optional dollar amount of either sign.
    fn amount(&mut self, field: &str, value: Option<f64>) {
        match value {
            Some(v) if !v.is_finite() => self.fail(field, "Must be a number"),
            Some(v) if !is_valid_dollars(v) => self.too_large(field),
            _ => {}
        }
    }

    fn finite(&mut self, field: &str, value: Option<f64>) {
        if value.is_some_and(|v| !v.is_finite()) {
            self.fail(field, "Must be a number");
        }
    }

    fn too_large(&mut self, field: &str) {
        self.fail(field, &format!("Must not exceed {MAX_DOLLARS:.0}"));
    }

    fn date(&mut self, field: &str, value: &str) -> Option<DateTime<Utc>> {
        let parsed = parse_deal_date(value);
        if parsed.is_none() {
            self.fail(field, "Must be a date (YYYY-MM-DD)");
        }
        parsed
    }

    fn finish(self) -> ServerResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServerError::Validation(self.errors))
        }
    }
}

/// Accepts a calendar date or a full RFC 3339 timestamp.
pub fn parse_deal_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Trims text and drops empty strings.
fn text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CreateDealRequest {
    /// Validates the payload and converts it to a new deal owned by
    /// `user_id`. Guest attribution is attached by the caller.
    pub fn into_new_deal(self, user_id: &str) -> ServerResult<NewDeal> {
        let mut check = Checker::default();
        check.required_id("makeId", self.make_id.as_deref());
        check.required_id("modelId", self.model_id.as_deref());
        match self.year {
            Some(year) => check.year(year),
            None => check.fail("year", "Required"),
        }
        match self.msrp {
            Some(msrp) => check.positive("msrp", msrp),
            None => check.fail("msrp", "Required"),
        }
        match self.selling_price {
            Some(price) => check.positive("sellingPrice", price),
            None => check.fail("sellingPrice", "Required"),
        }
        if let Some(otd) = self.otd_price {
            check.positive("otdPrice", otd);
        }
        check.amount("rebates", self.rebates);
        check.amount("downPayment", self.down_payment);
        check.amount("monthlyPayment", self.monthly_payment);
        check.finite("financingRate", self.financing_rate);
        let deal_date = match self.deal_date.as_deref() {
            Some(value) => check.date("dealDate", value),
            None => {
                check.fail("dealDate", "Required");
                None
            }
        };
        check.finish()?;

        let (
            Some(make_id),
            Some(model_id),
            Some(year),
            Some(msrp),
            Some(selling_price),
            Some(deal_date),
        ) = (
            self.make_id,
            self.model_id,
            self.year,
            self.msrp,
            self.selling_price,
            deal_date,
        )
        else {
            return Err(ServerError::Internal(
                "validated deal payload is missing a required field".to_string(),
            ));
        };

        Ok(NewDeal {
            user_id: user_id.to_string(),
            make_id: make_id.trim().to_string(),
            model_id: model_id.trim().to_string(),
            year,
            trim: text(self.trim),
            exterior_color: text(self.exterior_color),
            interior_color: text(self.interior_color),
            msrp: dollars_to_cents(msrp),
            selling_price: dollars_to_cents(selling_price),
            otd_price: optional_cents(self.otd_price),
            rebates: optional_cents(self.rebates),
            down_payment: optional_cents(self.down_payment),
            monthly_payment: optional_cents(self.monthly_payment),
            dealer_name: text(self.dealer_name),
            dealer_location: text(self.dealer_location),
            deal_date,
            financing_rate: self.financing_rate,
            financing_term: self.financing_term,
            notes: text(self.notes),
            is_leased: self.is_leased.unwrap_or(false),
            lease_term_months: self.lease_term_months,
            mileage_allowance: self.mileage_allowance,
            is_public: self.is_public.unwrap_or(true),
            guest_id: None,
            guest_ip_hash: None,
        })
    }
}

impl UpdateDealRequest {
    /// Validates supplied fields and converts them to a sparse patch.
    pub fn into_patch(self) -> ServerResult<DealPatch> {
        let mut check = Checker::default();
        check.optional_id("makeId", self.make_id.as_deref());
        check.optional_id("modelId", self.model_id.as_deref());
        if let Some(year) = self.year {
            check.year(year);
        }
        if let Some(msrp) = self.msrp {
            check.positive("msrp", msrp);
        }
        if let Some(price) = self.selling_price {
            check.positive("sellingPrice", price);
        }
        if let Some(otd) = self.otd_price {
            check.positive("otdPrice", otd);
        }
        check.amount("rebates", self.rebates);
        check.amount("downPayment", self.down_payment);
        check.amount("monthlyPayment", self.monthly_payment);
        check.finite("financingRate", self.financing_rate);
        let deal_date = self
            .deal_date
            .as_deref()
            .and_then(|value| check.date("dealDate", value));
        check.finish()?;

        Ok(DealPatch {
            make_id: self.make_id.map(|v| v.trim().to_string()),
            model_id: self.model_id.map(|v| v.trim().to_string()),
            year: self.year,
            trim: self.trim,
            exterior_color: self.exterior_color,
            interior_color: self.interior_color,
            msrp: optional_cents(self.msrp),
            selling_price: optional_cents(self.selling_price),
            otd_price: optional_cents(self.otd_price),
            rebates: optional_cents(self.rebates),
            down_payment: optional_cents(self.down_payment),
            monthly_payment: optional_cents(self.monthly_payment),
            dealer_name: self.dealer_name,
            dealer_location: self.dealer_location,
            deal_date,
            financing_rate: self.financing_rate,
            financing_term: self.financing_term,
            notes: self.notes,
            is_leased: self.is_leased,
            lease_term_months: self.lease_term_months,
            mileage_allowance: self.mileage_allowance,
            is_public: self.is_public,
        })
    }
}
