//! Aggregate price statistics over public deals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Deal;

/// Lowest and highest selling price, in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

/// Average selling price for one model year, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearAverage {
    pub year: i32,
    pub avg_price: i64,
}

/// Summary statistics. All amounts are cents rounded to the nearest cent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStats {
    pub total_deals: i64,
    pub avg_msrp: i64,
    pub avg_selling_price: i64,
    pub avg_savings: i64,
    pub price_range: PriceRange,
    /// Newest model year first.
    pub avg_price_by_year: Vec<YearAverage>,
}

impl PriceStats {
    /// Computes statistics over the given deals.
    pub fn from_deals<'a>(deals: impl IntoIterator<Item = &'a Deal>) -> Self {
        let deals: Vec<&Deal> = deals.into_iter().collect();
        if deals.is_empty() {
            return Self::default();
        }

        // Sums are widened so large prices cannot overflow.
        let count = deals.len() as i128;
        let msrp_sum: i128 = deals.iter().map(|d| i128::from(d.msrp)).sum();
        let price_sum: i128 = deals.iter().map(|d| i128::from(d.selling_price)).sum();
        let savings_sum: i128 = deals
            .iter()
            .map(|d| i128::from(d.msrp) - i128::from(d.selling_price))
            .sum();

        let mut by_year: BTreeMap<i32, (i128, i128)> = BTreeMap::new();
        for deal in &deals {
            let entry = by_year.entry(deal.year).or_insert((0, 0));
            entry.0 += i128::from(deal.selling_price);
            entry.1 += 1;
        }

        Self {
            total_deals: deals.len() as i64,
            avg_msrp: rounded_average(msrp_sum, count),
            avg_selling_price: rounded_average(price_sum, count),
            avg_savings: rounded_average(savings_sum, count),
            price_range: PriceRange {
                min: deals.iter().map(|d| d.selling_price).min().unwrap_or_default(),
                max: deals.iter().map(|d| d.selling_price).max().unwrap_or_default(),
            },
            avg_price_by_year: by_year
                .into_iter()
                .rev()
                .map(|(year, (sum, n))| YearAverage {
                    year,
                    avg_price: rounded_average(sum, n),
                })
                .collect(),
        }
    }
}

/// Integer mean rounded half away from zero, saturating at the `i64` bounds.
fn rounded_average(sum: i128, count: i128) -> i64 {
    if count == 0 {
        return 0;
    }
    let mut mean = sum / count;
    if 2 * (sum % count).abs() >= count {
        mean += sum.signum();
    }
    i64::try_from(mean).unwrap_or(if mean < 0 { i64::MIN } else { i64::MAX })
}
