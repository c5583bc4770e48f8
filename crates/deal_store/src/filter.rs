//! Listing criteria shared by every store implementation.
//!
//! A [`DealFilter`] expands into a list of [`Predicate`]s. The SQL store binds
//! each predicate as a parameter and the memory store evaluates them directly,
//! so user input never reaches query text.

use std::cmp::Ordering;

use entities::{Deal, DealWithRelations};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Filter options for listing deals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealFilter {
    /// Only include deals marked public.
    pub public_only: bool,
    /// Filter by owner.
    pub user_id: Option<String>,
    /// Filter by make ID.
    pub make_id: Option<String>,
    /// Filter by model ID.
    pub model_id: Option<String>,
    /// Filter by model year.
    pub year: Option<i32>,
    /// Inclusive lower bound on selling price, in cents.
    pub min_price: Option<i64>,
    /// Inclusive upper bound on selling price, in cents.
    pub max_price: Option<i64>,
}

impl DealFilter {
    /// Public deals only.
    pub fn public() -> Self {
        Self {
            public_only: true,
            ..Default::default()
        }
    }

    /// All deals owned by one user, public or not.
    pub fn owned_by(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    /// Expands the filter into conjunctive predicates.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if self.public_only {
            predicates.push(Predicate::IsPublic(true));
        }
        if let Some(user_id) = &self.user_id {
            predicates.push(Predicate::UserId(user_id.clone()));
        }
        if let Some(make_id) = &self.make_id {
            predicates.push(Predicate::MakeId(make_id.clone()));
        }
        if let Some(model_id) = &self.model_id {
            predicates.push(Predicate::ModelId(model_id.clone()));
        }
        if let Some(year) = self.year {
            predicates.push(Predicate::Year(year));
        }
        if let Some(min) = self.min_price {
            predicates.push(Predicate::MinSellingPrice(min));
        }
        if let Some(max) = self.max_price {
            predicates.push(Predicate::MaxSellingPrice(max));
        }
        predicates
    }

    /// Returns true when the deal satisfies every predicate.
    pub fn matches(&self, deal: &Deal) -> bool {
        self.predicates().iter().all(|p| p.matches(deal))
    }
}

/// A single column comparison with a bound value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    IsPublic(bool),
    UserId(String),
    MakeId(String),
    ModelId(String),
    Year(i32),
    MinSellingPrice(i64),
    MaxSellingPrice(i64),
}

impl Predicate {
    /// Qualified column in the deal listing query.
    pub fn column(&self) -> &'static str {
        match self {
            Self::IsPublic(_) => r#"d."isPublic""#,
            Self::UserId(_) => r#"d."userId""#,
            Self::MakeId(_) => r#"d."makeId""#,
            Self::ModelId(_) => r#"d."modelId""#,
            Self::Year(_) => "d.year",
            Self::MinSellingPrice(_) | Self::MaxSellingPrice(_) => r#"d."sellingPrice""#,
        }
    }

    /// Comparison operator.
    pub fn operator(&self) -> &'static str {
        match self {
            Self::MinSellingPrice(_) => ">=",
            Self::MaxSellingPrice(_) => "<=",
            _ => "=",
        }
    }

    /// Evaluates the predicate against an in-memory deal.
    pub fn matches(&self, deal: &Deal) -> bool {
        match self {
            Self::IsPublic(v) => deal.is_public == *v,
            Self::UserId(v) => deal.user_id == *v,
            Self::MakeId(v) => deal.make_id == *v,
            Self::ModelId(v) => deal.model_id == *v,
            Self::Year(v) => deal.year == *v,
            Self::MinSellingPrice(v) => deal.selling_price >= *v,
            Self::MaxSellingPrice(v) => deal.selling_price <= *v,
        }
    }
}

/// Sort key for deal listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Selling price.
    Price,
    /// Creation time.
    #[default]
    Date,
    /// MSRP minus selling price.
    Savings,
}

impl SortKey {
    /// Parses a `sortBy` value. Anything unrecognized sorts by date.
    pub fn parse(value: &str) -> Self {
        match value {
            "price" => Self::Price,
            "savings" => Self::Savings,
            _ => Self::Date,
        }
    }

    fn expression(self) -> &'static str {
        match self {
            Self::Price => r#"d."sellingPrice""#,
            Self::Date => r#"d."createdAt""#,
            Self::Savings => r#"(d.msrp - d."sellingPrice")"#,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parses a `sortOrder` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sort key plus direction. Ties break on deal ID in the same direction so
/// pagination is stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DealSort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl DealSort {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    /// `ORDER BY` body built only from fixed fragments.
    pub fn order_by_sql(&self) -> String {
        let direction = self.order.keyword();
        format!("{} {direction}, d.id {direction}", self.key.expression())
    }

    /// Orders two deals the way [`Self::order_by_sql`] orders rows.
    pub fn compare(&self, a: &Deal, b: &Deal) -> Ordering {
        let by_key = match self.key {
            SortKey::Price => a.selling_price.cmp(&b.selling_price),
            SortKey::Date => a.created_at.cmp(&b.created_at),
            SortKey::Savings => a.savings().cmp(&b.savings()),
        };
        let ordering = by_key.then_with(|| a.id.cmp(&b.id));
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Creates a page request. Zero values are raised to one.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    /// Total page count for a row count.
    pub fn pages(&self, total: i64) -> i64 {
        let limit = i64::from(self.limit);
        (total + limit - 1) / limit
    }
}

/// Everything needed to list one page of deals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealQuery {
    pub filter: DealFilter,
    pub sort: DealSort,
    pub page: PageRequest,
}

/// One page of deals plus the total matching row count.
#[derive(Debug, Clone, PartialEq)]
pub struct DealPage {
    pub deals: Vec<DealWithRelations>,
    pub total: i64,
}
