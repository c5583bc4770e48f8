use chrono::{DateTime, Utc};
use entities::{
    Deal, DealCount, DealWithRelations, Make, MakeRef, MakeWithCount, Model, ModelRef,
    ModelWithCount, User, UserSummary,
};
use sqlx::FromRow;

/// Database row for User
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for Make
#[derive(Debug, FromRow)]
pub(crate) struct MakeRow {
    pub id: String,
    pub name: String,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MakeRow> for Make {
    fn from(row: MakeRow) -> Self {
        Make {
            id: row.id,
            name: row.name,
            logo: row.logo,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Make row with its deal count
#[derive(Debug, FromRow)]
pub(crate) struct MakeCountRow {
    #[sqlx(flatten)]
    pub make: MakeRow,
    pub deal_count: i64,
}

impl From<MakeCountRow> for MakeWithCount {
    fn from(row: MakeCountRow) -> Self {
        MakeWithCount {
            make: row.make.into(),
            count: DealCount {
                car_deals: row.deal_count,
            },
        }
    }
}

/// Database row for Model
#[derive(Debug, FromRow)]
pub(crate) struct ModelRow {
    pub id: String,
    pub name: String,
    pub make_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ModelRow> for Model {
    fn from(row: ModelRow) -> Self {
        Model {
            id: row.id,
            name: row.name,
            make_id: row.make_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Model row joined with its make and deal count
#[derive(Debug, FromRow)]
pub(crate) struct ModelCountRow {
    #[sqlx(flatten)]
    pub model: ModelRow,
    pub make_name: String,
    pub make_logo: Option<String>,
    pub make_created_at: DateTime<Utc>,
    pub make_updated_at: DateTime<Utc>,
    pub deal_count: i64,
}

impl From<ModelCountRow> for ModelWithCount {
    fn from(row: ModelCountRow) -> Self {
        let make = Make {
            id: row.model.make_id.clone(),
            name: row.make_name,
            logo: row.make_logo,
            created_at: row.make_created_at,
            updated_at: row.make_updated_at,
        };
        ModelWithCount {
            model: row.model.into(),
            make,
            count: DealCount {
                car_deals: row.deal_count,
            },
        }
    }
}

/// Deal row joined with make, model and owner display fields
#[derive(Debug, FromRow)]
pub(crate) struct DealRow {
    pub id: String,
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
    pub verified: bool,
    pub is_public: bool,
    pub guest_id: Option<String>,
    pub guest_ip_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub make_name: String,
    pub model_name: String,
    pub owner_id: Option<String>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
}

impl From<DealRow> for DealWithRelations {
    fn from(row: DealRow) -> Self {
        let make = MakeRef {
            id: row.make_id.clone(),
            name: row.make_name,
        };
        let model = ModelRef {
            id: row.model_id.clone(),
            name: row.model_name,
        };
        let user = row.owner_id.map(|id| UserSummary {
            id,
            name: row.owner_name,
            email: row.owner_email,
        });
        let deal = Deal {
            id: row.id,
            user_id: row.user_id,
            make_id: row.make_id,
            model_id: row.model_id,
            year: row.year,
            trim: row.trim,
            exterior_color: row.exterior_color,
            interior_color: row.interior_color,
            msrp: row.msrp,
            selling_price: row.selling_price,
            otd_price: row.otd_price,
            rebates: row.rebates,
            down_payment: row.down_payment,
            monthly_payment: row.monthly_payment,
            dealer_name: row.dealer_name,
            dealer_location: row.dealer_location,
            deal_date: row.deal_date,
            financing_rate: row.financing_rate,
            financing_term: row.financing_term,
            notes: row.notes,
            is_leased: row.is_leased,
            lease_term_months: row.lease_term_months,
            mileage_allowance: row.mileage_allowance,
            verified: row.verified,
            is_public: row.is_public,
            guest_id: row.guest_id,
            guest_ip_hash: row.guest_ip_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        DealWithRelations::new(deal, make, model, user)
    }
}

/// Aggregate row for price statistics
#[derive(Debug, FromRow)]
pub(crate) struct StatsRow {
    pub total_deals: i64,
    pub avg_msrp: i64,
    pub avg_selling_price: i64,
    pub avg_savings: i64,
    pub min_price: i64,
    pub max_price: i64,
}
