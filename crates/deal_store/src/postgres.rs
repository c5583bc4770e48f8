//! PostgreSQL deal store.

use async_trait::async_trait;
use chrono::Utc;
use entities::{
    DealPatch, DealWithRelations, Make, MakeWithCount, Model, ModelWithCount, ModelWithMake,
    NewDeal, PriceRange, PriceStats, User, YearAverage, new_id,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tokio::sync::OnceCell;

use crate::{
    DealPage, DealQuery, DealStore, DealStoreError, Predicate, StoreResult,
    rows::{DealRow, MakeCountRow, MakeRow, ModelCountRow, ModelRow, StatsRow, UserRow},
    schema::{
        DEAL_COLUMN_MIGRATIONS, DEAL_SELECT, MAKE_COLUMNS, MODEL_COLUMNS, SCHEMA_STATEMENTS,
        USER_COLUMNS,
    },
};

/// PostgreSQL-backed deal store.
#[derive(Debug)]
pub struct PostgresDealStore {
    pool: PgPool,
    deal_columns: OnceCell<()>,
}

impl PostgresDealStore {
    /// Creates a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            deal_columns: OnceCell::new(),
        }
    }

    /// Runs the deal column migrations once per process.
    async fn ensure_deal_columns_once(&self) -> StoreResult<()> {
        self.deal_columns
            .get_or_try_init(|| self.ensure_deal_columns())
            .await?;
        Ok(())
    }

    async fn find_make_by_name(&self, name: &str) -> StoreResult<Option<Make>> {
        let row: Option<MakeRow> = sqlx::query_as(&format!(
            "SELECT {MAKE_COLUMNS} FROM car_makes WHERE lower(name) = lower($1)"
        ))
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_model_by_name(&self, make_id: &str, name: &str) -> StoreResult<Option<Model>> {
        let row: Option<ModelRow> = sqlx::query_as(&format!(
            r#"SELECT {MODEL_COLUMNS} FROM car_models WHERE "makeId" = $1 AND lower(name) = lower($2)"#
        ))
        .bind(make_id)
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Inserts a make unless the name is taken. `None` means it was.
    async fn insert_make_if_absent(&self, name: &str) -> StoreResult<Option<Make>> {
        let make = Make::new(name);
        let row: Option<MakeRow> = sqlx::query_as(&format!(
            r#"INSERT INTO car_makes (id, name, logo, "createdAt", "updatedAt")
               SELECT $1::text, $2::text, NULL, $3::timestamptz, $3::timestamptz
               WHERE NOT EXISTS (SELECT 1 FROM car_makes WHERE lower(name) = lower($2::text))
               ON CONFLICT DO NOTHING
               RETURNING {MAKE_COLUMNS}"#
        ))
        .bind(&make.id)
        .bind(&make.name)
        .bind(make.created_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Inserts a model unless the make already has one with this name.
    async fn insert_model_if_absent(&self, make_id: &str, name: &str) -> StoreResult<Option<Model>> {
        let model = Model::new(make_id, name);
        let row: Option<ModelRow> = sqlx::query_as(&format!(
            r#"INSERT INTO car_models (id, name, "makeId", "createdAt", "updatedAt")
               SELECT $1::text, $2::text, $3::text, $4::timestamptz, $4::timestamptz
               WHERE NOT EXISTS (
                   SELECT 1 FROM car_models
                   WHERE "makeId" = $3::text AND lower(name) = lower($2::text)
               )
               ON CONFLICT DO NOTHING
               RETURNING {MODEL_COLUMNS}"#
        ))
        .bind(&model.id)
        .bind(&model.name)
        .bind(&model.make_id)
        .bind(model.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DealStoreError::from_insert("Model", &model.id, e))?;
        Ok(row.map(Into::into))
    }

    async fn require_make(&self, make_id: &str) -> StoreResult<Make> {
        self.get_make(make_id)
            .await?
            .ok_or_else(|| DealStoreError::not_found("Make", make_id))
    }
}

/// Appends `WHERE` clauses for each predicate with its value bound.
fn push_predicates(builder: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
    for (i, predicate) in predicates.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(predicate.column());
        builder.push(" ");
        builder.push(predicate.operator());
        builder.push(" ");
        match predicate {
            Predicate::IsPublic(value) => builder.push_bind(*value),
            Predicate::UserId(value) | Predicate::MakeId(value) | Predicate::ModelId(value) => {
                builder.push_bind(value.clone())
            }
            Predicate::Year(value) => builder.push_bind(*value),
            Predicate::MinSellingPrice(value) | Predicate::MaxSellingPrice(value) => {
                builder.push_bind(*value)
            }
        };
    }
}

/// Appends `SET` assignments for the supplied patch fields.
fn push_assignments(builder: &mut QueryBuilder<'_, Postgres>, patch: &DealPatch) {
    let mut set = builder.separated(", ");
    macro_rules! assign {
        ($($field:ident => $column:literal),* $(,)?) => {
            $(
                if let Some(value) = &patch.$field {
                    set.push(concat!($column, " = "));
                    set.push_bind_unseparated(value.clone());
                }
            )*
        };
    }
    assign!(
        make_id => r#""makeId""#,
        model_id => r#""modelId""#,
        year => "year",
        trim => "trim",
        exterior_color => r#""exteriorColor""#,
        interior_color => r#""interiorColor""#,
        msrp => "msrp",
        selling_price => r#""sellingPrice""#,
        otd_price => r#""otdPrice""#,
        rebates => "rebates",
        down_payment => r#""downPayment""#,
        monthly_payment => r#""monthlyPayment""#,
        dealer_name => r#""dealerName""#,
        dealer_location => r#""dealerLocation""#,
        deal_date => r#""dealDate""#,
        financing_rate => r#""financingRate""#,
        financing_term => r#""financingTerm""#,
        notes => "notes",
        is_leased => r#""isLeased""#,
        lease_term_months => r#""leaseTermMonths""#,
        mileage_allowance => r#""mileageAllowance""#,
        is_public => r#""isPublic""#,
    );
    set.push(r#""updatedAt" = now()"#);
}

#[async_trait]
impl DealStore for PostgresDealStore {
    async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        self.ensure_deal_columns_once().await?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }

    async fn ensure_deal_columns(&self) -> StoreResult<()> {
        for statement in DEAL_COLUMN_MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!("Deal columns ensured");
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn create_user(&self, user: User) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as(&format!(
            r#"INSERT INTO users (id, email, name, image, "createdAt", "updatedAt")
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.image)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DealStoreError::from_insert("User", &user.id, e))?;
        Ok(row.into())
    }

    async fn upsert_user_by_email(&self, user: User) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as(&format!(
            r#"INSERT INTO users (id, email, name, image, "createdAt", "updatedAt")
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (email) DO UPDATE
               SET name = EXCLUDED.name, image = EXCLUDED.image, "updatedAt" = EXCLUDED."updatedAt"
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.image)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DealStoreError::from_insert("User", &user.id, e))?;
        Ok(row.into())
    }

    async fn ensure_guest_user(&self) -> StoreResult<()> {
        let guest = User::guest();
        sqlx::query(
            r#"INSERT INTO users (id, email, name, "createdAt", "updatedAt")
               VALUES ($1, $2, $3, $4, $4)
               ON CONFLICT DO NOTHING"#,
        )
        .bind(&guest.id)
        .bind(&guest.email)
        .bind(&guest.name)
        .bind(guest.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            r#"SELECT {USER_COLUMNS} FROM users ORDER BY "createdAt" ASC, id ASC"#
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Makes
    // =========================================================================

    async fn list_makes(&self) -> StoreResult<Vec<MakeWithCount>> {
        let rows: Vec<MakeCountRow> = sqlx::query_as(
            r#"SELECT ma.id, ma.name, ma.logo,
                      ma."createdAt" AS created_at, ma."updatedAt" AS updated_at,
                      COUNT(d.id) AS deal_count
               FROM car_makes ma
               LEFT JOIN car_deals d ON d."makeId" = ma.id
               GROUP BY ma.id
               ORDER BY ma.name ASC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_make(&self, id: &str) -> StoreResult<Option<Make>> {
        let row: Option<MakeRow> =
            sqlx::query_as(&format!("SELECT {MAKE_COLUMNS} FROM car_makes WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn create_make(&self, name: &str) -> StoreResult<Make> {
        let make = self
            .insert_make_if_absent(name)
            .await?
            .ok_or_else(|| DealStoreError::already_exists("Make", name.trim()))?;
        tracing::info!(make_id = %make.id, name = %make.name, "Make created");
        Ok(make)
    }

    async fn upsert_make_by_name(&self, name: &str) -> StoreResult<Make> {
        if let Some(make) = self.insert_make_if_absent(name).await? {
            return Ok(make);
        }
        self.find_make_by_name(name)
            .await?
            .ok_or_else(|| DealStoreError::not_found("Make", name.trim()))
    }

    async fn count_makes(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM car_makes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Models
    // =========================================================================

    async fn list_models(&self, make_id: Option<&str>) -> StoreResult<Vec<ModelWithCount>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            r#"SELECT mo.id, mo.name, mo."makeId" AS make_id,
                      mo."createdAt" AS created_at, mo."updatedAt" AS updated_at,
                      ma.name AS make_name, ma.logo AS make_logo,
                      ma."createdAt" AS make_created_at, ma."updatedAt" AS make_updated_at,
                      (SELECT COUNT(*) FROM car_deals d WHERE d."modelId" = mo.id) AS deal_count
               FROM car_models mo
               JOIN car_makes ma ON ma.id = mo."makeId""#,
        );
        if let Some(make_id) = make_id {
            builder.push(r#" WHERE mo."makeId" = "#);
            builder.push_bind(make_id.to_string());
        }
        builder.push(" ORDER BY mo.name ASC");

        let rows: Vec<ModelCountRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_model(&self, make_id: &str, name: &str) -> StoreResult<ModelWithMake> {
        let make = self.require_make(make_id).await?;
        let model = self
            .insert_model_if_absent(make_id, name)
            .await?
            .ok_or_else(|| DealStoreError::already_exists("Model", name.trim()))?;
        tracing::info!(model_id = %model.id, make_id = %make.id, name = %model.name, "Model created");
        Ok(ModelWithMake { model, make })
    }

    async fn upsert_model_by_name(&self, make_id: &str, name: &str) -> StoreResult<Model> {
        self.require_make(make_id).await?;
        if let Some(model) = self.insert_model_if_absent(make_id, name).await? {
            return Ok(model);
        }
        self.find_model_by_name(make_id, name)
            .await?
            .ok_or_else(|| DealStoreError::not_found("Model", name.trim()))
    }

    // =========================================================================
    // Deals
    // =========================================================================

    async fn list_deals(&self, query: &DealQuery) -> StoreResult<DealPage> {
        let predicates = query.filter.predicates();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM car_deals d");
        push_predicates(&mut count, &predicates);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(DEAL_SELECT);
        push_predicates(&mut select, &predicates);
        select.push(" ORDER BY ");
        select.push(query.sort.order_by_sql());
        select.push(" LIMIT ");
        select.push_bind(i64::from(query.page.limit));
        select.push(" OFFSET ");
        select.push_bind(query.page.offset());

        let rows: Vec<DealRow> = select.build_query_as().fetch_all(&self.pool).await?;
        Ok(DealPage {
            deals: rows.into_iter().map(Into::into).collect(),
            total,
        })
    }

    async fn list_all_deals(&self) -> StoreResult<Vec<DealWithRelations>> {
        let rows: Vec<DealRow> =
            sqlx::query_as(&format!(r#"{DEAL_SELECT} ORDER BY d."createdAt" DESC, d.id DESC"#))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_deal(&self, id: &str) -> StoreResult<Option<DealWithRelations>> {
        let row: Option<DealRow> = sqlx::query_as(&format!("{DEAL_SELECT} WHERE d.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn create_deal(&self, deal: NewDeal) -> StoreResult<DealWithRelations> {
        self.ensure_deal_columns_once().await?;

        let id = new_id();
        let now = Utc::now();
        sqlx::query(
            r#"INSERT INTO car_deals (
                   id, "userId", "makeId", "modelId", year, trim, "exteriorColor", "interiorColor",
                   msrp, "sellingPrice", "otdPrice", rebates, "downPayment", "monthlyPayment",
                   "dealerName", "dealerLocation", "dealDate", "financingRate", "financingTerm",
                   notes, "isLeased", "leaseTermMonths", "mileageAllowance", verified, "isPublic",
                   "guestId", "guestIpHash", "createdAt", "updatedAt"
               ) VALUES (
                   $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                   $18, $19, $20, $21, $22, $23, FALSE, $24, $25, $26, $27, $27
               )"#,
        )
        .bind(&id)
        .bind(&deal.user_id)
        .bind(&deal.make_id)
        .bind(&deal.model_id)
        .bind(deal.year)
        .bind(&deal.trim)
        .bind(&deal.exterior_color)
        .bind(&deal.interior_color)
        .bind(deal.msrp)
        .bind(deal.selling_price)
        .bind(deal.otd_price)
        .bind(deal.rebates)
        .bind(deal.down_payment)
        .bind(deal.monthly_payment)
        .bind(&deal.dealer_name)
        .bind(&deal.dealer_location)
        .bind(deal.deal_date)
        .bind(deal.financing_rate)
        .bind(deal.financing_term)
        .bind(&deal.notes)
        .bind(deal.is_leased)
        .bind(deal.lease_term_months)
        .bind(deal.mileage_allowance)
        .bind(deal.is_public)
        .bind(&deal.guest_id)
        .bind(&deal.guest_ip_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DealStoreError::from_insert("Deal", &id, e))?;

        self.get_deal(&id)
            .await?
            .ok_or_else(|| DealStoreError::not_found("Deal", id))
    }

    async fn deal_owner(&self, id: &str) -> StoreResult<Option<String>> {
        let owner: Option<String> =
            sqlx::query_scalar(r#"SELECT "userId" FROM car_deals WHERE id = $1"#)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(owner)
    }

    async fn update_deal(
        &self,
        id: &str,
        patch: DealPatch,
    ) -> StoreResult<Option<DealWithRelations>> {
        if patch.is_empty() {
            return self.get_deal(id).await;
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE car_deals SET ");
        push_assignments(&mut builder, &patch);
        builder.push(" WHERE id = ");
        builder.push_bind(id.to_string());

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| DealStoreError::from_insert("Deal", id, e))?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_deal(id).await
    }

    async fn delete_deal(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM car_deals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn price_stats(&self) -> StoreResult<PriceStats> {
        let totals: StatsRow = sqlx::query_as(
            r#"SELECT COUNT(*) AS total_deals,
                      COALESCE(ROUND(AVG(msrp)), 0)::BIGINT AS avg_msrp,
                      COALESCE(ROUND(AVG("sellingPrice")), 0)::BIGINT AS avg_selling_price,
                      COALESCE(ROUND(AVG(msrp - "sellingPrice")), 0)::BIGINT AS avg_savings,
                      COALESCE(MIN("sellingPrice"), 0)::BIGINT AS min_price,
                      COALESCE(MAX("sellingPrice"), 0)::BIGINT AS max_price
               FROM car_deals
               WHERE "isPublic" = TRUE"#,
        )
        .fetch_one(&self.pool)
        .await?;

        let by_year: Vec<(i32, i64)> = sqlx::query_as(
            r#"SELECT year, ROUND(AVG("sellingPrice"))::BIGINT
               FROM car_deals
               WHERE "isPublic" = TRUE
               GROUP BY year
               ORDER BY year DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(PriceStats {
            total_deals: totals.total_deals,
            avg_msrp: totals.avg_msrp,
            avg_selling_price: totals.avg_selling_price,
            avg_savings: totals.avg_savings,
            price_range: PriceRange {
                min: totals.min_price,
                max: totals.max_price,
            },
            avg_price_by_year: by_year
                .into_iter()
                .map(|(year, avg_price)| YearAverage { year, avg_price })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DealFilter;

    fn count_sql(filter: &DealFilter) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM car_deals d");
        push_predicates(&mut builder, &filter.predicates());
        builder.sql().to_string()
    }

    fn update_sql(patch: &DealPatch) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE car_deals SET ");
        push_assignments(&mut builder, patch);
        builder.sql().to_string()
    }

    #[test]
    fn test_predicates_chain_with_numbered_placeholders() {
        let filter = DealFilter {
            make_id: Some("make-secret-1".to_string()),
            min_price: Some(2_000_000),
            ..DealFilter::public()
        };
        let sql = count_sql(&filter);

        assert_eq!(
            sql,
            r#"SELECT COUNT(*) FROM car_deals d WHERE d."isPublic" = $1 AND d."makeId" = $2 AND d."sellingPrice" >= $3"#
        );
        assert!(!sql.contains("make-secret-1"));
        assert!(!sql.contains("2000000"));
    }

    #[test]
    fn test_every_filter_binds_in_order() {
        let filter = DealFilter {
            public_only: true,
            user_id: Some("u'; DROP TABLE users; --".to_string()),
            make_id: Some("make-1".to_string()),
            model_id: Some("model-1".to_string()),
            year: Some(2024),
            min_price: Some(100),
            max_price: Some(900),
        };
        let sql = count_sql(&filter);

        assert_eq!(sql.matches(" AND ").count(), 6);
        assert!(sql.contains(r#"d.year = $5"#));
        assert!(sql.ends_with(r#"d."sellingPrice" <= $7"#));
        assert!(!sql.contains("DROP TABLE"));
    }

    #[test]
    fn test_no_filter_has_no_where_clause() {
        assert_eq!(
            count_sql(&DealFilter::default()),
            "SELECT COUNT(*) FROM car_deals d"
        );
    }

    #[test]
    fn test_assignments_bind_values_and_touch_updated_at() {
        let patch = DealPatch {
            selling_price: Some(2_950_000),
            notes: Some("'); DELETE FROM car_deals; --".to_string()),
            ..Default::default()
        };
        let sql = update_sql(&patch);

        assert_eq!(
            sql,
            r#"UPDATE car_deals SET "sellingPrice" = $1, notes = $2, "updatedAt" = now()"#
        );
        assert!(!sql.contains("2950000"));
        assert!(!sql.contains("DELETE"));
    }

    #[test]
    fn test_empty_patch_only_touches_updated_at() {
        assert_eq!(
            update_sql(&DealPatch::default()),
            r#"UPDATE car_deals SET "updatedAt" = now()"#
        );
    }
}
