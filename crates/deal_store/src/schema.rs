//! PostgreSQL schema.
//!
//! Column names are quoted camelCase so existing databases created by the
//! first version of the site keep working. Monetary columns hold cents.

/// Initial schema. Each statement is idempotent.
pub(crate) const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT UNIQUE,
    name TEXT,
    image TEXT,
    "createdAt" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updatedAt" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#,
    r#"
CREATE TABLE IF NOT EXISTS car_makes (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    logo TEXT,
    "createdAt" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updatedAt" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#,
    "CREATE UNIQUE INDEX IF NOT EXISTS car_makes_name_lower_key ON car_makes (lower(name))",
    r#"
CREATE TABLE IF NOT EXISTS car_models (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    "makeId" TEXT NOT NULL REFERENCES car_makes(id),
    "createdAt" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updatedAt" TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (name, "makeId")
)"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS car_models_name_lower_make_key ON car_models (lower(name), "makeId")"#,
    r#"
CREATE TABLE IF NOT EXISTS car_deals (
    id TEXT PRIMARY KEY,
    "userId" TEXT NOT NULL REFERENCES users(id),
    "makeId" TEXT NOT NULL REFERENCES car_makes(id),
    "modelId" TEXT NOT NULL REFERENCES car_models(id),
    year INTEGER NOT NULL,
    trim TEXT,
    msrp BIGINT NOT NULL CHECK (msrp > 0),
    "sellingPrice" BIGINT NOT NULL CHECK ("sellingPrice" > 0),
    "otdPrice" BIGINT,
    rebates BIGINT,
    "downPayment" BIGINT,
    "monthlyPayment" BIGINT,
    "dealerName" TEXT,
    "dealerLocation" TEXT,
    "dealDate" TIMESTAMPTZ NOT NULL,
    "financingRate" DOUBLE PRECISION,
    "financingTerm" INTEGER,
    notes TEXT,
    "isLeased" BOOLEAN NOT NULL DEFAULT FALSE,
    "leaseTermMonths" INTEGER,
    "mileageAllowance" INTEGER,
    verified BOOLEAN NOT NULL DEFAULT FALSE,
    "isPublic" BOOLEAN NOT NULL DEFAULT TRUE,
    "createdAt" TIMESTAMPTZ NOT NULL DEFAULT now(),
    "updatedAt" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#,
    r#"CREATE INDEX IF NOT EXISTS car_deals_make_idx ON car_deals ("makeId")"#,
    r#"CREATE INDEX IF NOT EXISTS car_deals_model_idx ON car_deals ("modelId")"#,
    r#"CREATE INDEX IF NOT EXISTS car_deals_user_idx ON car_deals ("userId")"#,
    r#"CREATE INDEX IF NOT EXISTS car_deals_created_idx ON car_deals ("createdAt")"#,
    r#"CREATE INDEX IF NOT EXISTS car_deals_price_idx ON car_deals ("sellingPrice")"#,
];

/// Deal columns added after the initial schema shipped.
pub(crate) const DEAL_COLUMN_MIGRATIONS: &[&str] = &[
    r#"ALTER TABLE car_deals ADD COLUMN IF NOT EXISTS "exteriorColor" TEXT"#,
    r#"ALTER TABLE car_deals ADD COLUMN IF NOT EXISTS "interiorColor" TEXT"#,
    r#"ALTER TABLE car_deals ADD COLUMN IF NOT EXISTS "guestId" TEXT"#,
    r#"ALTER TABLE car_deals ADD COLUMN IF NOT EXISTS "guestIpHash" TEXT"#,
];

/// Deal projection joined with make, model and owner display fields.
pub(crate) const DEAL_SELECT: &str = r#"
SELECT
    d.id,
    d."userId" AS user_id,
    d."makeId" AS make_id,
    d."modelId" AS model_id,
    d.year,
    d.trim,
    d."exteriorColor" AS exterior_color,
    d."interiorColor" AS interior_color,
    d.msrp,
    d."sellingPrice" AS selling_price,
    d."otdPrice" AS otd_price,
    d.rebates,
    d."downPayment" AS down_payment,
    d."monthlyPayment" AS monthly_payment,
    d."dealerName" AS dealer_name,
    d."dealerLocation" AS dealer_location,
    d."dealDate" AS deal_date,
    d."financingRate" AS financing_rate,
    d."financingTerm" AS financing_term,
    d.notes,
    d."isLeased" AS is_leased,
    d."leaseTermMonths" AS lease_term_months,
    d."mileageAllowance" AS mileage_allowance,
    d.verified,
    d."isPublic" AS is_public,
    d."guestId" AS guest_id,
    d."guestIpHash" AS guest_ip_hash,
    d."createdAt" AS created_at,
    d."updatedAt" AS updated_at,
    ma.name AS make_name,
    mo.name AS model_name,
    u.id AS owner_id,
    u.name AS owner_name,
    u.email AS owner_email
FROM car_deals d
JOIN car_makes ma ON ma.id = d."makeId"
JOIN car_models mo ON mo.id = d."modelId"
LEFT JOIN users u ON u.id = d."userId"
"#;

pub(crate) const MAKE_COLUMNS: &str =
    r#"id, name, logo, "createdAt" AS created_at, "updatedAt" AS updated_at"#;

pub(crate) const MODEL_COLUMNS: &str =
    r#"id, name, "makeId" AS make_id, "createdAt" AS created_at, "updatedAt" AS updated_at"#;

pub(crate) const USER_COLUMNS: &str =
    r#"id, email, name, image, "createdAt" AS created_at, "updatedAt" AS updated_at"#;
