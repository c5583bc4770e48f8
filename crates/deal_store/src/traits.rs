//! Deal store trait definition.

use async_trait::async_trait;
use entities::{
    DealPatch, DealWithRelations, Make, MakeWithCount, Model, ModelWithCount, ModelWithMake,
    NewDeal, PriceStats, User,
};

use crate::{DealPage, DealQuery, StoreResult};

/// Persistence for users, makes, models and deals.
#[async_trait]
pub trait DealStore: Send + Sync {
    // =========================================================================
    // Schema
    // =========================================================================

    /// Creates tables and indexes that do not exist yet.
    async fn migrate(&self) -> StoreResult<()>;

    /// Adds deal columns introduced after the first schema. Idempotent.
    async fn ensure_deal_columns(&self) -> StoreResult<()>;

    // =========================================================================
    // Users
    // =========================================================================

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>>;

    /// Inserts a user. Fails with `AlreadyExists` on a duplicate ID or email.
    async fn create_user(&self, user: User) -> StoreResult<User>;

    /// Inserts a user, or refreshes name and image of the user holding the
    /// same email. Returns the stored row.
    async fn upsert_user_by_email(&self, user: User) -> StoreResult<User>;

    /// Creates the shared guest owner row when it is missing.
    async fn ensure_guest_user(&self) -> StoreResult<()>;

    async fn list_users(&self) -> StoreResult<Vec<User>>;

    // =========================================================================
    // Makes
    // =========================================================================

    /// All makes ordered by name, with deal counts.
    async fn list_makes(&self) -> StoreResult<Vec<MakeWithCount>>;

    async fn get_make(&self, id: &str) -> StoreResult<Option<Make>>;

    /// Inserts a make unless one with the same name (ignoring case) exists,
    /// in which case `AlreadyExists` is returned. The check and the insert
    /// are a single atomic step.
    async fn create_make(&self, name: &str) -> StoreResult<Make>;

    /// Returns the make with this name (ignoring case), creating it if needed.
    async fn upsert_make_by_name(&self, name: &str) -> StoreResult<Make>;

    async fn count_makes(&self) -> StoreResult<i64>;

    // =========================================================================
    // Models
    // =========================================================================

    /// Models ordered by name, optionally restricted to one make.
    async fn list_models(&self, make_id: Option<&str>) -> StoreResult<Vec<ModelWithCount>>;

    /// Inserts a model under an existing make. Fails with `NotFound` when the
    /// make is missing and `AlreadyExists` when the make already has a model
    /// with this name (ignoring case).
    async fn create_model(&self, make_id: &str, name: &str) -> StoreResult<ModelWithMake>;

    /// Returns the model with this name under the make, creating it if needed.
    async fn upsert_model_by_name(&self, make_id: &str, name: &str) -> StoreResult<Model>;

    // =========================================================================
    // Deals
    // =========================================================================

    async fn list_deals(&self, query: &DealQuery) -> StoreResult<DealPage>;

    /// Every deal, newest first, regardless of visibility.
    async fn list_all_deals(&self) -> StoreResult<Vec<DealWithRelations>>;

    async fn get_deal(&self, id: &str) -> StoreResult<Option<DealWithRelations>>;

    /// Inserts a deal. Owner, make and model must exist.
    async fn create_deal(&self, deal: NewDeal) -> StoreResult<DealWithRelations>;

    /// Owner ID of a deal, if the deal exists.
    async fn deal_owner(&self, id: &str) -> StoreResult<Option<String>>;

    /// Applies a patch. Returns `None` when the deal does not exist.
    async fn update_deal(&self, id: &str, patch: DealPatch)
    -> StoreResult<Option<DealWithRelations>>;

    /// Deletes a deal. Returns false when the deal does not exist.
    async fn delete_deal(&self, id: &str) -> StoreResult<bool>;

    /// Aggregates over public deals.
    async fn price_stats(&self) -> StoreResult<PriceStats>;
}
