//! In-memory deal store for tests and database-less local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use entities::{
    Deal, DealCount, DealPatch, DealWithRelations, Make, MakeRef, MakeWithCount, Model, ModelRef,
    ModelWithCount, ModelWithMake, NewDeal, PriceStats, User, same_name,
};
use tokio::sync::RwLock;

use crate::{DealFilter, DealPage, DealQuery, DealSort, DealStore, DealStoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, User>,
    makes: HashMap<String, Make>,
    models: HashMap<String, Model>,
    deals: HashMap<String, Deal>,
}

impl Tables {
    /// Joins a deal with its relations. Deals whose make or model vanished
    /// are skipped, matching an inner join.
    fn relate(&self, deal: &Deal) -> Option<DealWithRelations> {
        let make = self.makes.get(&deal.make_id)?;
        let model = self.models.get(&deal.model_id)?;
        let user = self.users.get(&deal.user_id).map(User::summary);
        Some(DealWithRelations::new(
            deal.clone(),
            MakeRef {
                id: make.id.clone(),
                name: make.name.clone(),
            },
            ModelRef {
                id: model.id.clone(),
                name: model.name.clone(),
            },
            user,
        ))
    }

    fn sorted_deals(&self, filter: &DealFilter, sort: DealSort) -> Vec<&Deal> {
        let mut deals: Vec<&Deal> = self.deals.values().filter(|d| filter.matches(d)).collect();
        deals.sort_by(|a, b| sort.compare(a, b));
        deals
    }

    fn count_deals(&self, matches: impl Fn(&Deal) -> bool) -> i64 {
        self.deals.values().filter(|d| matches(d)).count() as i64
    }

    fn find_make_by_name(&self, name: &str) -> Option<&Make> {
        self.makes.values().find(|m| same_name(&m.name, name))
    }

    fn find_model_by_name(&self, make_id: &str, name: &str) -> Option<&Model> {
        self.models
            .values()
            .find(|m| m.make_id == make_id && same_name(&m.name, name))
    }
}

/// In-memory deal store.
#[derive(Debug, Default)]
pub struct MemoryDealStore {
    tables: RwLock<Tables>,
}

impl MemoryDealStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DealStore for MemoryDealStore {
    async fn migrate(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn ensure_deal_columns(&self) -> StoreResult<()> {
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn create_user(&self, user: User) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let email_taken = user.email.is_some()
            && tables.users.values().any(|u| u.email == user.email);
        if tables.users.contains_key(&user.id) || email_taken {
            return Err(DealStoreError::already_exists("User", user.id));
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn upsert_user_by_email(&self, user: User) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let existing = user.email.as_ref().and_then(|email| {
            tables
                .users
                .values_mut()
                .find(|u| u.email.as_ref() == Some(email))
        });
        if let Some(existing) = existing {
            existing.name = user.name;
            existing.image = user.image;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }
        if tables.users.contains_key(&user.id) {
            return Err(DealStoreError::already_exists("User", user.id));
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn ensure_guest_user(&self) -> StoreResult<()> {
        let guest = User::guest();
        let mut tables = self.tables.write().await;
        tables.users.entry(guest.id.clone()).or_insert(guest);
        Ok(())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }

    // =========================================================================
    // Makes
    // =========================================================================

    async fn list_makes(&self) -> StoreResult<Vec<MakeWithCount>> {
        let tables = self.tables.read().await;
        let mut makes: Vec<MakeWithCount> = tables
            .makes
            .values()
            .map(|make| MakeWithCount {
                make: make.clone(),
                count: DealCount {
                    car_deals: tables.count_deals(|d| d.make_id == make.id),
                },
            })
            .collect();
        makes.sort_by(|a, b| a.make.name.cmp(&b.make.name));
        Ok(makes)
    }

    async fn get_make(&self, id: &str) -> StoreResult<Option<Make>> {
        Ok(self.tables.read().await.makes.get(id).cloned())
    }

    async fn create_make(&self, name: &str) -> StoreResult<Make> {
        let mut tables = self.tables.write().await;
        if tables.find_make_by_name(name).is_some() {
            return Err(DealStoreError::already_exists("Make", name.trim()));
        }
        let make = Make::new(name);
        tables.makes.insert(make.id.clone(), make.clone());
        Ok(make)
    }

    async fn upsert_make_by_name(&self, name: &str) -> StoreResult<Make> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.find_make_by_name(name) {
            return Ok(existing.clone());
        }
        let make = Make::new(name);
        tables.makes.insert(make.id.clone(), make.clone());
        Ok(make)
    }

    async fn count_makes(&self) -> StoreResult<i64> {
        Ok(self.tables.read().await.makes.len() as i64)
    }

    // =========================================================================
    // Models
    // =========================================================================

    async fn list_models(&self, make_id: Option<&str>) -> StoreResult<Vec<ModelWithCount>> {
        let tables = self.tables.read().await;
        let mut models: Vec<ModelWithCount> = tables
            .models
            .values()
            .filter(|m| make_id.is_none_or(|id| m.make_id == id))
            .filter_map(|model| {
                let make = tables.makes.get(&model.make_id)?;
                Some(ModelWithCount {
                    model: model.clone(),
                    make: make.clone(),
                    count: DealCount {
                        car_deals: tables.count_deals(|d| d.model_id == model.id),
                    },
                })
            })
            .collect();
        models.sort_by(|a, b| a.model.name.cmp(&b.model.name));
        Ok(models)
    }

    async fn create_model(&self, make_id: &str, name: &str) -> StoreResult<ModelWithMake> {
        let mut tables = self.tables.write().await;
        let Some(make) = tables.makes.get(make_id).cloned() else {
            return Err(DealStoreError::not_found("Make", make_id));
        };
        if tables.find_model_by_name(make_id, name).is_some() {
            return Err(DealStoreError::already_exists("Model", name.trim()));
        }
        let model = Model::new(make_id, name);
        tables.models.insert(model.id.clone(), model.clone());
        Ok(ModelWithMake { model, make })
    }

    async fn upsert_model_by_name(&self, make_id: &str, name: &str) -> StoreResult<Model> {
        let mut tables = self.tables.write().await;
        if !tables.makes.contains_key(make_id) {
            return Err(DealStoreError::not_found("Make", make_id));
        }
        if let Some(existing) = tables.find_model_by_name(make_id, name) {
            return Ok(existing.clone());
        }
        let model = Model::new(make_id, name);
        tables.models.insert(model.id.clone(), model.clone());
        Ok(model)
    }

    // =========================================================================
    // Deals
    // =========================================================================

    async fn list_deals(&self, query: &DealQuery) -> StoreResult<DealPage> {
        let tables = self.tables.read().await;
        let matching = tables.sorted_deals(&query.filter, query.sort);
        let total = matching.len() as i64;
        let deals = matching
            .into_iter()
            .skip(query.page.offset() as usize)
            .take(query.page.limit as usize)
            .filter_map(|d| tables.relate(d))
            .collect();
        Ok(DealPage { deals, total })
    }

    async fn list_all_deals(&self) -> StoreResult<Vec<DealWithRelations>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sorted_deals(&DealFilter::default(), DealSort::default())
            .into_iter()
            .filter_map(|d| tables.relate(d))
            .collect())
    }

    async fn get_deal(&self, id: &str) -> StoreResult<Option<DealWithRelations>> {
        let tables = self.tables.read().await;
        Ok(tables.deals.get(id).and_then(|d| tables.relate(d)))
    }

    async fn create_deal(&self, deal: NewDeal) -> StoreResult<DealWithRelations> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&deal.user_id) {
            return Err(DealStoreError::ForeignKeyViolation(format!(
                "user {} does not exist",
                deal.user_id
            )));
        }
        if !tables.makes.contains_key(&deal.make_id) {
            return Err(DealStoreError::ForeignKeyViolation(format!(
                "make {} does not exist",
                deal.make_id
            )));
        }
        if !tables.models.contains_key(&deal.model_id) {
            return Err(DealStoreError::ForeignKeyViolation(format!(
                "model {} does not exist",
                deal.model_id
            )));
        }

        let deal = Deal::from_new(deal);
        tables.deals.insert(deal.id.clone(), deal.clone());
        tables
            .relate(&deal)
            .ok_or_else(|| DealStoreError::not_found("Deal", deal.id))
    }

    async fn deal_owner(&self, id: &str) -> StoreResult<Option<String>> {
        let tables = self.tables.read().await;
        Ok(tables.deals.get(id).map(|d| d.user_id.clone()))
    }

    async fn update_deal(
        &self,
        id: &str,
        patch: DealPatch,
    ) -> StoreResult<Option<DealWithRelations>> {
        let mut tables = self.tables.write().await;
        if let Some(make_id) = &patch.make_id {
            if !tables.makes.contains_key(make_id) {
                return Err(DealStoreError::ForeignKeyViolation(format!(
                    "make {make_id} does not exist"
                )));
            }
        }
        if let Some(model_id) = &patch.model_id {
            if !tables.models.contains_key(model_id) {
                return Err(DealStoreError::ForeignKeyViolation(format!(
                    "model {model_id} does not exist"
                )));
            }
        }

        let Some(deal) = tables.deals.get_mut(id) else {
            return Ok(None);
        };
        if !patch.is_empty() {
            patch.apply(deal);
        }
        let deal = deal.clone();
        Ok(tables.relate(&deal))
    }

    async fn delete_deal(&self, id: &str) -> StoreResult<bool> {
        Ok(self.tables.write().await.deals.remove(id).is_some())
    }

    async fn price_stats(&self) -> StoreResult<PriceStats> {
        let tables = self.tables.read().await;
        Ok(PriceStats::from_deals(
            tables.deals.values().filter(|d| d.is_public),
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use entities::GUEST_USER_ID;

    use super::*;
    use crate::{PageRequest, SortKey, SortOrder};

    async fn store_with_catalog() -> (MemoryDealStore, Make, Model) {
        let store = MemoryDealStore::new();
        store.ensure_guest_user().await.unwrap();
        let make = store.create_make("Toyota").await.unwrap();
        let model = store.create_model(&make.id, "Camry").await.unwrap().model;
        (store, make, model)
    }

    fn new_deal(make: &Make, model: &Model, msrp: i64, selling_price: i64) -> NewDeal {
        NewDeal {
            user_id: GUEST_USER_ID.to_string(),
            make_id: make.id.clone(),
            model_id: model.id.clone(),
            year: 2024,
            trim: None,
            exterior_color: None,
            interior_color: None,
            msrp,
            selling_price,
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
            guest_id: Some("device".to_string()),
            guest_ip_hash: None,
        }
    }

    #[tokio::test]
    async fn test_create_make_rejects_case_insensitive_duplicate() {
        let store = MemoryDealStore::new();
        store.create_make("Toyota").await.unwrap();

        let err = store.create_make("  toyota ").await.unwrap_err();
        assert!(matches!(err, DealStoreError::AlreadyExists { .. }));
        assert_eq!(store.count_makes().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_make_returns_existing() {
        let store = MemoryDealStore::new();
        let created = store.create_make("Honda").await.unwrap();
        let upserted = store.upsert_make_by_name("HONDA").await.unwrap();
        assert_eq!(created.id, upserted.id);
    }

    #[tokio::test]
    async fn test_create_model_requires_make() {
        let store = MemoryDealStore::new();
        let err = store.create_model("missing", "Civic").await.unwrap_err();
        assert!(matches!(err, DealStoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_model_names_unique_per_make() {
        let (store, make, _) = store_with_catalog().await;
        let err = store.create_model(&make.id, "CAMRY").await.unwrap_err();
        assert!(matches!(err, DealStoreError::AlreadyExists { .. }));

        let other = store.create_make("Lexus").await.unwrap();
        assert!(store.create_model(&other.id, "Camry").await.is_ok());
        assert_eq!(store.list_models(Some(&make.id)).await.unwrap().len(), 1);
        assert_eq!(store.list_models(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_deal_checks_references() {
        let (store, make, model) = store_with_catalog().await;
        let mut deal = new_deal(&make, &model, 3_000_000, 2_800_000);
        deal.model_id = "missing".to_string();
        let err = store.create_deal(deal).await.unwrap_err();
        assert!(matches!(err, DealStoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn test_list_deals_filters_sorts_and_paginates() {
        let (store, make, model) = store_with_catalog().await;
        for (msrp, price) in [
            (3_000_000, 2_900_000),
            (3_000_000, 2_500_000),
            (3_000_000, 2_700_000),
        ] {
            store.create_deal(new_deal(&make, &model, msrp, price)).await.unwrap();
        }
        let mut private = new_deal(&make, &model, 3_000_000, 2_000_000);
        private.is_public = false;
        store.create_deal(private).await.unwrap();

        let query = DealQuery {
            filter: DealFilter::public(),
            sort: DealSort::new(SortKey::Price, SortOrder::Asc),
            page: PageRequest::new(1, 2),
        };
        let page = store.list_deals(&query).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.deals.len(), 2);
        assert_eq!(page.deals[0].deal.selling_price, 2_500_000);
        assert_eq!(page.deals[1].deal.selling_price, 2_700_000);
        assert_eq!(page.deals[0].make.name, "Toyota");

        let second = store
            .list_deals(&DealQuery {
                page: PageRequest::new(2, 2),
                ..query
            })
            .await
            .unwrap();
        assert_eq!(second.deals.len(), 1);
        assert_eq!(second.deals[0].deal.selling_price, 2_900_000);
    }

    #[tokio::test]
    async fn test_update_and_delete_deal() {
        let (store, make, model) = store_with_catalog().await;
        let created = store
            .create_deal(new_deal(&make, &model, 3_000_000, 2_800_000))
            .await
            .unwrap();
        let id = created.deal.id.clone();

        let patch = DealPatch {
            selling_price: Some(2_700_000),
            ..Default::default()
        };
        let updated = store.update_deal(&id, patch).await.unwrap().unwrap();
        assert_eq!(updated.deal.selling_price, 2_700_000);
        assert_eq!(updated.savings, 300_000);
        assert_eq!(updated.deal.created_at, created.deal.created_at);

        assert!(store.update_deal("missing", DealPatch::default()).await.unwrap().is_none());
        assert!(store.delete_deal(&id).await.unwrap());
        assert!(!store.delete_deal(&id).await.unwrap());
        assert!(store.get_deal(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_user_by_email_keeps_id() {
        let store = MemoryDealStore::new();
        let first = store
            .upsert_user_by_email(User::new("acct-1").with_email("a@example.com").with_name("A"))
            .await
            .unwrap();
        let second = store
            .upsert_user_by_email(User::new("acct-2").with_email("a@example.com").with_name("B"))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.name.as_deref(), Some("B"));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_guest_user_is_idempotent() {
        let store = MemoryDealStore::new();
        store.ensure_guest_user().await.unwrap();
        store.ensure_guest_user().await.unwrap();
        let users = store.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].is_guest());
    }

    #[tokio::test]
    async fn test_make_counts_include_deals() {
        let (store, make, model) = store_with_catalog().await;
        store
            .create_deal(new_deal(&make, &model, 3_000_000, 2_800_000))
            .await
            .unwrap();
        let makes = store.list_makes().await.unwrap();
        assert_eq!(makes[0].count.car_deals, 1);
    }

    #[tokio::test]
    async fn test_price_stats_ignore_private_deals() {
        let (store, make, model) = store_with_catalog().await;
        store
            .create_deal(new_deal(&make, &model, 3_000_000, 2_800_000))
            .await
            .unwrap();
        let mut private = new_deal(&make, &model, 9_000_000, 1_000_000);
        private.is_public = false;
        store.create_deal(private).await.unwrap();

        let stats = store.price_stats().await.unwrap();
        assert_eq!(stats.total_deals, 1);
        assert_eq!(stats.avg_savings, 200_000);
    }
}
