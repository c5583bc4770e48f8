//! Deal API endpoints.

use std::sync::Arc;

use auth::{
    AuthenticatedUser, GUEST_COOKIE_MAX_AGE_SECS, GUEST_COOKIE_NAME, GuestIdentity, Identity,
    client_address,
};
use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use deal_store::{
    DEFAULT_PAGE_LIMIT, DealFilter, DealPage, DealQuery, DealSort, DealStore, DealStoreError,
    PageRequest, SortKey, SortOrder,
};
use entities::{DealWithRelations, User, dollars_to_cents, is_valid_dollars};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::payload::{CreateDealRequest, UpdateDealRequest};
use super::{parse_param, require_user};
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Largest page size a client may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Query parameters of `GET /api/deals`. Values are kept as text so bad input
/// yields a descriptive 400.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDealsParams {
    pub make_id: Option<String>,
    pub model_id: Option<String>,
    pub year: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Query parameters of `GET /api/my-deals`.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Pagination block of a listing response.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

/// Response of the listing endpoints.
#[derive(Debug, Serialize)]
pub struct DealListResponse {
    pub deals: Vec<DealWithRelations>,
    pub pagination: Pagination,
}

impl DealListResponse {
    fn new(page: DealPage, request: PageRequest) -> Self {
        Self {
            pagination: Pagination {
                page: request.page,
                limit: request.limit,
                total: page.total,
                pages: request.pages(page.total),
            },
            deals: page.deals,
        }
    }
}

fn parse_page(page: Option<&str>, limit: Option<&str>) -> ServerResult<PageRequest> {
    let page = parse_param::<u32>("page", page)?.unwrap_or(1);
    if page == 0 {
        return Err(ServerError::InvalidRequest("page must be at least 1".to_string()));
    }
    let limit = parse_param::<u32>("limit", limit)?.unwrap_or(DEFAULT_PAGE_LIMIT);
    if limit == 0 {
        return Err(ServerError::InvalidRequest("limit must be at least 1".to_string()));
    }
    Ok(PageRequest::new(page, limit.min(MAX_PAGE_LIMIT)))
}

fn parse_price(name: &str, value: Option<&str>) -> ServerResult<Option<i64>> {
    match parse_param::<f64>(name, value)? {
        Some(dollars) if !is_valid_dollars(dollars) => {
            Err(ServerError::InvalidRequest(format!("Invalid {name}")))
        }
        dollars => Ok(dollars.map(dollars_to_cents)),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ListDealsParams {
    /// Converts the parameters into a store query over public deals.
    pub fn into_query(self) -> ServerResult<DealQuery> {
        let order = match self.sort_order.as_deref().map(str::trim) {
            None | Some("") => SortOrder::default(),
            Some(raw) => SortOrder::parse(raw)
                .ok_or_else(|| ServerError::InvalidRequest(format!("Invalid sortOrder: {raw}")))?,
        };
        let key = self
            .sort_by
            .as_deref()
            .map(|raw| SortKey::parse(raw.trim()))
            .unwrap_or_default();

        let filter = DealFilter {
            year: parse_param("year", self.year.as_deref())?,
            min_price: parse_price("minPrice", self.min_price.as_deref())?,
            max_price: parse_price("maxPrice", self.max_price.as_deref())?,
            make_id: non_empty(self.make_id),
            model_id: non_empty(self.model_id),
            ..DealFilter::public()
        };

        Ok(DealQuery {
            filter,
            sort: DealSort::new(key, order),
            page: parse_page(self.page.as_deref(), self.limit.as_deref())?,
        })
    }
}

/// Lists public deals.
pub async fn list_deals<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<ListDealsParams>, QueryRejection>,
) -> ServerResult<Json<DealListResponse>> {
    let Query(params) = params?;
    let query = params.into_query()?;

    let page = state
        .store
        .list_deals(&query)
        .await
        .map_err(ServerError::store("Failed to fetch deals"))?;

    Ok(Json(DealListResponse::new(page, query.page)))
}

/// Lists the caller's own deals, private ones included.
pub async fn my_deals<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
    user: Option<Extension<AuthenticatedUser>>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ServerResult<Json<DealListResponse>> {
    let user = require_user(user)?;
    let Query(params) = params?;
    let query = DealQuery {
        filter: DealFilter::owned_by(&user.id),
        sort: DealSort::default(),
        page: parse_page(params.page.as_deref(), params.limit.as_deref())?,
    };

    let page = state
        .store
        .list_deals(&query)
        .await
        .map_err(ServerError::store("Failed to fetch deals"))?;

    Ok(Json(DealListResponse::new(page, query.page)))
}

/// Gets a deal by ID.
///
/// Private deals are only visible to their owner. Anyone else gets a 404,
/// the same as for an unknown ID, so the deal's existence is not revealed.
pub async fn get_deal<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
    user: Option<Extension<AuthenticatedUser>>,
    Path(id): Path<String>,
) -> ServerResult<Json<DealWithRelations>> {
    let deal = state
        .store
        .get_deal(&id)
        .await
        .map_err(ServerError::store("Failed to fetch deal"))?
        .filter(|deal| {
            deal.deal.is_public
                || user
                    .as_ref()
                    .is_some_and(|Extension(user)| user.id == deal.deal.user_id)
        })
        .ok_or_else(|| ServerError::NotFound("Deal not found".to_string()))?;

    Ok(Json(deal))
}

/// Makes sure the session user has a row to own the deal.
async fn ensure_user_row<S: DealStore>(store: &S, user: &AuthenticatedUser) -> ServerResult<()> {
    let existing = store
        .get_user(&user.id)
        .await
        .map_err(ServerError::store("Failed to create deal"))?;
    if existing.is_some() {
        return Ok(());
    }

    let mut row = User::new(&user.id);
    row.email = user.email.clone();
    row.name = user.name.clone();
    row.image = user.image.clone();
    match store.create_user(row).await {
        Ok(_) => {
            tracing::info!(user_id = %user.id, "User created");
            Ok(())
        }
        // Either a concurrent request created this user, or another account
        // already holds the email. Only the first is fine.
        Err(e @ DealStoreError::AlreadyExists { .. }) => {
            let created = store
                .get_user(&user.id)
                .await
                .map_err(ServerError::store("Failed to create deal"))?;
            if created.is_some() {
                Ok(())
            } else {
                tracing::warn!(user_id = %user.id, "Session email belongs to another user");
                Err(ServerError::store("Failed to create deal")(e))
            }
        }
        Err(e) => Err(ServerError::store("Failed to create deal")(e)),
    }
}

/// Resolves who is submitting.
fn resolve_identity<S: DealStore>(
    state: &AppState<S>,
    user: Option<AuthenticatedUser>,
    headers: &HeaderMap,
    jar: &CookieJar,
) -> Identity {
    if let Some(user) = user {
        return Identity::Authenticated(user);
    }

    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
    let address = client_address(header("x-forwarded-for"), header("x-real-ip"));
    let cookie = jar.get(GUEST_COOKIE_NAME).map(|cookie| cookie.value());
    Identity::Guest(GuestIdentity::resolve(
        cookie,
        address.as_deref(),
        &state.address_hasher,
    ))
}

fn guest_cookie(token: String) -> Cookie<'static> {
    Cookie::build((GUEST_COOKIE_NAME, token))
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(GUEST_COOKIE_MAX_AGE_SECS))
        .build()
}

/// Creates a deal as the session user, or as a guest.
pub async fn create_deal<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
    user: Option<Extension<AuthenticatedUser>>,
    headers: HeaderMap,
    jar: CookieJar,
    payload: Result<Json<CreateDealRequest>, JsonRejection>,
) -> ServerResult<(StatusCode, CookieJar, Json<DealWithRelations>)> {
    let Json(request) = payload?;
    let identity = resolve_identity(&state, user.map(|Extension(user)| user), &headers, &jar);
    let mut new_deal = request.into_new_deal(identity.user_id())?;

    match &identity {
        Identity::Authenticated(user) => ensure_user_row(&state.store, user).await?,
        Identity::Guest(guest) => {
            state
                .store
                .ensure_guest_user()
                .await
                .map_err(ServerError::store("Failed to create deal"))?;
            new_deal.guest_id = Some(guest.device_token.clone());
            new_deal.guest_ip_hash = guest.ip_hash.clone();
        }
    }

    let deal = state
        .store
        .create_deal(new_deal)
        .await
        .map_err(ServerError::store("Failed to create deal"))?;

    tracing::info!(
        deal_id = %deal.deal.id,
        user_id = %deal.deal.user_id,
        "Deal created"
    );

    let jar = match identity.guest() {
        Some(guest) if guest.minted => jar.add(guest_cookie(guest.device_token.clone())),
        _ => jar,
    };

    Ok((StatusCode::CREATED, jar, Json(deal)))
}

/// Confirms the caller owns the deal.
async fn check_owner<S: DealStore>(store: &S, id: &str, user: &AuthenticatedUser) -> ServerResult<()> {
    let owner = store
        .deal_owner(id)
        .await
        .map_err(ServerError::store("Failed to fetch deal"))?
        .ok_or_else(|| ServerError::NotFound("Deal not found".to_string()))?;

    if owner != user.id {
        tracing::warn!(deal_id = %id, user_id = %user.id, "Rejected change to another user's deal");
        return Err(ServerError::PermissionDenied(
            "You can only modify your own deals".to_string(),
        ));
    }
    Ok(())
}

/// Applies a partial update to the caller's deal.
pub async fn update_deal<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
    user: Option<Extension<AuthenticatedUser>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateDealRequest>, JsonRejection>,
) -> ServerResult<Json<DealWithRelations>> {
    let user = require_user(user)?;
    let Json(request) = payload?;
    let patch = request.into_patch()?;
    check_owner(&state.store, &id, &user).await?;

    let deal = if patch.is_empty() {
        state
            .store
            .get_deal(&id)
            .await
            .map_err(ServerError::store("Failed to update deal"))?
    } else {
        state
            .store
            .update_deal(&id, patch)
            .await
            .map_err(ServerError::store("Failed to update deal"))?
    };
    let deal = deal.ok_or_else(|| ServerError::NotFound("Deal not found".to_string()))?;

    tracing::info!(deal_id = %id, user_id = %user.id, "Deal updated");

    Ok(Json(deal))
}

/// Deletes the caller's deal.
pub async fn delete_deal<S: DealStore>(
    State(state): State<Arc<AppState<S>>>,
    user: Option<Extension<AuthenticatedUser>>,
    Path(id): Path<String>,
) -> ServerResult<Json<Value>> {
    let user = require_user(user)?;
    check_owner(&state.store, &id, &user).await?;

    let deleted = state
        .store
        .delete_deal(&id)
        .await
        .map_err(ServerError::store("Failed to delete deal"))?;
    if !deleted {
        return Err(ServerError::NotFound("Deal not found".to_string()));
    }

    tracing::info!(deal_id = %id, user_id = %user.id, "Deal deleted");

    Ok(Json(json!({ "id": id, "deleted": true })))
}
