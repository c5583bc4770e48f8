//! Router-level tests against the in-memory store.

use std::sync::Arc;

use auth::{AdminAllowList, AuthenticatedUser, GUEST_COOKIE_NAME};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        HeaderMap, Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
};
use deal_store::{DealStore, MemoryDealStore};
use entities::{GUEST_USER_ID, User};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::config::Config;
use crate::state::AppState;
use crate::{create_app, create_state};

struct TestApp {
    app: Router,
    state: Arc<AppState<MemoryDealStore>>,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl TestApp {
    fn new() -> Self {
        let config = Config {
            session_secret: Some("router-test-secret".to_string()),
            admin_emails: AdminAllowList::parse("admin@example.com"),
            ..Config::default()
        };
        let state = create_state(config, MemoryDealStore::new());
        Self {
            app: create_app(state.clone()),
            state,
        }
    }

    fn token_for(&self, user: &AuthenticatedUser) -> String {
        self.state
            .jwt_manager
            .as_ref()
            .unwrap()
            .generate_token(user)
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, token, None)).await
    }

    /// Seeds one make with one model and returns their IDs.
    async fn vocabulary(&self, make: &str, model: &str) -> (String, String) {
        let make = match self.state.store.create_make(make).await {
            Ok(make) => make,
            Err(_) => self.state.store.upsert_make_by_name(make).await.unwrap(),
        };
        let model = self.state.store.create_model(&make.id, model).await.unwrap();
        (make.id, model.model.id)
    }
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn deal_body(make_id: &str, model_id: &str, msrp: f64, selling_price: f64) -> Value {
    json!({
        "makeId": make_id,
        "modelId": model_id,
        "year": 2024,
        "msrp": msrp,
        "sellingPrice": selling_price,
        "dealDate": "2024-05-01",
    })
}

fn alice() -> AuthenticatedUser {
    AuthenticatedUser::new("acct-alice")
        .with_email("alice@example.com")
        .with_name("Alice")
}

fn bob() -> AuthenticatedUser {
    AuthenticatedUser::new("acct-bob").with_email("bob@example.com")
}

#[tokio::test]
async fn test_guest_submission_mints_and_reuses_cookie() {
    let app = TestApp::new();
    let (make_id, model_id) = app.vocabulary("Toyota", "Camry").await;

    let first = app
        .send(request(
            Method::POST,
            "/api/deals",
            None,
            Some(deal_body(&make_id, &model_id, 35000.0, 32000.0)),
        ))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["userId"], GUEST_USER_ID);
    assert_eq!(first.body["msrp"], 3_500_000);
    assert_eq!(first.body["sellingPrice"], 3_200_000);
    assert_eq!(first.body["savings"], 300_000);
    assert_eq!(first.body["savingsPercentage"], 8.6);
    assert!(first.body.get("guestId").is_none());

    let set_cookie = first.headers[SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with(&format!("{GUEST_COOKIE_NAME}=")));
    assert!(set_cookie.contains("SameSite=Lax"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let token = cookie.split_once('=').unwrap().1.to_string();

    let mut second = request(
        Method::POST,
        "/api/deals",
        None,
        Some(deal_body(&make_id, &model_id, 30000.0, 29000.0)),
    );
    second
        .headers_mut()
        .insert(COOKIE, cookie.parse().unwrap());
    second
        .headers_mut()
        .insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
    let second = app.send(second).await;
    assert_eq!(second.status, StatusCode::CREATED);
    assert!(second.headers.get(SET_COOKIE).is_none());

    let deals = app.state.store.list_all_deals().await.unwrap();
    assert_eq!(deals.len(), 2);
    assert!(
        deals
            .iter()
            .all(|deal| deal.deal.guest_id.as_deref() == Some(token.as_str()))
    );
    let hashed = deals.iter().filter(|deal| deal.deal.guest_ip_hash.is_some()).count();
    assert_eq!(hashed, 1);
}

#[tokio::test]
async fn test_signed_in_submission_creates_owner_row() {
    let app = TestApp::new();
    let (make_id, model_id) = app.vocabulary("Honda", "Civic").await;
    let token = app.token_for(&alice());

    let created = app
        .send(request(
            Method::POST,
            "/api/deals",
            Some(&token),
            Some(deal_body(&make_id, &model_id, 28000.0, 26500.0)),
        ))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["userId"], "acct-alice");
    assert_eq!(created.body["user"]["name"], "Alice");
    assert!(created.headers.get(SET_COOKIE).is_none());

    let stored = app.state.store.get_user("acct-alice").await.unwrap().unwrap();
    assert_eq!(stored.email.as_deref(), Some("alice@example.com"));
}

#[tokio::test]
async fn test_submission_rejected_when_email_belongs_to_another_user() {
    let app = TestApp::new();
    let (make_id, model_id) = app.vocabulary("Honda", "Accord").await;
    app.state
        .store
        .create_user(User::new("acct-old").with_email("alice@example.com"))
        .await
        .unwrap();
    let token = app.token_for(&alice());

    let created = app
        .send(request(
            Method::POST,
            "/api/deals",
            Some(&token),
            Some(deal_body(&make_id, &model_id, 30000.0, 28000.0)),
        ))
        .await;
    assert_eq!(created.status, StatusCode::CONFLICT);
    assert_eq!(created.body["error"]["code"], 409);

    assert!(app.state.store.get_user("acct-alice").await.unwrap().is_none());
    let listed = app.get("/api/deals", None).await;
    assert_eq!(listed.body["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_submission_validation_and_malformed_json() {
    let app = TestApp::new();

    let invalid = app
        .send(request(
            Method::POST,
            "/api/deals",
            None,
            Some(json!({ "year": 1980, "msrp": -5 })),
        ))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = invalid.body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|detail| detail["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"makeId"));
    assert!(fields.contains(&"year"));
    assert!(fields.contains(&"msrp"));

    let (make_id, model_id) = app.vocabulary("Kia", "Telluride").await;
    let oversized = app
        .send(request(
            Method::POST,
            "/api/deals",
            None,
            Some(deal_body(&make_id, &model_id, 1e20, 30000.0)),
        ))
        .await;
    assert_eq!(oversized.status, StatusCode::BAD_REQUEST);
    assert_eq!(oversized.body["error"]["details"][0]["field"], "msrp");

    let malformed = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/deals")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    let dangling = app
        .send(request(
            Method::POST,
            "/api/deals",
            None,
            Some(deal_body("missing-make", "missing-model", 20000.0, 19000.0)),
        ))
        .await;
    assert_eq!(dangling.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_owner_can_change_a_deal() {
    let app = TestApp::new();
    let (make_id, model_id) = app.vocabulary("Mazda", "CX-5").await;
    let alice_token = app.token_for(&alice());
    let bob_token = app.token_for(&bob());

    let created = app
        .send(request(
            Method::POST,
            "/api/deals",
            Some(&alice_token),
            Some(deal_body(&make_id, &model_id, 31000.0, 29500.0)),
        ))
        .await;
    let id = created.body["id"].as_str().unwrap().to_string();
    let uri = format!("/api/deals/{id}");

    let anonymous = app
        .send(request(Method::PUT, &uri, None, Some(json!({ "notes": "mine" }))))
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let stolen = app
        .send(request(
            Method::PUT,
            &uri,
            Some(&bob_token),
            Some(json!({ "sellingPrice": 1 })),
        ))
        .await;
    assert_eq!(stolen.status, StatusCode::FORBIDDEN);
    let unchanged = app.get(&uri, None).await;
    assert_eq!(unchanged.body["sellingPrice"], 2_950_000);

    let updated = app
        .send(request(
            Method::PUT,
            &uri,
            Some(&alice_token),
            Some(json!({ "sellingPrice": 29000, "notes": "Negotiated again" })),
        ))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["sellingPrice"], 2_900_000);
    assert_eq!(updated.body["notes"], "Negotiated again");

    let noop = app
        .send(request(Method::PUT, &uri, Some(&alice_token), Some(json!({}))))
        .await;
    assert_eq!(noop.status, StatusCode::OK);
    assert_eq!(noop.body["sellingPrice"], 2_900_000);

    let refused = app
        .send(request(Method::DELETE, &uri, Some(&bob_token), None))
        .await;
    assert_eq!(refused.status, StatusCode::FORBIDDEN);

    let deleted = app
        .send(request(Method::DELETE, &uri, Some(&alice_token), None))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body, json!({ "id": id, "deleted": true }));

    let missing = app
        .send(request(Method::DELETE, &uri, Some(&alice_token), None))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_private_deals_are_hidden_from_others() {
    let app = TestApp::new();
    let (make_id, model_id) = app.vocabulary("Kia", "Telluride").await;
    let alice_token = app.token_for(&alice());

    let mut body = deal_body(&make_id, &model_id, 45000.0, 43000.0);
    body["isPublic"] = json!(false);
    let created = app
        .send(request(Method::POST, "/api/deals", Some(&alice_token), Some(body)))
        .await;
    let uri = format!("/api/deals/{}", created.body["id"].as_str().unwrap());

    assert_eq!(app.get(&uri, None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get(&uri, Some(&alice_token)).await.status, StatusCode::OK);

    let public = app.get("/api/deals", None).await;
    assert_eq!(public.body["pagination"]["total"], 0);

    let mine = app.get("/api/my-deals", Some(&alice_token)).await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.body["pagination"]["total"], 1);
    assert_eq!(mine.body["deals"][0]["make"]["name"], "Kia");

    assert_eq!(
        app.get("/api/my-deals", None).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_listing_filters_and_sorts_by_price() {
    let app = TestApp::new();
    let (make_id, model_id) = app.vocabulary("Ford", "Escape").await;
    for price in [35000.0, 25000.0, 19000.0, 21000.0, 30000.0] {
        let created = app
            .send(request(
                Method::POST,
                "/api/deals",
                None,
                Some(deal_body(&make_id, &model_id, 40000.0, price)),
            ))
            .await;
        assert_eq!(created.status, StatusCode::CREATED);
    }

    let listed = app
        .get(
            "/api/deals?minPrice=20000&maxPrice=30000&sortBy=price&sortOrder=asc",
            None,
        )
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    let prices: Vec<i64> = listed.body["deals"]
        .as_array()
        .unwrap()
        .iter()
        .map(|deal| deal["sellingPrice"].as_i64().unwrap())
        .collect();
    assert_eq!(prices, vec![2_100_000, 2_500_000, 3_000_000]);
    assert_eq!(
        listed.body["pagination"],
        json!({ "page": 1, "limit": 20, "total": 3, "pages": 1 })
    );

    let paged = app.get("/api/deals?limit=2&page=3", None).await;
    assert_eq!(paged.body["deals"].as_array().unwrap().len(), 1);
    assert_eq!(paged.body["pagination"]["pages"], 3);

    let bad = app.get("/api/deals?sortOrder=up", None).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    let huge = app.get("/api/deals?maxPrice=1e20", None).await;
    assert_eq!(huge.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_make_and_model_creation() {
    let app = TestApp::new();

    let make = app
        .send(request(
            Method::POST,
            "/api/makes/create",
            None,
            Some(json!({ "name": "  Rivian " })),
        ))
        .await;
    assert_eq!(make.status, StatusCode::CREATED);
    assert_eq!(make.body["name"], "Rivian");
    let make_id = make.body["id"].as_str().unwrap().to_string();

    let duplicate = app
        .send(request(
            Method::POST,
            "/api/makes/create",
            None,
            Some(json!({ "name": "rivian" })),
        ))
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let blank = app
        .send(request(
            Method::POST,
            "/api/makes/create",
            None,
            Some(json!({ "name": "   " })),
        ))
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    let model = app
        .send(request(
            Method::POST,
            "/api/models/create",
            None,
            Some(json!({ "makeId": make_id, "name": "R1S" })),
        ))
        .await;
    assert_eq!(model.status, StatusCode::CREATED);
    assert_eq!(model.body["make"]["name"], "Rivian");

    let orphan = app
        .send(request(
            Method::POST,
            "/api/models/create",
            None,
            Some(json!({ "makeId": "no-such-make", "name": "R2" })),
        ))
        .await;
    assert_eq!(orphan.status, StatusCode::NOT_FOUND);
    assert_eq!(app.state.store.list_models(None).await.unwrap().len(), 1);

    let listed = app.get(&format!("/api/models?makeId={make_id}"), None).await;
    assert_eq!(listed.body[0]["name"], "R1S");
    assert_eq!(listed.body[0]["_count"]["carDeals"], 0);

    let makes = app.get("/api/makes", None).await;
    assert_eq!(makes.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_export_requires_admin() {
    let app = TestApp::new();
    let admin = AuthenticatedUser::new("acct-admin").with_email("admin@example.com");

    assert_eq!(
        app.get("/api/admin/export", None).await.status,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get("/api/admin/export", Some(&app.token_for(&bob())))
            .await
            .status,
        StatusCode::FORBIDDEN
    );

    app.vocabulary("Subaru", "Outback").await;
    let export = app
        .get("/api/admin/export", Some(&app.token_for(&admin)))
        .await;
    assert_eq!(export.status, StatusCode::OK);
    let disposition = export.headers[CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"cardeals-backup-"));
    assert_eq!(export.body["metadata"]["version"], "1.0");
    assert_eq!(export.body["metadata"]["totalMakes"], 1);
    assert_eq!(export.body["metadata"]["totalModels"], 1);
}

#[tokio::test]
async fn test_seeding_and_stats() {
    let app = TestApp::new();

    let seeded = app
        .send(request(Method::POST, "/api/seed", None, None))
        .await;
    assert_eq!(seeded.status, StatusCode::OK);
    assert_eq!(seeded.body["makes"], 20);
    assert_eq!(seeded.body["models"], 188);

    let mocks = app
        .send(request(Method::POST, "/api/admin/seed-mocks", None, None))
        .await;
    assert_eq!(mocks.status, StatusCode::OK);
    assert_eq!(mocks.body["inserted"], 6);

    let stats = app.get("/api/stats", None).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["totalDeals"], 6);

    let health = app.get("/api/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "ok");
    assert!(health.body["makeCount"].as_i64().unwrap() >= 20);
}

#[tokio::test]
async fn test_current_user_and_providers() {
    let app = TestApp::new();

    assert_eq!(
        app.get("/api/auth/me", None).await.status,
        StatusCode::UNAUTHORIZED
    );

    let me = app.get("/api/auth/me", Some(&app.token_for(&alice()))).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], "alice@example.com");

    let providers = app.get("/api/auth/providers", None).await;
    assert_eq!(providers.body["providers"], json!([]));
}
