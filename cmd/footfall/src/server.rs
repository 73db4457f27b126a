//! HTTP API.
//!
//! Every person, cart and product route is scoped to the organization named
//! in the `X-Organization-Id` header.
//!
//! - POST /api/organizations            - create organization
//! - GET  /api/organizations/{id}       - organization
//! - POST /api/person                   - record a sighting
//! - PUT  /api/person/{id}              - update person
//! - GET  /api/person/{id}/detail       - person with carts
//! - GET  /api/person/{id}/orders       - order history
//! - GET  /api/person/{id}/summary      - visit statistics
//! - GET  /api/person/{id}/match        - re-match against everyone else
//! - GET  /api/persons                  - paginated list
//! - POST /api/cart                     - create cart
//! - POST /api/cart-product             - add product to cart
//! - POST /api/cart-products/bulk       - add many products
//! - GET  /api/products, POST /api/products
//! - GET  /healthz

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use footfall_people::{
    BulkCartProducts, NewCart, NewCartProduct, NewOrganization, NewProduct, PageQuery,
    PeopleError, PeopleService, PersonPatch, SightingRequest,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub const ORG_HEADER: &str = "x-organization-id";

#[derive(Clone)]
struct AppState {
    svc: Arc<PeopleService>,
}

/// Start the HTTP server and serve until the process exits.
pub async fn start_server(addr: &str, svc: Arc<PeopleService>) -> Result<()> {
    let app = router(svc);
    let addr = parse_addr(addr)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server started");
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(svc: Arc<PeopleService>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/organizations", post(create_organization))
        .route("/api/organizations/{id}", get(get_organization))
        .route("/api/person", post(record_sighting))
        .route("/api/person/{id}", put(update_person))
        .route("/api/person/{id}/detail", get(person_detail))
        .route("/api/person/{id}/orders", get(order_history))
        .route("/api/person/{id}/summary", get(person_summary))
        .route("/api/person/{id}/match", get(rematch_person))
        .route("/api/persons", get(list_persons))
        .route("/api/cart", post(create_cart))
        .route("/api/cart-product", post(add_cart_product))
        .route("/api/cart-products/bulk", post(bulk_add_cart_products))
        .route("/api/products", get(list_products).post(create_product))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { svc })
}

/// Parse address string to SocketAddr. A leading ':' binds all interfaces.
fn parse_addr(addr: &str) -> Result<SocketAddr> {
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };
    Ok(addr.parse()?)
}

// ---------------------------------------------------------------------------
// Errors and extractors
// ---------------------------------------------------------------------------

/// Error response: `{"error": "..."}` with a matching status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<PeopleError> for ApiError {
    fn from(e: PeopleError) -> Self {
        let status = match &e {
            PeopleError::Validation(_) => StatusCode::BAD_REQUEST,
            PeopleError::NotFound(_) => StatusCode::NOT_FOUND,
            PeopleError::Conflict(_) => StatusCode::CONFLICT,
            PeopleError::Storage(_) | PeopleError::Serialization(_) | PeopleError::Match(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "request failed");
        }
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// Organization scope from the `X-Organization-Id` header.
struct OrgId(String);

impl<S: Send + Sync> FromRequestParts<S> for OrgId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ORG_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::bad_request(format!("missing {ORG_HEADER} header")))?;
        Ok(OrgId(value.to_string()))
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

/// Runs a service call on the blocking pool.
async fn call<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&PeopleService) -> Result<T, PeopleError> + Send + 'static,
{
    let svc = state.svc.clone();
    tokio::task::spawn_blocking(move || f(&svc))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .map_err(ApiError::from)
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn created<T: Serialize>(value: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(value))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_organization(
    State(state): State<AppState>,
    payload: Result<Json<NewOrganization>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body(payload)?;
    let org = call(&state, move |svc| svc.create_organization(req)).await?;
    Ok(created(org))
}

async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<footfall_people::Organization> {
    Ok(Json(call(&state, move |svc| svc.organization(&id)).await?))
}

async fn record_sighting(
    State(state): State<AppState>,
    OrgId(org): OrgId,
    payload: Result<Json<SightingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body(payload)?;
    let outcome = call(&state, move |svc| svc.record_sighting(&org, req)).await?;
    Ok(created(outcome))
}

async fn update_person(
    State(state): State<AppState>,
    OrgId(org): OrgId,
    Path(id): Path<String>,
    payload: Result<Json<PersonPatch>, JsonRejection>,
) -> ApiResult<footfall_people::Person> {
    let patch = body(payload)?;
    Ok(Json(
        call(&state, move |svc| svc.update_person(&org, &id, patch)).await?,
    ))
}

async fn person_detail(
    State(state): State<AppState>,
    OrgId(org): OrgId,
    Path(id): Path<String>,
) -> ApiResult<footfall_people::PersonDetail> {
    Ok(Json(
        call(&state, move |svc| svc.person_detail(&org, &id)).await?,
    ))
}

async fn order_history(
    State(state): State<AppState>,
    OrgId(org): OrgId,
    Path(id): Path<String>,
) -> ApiResult<footfall_people::OrderHistory> {
    Ok(Json(
        call(&state, move |svc| svc.order_history(&org, &id)).await?,
    ))
}

async fn person_summary(
    State(state): State<AppState>,
    OrgId(org): OrgId,
    Path(id): Path<String>,
) -> ApiResult<footfall_people::VisitSummary> {
    Ok(Json(
        call(&state, move |svc| svc.person_summary(&org, &id)).await?,
    ))
}

async fn rematch_person(
    State(state): State<AppState>,
    OrgId(org): OrgId,
    Path(id): Path<String>,
) -> ApiResult<footfall_identity::MatchResult> {
    Ok(Json(
        call(&state, move |svc| svc.rematch_person(&org, &id)).await?,
    ))
}

async fn list_persons(
    State(state): State<AppState>,
    OrgId(org): OrgId,
    query: Result<Query<PageQuery>, axum::extract::rejection::QueryRejection>,
) -> ApiResult<footfall_people::PersonPage> {
    let Query(q) =
        query.map_err(|_| ApiError::bad_request("page and page_size must be integers"))?;
    Ok(Json(
        call(&state, move |svc| svc.list_persons(&org, q)).await?,
    ))
}

async fn create_cart(
    State(state): State<AppState>,
    OrgId(org): OrgId,
    payload: Result<Json<NewCart>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body(payload)?;
    let cart = call(&state, move |svc| svc.create_cart(&org, req)).await?;
    Ok(created(cart))
}

async fn add_cart_product(
    State(state): State<AppState>,
    OrgId(org): OrgId,
    payload: Result<Json<NewCartProduct>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body(payload)?;
    let item = call(&state, move |svc| svc.add_cart_product(&org, req)).await?;
    Ok(created(item))
}

async fn bulk_add_cart_products(
    State(state): State<AppState>,
    OrgId(org): OrgId,
    payload: Result<Json<BulkCartProducts>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body(payload)?;
    let items = call(&state, move |svc| {
        svc.bulk_add_cart_products(&org, req.cart_products)
    })
    .await?;
    Ok(created(serde_json::json!({
        "created_count": items.len(),
        "cart_products": items,
    })))
}

async fn list_products(
    State(state): State<AppState>,
    OrgId(org): OrgId,
) -> ApiResult<Vec<footfall_people::Product>> {
    Ok(Json(call(&state, move |svc| svc.list_products(&org)).await?))
}

async fn create_product(
    State(state): State<AppState>,
    OrgId(org): OrgId,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body(payload)?;
    let product = call(&state, move |svc| svc.create_product(&org, req)).await?;
    Ok(created(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use footfall_kv::{KVError, KVResult, KVStore, MemoryStore};
    use footfall_people::ServiceConfig;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        app_over(MemoryStore::new())
    }

    fn app_over(store: impl KVStore + 'static) -> Router {
        let svc = PeopleService::new(
            Box::new(store),
            ServiceConfig {
                dim: 2,
                ..Default::default()
            },
        );
        router(Arc::new(svc))
    }

    /// Memory store that cannot scan people.
    struct BrokenPeopleScan(MemoryStore);

    impl KVStore for BrokenPeopleScan {
        fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
            self.0.get(key)
        }

        fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>> {
            if prefix.contains(":person:") {
                return Err(KVError::Storage("scan unavailable".into()));
            }
            self.0.scan(prefix)
        }

        fn batch_set(&self, entries: &[(&str, &[u8])]) -> KVResult<()> {
            self.0.batch_set(entries)
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn post_json(uri: &str, org: Option<&str>, body: Value) -> Request<Body> {
        let mut b = Request::post(uri).header("content-type", "application/json");
        if let Some(org) = org {
            b = b.header(ORG_HEADER, org);
        }
        b.body(Body::from(body.to_string())).unwrap()
    }

    fn get_req(uri: &str, org: &str) -> Request<Body> {
        Request::get(uri)
            .header(ORG_HEADER, org)
            .body(Body::empty())
            .unwrap()
    }

    async fn new_org(app: &Router) -> String {
        let (status, body) = send(
            app,
            post_json("/api/organizations", None, json!({ "name": "Cafe" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[test]
    fn parse_addr_variants() {
        assert_eq!(parse_addr(":8080").unwrap().to_string(), "0.0.0.0:8080");
        assert_eq!(
            parse_addr("127.0.0.1:9000").unwrap().to_string(),
            "127.0.0.1:9000"
        );
        assert!(parse_addr("nonsense").is_err());
    }

    #[test]
    fn people_errors_map_to_status_codes() {
        let cases = [
            (PeopleError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (PeopleError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (PeopleError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                PeopleError::Serialization("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                PeopleError::Storage(KVError::Storage("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, want) in cases {
            assert_eq!(ApiError::from(err).status, want);
        }
    }

    #[tokio::test]
    async fn sighting_roundtrip_over_http() {
        let app = app();
        let org = new_org(&app).await;

        let (status, first) = send(
            &app,
            post_json("/api/person", Some(&org), json!({ "vector": [0.6, 0.8], "age": 40 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["created"], json!(true));
        assert_eq!(first["match"]["decision"], json!("create"));

        let (status, second) = send(
            &app,
            post_json("/api/person", Some(&org), json!({ "vector": [0.6, 0.8] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(second["match"]["decision"], json!("accept"));
        assert_eq!(second["person"]["id"], first["person"]["id"]);

        let (status, page) = send(&app, get_req("/api/persons?page_size=5", &org)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["count"], json!(1));
        assert!(page["results"][0].get("vector").is_none());
    }

    #[tokio::test]
    async fn bad_requests_are_400() {
        let app = app();
        let org = new_org(&app).await;

        let (status, body) = send(
            &app,
            post_json("/api/person", None, json!({ "vector": [0.6, 0.8] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains(ORG_HEADER));

        let (status, _) = send(
            &app,
            post_json("/api/person", Some(&org), json!({ "vector": [0.1, 0.2, 0.3] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            post_json("/api/person", Some(&org), json!({ "vector": ["a", "b"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, get_req("/api/persons?page=abc", &org)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_records_are_404_and_duplicates_409() {
        let app = app();
        let org = new_org(&app).await;

        let (status, _) = send(&app, get_req("/api/person/nope/orders", &org)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            post_json("/api/organizations", None, json!({ "name": "Cafe" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            post_json("/api/person", Some("unknown-org"), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn storage_failure_is_500_and_writes_nothing() {
        let inner = MemoryStore::new();
        let app = app_over(BrokenPeopleScan(inner.clone()));
        let org = new_org(&app).await;

        let (status, body) = send(
            &app,
            post_json("/api/person", Some(&org), json!({ "vector": [0.6, 0.8] })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
        assert!(inner.scan(&format!("org:{org}:person:")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn summary_over_http() {
        let app = app();
        let org = new_org(&app).await;
        let (_, first) = send(
            &app,
            post_json("/api/person", Some(&org), json!({ "vector": [0.6, 0.8] })),
        )
        .await;
        let id = first["person"]["id"].as_str().unwrap();

        let (status, summary) =
            send(&app, get_req(&format!("/api/person/{id}/summary"), &org)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["person_id"], json!(id));
        assert_eq!(summary["total_visits"], json!(0));
        assert_eq!(summary["favorite_dishes"], json!([]));
    }
}
