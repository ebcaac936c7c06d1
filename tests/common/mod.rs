#![allow(dead_code)]

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{body::MessageBody, http::header, test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use todoforge::auth::{
    MemoryRevocationStore, PasswordHasher, RevocationPolicy, RevocationStore, TokenService,
};
use todoforge::routes;
use todoforge::state::AppState;
use todoforge::store::MemoryStore;

pub const PASSWORD: &str = "abc123!";
pub const TEST_SECRET: &[u8] = b"integration-test-secret";

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub store: Arc<MemoryStore>,
    pub revocations: Arc<MemoryRevocationStore>,
}

pub fn context() -> TestContext {
    let revocations = Arc::new(MemoryRevocationStore::new());
    let (state, store) = state_with(revocations.clone());
    TestContext {
        state,
        store,
        revocations,
    }
}

/// State over in-memory stores and the given revocation store. bcrypt cost 4 keeps
/// the suite fast.
pub fn state_with(revocations: Arc<dyn RevocationStore>) -> (web::Data<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        store.clone(),
        store.clone(),
        revocations,
        PasswordHasher::new(4).unwrap(),
        TokenService::new(TEST_SECRET, Duration::from_secs(14400), Duration::from_secs(15)),
        RevocationPolicy::default(),
    );
    (web::Data::new(state), store)
}

pub async fn init_app(
    state: web::Data<AppState>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(state)
            .wrap(Logger::default())
            .configure(routes::config),
    )
    .await
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

pub async fn register_and_login_user(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    email: &str,
    name: &str,
    password: &str,
) -> Result<TestUser, String> {
    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({ "email": email, "name": name, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    if !resp.status().is_success() {
        let status = resp.status();
        let body = test::read_body(resp).await;
        return Err(format!(
            "Failed to register user. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    if !status.is_success() {
        return Err(format!("Failed to login. Status: {}. Body: {}", status, body));
    }

    let id = body["user"]["id"]
        .as_str()
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or_else(|| format!("Login response has no user id: {}", body))?;
    let token = body["token"]
        .as_str()
        .ok_or_else(|| format!("Login response has no token: {}", body))?
        .to_string();

    Ok(TestUser { id, token })
}
