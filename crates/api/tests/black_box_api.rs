use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use storefront_api::app::{router, services::AppServices};
use storefront_auth::{JwtClaims, Role};
use storefront_core::UserId;
use storefront_infra::mailer::RecordingMailer;
use storefront_infra::{AppConfig, StockMode};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    mailer: Arc<RecordingMailer>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(stock_mode: StockMode) -> Self {
        let config = AppConfig {
            jwt_secret: JWT_SECRET.to_string(),
            admin_emails: vec!["boss@shop.in".to_string()],
            stock_mode,
            ..AppConfig::default()
        };
        let mailer = Arc::new(RecordingMailer::new());
        let services = AppServices::in_memory(&config, mailer.clone());

        // Same router as prod, bound to an ephemeral port.
        let app = router(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            mailer,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, role: Role) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        email: format!("{}@example.com", role.as_str()),
        role,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn create_product(client: &reqwest::Client, srv: &TestServer, admin: &str, name: &str, stock: i64) -> String {
    let res = client
        .post(srv.url("/api/products"))
        .bearer_auth(admin)
        .json(&json!({
            "name": name,
            "category": "Tops",
            "price": "₹499",
            "description": "Cotton",
            "image": "/img/p.jpg",
            "stock": stock,
            "sizes": ["S", "M"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["_id"].as_str().unwrap().to_string()
}

async fn stock_of(client: &reqwest::Client, srv: &TestServer, id: &str) -> i64 {
    let body: Value = client
        .get(srv.url(&format!("/api/products/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["stock"].as_i64().unwrap()
}

fn order_body(product_id: &str, quantity: i64) -> Value {
    json!({
        "items": [{
            "_id": product_id,
            "name": "Client Name",
            "category": "Client Category",
            "quantity": quantity,
            "selectedSize": "M",
            "price": "₹1"
        }],
        "totalAmount": 1497,
        "shippingDetails": {"name": "Asha", "phone": "9999999999", "address": "12 MG Road", "pincode": "560001"},
        "paymentMethod": "COD"
    })
}

async fn set_status(client: &reqwest::Client, srv: &TestServer, token: &str, order_id: &str, status: &str) -> reqwest::Response {
    client
        .put(srv.url(&format!("/api/orders/{order_id}/status")))
        .bearer_auth(token)
        .json(&json!({ "status": status }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_public_and_protected_routes_need_a_token() {
    let srv = TestServer::spawn(StockMode::Baseline).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/api/orders/user")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["msg"], "No token, authorization denied");

    let forged = mint_jwt("some-other-secret", Role::ADMIN);
    let res = client
        .get(srv.url("/api/orders"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn legacy_token_header_is_accepted() {
    let srv = TestServer::spawn(StockMode::Baseline).await;
    let client = reqwest::Client::new();
    let token = mint_jwt(JWT_SECRET, Role::USER);

    let res = client
        .get(srv.url("/api/orders/user"))
        .header("x-auth-token", token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn cross_origin_preflight_allows_token_headers() {
    let srv = TestServer::spawn(StockMode::Baseline).await;
    let client = reqwest::Client::new();

    let res = client
        .request(reqwest::Method::OPTIONS, srv.url("/api/orders"))
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,x-auth-token")
        .send()
        .await
        .unwrap();

    assert!(res.status().is_success());
    let headers = res.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    let allowed = headers["access-control-allow-headers"].to_str().unwrap();
    assert!(allowed.contains("x-auth-token"));
    assert!(allowed.contains("authorization"));

    let res = client
        .get(srv.url("/api/products"))
        .header("origin", "http://localhost:5173")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn checkout_and_cancel_round_trip_reconciles_stock() {
    let srv = TestServer::spawn(StockMode::Baseline).await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(JWT_SECRET, Role::ADMIN);
    let user = mint_jwt(JWT_SECRET, Role::USER);

    let pid = create_product(&client, &srv, &admin, "Kurta", 5).await;

    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&user)
        .json(&order_body(&pid, 3))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: Value = res.json().await.unwrap();
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["paymentMethod"], "CashOnDelivery");
    assert_eq!(order["items"][0]["name"], "Kurta");
    assert_eq!(order["items"][0]["price"], "₹499");
    let order_id = order["_id"].as_str().unwrap().to_string();
    assert_eq!(stock_of(&client, &srv, &pid).await, 2);

    let res = set_status(&client, &srv, &admin, &order_id, "Cancelled").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(stock_of(&client, &srv, &pid).await, 5);

    let res = set_status(&client, &srv, &admin, &order_id, "Shipped").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "Shipped");
    assert_eq!(stock_of(&client, &srv, &pid).await, 2);

    let mine: Value = client
        .get(srv.url("/api/orders/user"))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["items"][0]["product"]["image"], "/img/p.jpg");

    let all: Value = client
        .get(srv.url("/api/orders"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn non_admin_status_update_is_forbidden_and_leaves_order_alone() {
    let srv = TestServer::spawn(StockMode::Baseline).await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(JWT_SECRET, Role::ADMIN);
    let user = mint_jwt(JWT_SECRET, Role::USER);

    let pid = create_product(&client, &srv, &admin, "Tee", 5).await;
    let order: Value = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&user)
        .json(&order_body(&pid, 1))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id = order["_id"].as_str().unwrap();

    let res = set_status(&client, &srv, &user, order_id, "Cancelled").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["msg"], "Access denied. Admin only.");

    let current: Value = client
        .get(srv.url(&format!("/api/orders/{order_id}")))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["status"], "Pending");
    assert_eq!(stock_of(&client, &srv, &pid).await, 4);

    let res = client
        .post(srv.url("/api/products"))
        .bearer_auth(&user)
        .json(&json!({"name": "X", "category": "Y", "price": "1", "description": "d", "image": "i"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_orders_are_rejected_without_touching_stock() {
    let srv = TestServer::spawn(StockMode::Atomic).await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(JWT_SECRET, Role::ADMIN);
    let user = mint_jwt(JWT_SECRET, Role::USER);
    let pid = create_product(&client, &srv, &admin, "Tee", 5).await;

    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&user)
        .json(&order_body(&pid, 6))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["msg"], "Insufficient stock for Tee. Available: 5");

    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&user)
        .json(&order_body(&pid, 0))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let mut empty = order_body(&pid, 1);
    empty["items"] = json!([]);
    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&user)
        .json(&empty)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["msg"], "No items in order");

    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&user)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&user)
        .json(&order_body(&storefront_core::ProductId::new().to_string(), 1))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert_eq!(stock_of(&client, &srv, &pid).await, 5);
}

#[tokio::test]
async fn malformed_product_id_is_checked_after_request_validation() {
    let srv = TestServer::spawn(StockMode::Baseline).await;
    let client = reqwest::Client::new();
    let user = mint_jwt(JWT_SECRET, Role::USER);

    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&user)
        .json(&json!({"items": [{"_id": "nope", "quantity": 1}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["msg"], "Shipping details are required");

    let mut bad_payment = order_body("nope", 1);
    bad_payment["paymentMethod"] = json!("Bitcoin");
    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&user)
        .json(&bad_payment)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["msg"], "Invalid payment method: Bitcoin");

    let mut unnamed = order_body("nope", 1);
    unnamed["items"][0]["name"] = Value::Null;
    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&user)
        .json(&unnamed)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["msg"], "Product not found: nope");
}

#[tokio::test]
async fn passwordless_login_flow() {
    let srv = TestServer::spawn(StockMode::Baseline).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/auth/register"))
        .json(&json!({"name": "Asha", "email": "asha@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(srv.url("/api/auth/register"))
        .json(&json!({"name": "Asha", "email": "ASHA@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["msg"], "User already exists");

    let res = client
        .post(srv.url("/api/auth/otp"))
        .json(&json!({"email": "asha@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let code = srv.mailer.last_code_for("asha@example.com").unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({"email": "asha@example.com", "otp": wrong}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({"email": "asha@example.com", "otp": code}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["name"], "Asha");
    assert_eq!(body["user"]["role"], "user");
    let token = body["token"].as_str().unwrap().to_string();

    let me: Value = client
        .get(srv.url("/api/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["email"], "asha@example.com");

    let res = client
        .get(srv.url("/api/orders"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
