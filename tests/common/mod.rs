#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use itso_id_tracker::auth::jwt::JwtManager;
use itso_id_tracker::config::Config;
use itso_id_tracker::notify::calendar::CalendarClient;
use itso_id_tracker::notify::{Email, MemoryNotifier, Notifications, RetryPolicy};
use itso_id_tracker::routes::create_router;
use itso_id_tracker::AppState;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@itso.test";
pub const ADMIN_PASSWORD: &str = "AdminPass1";
pub const PASSWORD: &str = "Password1";

static STUDENT_SEQ: AtomicUsize = AtomicUsize::new(1);

// ─── TestResponse ────────────────────────────────────────────────────────────

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body_bytes).to_string()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body_bytes).unwrap_or_else(|e| {
            panic!(
                "Failed to deserialize response as {}: {e}\nBody: {}",
                std::any::type_name::<T>(),
                self.text()
            )
        })
    }

    pub fn value(&self) -> Value {
        self.json()
    }

    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status, expected,
            "Expected status {expected}, got {}. Body: {}",
            self.status,
            self.text()
        );
    }

    /// Assert an error response with the given status and message.
    pub fn assert_error(&self, expected: StatusCode, message: &str) {
        self.assert_status(expected);
        let body = self.value();
        assert_eq!(
            body["message"].as_str(),
            Some(message),
            "unexpected error body: {body}"
        );
    }
}

// ─── Student ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Student {
    pub id: String,
    pub token: String,
    pub email: String,
    pub student_id: String,
}

impl Student {
    pub fn gmail(&self) -> String {
        format!("{}@gmail.com", self.student_id.to_lowercase().replace('-', "."))
    }
}

// ─── TestApp ─────────────────────────────────────────────────────────────────

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret-that-is-long-enough".to_string(),
        jwt_expiry_days: 7,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        cors_allowed_origins: "*".to_string(),
        frontend_url: "http://localhost:5173".to_string(),
        utc_offset_minutes: 480,
        daily_appointment_cap: 1500,
        checkin_token_ttl_hours: 6,
        auth_rate_limit_per_minute: 1000,
        smtp: None,
        google: None,
    }
}

pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub mailbox: MemoryNotifier,
    pub admin_token: String,
    pub admin_id: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let db = itso_id_tracker::db::pool::connect(&config.database_url)
            .await
            .expect("Failed to connect to in-memory SQLite");

        migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let jwt = JwtManager::new(&config).expect("Failed to init JwtManager");

        let mailbox = MemoryNotifier::new();
        let notifications = Notifications::new(
            Arc::new(mailbox.clone()),
            CalendarClient::new(config.utc_offset_minutes),
        )
        .with_retry_policy(RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::from_millis(1),
        });

        let seeded = itso_id_tracker::seed::bootstrap(&db, ADMIN_EMAIL, Some(ADMIN_PASSWORD))
            .await
            .expect("Failed to seed admin");
        let admin = itso_id_tracker::db::queries::users::find_by_id(&db, &seeded.user_id)
            .await
            .unwrap()
            .expect("seeded admin missing");
        let admin_token = jwt.issue_token(&admin).unwrap();

        let state = AppState {
            db,
            jwt,
            notifications,
            config,
        };

        let router = create_router(state.clone());

        Self {
            router,
            state,
            mailbox,
            admin_token,
            admin_id: seeded.user_id,
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn request(&self, req: Request<Body>) -> TestResponse {
        send_request(self.router.clone(), req).await
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        self.request(build_request(method, uri, token, body)).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send("POST", uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send("PUT", uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send("PATCH", uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send("DELETE", uri, token, None).await
    }

    pub fn admin(&self) -> Option<&str> {
        Some(self.admin_token.as_str())
    }

    pub fn today(&self) -> NaiveDate {
        self.state.today()
    }

    // ── Auth helpers ─────────────────────────────────────────────────────

    pub async fn register(
        &self,
        name: &str,
        student_id: &str,
        email: &str,
        password: &str,
    ) -> TestResponse {
        self.post(
            "/api/auth/register",
            None,
            json!({
                "name": name,
                "student_id": student_id,
                "email": email,
                "password": password,
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, student_id: &str, password: &str) -> TestResponse {
        self.post(
            "/api/auth/login",
            None,
            json!({
                "email": email,
                "student_id": student_id,
                "password": password,
            }),
        )
        .await
    }

    /// Register a fresh student and return their token.
    pub async fn student(&self) -> Student {
        let n = STUDENT_SEQ.fetch_add(1, Ordering::SeqCst);
        let student_id = format!("2025-{n:05}");
        let email = format!("student{n}@school.test");
        let resp = self
            .register(&format!("Student {n}"), &student_id, &email, PASSWORD)
            .await;
        resp.assert_status(StatusCode::CREATED);
        let body = resp.value();
        Student {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
            email,
            student_id,
        }
    }

    // ── Scheduling helpers ───────────────────────────────────────────────

    /// Open an ALL-purpose window from today for `days` days.
    pub async fn open_window(&self, days: i64) {
        let today = self.today();
        let now = chrono::Utc::now().naive_utc();
        entity::scheduling_window::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            start_date: Set(today),
            end_date: Set(today + chrono::Duration::days(days)),
            purpose: Set(entity::sea_orm_active_enums::WindowPurpose::All),
            is_active: Set(true),
            remarks: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.state.db)
        .await
        .expect("Failed to insert window");
    }

    pub async fn create_slot(
        &self,
        date: NaiveDate,
        start: &str,
        end: &str,
        purpose: &str,
        capacity: i32,
    ) -> Value {
        let resp = self
            .post(
                "/api/slots",
                self.admin(),
                json!({
                    "date": date,
                    "start_time": start,
                    "end_time": end,
                    "purpose": purpose,
                    "capacity": capacity,
                }),
            )
            .await;
        resp.assert_status(StatusCode::CREATED);
        resp.value()
    }

    pub async fn slot(&self, slot_id: &str) -> entity::slot::Model {
        itso_id_tracker::db::queries::slots::find_by_id(&self.state.db, slot_id)
            .await
            .unwrap()
            .expect("slot missing")
    }

    pub async fn book(&self, student: &Student, slot_id: &str) -> TestResponse {
        self.post(
            "/api/appointments",
            Some(&student.token),
            json!({
                "slot_id": slot_id,
                "purpose": "NEW_ID",
                "contact_email": student.gmail(),
            }),
        )
        .await
    }

    pub async fn set_status(&self, appointment_id: &str, status: &str) -> TestResponse {
        self.patch(
            &format!("/api/appointments/{appointment_id}"),
            self.admin(),
            json!({ "status": status }),
        )
        .await
    }

    // ── Mail helpers ─────────────────────────────────────────────────────

    /// Wait for background deliveries to land.
    pub async fn wait_for_emails(&self, count: usize) -> Vec<Email> {
        for _ in 0..100 {
            let sent = self.mailbox.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.mailbox.sent()
    }
}

pub fn build_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send_request(router: Router, req: Request<Body>) -> TestResponse {
    let resp = router.oneshot(req).await.expect("oneshot failed");

    let status = resp.status();
    let body_bytes = resp
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes()
        .to_vec();

    TestResponse { status, body_bytes }
}
