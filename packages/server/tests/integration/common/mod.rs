use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::Client;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::{Value, json};
use uuid::Uuid;

use records_server::config::{
    AppConfig, AuthConfig, BootstrapConfig, CorsConfig, DatabaseConfig, InstitutionConfig,
    LogConfig, ServerConfig, StoreConfig,
};
use records_server::entity::user;
use records_server::identity::{DbIdentityProvider, IdentityProvider};
use records_server::state::AppState;

pub const HOD_EMAIL: &str = "hod@sngist.org";
pub const HOD_PASSWORD: &str = "HodPass@123";
pub const FACULTY_PASSWORD: &str = "Welcome@123";
pub const EMAIL_DOMAIN: &str = "sngist.org";

pub mod routes {
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const LOGOUT: &str = "/api/v1/auth/logout";
    pub const ME: &str = "/api/v1/auth/me";
    pub const PASSWORD: &str = "/api/v1/auth/password";
    pub const USERS: &str = "/api/v1/users";
    pub const FACULTY: &str = "/api/v1/faculty";
    pub const CLASSES: &str = "/api/v1/classes";
    pub const SUBJECTS: &str = "/api/v1/subjects";
    pub const STUDENTS: &str = "/api/v1/students";
    pub const ASSIGNMENTS: &str = "/api/v1/assignments";
    pub const SUBMISSION_STATUS: &str = "/api/v1/submissions/status";
    pub const ATTENDANCE: &str = "/api/v1/attendance";
    pub const INTERNAL_MARKS: &str = "/api/v1/internal-marks";
    pub const MY_DASHBOARD: &str = "/api/v1/me/dashboard";
    pub const MY_PROFILE: &str = "/api/v1/me/profile";
    pub const MY_SUBJECTS: &str = "/api/v1/me/subjects";
    pub const HOD_SUMMARY: &str = "/api/v1/dashboard/summary";
    pub const RECONCILIATION: &str = "/api/v1/reconciliation";

    pub fn access(roles: &str) -> String {
        format!("/api/v1/auth/access?roles={roles}")
    }

    pub fn user_role(id: impl std::fmt::Display) -> String {
        format!("/api/v1/users/{id}/role")
    }

    pub fn user(id: impl std::fmt::Display) -> String {
        format!("/api/v1/users/{id}")
    }

    pub fn faculty(id: impl std::fmt::Display) -> String {
        format!("/api/v1/faculty/{id}")
    }

    pub fn faculty_status(id: impl std::fmt::Display) -> String {
        format!("/api/v1/faculty/{id}/status")
    }

    pub fn class(id: i32) -> String {
        format!("/api/v1/classes/{id}")
    }

    pub fn class_performance(id: i32) -> String {
        format!("/api/v1/classes/{id}/performance")
    }

    pub fn subject(id: i32) -> String {
        format!("/api/v1/subjects/{id}")
    }

    pub fn student(id: impl std::fmt::Display) -> String {
        format!("/api/v1/students/{id}")
    }

    pub fn assignment(id: i32) -> String {
        format!("/api/v1/assignments/{id}")
    }

    pub fn assignment_submissions(id: i32) -> String {
        format!("/api/v1/assignments/{id}/submissions")
    }

    pub fn submission(id: i32) -> String {
        format!("/api/v1/submissions/{id}")
    }

    pub fn my_submission(id: i32) -> String {
        format!("/api/v1/me/submissions/{id}")
    }

    pub fn resolve_failure(id: i32) -> String {
        format!("/api/v1/reconciliation/{id}/resolve")
    }
}

/// A running test server over a private in-memory database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// A faculty member created through the API.
pub struct Faculty {
    pub id: Uuid,
    pub email: String,
}

/// A student created through the API.
pub struct Student {
    pub id: Uuid,
    pub email: String,
    pub password: String,
}

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors: CorsConfig {
                allow_origins: vec![],
                max_age: 3600,
            },
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        },
        auth: AuthConfig {
            jwt_secret: "test-secret-for-integration-tests-only".to_string(),
            session_ttl_hours: 24,
        },
        institution: InstitutionConfig {
            email_domain: EMAIL_DOMAIN.to_string(),
            faculty_initial_password: FACULTY_PASSWORD.to_string(),
        },
        store: StoreConfig {
            request_timeout_secs: 10,
        },
        bootstrap: BootstrapConfig {
            hod_email: Some(HOD_EMAIL.to_string()),
            hod_password: Some(HOD_PASSWORD.to_string()),
            hod_name: Some("Dr. Meera Nair".to_string()),
        },
        log: LogConfig {
            level: "debug".to_string(),
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_, inner| inner).await
    }

    /// Spawn with the identity provider wrapped by `wrap`, which also receives the
    /// database after the bootstrap HOD has been seeded.
    pub async fn spawn_with<F>(wrap: F) -> Self
    where
        F: FnOnce(&DatabaseConnection, Arc<dyn IdentityProvider>) -> Arc<dyn IdentityProvider>,
    {
        Self::spawn_configured(|_| {}, wrap).await
    }

    /// Like [`TestApp::spawn_with`], after `configure` has adjusted the test config.
    pub async fn spawn_configured<C, F>(configure: C, wrap: F) -> Self
    where
        C: FnOnce(&mut AppConfig),
        F: FnOnce(&DatabaseConnection, Arc<dyn IdentityProvider>) -> Arc<dyn IdentityProvider>,
    {
        let mut config = test_config();
        configure(&mut config);
        let db = records_server::database::init_db(&config.database.url)
            .await
            .expect("Failed to initialise in-memory database");

        let provider = DbIdentityProvider::new(db.clone(), config.auth.session_ttl_hours);
        records_server::seed::bootstrap_hod(&db, &provider, &config.bootstrap)
            .await
            .expect("Failed to seed bootstrap HOD");

        let identities = wrap(&db, Arc::new(provider));
        let state = AppState {
            db: db.clone(),
            config: Arc::new(config),
            identities,
        };
        let app = records_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn send(&self, req: reqwest::RequestBuilder, token: Option<&str>) -> TestResponse {
        let req = match token {
            Some(token) => req.header("Authorization", format!("Bearer {token}")),
            None => req,
        };
        let res = req.send().await.expect("Failed to send request");
        TestResponse::from_response(res).await
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        self.send(self.client.post(self.url(path)).json(body), Some(token))
            .await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        self.send(self.client.post(self.url(path)).json(body), None)
            .await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        self.send(self.client.get(self.url(path)), Some(token)).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        self.send(self.client.get(self.url(path)), None).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        self.send(self.client.patch(self.url(path)).json(body), Some(token))
            .await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        self.send(self.client.put(self.url(path)).json(body), Some(token))
            .await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        self.send(self.client.delete(self.url(path)), Some(token))
            .await
    }

    /// Log in and return the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let res = self
            .post_without_token(
                routes::LOGIN,
                &json!({"email": email, "password": password}),
            )
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);
        res.body["token"]
            .as_str()
            .expect("Login response should contain a token")
            .to_string()
    }

    pub async fn hod_token(&self) -> String {
        self.login(HOD_EMAIL, HOD_PASSWORD).await
    }

    pub async fn user_id_of(&self, email: &str) -> Option<Uuid> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .expect("users query failed")
            .map(|u| u.id)
    }

    /// Add a faculty member via the API.
    pub async fn add_faculty(&self, hod_token: &str, name: &str, email: &str) -> Faculty {
        let res = self
            .post_with_token(
                routes::FACULTY,
                &json!({
                    "name": name,
                    "email": email,
                    "phone": "9876543210",
                    "department": "CS",
                }),
                hod_token,
            )
            .await;
        assert_eq!(res.status, 201, "add_faculty failed: {}", res.text);
        Faculty {
            id: res.uuid_at("/faculty/id"),
            email: email.to_string(),
        }
    }

    /// Create a class via the API and return its `id`.
    pub async fn create_class(
        &self,
        hod_token: &str,
        name: &str,
        coordinator: Option<Uuid>,
    ) -> i32 {
        let res = self
            .post_with_token(
                routes::CLASSES,
                &json!({
                    "name": name,
                    "department": "CS",
                    "batch_year_start": 2022,
                    "batch_year_end": 2026,
                    "batch_coordinator_id": coordinator,
                }),
                hod_token,
            )
            .await;
        assert_eq!(res.status, 201, "create_class failed: {}", res.text);
        res.id()
    }

    /// Create a subject via the API and return its `id`.
    pub async fn create_subject(
        &self,
        hod_token: &str,
        class_id: i32,
        name: &str,
        faculty_id: Option<Uuid>,
    ) -> i32 {
        let res = self
            .post_with_token(
                routes::SUBJECTS,
                &json!({"name": name, "class_id": class_id, "faculty_id": faculty_id}),
                hod_token,
            )
            .await;
        assert_eq!(res.status, 201, "create_subject failed: {}", res.text);
        res.id()
    }

    /// Add a student via the API as the given coordinator (or HOD with `coordinator_id`).
    pub async fn add_student(
        &self,
        token: &str,
        reg_no: &str,
        date_of_birth: &str,
        coordinator_id: Option<Uuid>,
    ) -> Student {
        let res = self
            .post_with_token(
                routes::STUDENTS,
                &json!({
                    "reg_no": reg_no,
                    "name_of_student": format!("Student {reg_no}"),
                    "date_of_birth": date_of_birth,
                    "coordinator_id": coordinator_id,
                }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "add_student failed: {}", res.text);
        Student {
            id: res.uuid_at("/student/id"),
            email: res.body["email"].as_str().unwrap().to_string(),
            password: res.body["initial_password"].as_str().unwrap().to_string(),
        }
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    /// Extract the integer `id` field from the response body.
    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .unwrap_or_else(|| panic!("Response should contain an id: {}", self.text))
            as i32
    }

    /// Extract a UUID at a JSON pointer.
    pub fn uuid_at(&self, pointer: &str) -> Uuid {
        self.body
            .pointer(pointer)
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(|| panic!("Response should contain a uuid at {pointer}: {}", self.text))
    }
}
