#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use car_rental_backend::{
    build_router,
    config::Config,
    models::user::{NewUser, Role},
    repository::{
        memory::{MemoryCarRepository, MemoryUserRepository},
        UserRepository,
    },
    services::media_service::LocalMedia,
    utils::token::issue_token,
    AppState,
};

pub const JWT_SECRET: &str = "integration-secret";

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserRepository>,
    pub cars: Arc<MemoryCarRepository>,
    pub uploads_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.uploads_dir);
    }
}

pub fn test_config(uploads_dir: &PathBuf) -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: None,
        jwt_secret: JWT_SECRET.into(),
        jwt_expires_in_days: 30,
        cloudinary: None,
        uploads_dir: uploads_dir.to_string_lossy().into_owned(),
        public_base_url: String::new(),
    }
}

pub fn spawn_app() -> TestApp {
    let uploads_dir = std::env::temp_dir().join(format!("car-rental-test-{}", Uuid::new_v4()));
    let config = test_config(&uploads_dir);

    let users = Arc::new(MemoryUserRepository::new());
    let cars = Arc::new(MemoryCarRepository::new());
    let media = Arc::new(LocalMedia::new(uploads_dir.clone(), ""));

    let state = AppState::new(Arc::new(config), users.clone(), cars.clone(), media);
    TestApp {
        router: build_router(state),
        users,
        cars,
        uploads_dir,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, body, text }
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.bare(Method::GET, uri, token).await
    }

    pub async fn bare(&self, method: Method, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        form: MultipartBody,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, form.content_type());
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(form.finish())).unwrap())
            .await
    }

    /// Registers an account and returns its token and id.
    pub async fn register(&self, name: &str, email: &str, role: &str) -> (String, String) {
        let resp = self
            .json(
                Method::POST,
                "/api/auth/register",
                None,
                json!({ "name": name, "email": email, "password": "password123", "role": role }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.text);
        (
            resp.body["token"].as_str().unwrap().to_string(),
            resp.body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Admins cannot self-register, so they are inserted straight into the store.
    pub async fn admin_token(&self) -> String {
        let admin = self
            .users
            .create(NewUser {
                name: "Admin".into(),
                email: format!("admin-{}@example.com", Uuid::new_v4()),
                password_hash: "unused".into(),
                role: Role::Admin,
            })
            .await
            .unwrap();
        issue_token(admin.id, Role::Admin, JWT_SECRET, 1).unwrap()
    }

    pub async fn create_car(&self, token: &str, body: Value) -> Value {
        let resp = self.json(Method::POST, "/api/cars", Some(token), body).await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.text);
        resp.body["data"].clone()
    }
}

pub fn car_body(name: &str, price: f64) -> Value {
    json!({
        "name": name,
        "images": ["https://cdn.example.com/car.jpg"],
        "type": "SUV",
        "location": "Lisbon",
        "passengers": 5,
        "transmission": "Automatic",
        "airConditioning": true,
        "doors": 5,
        "price": price,
        "category": "Family",
        "description": "Roomy and reliable",
        "features": ["Bluetooth"],
        "specs": { "luggage": 3, "fuelType": "Hybrid" }
    })
}

const BOUNDARY: &str = "car-rental-test-boundary";

#[derive(Default)]
pub struct MultipartBody {
    buf: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.buf
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.buf
    }
}
