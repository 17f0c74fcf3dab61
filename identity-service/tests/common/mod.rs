// Each test binary compiles this module and uses a different subset of it.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::PasswordHasher;
use auth::TokenIssuerConfig;
use identity_service::domain::user::models::MediaFile;
use identity_service::domain::user::models::UploadedMedia;
use identity_service::domain::user::ports::MediaUploader;
use identity_service::domain::user::service::UserService;
use identity_service::inbound::http::cookies::CookieSettings;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemoryUserRepository;
use identity_service::user::errors::MediaUploadError;
use reqwest::multipart::Form;
use reqwest::multipart::Part;
use serde_json::Value;

pub const ACCESS_SECRET: &[u8] = b"test-access-secret-at-least-32-bytes!!";
pub const REFRESH_SECRET: &[u8] = b"test-refresh-secret-at-least-32-bytes!";

/// Uploader standing in for the media sink.
///
/// Files whose name starts with `fail` are rejected. Every accepted upload
/// must still find its staged file on disk.
#[derive(Default)]
pub struct FakeMediaUploader {
    pub uploads: AtomicUsize,
}

#[async_trait]
impl MediaUploader for FakeMediaUploader {
    async fn upload(&self, file: &MediaFile) -> Result<UploadedMedia, MediaUploadError> {
        if !file.path.exists() {
            return Err(MediaUploadError::ReadFailed(format!(
                "{} is not staged",
                file.path.display()
            )));
        }
        if file.file_name.starts_with("fail") {
            return Err(MediaUploadError::Rejected {
                status: 400,
                message: "Invalid image file".to_string(),
            });
        }

        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(UploadedMedia {
            url: format!("https://media.test/{}", file.file_name),
        })
    }
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    /// Keeps cookies between requests, like a browser
    pub api_client: reqwest::Client,
    /// Sends only what each request carries explicitly
    pub bare_client: reqwest::Client,
    pub authenticator: Arc<Authenticator>,
    pub media_uploader: Arc<FakeMediaUploader>,
    pub upload_dir: PathBuf,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let upload_dir =
            std::env::temp_dir().join(format!("identity-service-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&upload_dir).expect("Failed to create upload dir");

        let authenticator = Arc::new(
            Authenticator::new(TokenIssuerConfig::new(ACCESS_SECRET, REFRESH_SECRET))
                .expect("Failed to build authenticator")
                .with_password_hasher(PasswordHasher::with_params(1024, 1, 1).unwrap()),
        );
        let media_uploader = Arc::new(FakeMediaUploader::default());

        let user_service = Arc::new(UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::clone(&media_uploader),
            Arc::clone(&authenticator),
        ));

        let router = create_router(
            user_service,
            Arc::clone(&authenticator),
            CookieSettings::new(false),
            upload_dir.clone(),
        );

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .expect("Failed to create reqwest client"),
            bare_client: reqwest::Client::new(),
            authenticator,
            media_uploader,
            upload_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/users{}", self.address, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(self.url(path))
    }

    /// POST without the cookie jar
    pub fn bare_post(&self, path: &str) -> reqwest::RequestBuilder {
        self.bare_client.post(self.url(path))
    }

    /// GET without the cookie jar, authenticated with a Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.bare_client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.bare_client.post(self.url(path)).bearer_auth(token)
    }

    pub fn patch_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.bare_client.patch(self.url(path)).bearer_auth(token)
    }

    /// Register a user with an avatar; panics unless the server answers 201.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Value {
        let response = self
            .bare_post("/register")
            .multipart(registration_form(
                username,
                email,
                "Test User",
                password,
                Some("avatar.png"),
                None,
            ))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }

    /// Log in without touching the cookie jar and return the response body.
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.bare_post("/login")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Number of staged files left behind in the upload directory.
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(&self.upload_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

pub fn image_part(file_name: &str) -> Part {
    Part::bytes(b"\x89PNG\r\n\x1a\n fake image".to_vec())
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .unwrap()
}

pub fn registration_form(
    username: &str,
    email: &str,
    full_name: &str,
    password: &str,
    avatar: Option<&str>,
    cover_image: Option<&str>,
) -> Form {
    let mut form = Form::new()
        .text("username", username.to_string())
        .text("email", email.to_string())
        .text("full_name", full_name.to_string())
        .text("password", password.to_string());

    if let Some(name) = avatar {
        form = form.part("avatar", image_part(name));
    }
    if let Some(name) = cover_image {
        form = form.part("cover_image", image_part(name));
    }

    form
}

/// Value of a `Set-Cookie` header for `name`, if the response sets it.
pub fn set_cookie<'a>(response: &'a reqwest::Response, name: &str) -> Option<&'a str> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&format!("{}=", name)))
}
