mod common;

use std::sync::atomic::Ordering;

use auth::TokenKind;
use auth::TokenIssuer;
use auth::TokenIssuerConfig;
use chrono::Duration;
use chrono::Utc;
use common::registration_form;
use common::set_cookie;
use common::TestApp;
use reqwest::multipart::Form;
use reqwest::StatusCode;
use serde_json::json;
use serde_json::Value;

async fn json_body(response: reqwest::Response) -> Value {
    response.json().await.expect("Failed to parse response")
}

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::spawn().await;

    let response = app
        .bare_post("/register")
        .multipart(registration_form(
            "Alice",
            "alice@x.com",
            "Alice",
            "Secret1",
            Some("avatar.png"),
            Some("cover.png"),
        ))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["status_code"], 201);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "alice@x.com");
    assert_eq!(body["data"]["full_name"], "Alice");
    assert_eq!(body["data"]["avatar"], "https://media.test/avatar.png");
    assert_eq!(body["data"]["cover_image"], "https://media.test/cover.png");
    assert!(body["data"]["id"].is_string());
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("password_hash").is_none());
    assert!(body["data"].get("refresh_token").is_none());

    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn test_register_duplicate_username_or_email() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "Secret1").await;
    let uploads_before = app.media_uploader.uploads.load(Ordering::SeqCst);

    for (username, email) in [("ALICE", "other@x.com"), ("bob", "Alice@X.com")] {
        let response = app
            .bare_post("/register")
            .multipart(registration_form(
                username,
                email,
                "Someone",
                "Secret1",
                Some("avatar.png"),
                None,
            ))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = json_body(response).await;
        assert_eq!(body["error_kind"], "conflict");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("already exists"));
    }

    // Rejected before any upload
    assert_eq!(
        app.media_uploader.uploads.load(Ordering::SeqCst),
        uploads_before
    );
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = TestApp::spawn().await;

    let missing_field = Form::new()
        .text("username", "alice")
        .text("email", "alice@x.com")
        .text("password", "Secret1")
        .part("avatar", common::image_part("avatar.png"));

    let response = app
        .bare_post("/register")
        .multipart(missing_field)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error_kind"], "validation_error");
    assert_eq!(body["message"], "full_name is required");

    let response = app
        .bare_post("/register")
        .multipart(registration_form(
            "alice",
            "not-an-email",
            "Alice",
            "Secret1",
            Some("avatar.png"),
            None,
        ))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn test_register_without_avatar() {
    let app = TestApp::spawn().await;

    let response = app
        .bare_post("/register")
        .multipart(registration_form(
            "alice",
            "alice@x.com",
            "Alice",
            "Secret1",
            None,
            Some("cover.png"),
        ))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Avatar file is required");
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn test_register_avatar_upload_failure() {
    let app = TestApp::spawn().await;

    let response = app
        .bare_post("/register")
        .multipart(registration_form(
            "alice",
            "alice@x.com",
            "Alice",
            "Secret1",
            Some("fail.png"),
            None,
        ))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error_kind"], "upload_error");
    assert_eq!(app.staged_files(), 0);

    // No user was created: the same identity can register afterwards
    app.register("alice", "alice@x.com", "Secret1").await;
}

#[tokio::test]
async fn test_register_cover_upload_failure_is_tolerated() {
    let app = TestApp::spawn().await;

    let response = app
        .bare_post("/register")
        .multipart(registration_form(
            "alice",
            "alice@x.com",
            "Alice",
            "Secret1",
            Some("avatar.png"),
            Some("fail-cover.png"),
        ))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert!(body["data"]["cover_image"].is_null());
    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn test_login_flow() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "Secret1").await;

    let response = app.login("alice@x.com", "Secret2").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error_kind"], "unauthorized");

    let response = app.login("nobody@x.com", "Secret1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.login("", "Secret1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.login("Alice@X.com", "Secret1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let access_cookie = set_cookie(&response, "access_token")
        .expect("access cookie missing")
        .to_string();
    let refresh_cookie = set_cookie(&response, "refresh_token")
        .expect("refresh cookie missing")
        .to_string();
    assert!(access_cookie.contains("HttpOnly"));
    assert!(access_cookie.contains("SameSite=Strict"));
    assert!(access_cookie.contains("Max-Age=900"));
    assert!(refresh_cookie.contains("Max-Age=864000"));

    let body = json_body(response).await;
    assert_eq!(body["data"]["user"]["username"], "alice");
    assert!(body["data"]["user"].get("password_hash").is_none());
    assert!(body["data"]["user"].get("refresh_token").is_none());

    let access_token = body["data"]["access_token"].as_str().unwrap();
    assert!(access_cookie.starts_with(&format!("access_token={};", access_token)));
    assert!(!refresh_cookie.starts_with(&format!("refresh_token={};", access_token)));
}

#[tokio::test]
async fn test_current_user_with_bearer_and_cookie() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "Secret1").await;

    let body = json_body(app.login("alice@x.com", "Secret1").await).await;
    let access_token = body["data"]["access_token"].as_str().unwrap();

    let response = app
        .get_authenticated("/current-user", access_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["email"], "alice@x.com");

    // Cookie jar client logs in and is authenticated by cookie alone
    let response = app
        .post("/login")
        .json(&json!({ "email": "alice@x.com", "password": "Secret1" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .get("/current-user")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .get_authenticated("/current-user", "not.a.token")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::spawn().await;

    for response in [
        app.bare_client
            .get(format!("{}/api/v1/users/current-user", app.address))
            .send()
            .await,
        app.bare_client
            .post(format!("{}/api/v1/users/logout", app.address))
            .send()
            .await,
    ] {
        let response = response.expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error_kind"], "unauthorized");
    }
}

#[tokio::test]
async fn test_refresh_rotation_and_reuse_detection() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "Secret1").await;

    // Cookie jar: login stores both cookies, refresh reads the refresh cookie
    let login = app
        .post("/login")
        .json(&json!({ "email": "alice@x.com", "password": "Secret1" }))
        .send()
        .await
        .expect("Failed to execute request");
    let first_refresh = set_cookie(&login, "refresh_token")
        .and_then(|cookie| cookie.split(';').next())
        .and_then(|pair| pair.strip_prefix("refresh_token="))
        .unwrap()
        .to_string();

    let response = app
        .post("/refresh-token")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response, "access_token").is_some());
    assert!(set_cookie(&response, "refresh_token").is_some());

    let body = json_body(response).await;
    let second_refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();
    assert!(body["data"]["access_token"].is_string());
    assert_ne!(first_refresh, second_refresh);

    // Replaying the superseded token is detected
    let response = app
        .bare_post("/refresh-token")
        .json(&json!({ "refresh_token": first_refresh }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The current one still works, from the body this time
    let response = app
        .bare_post("/refresh-token")
        .json(&json!({ "refresh_token": second_refresh }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_concurrent_refresh_redeems_token_once() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "Secret1").await;

    for _ in 0..10 {
        let login = app.login("alice@x.com", "Secret1").await;
        let refresh = set_cookie(&login, "refresh_token")
            .and_then(|cookie| cookie.split(';').next())
            .and_then(|pair| pair.strip_prefix("refresh_token="))
            .unwrap()
            .to_string();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                tokio::spawn(
                    app.bare_post("/refresh-token")
                        .json(&json!({ "refresh_token": refresh }))
                        .send(),
                )
            })
            .collect();

        let mut redeemed = 0;
        for handle in handles {
            let response = handle
                .await
                .expect("Request task panicked")
                .expect("Failed to execute request");
            match response.status() {
                StatusCode::OK => redeemed += 1,
                status => assert_eq!(status, StatusCode::UNAUTHORIZED),
            }
        }

        assert_eq!(redeemed, 1);
    }
}

#[tokio::test]
async fn test_second_login_supersedes_first() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "Secret1").await;

    let first = app.login("alice@x.com", "Secret1").await;
    let first_refresh = set_cookie(&first, "refresh_token")
        .and_then(|cookie| cookie.split(';').next())
        .and_then(|pair| pair.strip_prefix("refresh_token="))
        .unwrap()
        .to_string();

    let second = app.login("alice@x.com", "Secret1").await;
    assert_eq!(second.status(), StatusCode::OK);

    let response = app
        .bare_post("/refresh-token")
        .json(&json!({ "refresh_token": first_refresh }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "Secret1").await;

    let login = app.login("alice@x.com", "Secret1").await;
    let refresh = set_cookie(&login, "refresh_token")
        .and_then(|cookie| cookie.split(';').next())
        .and_then(|pair| pair.strip_prefix("refresh_token="))
        .unwrap()
        .to_string();
    let access = json_body(login).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .post_authenticated("/logout", &access)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response, "access_token")
        .unwrap()
        .contains("Max-Age=0"));
    assert!(set_cookie(&response, "refresh_token")
        .unwrap()
        .contains("Max-Age=0"));

    // Logging out twice is harmless
    let response = app
        .post_authenticated("/logout", &access)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .bare_post("/refresh-token")
        .json(&json!({ "refresh_token": refresh }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rejects_bad_tokens() {
    let app = TestApp::spawn().await;
    let body = app.register("alice", "alice@x.com", "Secret1").await;
    let user_id = body["data"]["id"].as_str().unwrap().to_string();
    let login = json_body(app.login("alice@x.com", "Secret1").await).await;
    let access = login["data"]["access_token"].as_str().unwrap().to_string();

    // Nothing presented
    let response = app
        .bare_post("/refresh-token")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Expired beyond leeway
    let expired = app
        .authenticator
        .token_issuer()
        .issue_at(
            &user_id,
            TokenKind::Refresh,
            Utc::now() - Duration::days(11),
        )
        .unwrap();

    // Signed with a foreign key
    let foreign = TokenIssuer::new(TokenIssuerConfig::new(
        b"another-access-secret-of-32-bytes-plus".to_vec(),
        b"another-refresh-secret-of-32-bytes-plus".to_vec(),
    ))
    .unwrap()
    .issue_refresh(&user_id)
    .unwrap();

    for token in [expired.token, foreign.token, access, "garbage".to_string()] {
        let response = app
            .bare_post("/refresh-token")
            .json(&json!({ "refresh_token": token }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error_kind"], "unauthorized");
    }
}

#[tokio::test]
async fn test_refresh_token_cannot_authenticate_requests() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "Secret1").await;

    let login = app.login("alice@x.com", "Secret1").await;
    let refresh = set_cookie(&login, "refresh_token")
        .and_then(|cookie| cookie.split(';').next())
        .and_then(|pair| pair.strip_prefix("refresh_token="))
        .unwrap()
        .to_string();

    let response = app
        .get_authenticated("/current-user", &refresh)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "Secret1").await;

    let login = app.login("alice@x.com", "Secret1").await;
    let refresh = set_cookie(&login, "refresh_token")
        .and_then(|cookie| cookie.split(';').next())
        .and_then(|pair| pair.strip_prefix("refresh_token="))
        .unwrap()
        .to_string();
    let access = json_body(login).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .post_authenticated("/change-password", &access)
        .json(&json!({
            "old_password": "Secret1",
            "new_password": "Secret2",
            "confirm_password": "Secret3"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post_authenticated("/change-password", &access)
        .json(&json!({
            "old_password": "Wrong",
            "new_password": "Secret2",
            "confirm_password": "Secret2"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post_authenticated("/change-password", &access)
        .json(&json!({
            "old_password": "Secret1",
            "new_password": "Secret2",
            "confirm_password": "Secret2"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    // Old password no longer works, new one does
    assert_eq!(
        app.login("alice@x.com", "Secret1").await.status(),
        StatusCode::UNAUTHORIZED
    );

    // The session from before the change is gone
    let response = app
        .bare_post("/refresh-token")
        .json(&json!({ "refresh_token": refresh }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(
        app.login("alice@x.com", "Secret2").await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_update_account() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "Secret1").await;
    app.register("bob", "bob@x.com", "Secret1").await;

    let login = json_body(app.login("alice@x.com", "Secret1").await).await;
    let access = login["data"]["access_token"].as_str().unwrap().to_string();

    let response = app
        .patch_authenticated("/update-account", &access)
        .json(&json!({ "full_name": "Alice Liddell", "email": "bob@x.com" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .patch_authenticated("/update-account", &access)
        .json(&json!({ "full_name": "Alice Liddell" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .patch_authenticated("/update-account", &access)
        .json(&json!({ "full_name": "Alice Liddell", "email": "liddell@x.com" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["data"]["full_name"], "Alice Liddell");
    assert_eq!(body["data"]["email"], "liddell@x.com");

    assert_eq!(
        app.login("liddell@x.com", "Secret1").await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_update_avatar_and_cover_image() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "Secret1").await;

    let login = json_body(app.login("alice@x.com", "Secret1").await).await;
    let access = login["data"]["access_token"].as_str().unwrap().to_string();

    let response = app
        .patch_authenticated("/avatar", &access)
        .multipart(Form::new().part("avatar", common::image_part("new-avatar.png")))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["data"]["avatar"],
        "https://media.test/new-avatar.png"
    );

    let response = app
        .patch_authenticated("/cover-image", &access)
        .multipart(Form::new().part("cover_image", common::image_part("banner.png")))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["data"]["cover_image"],
        "https://media.test/banner.png"
    );

    // A failed upload leaves the stored avatar alone
    let response = app
        .patch_authenticated("/avatar", &access)
        .multipart(Form::new().part("avatar", common::image_part("fail.png")))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app
        .patch_authenticated("/avatar", &access)
        .multipart(Form::new().text("note", "no file"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .get_authenticated("/current-user", &access)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(
        json_body(response).await["data"]["avatar"],
        "https://media.test/new-avatar.png"
    );

    assert_eq!(app.staged_files(), 0);
}

#[tokio::test]
async fn test_unparseable_bodies_use_error_envelope() {
    let app = TestApp::spawn().await;

    let requests = [
        // Malformed JSON
        app.bare_post("/login")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body("{\"email\": "),
        // No body and no content type
        app.bare_post("/login"),
        // JSON where multipart is expected
        app.bare_post("/register")
            .json(&json!({ "username": "alice" })),
    ];

    for request in requests {
        let response = request.send().await.expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[reqwest::header::CONTENT_TYPE],
            "application/json"
        );

        let body = json_body(response).await;
        assert_eq!(body["status_code"], 400);
        assert_eq!(body["error_kind"], "validation_error");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    assert_eq!(app.staged_files(), 0);
}
