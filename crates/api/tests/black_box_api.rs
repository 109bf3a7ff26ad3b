use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use inkpost_api::app::services::AppServices;
use inkpost_api::config::ApiConfig;
use inkpost_auth::JwtClaims;
use inkpost_blog::NewUser;
use inkpost_core::UserId;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";
const PASSWORD: &str = "hunter2hunter2";

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over in-memory stores, bound to an ephemeral port.
        let config = ApiConfig {
            bcrypt_cost: 4,
            ..ApiConfig::new(JWT_SECRET)
        };
        let services =
            Arc::new(AppServices::in_memory(&config).expect("failed to build services"));
        let app = inkpost_api::app::router(services.clone());
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
            services,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Store a user directly (the HTTP surface cannot create the first admin).
    async fn seed_user(&self, email: &str, is_admin: bool) -> UserId {
        let user = self
            .services
            .users
            .insert(NewUser {
                email: email.to_string(),
                username: email.split('@').next().unwrap().to_string(),
                password_hash: self.services.hasher.hash(PASSWORD).unwrap(),
                is_admin,
            })
            .await
            .unwrap();
        user.id
    }

    async fn create_post(&self, token: &str, title: &str) -> i64 {
        let res = self
            .client
            .post(self.url("/posts"))
            .bearer_auth(token)
            .json(&json!({ "title": title, "content": "body", "excerpt": "short" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt_with(secret: &str, sub: UserId, issued_at: chrono::DateTime<Utc>, ttl: ChronoDuration) -> String {
    let claims = JwtClaims::new(sub, issued_at, ttl);
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn mint_jwt(sub: UserId) -> String {
    mint_jwt_with(JWT_SECRET, sub, Utc::now(), ChronoDuration::minutes(10))
}

fn ids(body: &Value) -> Vec<i64> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_credential_keeps_historical_not_found() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/posts"))
        .json(&json!({ "title": "t", "content": "c", "excerpt": "e" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "missing_credential");
}

#[tokio::test]
async fn bad_tokens_are_unauthenticated_and_other_schemes_are_missing() {
    let srv = TestServer::spawn().await;
    let user = srv.seed_user("ada@example.com", false).await;

    let wrong_secret = mint_jwt_with("other-secret", user, Utc::now(), ChronoDuration::minutes(10));
    let expired = mint_jwt_with(
        JWT_SECRET,
        user,
        Utc::now() - ChronoDuration::hours(2),
        ChronoDuration::minutes(10),
    );

    for token in [wrong_secret.as_str(), expired.as_str(), "not-a-jwt"] {
        let res = srv
            .client
            .get(srv.url("/whoami"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "token {token}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "unauthenticated");
    }

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .header("Authorization", "Basic Zm9vOmJhcg==")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "missing_credential");
}

#[tokio::test]
async fn token_for_deleted_user_is_an_invalid_principal() {
    let srv = TestServer::spawn().await;
    let user = srv.seed_user("gone@example.com", false).await;
    let token = mint_jwt(user);

    srv.services.users.soft_delete(user).await.unwrap();

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_principal");
}

#[tokio::test]
async fn signup_login_cookie_and_logout() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/signup"))
        .json(&json!({ "email": "grace@example.com", "password": PASSWORD, "username": "grace" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert!(created.get("passwordHash").is_none());
    assert_eq!(created["isAdmin"], false);

    let stored = srv
        .services
        .users
        .find_by_email("grace@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.password_hash.starts_with("$2b$04$"));

    let res = srv
        .client
        .post(srv.url("/signup"))
        .json(&json!({ "email": "grace@example.com", "password": PASSWORD, "username": "again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv
        .client
        .post(srv.url("/login"))
        .json(&json!({ "email": "grace@example.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .post(srv.url("/login"))
        .json(&json!({ "email": "grace@example.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("Authorization="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=3600"));
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["id"], created["id"]);

    // The cookie alone authenticates.
    let res = srv
        .client
        .get(srv.url("/whoami"))
        .header("Cookie", format!("Authorization={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await.unwrap();
    assert_eq!(me["id"], created["id"]);
    assert_eq!(me["isAdmin"], false);

    let res = srv
        .client
        .post(srv.url("/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cleared = res.headers().get("set-cookie").unwrap().to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn only_the_author_may_change_a_post() {
    let srv = TestServer::spawn().await;
    let author = srv.seed_user("author@example.com", false).await;
    let other = srv.seed_user("other@example.com", false).await;
    let admin = srv.seed_user("admin@example.com", true).await;

    let post = srv.create_post(&mint_jwt(author), "mine").await;
    let path = format!("/posts/{post}");

    for intruder in [other, admin] {
        let res = srv
            .client
            .patch(srv.url(&path))
            .bearer_auth(mint_jwt(intruder))
            .json(&json!({ "title": "hijacked" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "forbidden");
    }

    let (_, unchanged) = srv.get_json(&path).await;
    assert_eq!(unchanged["title"], "mine");

    let res = srv
        .client
        .patch(srv.url(&path))
        .bearer_auth(mint_jwt(author))
        .json(&json!({ "title": "still mine" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["title"], "still mine");

    let res = srv
        .client
        .delete(srv.url("/posts/999"))
        .bearer_auth(mint_jwt(author))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn user_listing_is_admin_only_and_profiles_are_self_only() {
    let srv = TestServer::spawn().await;
    let admin = srv.seed_user("admin@example.com", true).await;
    let ada = srv.seed_user("ada@example.com", false).await;
    let bob = srv.seed_user("bob@example.com", false).await;

    let res = srv
        .client
        .get(srv.url("/users"))
        .bearer_auth(mint_jwt(ada))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .get(srv.url("/users?limit=2"))
        .bearer_auth(mint_jwt(admin))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(ids(&page), vec![admin.get(), ada.get()]);
    assert_eq!(page["nextCursor"], ada.get());

    let res = srv
        .client
        .patch(srv.url(&format!("/users/{bob}")))
        .bearer_auth(mint_jwt(ada))
        .json(&json!({ "bio": "not mine" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .patch(srv.url(&format!("/users/{ada}")))
        .bearer_auth(mint_jwt(ada))
        .json(&json!({ "bio": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["bio"], "hello");
}

#[tokio::test]
async fn posts_page_newest_first() {
    let srv = TestServer::spawn().await;
    let author = srv.seed_user("author@example.com", false).await;
    let token = mint_jwt(author);
    for n in 1..=5 {
        srv.create_post(&token, &format!("P{n}")).await;
    }

    let (status, first) = srv.get_json("/posts?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&first), vec![5, 4]);
    assert_eq!(first["nextCursor"], 4);

    let (_, second) = srv.get_json("/posts?limit=2&cursor=4").await;
    assert_eq!(ids(&second), vec![3, 2]);
    assert_eq!(second["nextCursor"], 2);

    let (_, third) = srv.get_json("/posts?limit=2&cursor=2").await;
    assert_eq!(ids(&third), vec![1]);
    assert!(third["nextCursor"].is_null());

    let (_, all) = srv.get_json("/posts?limit=0").await;
    assert_eq!(ids(&all), vec![5, 4, 3, 2, 1]);
    assert!(all["nextCursor"].is_null());

    let (status, _) = srv.get_json("/posts?limit=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn soft_deleting_the_cursor_post_keeps_the_next_page_stable() {
    let srv = TestServer::spawn().await;
    let author = srv.seed_user("author@example.com", false).await;
    let token = mint_jwt(author);
    for n in 1..=5 {
        srv.create_post(&token, &format!("P{n}")).await;
    }

    let (_, first) = srv.get_json("/posts?limit=2").await;
    let cursor = first["nextCursor"].as_i64().unwrap();
    assert_eq!(cursor, 4);

    let res = srv
        .client
        .delete(srv.url(&format!("/posts/{cursor}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let (_, second) = srv.get_json(&format!("/posts?limit=2&cursor={cursor}")).await;
    assert_eq!(ids(&second), vec![3, 2]);

    let (status, _) = srv.get_json(&format!("/posts/{cursor}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, fresh) = srv.get_json("/posts?limit=2").await;
    assert_eq!(ids(&fresh), vec![5, 3]);
}

#[tokio::test]
async fn comments_follow_their_post_and_their_commenter() {
    let srv = TestServer::spawn().await;
    let author = srv.seed_user("author@example.com", false).await;
    let reader = srv.seed_user("reader@example.com", false).await;
    let post = srv.create_post(&mint_jwt(author), "hello").await;

    let res = srv
        .client
        .post(srv.url("/comments"))
        .bearer_auth(mint_jwt(reader))
        .json(&json!({ "postId": post, "content": "nice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let comment: Value = res.json().await.unwrap();
    let comment_id = comment["id"].as_i64().unwrap();
    assert_eq!(comment["commenterId"], reader.get());

    let (_, detail) = srv.get_json(&format!("/posts/{post}")).await;
    assert_eq!(detail["comments"].as_array().unwrap().len(), 1);

    // The post author does not own the reader's comment.
    let res = srv
        .client
        .delete(srv.url(&format!("/comments/{comment_id}")))
        .bearer_auth(mint_jwt(author))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .delete(srv.url(&format!("/comments/{comment_id}")))
        .bearer_auth(mint_jwt(reader))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let (_, thread) = srv.get_json(&format!("/posts/{post}/comments")).await;
    assert!(ids(&thread).is_empty());

    let res = srv
        .client
        .delete(srv.url(&format!("/posts/{post}")))
        .bearer_auth(mint_jwt(author))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .post(srv.url("/comments"))
        .bearer_auth(mint_jwt(reader))
        .json(&json!({ "postId": post, "content": "too late" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
