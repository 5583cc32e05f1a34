use std::net::SocketAddr;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use time::OffsetDateTime;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, messages, portfolios, projects, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(portfolios::router())
        .merge(projects::router())
        .merge(messages::router())
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    uptime_seconds: u64,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: OffsetDateTime::now_utc(),
    })
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn token_for(state: &AppState, user_id: Uuid) -> String {
        state.jwt.issue(user_id).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["uptime_seconds"].is_u64());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn protected_route_without_token_is_401() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::GET, "/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn expired_token_is_401() {
        let state = AppState::fake();
        let stale = OffsetDateTime::now_utc() - time::Duration::hours(1);
        let token = state.jwt.issue_at(Uuid::new_v4(), stale).unwrap();
        let app = build_app(state);

        let (status, _) = call(&app, Method::GET, "/messages/unread-count", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn optional_route_rejects_invalid_token() {
        let app = build_app(AppState::fake());
        let uri = format!("/users/{}", Uuid::new_v4());
        let (status, body) = call(&app, Method::GET, &uri, Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UNAUTHORIZED");

        let uri = format!("/portfolios/{}", Uuid::new_v4());
        let req = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_ids_are_400() {
        let state = AppState::fake();
        let token = token_for(&state, Uuid::new_v4());
        let app = build_app(state);

        let (status, body) = call(&app, Method::GET, "/projects/not-a-uuid", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");

        let (status, _) = call(&app, Method::PUT, "/messages/42/read", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::GET, "/projects?user_id=nope", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn self_message_is_400_before_store_access() {
        let state = AppState::fake();
        let me = Uuid::new_v4();
        let token = token_for(&state, me);
        let app = build_app(state);

        let (status, body) = call(
            &app,
            Method::POST,
            "/messages",
            Some(&token),
            Some(json!({ "recipient_id": me, "message": "note to self" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "SELF_MESSAGE");
    }

    #[tokio::test]
    async fn invalid_bodies_are_400() {
        let state = AppState::fake();
        let token = token_for(&state, Uuid::new_v4());
        let app = build_app(state);

        let (status, body) = call(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "name": "Alice",
                "username": "alice",
                "email": "not-an-email",
                "password": "secret1"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");

        let (status, _) = call(
            &app,
            Method::POST,
            "/auth/change-password",
            Some(&token),
            Some(json!({ "currentPassword": "secret1", "newPassword": "123" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::POST,
            "/messages",
            Some(&token),
            Some(json!({ "recipient_id": "bob", "message": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn whitespace_only_text_is_400() {
        let state = AppState::fake();
        let token = token_for(&state, Uuid::new_v4());
        let app = build_app(state);

        let (status, body) = call(
            &app,
            Method::POST,
            "/projects",
            Some(&token),
            Some(json!({ "title": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");

        let uri = format!("/projects/{}", Uuid::new_v4());
        let (status, _) = call(&app, Method::PUT, &uri, Some(&token), Some(json!({ "title": " " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::PUT,
            "/users/profile",
            Some(&token),
            Some(json!({ "name": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "name": "  ",
                "username": "alice",
                "email": "alice@example.com",
                "password": "secret1"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // ---- database scenarios ----

    async fn register(app: &Router, username: &str, email: &str) -> (Uuid, String) {
        let (status, body) = call(
            app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "name": username,
                "username": username,
                "email": email,
                "password": "secret123"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let id = body["data"]["user"]["id"].as_str().unwrap().parse().unwrap();
        let token = body["data"]["token"].as_str().unwrap().to_string();
        (id, token)
    }

    async fn create_project(app: &Router, token: &str, title: &str) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/projects",
            Some(token),
            Some(json!({ "title": title, "tech_stack": ["rust"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    #[sqlx::test]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn message_read_flow(pool: sqlx::PgPool) {
        let app = build_app(AppState::with_pool(pool.clone()));
        let (alice, alice_token) = register(&app, "alice", "alice@example.com").await;
        let (bob, bob_token) = register(&app, "bob", "bob@example.com").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/messages",
            Some(&alice_token),
            Some(json!({ "recipient_id": bob, "message": "hi bob" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let message_id = body["data"]["id"].as_str().unwrap().to_string();

        let (_, body) = call(&app, Method::GET, "/messages/unread-count", Some(&bob_token), None).await;
        assert_eq!(body["data"]["unread_count"], 1);

        let (_, body) = call(&app, Method::GET, "/messages/conversations", Some(&bob_token), None).await;
        let convs = body["data"].as_array().unwrap();
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0]["partner_id"], alice.to_string());
        assert_eq!(convs[0]["partner_username"], "alice");
        assert_eq!(convs[0]["sent_by_me"], false);
        assert_eq!(convs[0]["unread_count"], 1);

        // Only the recipient may mark it read.
        let read_uri = format!("/messages/{message_id}/read");
        let (status, _) = call(&app, Method::PUT, &read_uri, Some(&alice_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        for _ in 0..2 {
            let (status, body) = call(&app, Method::PUT, &read_uri, Some(&bob_token), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["is_read"], true);
        }

        let (_, body) = call(&app, Method::GET, "/messages/unread-count", Some(&bob_token), None).await;
        assert_eq!(body["data"]["unread_count"], 0);

        let conv_uri = format!("/messages/conversations/{alice}");
        let (status, body) = call(&app, Method::GET, &conv_uri, Some(&bob_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["count"], 1);

        // Only the sender may delete it.
        let msg_uri = format!("/messages/{message_id}");
        let (status, _) = call(&app, Method::DELETE, &msg_uri, Some(&bob_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::DELETE, &msg_uri, Some(&alice_token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(
            &app,
            Method::POST,
            "/messages",
            Some(&alice_token),
            Some(json!({ "recipient_id": Uuid::new_v4(), "message": "anyone?" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &app,
            Method::POST,
            "/messages",
            Some(&alice_token),
            Some(json!({ "recipient_id": alice, "message": "me" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(left, 0);
    }

    #[sqlx::test]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn duplicate_username_writes_nothing(pool: sqlx::PgPool) {
        let app = build_app(AppState::with_pool(pool.clone()));
        register(&app, "alice", "alice@example.com").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "name": "Other",
                "username": "alice",
                "email": "other@example.com",
                "password": "secret123"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "DUPLICATE_USER");

        assert_eq!(user_and_portfolio_counts(&pool).await, (1, 1));

        let (status, body) = call(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "wrong-one" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "INVALID_CREDENTIALS");
    }

    async fn user_and_portfolio_counts(pool: &sqlx::PgPool) -> (i64, i64) {
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .unwrap();
        let portfolios: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM portfolios")
            .fetch_one(pool)
            .await
            .unwrap();
        (users, portfolios)
    }

    #[sqlx::test]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn duplicate_email_is_matched_case_insensitively(pool: sqlx::PgPool) {
        let app = build_app(AppState::with_pool(pool.clone()));
        register(&app, "alice", "alice@example.com").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "name": "Bob",
                "username": "bob",
                "email": "ALICE@Example.com",
                "password": "secret123"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "DUPLICATE_USER");
        assert_eq!(user_and_portfolio_counts(&pool).await, (1, 1));
    }

    #[sqlx::test]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn concurrent_registrations_create_one_user(pool: sqlx::PgPool) {
        let app = build_app(AppState::with_pool(pool.clone()));

        let mut set = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let app = app.clone();
            set.spawn(async move {
                call(
                    &app,
                    Method::POST,
                    "/auth/register",
                    None,
                    Some(json!({
                        "name": "Alice",
                        "username": "alice",
                        "email": "alice@example.com",
                        "password": "secret123"
                    })),
                )
                .await
            });
        }

        let mut created = 0;
        let mut duplicates = 0;
        while let Some(res) = set.join_next().await {
            let (status, body) = res.unwrap();
            match status {
                StatusCode::CREATED => created += 1,
                StatusCode::BAD_REQUEST => {
                    assert_eq!(body["error"], "DUPLICATE_USER");
                    duplicates += 1;
                }
                other => panic!("unexpected status {other}: {body}"),
            }
        }
        assert_eq!((created, duplicates), (1, 7));
        assert_eq!(user_and_portfolio_counts(&pool).await, (1, 1));
    }

    #[sqlx::test]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn portfolio_update_respects_absent_and_empty(pool: sqlx::PgPool) {
        let app = build_app(AppState::with_pool(pool));
        let (alice, token) = register(&app, "alice", "alice@example.com").await;

        let (status, body) = call(
            &app,
            Method::PUT,
            "/users/skills",
            Some(&token),
            Some(json!({ "skills": ["Rust", " rust ", "Go", ""] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!(["Rust", "Go"]));

        let (status, body) = call(
            &app,
            Method::PUT,
            "/portfolios",
            Some(&token),
            Some(json!({ "summary": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["summary"], "");
        assert_eq!(body["data"]["experience"], "No experience added yet.");
        assert_eq!(body["data"]["skills"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["is_owner"], true);

        let (_, body) = call(
            &app,
            Method::PUT,
            "/portfolios",
            Some(&token),
            Some(json!({ "skills": [] })),
        )
        .await;
        assert_eq!(body["data"]["skills"], json!([]));

        let uri = format!("/portfolios/{alice}");
        let (status, body) = call(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["is_owner"], false);
        assert!(body["data"]["user"].get("email").is_none());
    }

    #[sqlx::test]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn project_ownership_and_featured_set(pool: sqlx::PgPool) {
        let app = build_app(AppState::with_pool(pool));
        let (_, alice_token) = register(&app, "alice", "alice@example.com").await;
        let (_, bob_token) = register(&app, "bob", "bob@example.com").await;

        let alice_project = create_project(&app, &alice_token, "Compiler").await;
        let bob_project = create_project(&app, &bob_token, "Game").await;

        let uri = format!("/projects/{alice_project}");
        let (status, body) = call(
            &app,
            Method::PUT,
            &uri,
            Some(&bob_token),
            Some(json!({ "title": "Stolen" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "FORBIDDEN");

        let missing = format!("/projects/{}", Uuid::new_v4());
        let (status, _) = call(
            &app,
            Method::PUT,
            &missing,
            Some(&alice_token),
            Some(json!({ "title": "Ghost" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(
            &app,
            Method::PUT,
            "/portfolios",
            Some(&alice_token),
            Some(json!({ "featured_projects": [alice_project, bob_project] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let featured = body["data"]["featured_projects"].as_array().unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0]["id"], alice_project.as_str());

        let (_, body) = call(&app, Method::GET, "/projects?featured=true", None, None).await;
        assert_eq!(body["pagination"]["total"], 1);

        let (status, _) = call(&app, Method::DELETE, &uri, Some(&bob_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, Method::DELETE, &uri, Some(&alice_token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
