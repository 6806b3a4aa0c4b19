use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use components_sdk::domain::{Account, Permission};
use components_sdk::membership::{hash_password, new_token};
use components_sdk::resource::{random_id, PersistentResource};
use components_sdk::{app, AppConfig, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "admin-password";
const USER_PASSWORD: &str = "user-password";

struct TestApp {
    state: AppState,
    router: Router,
    admin_id: String,
    user_id: String,
}

async fn account(state: &AppState, username: &str, password: &str) -> String {
    let account = Account::new(
        random_id(),
        Utc::now(),
        username,
        format!("{}@example.com", username),
        true,
        hash_password(password).unwrap(),
        new_token(),
    )
    .unwrap();
    state.accounts.resources().create(account).await.unwrap().id().to_string()
}

async fn test_app() -> TestApp {
    let state = AppState::in_memory(AppConfig::default());
    let admin_id = account(&state, "admin", ADMIN_PASSWORD).await;
    let user_id = account(&state, "user", USER_PASSWORD).await;
    for (id, name) in [("ADMIN", "administrator"), ("EDITOR", "editor")] {
        state
            .permissions
            .resources()
            .create(Permission::new(id, Utc::now(), name).unwrap())
            .await
            .unwrap();
    }
    state.permissions.add_to_account(&admin_id, "ADMIN").await.unwrap();
    TestApp {
        router: app(state.clone()),
        state,
        admin_id,
        user_id,
    }
}

fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

fn request(method: Method, uri: &str, body: Option<Value>, auth: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(request(method, uri, body, None)).await
    }

    async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(request(method, uri, body, Some(basic("admin", ADMIN_PASSWORD))))
            .await
    }
}

#[tokio::test]
async fn common_routes_answer_at_root() {
    let app = test_app().await;
    let (status, body) = app.call(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (status, body) = app.call(Method::GET, "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "components-sdk");
    let (status, _) = app.call(Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn country_crud() {
    let app = test_app().await;

    let (status, body) = app
        .call(Method::POST, "/api/countries", Some(json!({"code": "FR", "name": "France"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert!(body["data"]["creationDate"].is_string());

    let (status, body) = app.call(Method::GET, &format!("/api/countries/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "France");

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/countries/{}", id),
            Some(json!({"code": "FR", "name": "République française"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["name"], "République française");

    let (status, _) = app.call(Method::DELETE, &format!("/api/countries/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.call(Method::GET, &format!("/api/countries/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn updating_or_deleting_missing_resource_is_not_found() {
    let app = test_app().await;
    let (status, _) = app
        .call(Method::PUT, "/api/countries/nope", Some(json!({"code": "DE", "name": "Germany"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call(Method::DELETE, "/api/countries/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn country_validation_errors_are_unprocessable() {
    let app = test_app().await;
    let (status, body) = app
        .call(Method::POST, "/api/countries", Some(json!({"code": " ", "name": "Nowhere"})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn lists_pages_with_sort() {
    let app = test_app().await;
    for (code, name) in [("DE", "Germany"), ("FR", "France"), ("IT", "Italy")] {
        app.call(Method::POST, "/api/countries", Some(json!({"code": code, "name": name})))
            .await;
    }

    let (status, body) = app
        .call(Method::GET, "/api/countries?page=0&size=2&properties=name&direction=desc", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body["data"].as_array().unwrap().iter().map(|c| c["name"].clone()).collect();
    assert_eq!(names, vec![json!("Italy"), json!("Germany")]);
    assert_eq!(body["meta"]["totalItems"], 3);
    assert_eq!(body["meta"]["totalPages"], 2);
    assert_eq!(body["meta"]["size"], 2);

    let (_, body) = app.call(Method::GET, "/api/countries?page=1&size=2&properties=name", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "Italy");
    assert_eq!(body["meta"]["page"], 1);
}

#[tokio::test]
async fn sort_follows_declaration_order_not_request_order() {
    let app = test_app().await;
    for (code, name) in [("AA", "Zulu"), ("ZZ", "Alpha")] {
        app.call(Method::POST, "/api/countries", Some(json!({"code": code, "name": name})))
            .await;
    }
    // code is declared before name, so it wins.
    let (_, body) = app
        .call(Method::GET, "/api/countries?properties=name,code", None)
        .await;
    assert_eq!(body["data"][0]["code"], "AA");
}

#[tokio::test]
async fn invalid_page_requests_are_bad_requests() {
    let app = test_app().await;
    for query in ["page=-1", "page=x", "size=0", "size=5000", "direction=up"] {
        let (status, body) = app.call(Method::GET, &format!("/api/countries?{}", query), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", query);
        assert_eq!(body["error"]["code"], "invalid_page_request");
    }
}

#[tokio::test]
async fn event_logs_are_read_only() {
    let app = test_app().await;
    let (status, body) = app
        .call(Method::POST, "/api/event-logs", Some(json!({"description": "forged"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "bad request: create not allowed");
}

#[tokio::test]
async fn admin_routes_require_admin_credentials() {
    let app = test_app().await;

    let (status, body) = app.call(Method::GET, "/api/accounts", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, _) = app
        .send(request(Method::GET, "/api/accounts", None, Some(basic("admin", "wrong"))))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(request(Method::GET, "/api/accounts", None, Some(basic("user", USER_PASSWORD))))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.admin(Method::GET, "/api/accounts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["totalItems"], 2);
    assert!(body["data"][0].get("password").is_none());
    assert!(body["data"][0].get("token").is_none());
}

#[tokio::test]
async fn accounts_cannot_be_created_through_crud() {
    let app = test_app().await;
    let (status, _) = app
        .admin(
            Method::POST,
            "/api/accounts",
            Some(json!({"username": "bob", "email": "bob@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn grants_and_revokes_account_permissions() {
    let app = test_app().await;
    let base = format!("/api/accounts/{}/permissions", app.user_id);

    let (status, _) = app.admin(Method::PUT, &format!("{}/EDITOR", base), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.admin(Method::PUT, &format!("{}/EDITOR", base), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.admin(Method::GET, &base, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["count"], 1);
    assert_eq!(body["data"][0]["id"], "EDITOR");

    let (status, _) = app.admin(Method::PUT, &format!("{}/UNKNOWN", base), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.admin(Method::DELETE, &format!("{}/EDITOR", base), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = app.admin(Method::GET, &base, None).await;
    assert_eq!(body["meta"]["count"], 0);

    let (_, body) = app
        .admin(Method::GET, &format!("/api/accounts/{}/permissions", app.admin_id), None)
        .await;
    assert_eq!(body["data"][0]["id"], "ADMIN");
}

#[tokio::test]
async fn membership_flow() {
    let app = test_app().await;
    let signup = json!({"username": "bob", "email": "bob@example.com", "password": "bob-password"});

    let (status, body) = app.call(Method::POST, "/api/membership/signup", Some(signup.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["enabled"], false);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.call(Method::POST, "/api/membership/signup", Some(signup)).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(body["error"]["code"], "user_details_already_exist");

    let (status, body) = app
        .call(Method::POST, &format!("/api/membership/activate/{}/wrong-token", id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "illegal_argument");

    let token = app.state.accounts.find_by_username("bob").await.unwrap().unwrap().token;
    let (status, body) = app
        .call(Method::POST, &format!("/api/membership/activate/{}/{}", id, token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["enabled"], true);

    let (status, _) = app
        .call(Method::POST, "/api/membership/password/new", Some(json!({"email": "bob@example.com"})))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, _) = app
        .call(Method::POST, "/api/membership/password/new", Some(json!({"email": "nobody@example.com"})))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let token = app.state.accounts.find_by_username("bob").await.unwrap().unwrap().token;
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/membership/password/reset/{}/{}", id, token),
            Some(json!({"password": "new-bob-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.state.membership.authenticate("bob", "new-bob-password").await.is_ok());
}

#[tokio::test]
async fn news_lifecycle() {
    let app = test_app().await;
    let news = json!({
        "authorId": app.user_id,
        "title": "Hello World",
        "description": "first news",
        "content": "lorem ipsum",
        "status": "PUBLISHED"
    });

    let (status, body) = app.call(Method::POST, "/api/news", Some(news.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "DRAFT");
    assert_eq!(body["data"]["urlFriendlyTitle"], "hello-world");
    assert!(body["data"]["publicationDate"].is_null());
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.call(Method::POST, &format!("/api/news/{}/publish", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "PUBLISHED");
    assert!(body["data"]["publicationDate"].is_string());

    let (status, body) = app.call(Method::PUT, &format!("/api/news/{}", id), Some(news)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "illegal_state");
    let (status, _) = app.call(Method::DELETE, &format!("/api/news/{}", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.call(Method::POST, &format!("/api/news/{}/validate", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["publicationDate"].is_null());

    let (status, _) = app.call(Method::POST, &format!("/api/news/{}/draft", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::DELETE, &format!("/api/news/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // create, publish, validate, draft, delete
    let (_, body) = app.call(Method::GET, "/api/event-logs?size=100", None).await;
    assert_eq!(body["meta"]["totalItems"], 5);
}

#[tokio::test]
async fn news_needs_an_enabled_author() {
    let app = test_app().await;
    let (_, body) = app
        .call(
            Method::POST,
            "/api/membership/signup",
            Some(json!({"username": "carol", "email": "carol@example.com", "password": "carol-password"})),
        )
        .await;
    let carol = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .call(
            Method::POST,
            "/api/news",
            Some(json!({"authorId": carol, "title": "t", "description": "d", "content": "c"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn news_update_with_unsluggable_title_keeps_news_readable() {
    let app = test_app().await;
    let (_, body) = app
        .call(
            Method::POST,
            "/api/news",
            Some(json!({"authorId": app.user_id, "title": "Hello", "description": "d", "content": "c"})),
        )
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/news/{}", id),
            Some(json!({
                "authorId": app.user_id,
                "title": "!!!",
                "urlFriendlyTitle": "x",
                "description": "d",
                "content": "c"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = app.call(Method::GET, &format!("/api/news/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["urlFriendlyTitle"], "hello");
    let (status, _) = app.call(Method::GET, "/api/news", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::DELETE, &format!("/api/news/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn country_codes_are_unique_ignoring_case() {
    let app = test_app().await;
    let (status, _) = app
        .call(Method::POST, "/api/countries", Some(json!({"code": "FR", "name": "France"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app
        .call(Method::POST, "/api/countries", Some(json!({"code": "fr", "name": "France"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "already_exists");
    let (_, body) = app.call(Method::GET, "/api/countries", None).await;
    assert_eq!(body["meta"]["totalItems"], 1);
}
