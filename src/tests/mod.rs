
use serde_json::json;

use crate::cli::validation::LoginForm;
use crate::client::{ApiClient, ClientError, ClientOptions, GENERIC_ERROR_MESSAGE};
use crate::dashboard::{Dashboard, DashboardError, View, TRANSPORT_ERROR_MESSAGE};
use crate::model::{Credentials, ProductDraft, ProductPatch};
use crate::store::{RememberStore, Remembered};

use http_stub::{Canned, StubServer};

fn client_for(base_url: &str) -> ApiClient {
    ApiClient::new(&ClientOptions {
        base_url: base_url.to_string(),
        timeout_seconds: 5,
        proxy: None,
    })
    .unwrap()
}

fn product_json(id: i64, name: &str, quantity: u32) -> serde_json::Value {
    json!({
        "id": id,
        "product_name": name,
        "description": format!("{name} description"),
        "original_price": 10.0,
        "quantity": quantity,
        "delivery_fee": 1.5,
        "user_id": 1,
        "target_margin": 20
    })
}

fn catalogue(count: i64) -> serde_json::Value {
    serde_json::Value::Array(
        (1..=count)
            .map(|id| product_json(id, &format!("Item {id}"), 12))
            .collect(),
    )
}

fn alice(remember_me: bool) -> LoginForm {
    LoginForm {
        username: "alice".to_string(),
        password: "secret".to_string(),
        remember_me,
    }
}

#[tokio::test]
async fn session_cookie_is_sent_on_later_requests() {
    let server = StubServer::start(vec![
        Canned::json(200, json!({"message": "Welcome back"}))
            .with_header("Set-Cookie", "session=abc123; Path=/; HttpOnly"),
        Canned::json(200, json!({"id": 1, "username": "alice"})),
    ])
    .await;
    let client = client_for(&server.base_url);

    let creds = Credentials {
        username: "alice".to_string(),
        password: "secret".to_string(),
    };
    let auth = client.login(&creds).await.unwrap();
    assert_eq!(auth.message.as_deref(), Some("Welcome back"));
    assert_eq!(client.session_token().as_deref(), Some("session=abc123"));

    let me = client.get_current_user().await.unwrap();
    assert!(me.is_authenticated());

    let requests = server.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/login");
    assert_eq!(
        requests[0].json(),
        json!({"username": "alice", "password": "secret"})
    );
    assert_eq!(requests[0].header("content-type"), Some("application/json"));
    assert_eq!(requests[1].path, "/me");
    assert!(requests[1]
        .header("cookie")
        .unwrap_or_default()
        .contains("session=abc123"));
}

#[tokio::test]
async fn error_bodies_are_normalized() {
    let server = StubServer::start(vec![
        Canned::json(401, json!({"error": "Invalid credentials"})),
        Canned::json(422, json!({"errors": ["Username taken", "Password too short"]})),
        Canned::raw(500, "<html>boom</html>"),
        Canned::json(400, json!({"error": ""})),
    ])
    .await;
    let client = client_for(&server.base_url);

    let err = client.get_products().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "Invalid credentials");

    let err = client.get_products().await.unwrap_err();
    assert_eq!(err.to_string(), "Username taken, Password too short");

    let err = client.get_products().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), GENERIC_ERROR_MESSAGE);

    let err = client.get_products().await.unwrap_err();
    assert_eq!(err.to_string(), GENERIC_ERROR_MESSAGE);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}"));
    let err = client.get_current_user().await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.status(), None);

    let banner = DashboardError::from(err).banner();
    assert_eq!(banner, TRANSPORT_ERROR_MESSAGE);
}

#[tokio::test]
async fn product_writes_use_envelope_and_paths() {
    let server = StubServer::start(vec![
        Canned::json(201, product_json(9, "Desk", 4)),
        Canned::json(200, product_json(9, "Desk", 0)),
        Canned::json(200, json!({})),
    ])
    .await;
    let client = client_for(&server.base_url);

    let draft = ProductDraft {
        name: "Desk".to_string(),
        description: None,
        unit_price: 120.0,
        quantity: 4,
        delivery_fee: 15.0,
        target_margin: 10.0,
    };
    let created = client.create_product(&draft).await.unwrap();
    assert_eq!(created["id"], 9);

    let patch = ProductPatch {
        quantity: Some(0),
        ..Default::default()
    };
    client.update_product(9, &patch).await.unwrap();
    client.delete_product(9).await.unwrap();

    let requests = server.requests();
    assert_eq!(
        server.paths(),
        vec!["POST /products", "PATCH /products/9", "DELETE /products/9"]
    );
    assert_eq!(
        requests[0].json(),
        json!({"product": {
            "product_name": "Desk",
            "original_price": 120.0,
            "quantity": 4,
            "delivery_fee": 15.0,
            "target_margin": 10.0
        }})
    );
    assert_eq!(requests[1].json(), json!({"product": {"quantity": 0}}));
}

#[tokio::test]
async fn signup_wraps_credentials_under_user() {
    let server =
        StubServer::start(vec![Canned::json(201, json!({"id": 4, "username": "bob"}))]).await;
    let dir = tempfile::tempdir().unwrap();
    let mut dashboard = Dashboard::new(
        client_for(&server.base_url),
        RememberStore::new(dir.path().join("state.yml")),
    );
    dashboard.show_view(View::Signup);

    let message = dashboard
        .signup(crate::cli::validation::SignupForm {
            username: " bob ".to_string(),
            password: "hunter2".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(message, "Account created! Please login.");
    assert_eq!(dashboard.view(), View::Login);
    assert_eq!(
        server.requests()[0].json(),
        json!({"user": {"username": "bob", "password": "hunter2"}})
    );
}

#[tokio::test]
async fn login_persists_session_and_paginates_products() {
    let server = StubServer::start(vec![
        Canned::json(200, json!({})).with_header("Set-Cookie", "session=tok; Path=/"),
        Canned::json(200, catalogue(12)),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let store = RememberStore::new(dir.path().join("state.yml"));
    let mut dashboard = Dashboard::new(client_for(&server.base_url), store.clone());

    let message = dashboard.login(alice(true)).await.unwrap();
    assert_eq!(message, "Login successful!");
    assert_eq!(dashboard.view(), View::Dashboard);

    let view = dashboard.page_view();
    assert_eq!(view.total, 12);
    assert_eq!(view.showing, 10);
    assert_eq!(view.page_info, "Page 1 of 2");
    assert!(view.prev_disabled);

    let view = dashboard.change_page(1).unwrap();
    assert_eq!(view.showing, 2);
    assert!(view.next_disabled);
    assert!(dashboard.change_page(1).is_none());

    let saved = store.load().unwrap();
    assert_eq!(saved.remembered_username.as_deref(), Some("alice"));
    assert_eq!(saved.session_token.as_deref(), Some("session=tok"));
}

#[tokio::test]
async fn login_without_remember_keeps_only_the_session() {
    let server = StubServer::start(vec![
        Canned::json(200, json!({})).with_header("Set-Cookie", "session=tok; Path=/"),
        Canned::json(200, json!([])),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let store = RememberStore::new(dir.path().join("state.yml"));
    store
        .save(&Remembered {
            remembered_username: Some("old".to_string()),
            session_token: None,
        })
        .unwrap();
    let mut dashboard = Dashboard::new(client_for(&server.base_url), store.clone());

    dashboard.login(alice(false)).await.unwrap();
    assert!(dashboard.page_view().empty);

    let saved = store.load().unwrap();
    assert_eq!(saved.remembered_username, None);
    assert_eq!(saved.session_token.as_deref(), Some("session=tok"));
}

#[tokio::test]
async fn start_resumes_stored_session() {
    let server = StubServer::start(vec![
        Canned::json(200, json!({"id": 1, "username": "alice"})),
        Canned::json(200, catalogue(3)),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let store = RememberStore::new(dir.path().join("state.yml"));
    store
        .save(&Remembered {
            remembered_username: Some("alice".to_string()),
            session_token: Some("session=tok".to_string()),
        })
        .unwrap();

    let mut dashboard = Dashboard::new(client_for(&server.base_url), store);
    let startup = dashboard.start().await;

    assert_eq!(startup.view, View::Dashboard);
    assert_eq!(startup.prefill_username.as_deref(), Some("alice"));
    assert_eq!(startup.products.unwrap().total, 3);
    assert_eq!(server.paths(), vec!["GET /me", "GET /products"]);
    assert!(server.requests()[0]
        .header("cookie")
        .unwrap_or_default()
        .contains("session=tok"));
}

#[tokio::test]
async fn start_without_session_shows_login() {
    let server = StubServer::start(vec![Canned::json(200, json!({}))]).await;
    let dir = tempfile::tempdir().unwrap();
    let mut dashboard = Dashboard::new(
        client_for(&server.base_url),
        RememberStore::new(dir.path().join("state.yml")),
    );

    let startup = dashboard.start().await;
    assert_eq!(startup.view, View::Login);
    assert_eq!(startup.prefill_username, None);
    assert!(startup.products.is_none());
    assert_eq!(server.paths(), vec!["GET /me"]);
}

#[tokio::test]
async fn invalid_login_sends_nothing() {
    let server = StubServer::start(Vec::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let mut dashboard = Dashboard::new(
        client_for(&server.base_url),
        RememberStore::new(dir.path().join("state.yml")),
    );

    let err = dashboard
        .login(LoginForm {
            username: "alice".to_string(),
            password: String::new(),
            remember_me: true,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::Validation(_)));
    assert_eq!(err.banner(), "Please enter both username and password");

    let err = dashboard
        .create_product(ProductDraft::default())
        .await
        .unwrap_err();
    assert_eq!(err.banner(), "Product name is required");
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn rejected_login_shows_server_message() {
    let server =
        StubServer::start(vec![Canned::json(401, json!({"error": "Invalid credentials"}))]).await;
    let dir = tempfile::tempdir().unwrap();
    let store = RememberStore::new(dir.path().join("state.yml"));
    let mut dashboard = Dashboard::new(client_for(&server.base_url), store.clone());

    let err = dashboard.login(alice(true)).await.unwrap_err();
    assert_eq!(err.banner(), "Invalid credentials");
    assert_eq!(dashboard.view(), View::Login);
    assert_eq!(store.load().unwrap(), Remembered::default());
}

#[tokio::test]
async fn mutations_refetch_the_list() {
    let server = StubServer::start(vec![
        Canned::json(200, json!({})),
        Canned::json(200, catalogue(2)),
        Canned::json(201, product_json(3, "Desk", 5)),
        Canned::json(200, catalogue(3)),
        Canned::json(200, json!({})),
        Canned::json(200, catalogue(2)),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let mut dashboard = Dashboard::new(
        client_for(&server.base_url),
        RememberStore::new(dir.path().join("state.yml")),
    );
    dashboard.login(alice(false)).await.unwrap();

    let view = dashboard
        .create_product(ProductDraft {
            name: "Desk".to_string(),
            unit_price: 50.0,
            quantity: 5,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(view.total, 3);

    let view = dashboard.delete_product(3).await.unwrap();
    assert_eq!(view.total, 2);

    assert_eq!(
        server.paths(),
        vec![
            "POST /login",
            "GET /products",
            "POST /products",
            "GET /products",
            "DELETE /products/3",
            "GET /products",
        ]
    );
}

#[tokio::test]
async fn failed_mutation_keeps_current_list() {
    let server = StubServer::start(vec![
        Canned::json(200, json!({})),
        Canned::json(200, catalogue(2)),
        Canned::json(422, json!({"errors": ["Quantity must be positive"]})),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let mut dashboard = Dashboard::new(
        client_for(&server.base_url),
        RememberStore::new(dir.path().join("state.yml")),
    );
    dashboard.login(alice(false)).await.unwrap();

    let patch = ProductPatch {
        name: Some("Renamed".to_string()),
        ..Default::default()
    };
    let err = dashboard.update_product(1, patch).await.unwrap_err();
    assert_eq!(err.banner(), "Quantity must be positive");
    assert_eq!(dashboard.page_view().total, 2);
    assert_eq!(server.requests().len(), 3);
}

#[tokio::test]
async fn logout_clears_store_even_when_server_fails() {
    let server = StubServer::start(vec![
        Canned::json(200, json!({})).with_header("Set-Cookie", "session=tok; Path=/"),
        Canned::json(200, catalogue(1)),
        Canned::json(500, json!({"error": "Session store unavailable"})),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let store = RememberStore::new(dir.path().join("state.yml"));
    let mut dashboard = Dashboard::new(client_for(&server.base_url), store.clone());
    dashboard.login(alice(true)).await.unwrap();
    assert!(store.load().unwrap().remembered_username.is_some());

    let err = dashboard.logout().await.unwrap_err();
    assert!(matches!(
        err,
        DashboardError::Client(ClientError::Request { status: 500, .. })
    ));
    assert_eq!(store.load().unwrap(), Remembered::default());
    assert_eq!(dashboard.view(), View::Dashboard);
    assert_eq!(dashboard.page_view().total, 1);
}

#[tokio::test]
async fn logout_resets_dashboard() {
    let server = StubServer::start(vec![
        Canned::json(200, json!({})),
        Canned::json(200, catalogue(4)),
        Canned::json(200, json!({"message": "Logged out"})),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let mut dashboard = Dashboard::new(
        client_for(&server.base_url),
        RememberStore::new(dir.path().join("state.yml")),
    );
    dashboard.login(alice(false)).await.unwrap();
    dashboard.search("item 1");

    dashboard.logout().await.unwrap();
    assert_eq!(dashboard.view(), View::Login);
    assert!(dashboard.user().is_none());
    let view = dashboard.page_view();
    assert!(view.empty);
    assert_eq!(view.search_term, "");
    assert_eq!(server.paths()[2], "DELETE /logout");
}

#[tokio::test]
async fn demo_mode_never_calls_the_api() {
    let server = StubServer::start(Vec::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let store = RememberStore::new(dir.path().join("state.yml"));
    store
        .save(&Remembered {
            remembered_username: Some("alice".to_string()),
            session_token: Some("session=tok".to_string()),
        })
        .unwrap();
    let mut dashboard = Dashboard::new(client_for(&server.base_url), store.clone());

    let view = dashboard.load_demo();
    assert_eq!(view.total, 5);
    assert_eq!(view.rows[2].status_label, "Out of Stock");

    let view = dashboard
        .update_product(
            3,
            ProductPatch {
                quantity: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(view.rows[2].status_label, "Low Stock");

    let err = dashboard.delete_product(42).await.unwrap_err();
    assert!(matches!(err, DashboardError::UnknownProduct { id: 42 }));

    dashboard.logout().await.unwrap();
    assert_eq!(dashboard.view(), View::Login);
    assert!(!dashboard.is_demo());
    assert_eq!(store.load().unwrap(), Remembered::default());
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn start_reports_product_load_failure_after_auth() {
    let server = StubServer::start(vec![
        Canned::json(200, json!({"id": 1, "username": "alice"})),
        Canned::json(500, json!({"error": "Catalogue unavailable"})),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let mut dashboard = Dashboard::new(
        client_for(&server.base_url),
        RememberStore::new(dir.path().join("state.yml")),
    );

    let startup = dashboard.start().await;
    assert_eq!(startup.view, View::Dashboard);
    assert!(startup.products.is_none());
    assert_eq!(startup.load_error.as_deref(), Some("Catalogue unavailable"));
    assert_eq!(dashboard.user().and_then(|u| u.id), Some(1));
}

#[tokio::test]
async fn sparse_product_rows_still_list() {
    let server = StubServer::start(vec![
        Canned::json(200, json!({})),
        Canned::json(
            200,
            json!([
                {"id": 1, "product_name": "Desk", "original_price": 10.0, "quantity": 3,
                 "delivery_fee": null, "user_id": 1, "target_margin": null},
                {"id": 2, "product_name": "Lamp", "original_price": null, "quantity": null}
            ]),
        ),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let mut dashboard = Dashboard::new(
        client_for(&server.base_url),
        RememberStore::new(dir.path().join("state.yml")),
    );
    dashboard.login(alice(false)).await.unwrap();

    let view = dashboard.page_view();
    assert_eq!(view.total, 2);
    assert_eq!(view.rows[0].delivery_fee, "$0.00");
    assert_eq!(view.rows[1].price, "$0.00");
    assert_eq!(view.rows[1].status_label, "Out of Stock");
}
