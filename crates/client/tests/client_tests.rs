use serde_json::json;
use todo_client::{AuthorizeParams, Client, ClientError};
use todo_types::items::{ItemCreationInput, ItemUpdateInput, SearchQuery};
use todo_types::users::{AccountStatus, UserLoginInput};
use todo_types::{QueryFilter, SortOrder};
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn item_json(id: i32, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "details": "",
        "belongs_to_user": 7,
        "created_on": "2024-05-01T12:00:00Z",
    })
}

async fn client(server: &MockServer) -> Client {
    Client::new(&server.uri()).unwrap()
}

#[tokio::test]
async fn list_items_sends_filter_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/items"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "5"))
        .and(query_param("sort_by", "desc"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [item_json(3, "milk")],
            "page": 2,
            "limit": 5,
            "total_count": 6,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await.with_bearer_token("t0ken");
    let list = client
        .list_items(&QueryFilter {
            page: Some(2),
            limit: Some(5),
            sort_by: Some(SortOrder::Desc),
            include_archived: None,
        })
        .await
        .unwrap();

    assert_eq!(list.pagination.total_count, 6);
    assert_eq!(list.items[0].name, "milk");
    assert_eq!(list.items[0].created_on.year(), 2024);
}

#[tokio::test]
async fn create_and_update_send_json_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/items"))
        .and(body_json(json!({ "name": "eggs", "details": "a dozen" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(item_json(1, "eggs")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/items/1"))
        .and(body_json(json!({ "name": "more eggs" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(item_json(1, "more eggs")))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let created = client
        .create_item(&ItemCreationInput {
            name: "eggs".into(),
            details: "a dozen".into(),
        })
        .await
        .unwrap();
    assert_eq!(created.id, 1);

    let updated = client
        .update_item(
            1,
            &ItemUpdateInput {
                name: Some("more eggs".into()),
                details: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "more eggs");
}

#[tokio::test]
async fn statuses_map_to_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/items/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/items/401"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/items/403"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/items/400"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "message": "name is required", "code": 400 })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/items/500"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client(&server).await;
    assert!(matches!(client.get_item(404).await, Err(ClientError::NotFound)));
    assert!(matches!(client.get_item(401).await, Err(ClientError::Unauthorized)));
    assert!(matches!(client.get_item(403).await, Err(ClientError::Forbidden)));
    match client.get_item(400).await {
        Err(ClientError::InvalidRequestInput(message)) => assert_eq!(message, "name is required"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(matches!(
        client.get_item(500).await,
        Err(ClientError::UnexpectedStatus(500))
    ));
}

#[tokio::test]
async fn item_exists_uses_head() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/api/v1/items/1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/api/v1/items/2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server).await;
    assert!(client.item_exists(1).await.unwrap());
    assert!(!client.item_exists(2).await.unwrap());
}

#[tokio::test]
async fn archive_and_search() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/webhooks/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/items/search"))
        .and(query_param("q", "mil"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([item_json(3, "milk")])))
        .mount(&server)
        .await;

    let client = client(&server).await;
    client.archive_webhook(9).await.unwrap();
    let found = client
        .search_items(&SearchQuery {
            q: "mil".into(),
            limit: None,
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn fetch_token_stores_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=abc"))
        .and(body_string_contains("scope=items+webhooks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "issued",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "items webhooks",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/self"))
        .and(header("authorization", "Bearer issued"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "username": "alice",
            "is_admin": false,
            "account_status": "good",
            "requires_password_change": false,
            "created_on": "2024-05-01T12:00:00Z",
        })))
        .mount(&server)
        .await;

    let mut client = client(&server).await;
    let token = client
        .fetch_token("abc", "s3cret", &["items", "webhooks"])
        .await
        .unwrap();
    assert_eq!(token.expires_in, 3600);
    assert_eq!(client.bearer_token(), Some("issued"));

    let me = client.self_user().await.unwrap();
    assert_eq!(me.username, "alice");
    assert_eq!(me.account_status, AccountStatus::Good);
}

#[tokio::test]
async fn oauth2_errors_surface_their_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_scope",
            "error_description": "scope not granted",
        })))
        .mount(&server)
        .await;

    let mut client = client(&server).await;
    match client.fetch_token("abc", "s3cret", &["plans"]).await {
        Err(ClientError::InvalidRequestInput(message)) => assert_eq!(message, "scope not granted"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(client.bearer_token(), None);
}

#[tokio::test]
async fn login_returns_session_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header(
                    "set-cookie",
                    "todocookie=abc123; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400",
                )
                .set_body_json(json!({
                    "authenticated": true,
                    "user_is_admin": false,
                    "account_status": "good",
                })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/status"))
        .and(header("cookie", "todocookie=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "authenticated": true,
            "user_is_admin": false,
        })))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let login = client
        .login(&UserLoginInput {
            username: "alice".into(),
            password: "correct horse battery".into(),
            totp_token: "123456".into(),
        })
        .await
        .unwrap();
    assert_eq!(login.cookie, "todocookie=abc123");
    assert!(login.status.authenticated);

    let status = client
        .with_session_cookie(login.cookie)
        .status()
        .await
        .unwrap();
    assert!(status.authenticated);
}

#[tokio::test]
async fn authorize_returns_redirect_target() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth2/authorize"))
        .and(query_param("response_type", "token"))
        .and(query_param("client_id", "abc"))
        .and(query_param("state", "xyz"))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "location",
            "https://app.example.com/callback#access_token=t&token_type=Bearer&state=xyz",
        ))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let target = client
        .authorize(&AuthorizeParams {
            response_type: "token".into(),
            client_id: "abc".into(),
            state: Some("xyz".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(target.host_str(), Some("app.example.com"));
    assert!(target.fragment().unwrap().contains("access_token=t"));
}

#[tokio::test]
async fn readiness_reports_unavailable_database() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_meta_/ready"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/_meta_/live"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client(&server).await;
    client.liveness().await.unwrap();
    assert!(matches!(
        client.readiness().await,
        Err(ClientError::UnexpectedStatus(503))
    ));
}

#[test]
fn build_requests_target_the_right_routes() {
    let client = Client::new("http://localhost:8080").unwrap();

    let request = client.build_get_audit_log_for_plan_request(4).unwrap();
    assert_eq!(request.method(), "GET");
    assert_eq!(request.url().path(), "/api/v1/plans/4/audit");

    let request = client.build_archive_oauth2_client_request(2).unwrap();
    assert_eq!(request.method(), "DELETE");
    assert_eq!(request.url().path(), "/api/v1/oauth2/clients/2");

    let request = client.build_get_audit_log_entry_request(11).unwrap();
    assert_eq!(request.url().path(), "/api/v1/admin/audit_log/11");

    let request = client
        .build_list_accounts_request(&QueryFilter::default())
        .unwrap();
    assert_eq!(request.url().query(), None);
}
