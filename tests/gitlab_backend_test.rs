use gist_bridge::utils::validation::Validate;
use gist_bridge::{create_backend, BridgeConfig, NewFiles, Provider};
use httpmock::prelude::*;

fn config_for(server: &MockServer) -> BridgeConfig {
    let toml_str = format!(
        r#"
            [backend]
            provider = "gitlab"

            [gitlab]
            host = "{base}"
            group = "notes"
            name = "snippets"
        "#,
        base = server.base_url()
    );
    let config = BridgeConfig::from_toml_str(&toml_str).unwrap();
    config.validate().unwrap();
    config
}

fn snippet_json(id: u64, title: &str, file_name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "file_name": file_name,
        "description": "notes",
        "created_at": "2021-03-01T10:00:00Z",
        "updated_at": "2021-03-02T11:30:00Z",
        "web_url": format!("https://gitlab.example.com/snippets/{}", id),
        "project_id": 7,
        "author": { "username": "dev" }
    })
}

#[tokio::test]
async fn test_end_to_end_listing_groups_snippets_into_gists() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v4/user")
            .query_param("private_token", "tok");
        then.status(200)
            .json_body(serde_json::json!({"username": "dev"}));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v4/projects")
            .query_param("search", "snippets");
        then.status(200).json_body(serde_json::json!([
            {"id": 7, "path_with_namespace": "notes/snippets"}
        ]));
    });
    let list_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v4/projects/7/snippets")
            .query_param("page", "1");
        then.status(200)
            .header("x-total-pages", "1")
            .json_body(serde_json::json!([
                snippet_json(1, "shared", "a.rs"),
                snippet_json(2, "shared", "b.py"),
                snippet_json(3, "zolo", "c.md"),
            ]));
    });

    let backend = create_backend(&config_for(&server)).unwrap();
    assert_eq!(backend.provider(), Provider::GitLab);

    let profile = backend.get_user_profile("tok").await.unwrap();
    assert_eq!(profile.login, "dev");
    assert_eq!(profile.project_id, Some(7));

    let gists = backend.get_all_gists("tok", &profile).await.unwrap();
    list_mock.assert();

    assert_eq!(gists.len(), 2);
    // Title-descending order.
    assert_eq!(gists[0].id, "zolo");
    assert_eq!(gists[1].id, "shared");
    assert_eq!(gists[1].files.len(), 2);
    assert_eq!(gists[1].files["b.py"].language, "python");
    assert_eq!(gists[1].user, "dev");
}

#[tokio::test]
async fn test_gist_lifecycle_create_fetch_delete() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/v4/user");
        then.status(200)
            .json_body(serde_json::json!({"username": "dev"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v4/projects");
        then.status(200).json_body(serde_json::json!([
            {"id": 7, "path_with_namespace": "notes/snippets"}
        ]));
    });

    // The backend hashes the description into a title; the mock echoes a
    // fixed one back, which is what grouping keys on.
    let title = "0f6259af50c8a4bf0b3f5cbb6e8d26c9";
    let create_mock = server.mock(|when, then| {
        when.method(POST).path("/api/v4/projects/7/snippets");
        then.status(201).json_body(snippet_json(11, title, "a.rs"));
    });
    let raw_mock = server.mock(|when, then| {
        when.method(GET).path("/api/v4/projects/7/snippets/11/raw");
        then.status(200).body("fn main() {}");
    });
    let delete_mock = server.mock(|when, then| {
        when.method(DELETE).path("/api/v4/projects/7/snippets/11");
        then.status(204);
    });

    let backend = create_backend(&config_for(&server)).unwrap();
    let profile = backend.get_user_profile("tok").await.unwrap();

    let mut files = NewFiles::new();
    files.insert("a.rs".to_string(), "fn main() {}".to_string());
    let created = backend
        .create_single_gist("tok", &profile, "notes", &files, false)
        .await
        .unwrap();
    create_mock.assert();
    raw_mock.assert();
    assert_eq!(
        created.files["a.rs"].content.as_deref(),
        Some("fn main() {}")
    );

    let fetched = backend
        .get_single_gist("tok", &created.id, &created)
        .await
        .unwrap();
    assert_eq!(
        fetched.files["a.rs"].content.as_deref(),
        Some("fn main() {}")
    );

    backend.delete_single_gist("tok", &created).await.unwrap();
    delete_mock.assert();
}

#[tokio::test]
async fn test_listing_falls_back_when_a_page_fails() {
    let server = MockServer::start();
    let page1 = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v4/projects/7/snippets")
            .query_param("page", "1");
        then.status(200)
            .header("x-total-pages", "3")
            .json_body(serde_json::json!([snippet_json(1, "t1", "a.rs")]));
    });
    let page2 = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v4/projects/7/snippets")
            .query_param("page", "2");
        then.status(502);
    });

    let backend = create_backend(&config_for(&server)).unwrap();
    let profile = gist_bridge::UserProfile {
        login: "dev".to_string(),
        project_id: Some(7),
    };

    // The legacy walk still returns what it managed to fetch.
    let gists = backend.get_all_gists("tok", &profile).await.unwrap();
    assert_eq!(gists.len(), 1);
    assert_eq!(gists[0].id, "t1");
    assert!(page1.hits() >= 2);
    assert!(page2.hits() >= 1);
}
