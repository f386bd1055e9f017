//! End-to-end ingestion tests against a mock CMS

use serde_json::{json, Value};
use sitegraph_ingest::schema::TypeDefinition;
use sitegraph_ingest::{node_id, Ingestion, MemoryGraph, RawOptions};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mock_cms() -> MockServer {
    let server = MockServer::start().await;

    mount_json(
        &server,
        "/sitemap",
        json!({
            "root": {
                "id": 1,
                "urlSegment": "home",
                "type": "page",
                "children": [
                    { "id": 2, "urlSegment": "about", "type": "page", "children": [] },
                ],
            },
        }),
    )
    .await;

    mount_json(
        &server,
        "/home",
        json!({
            "name": "Home",
            "author___ID": 2,
            "hero___FILE": format!("{}/media/hero.jpg", server.uri()),
        }),
    )
    .await;

    mount_json(&server, "/home/about", json!({ "name": "About" })).await;
    mount_json(&server, "/globaldata", json!({ "siteName": "Example" })).await;

    Mock::given(method("GET"))
        .and(path("/media/hero.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0xff, 0xd8, 0xff]),
        )
        .mount(&server)
        .await;

    server
}

fn ingestion_for(server: &MockServer) -> Ingestion {
    Ingestion::new(RawOptions {
        url: Some(server.uri()),
        ..RawOptions::default()
    })
    .unwrap()
}

#[tokio::test]
async fn ingests_the_whole_tree_with_links_and_stable_ids() {
    let server = mock_cms().await;
    let graph = MemoryGraph::new();

    let stats = ingestion_for(&server).run(&graph).await.unwrap();

    // Global node plus the two sitemap nodes.
    assert_eq!(stats.nodes_created, 3);
    assert_eq!(stats.files_created, 1);
    assert_eq!(stats.files_failed, 0);
    assert_eq!(stats.types_discovered, 1);

    let home = graph.node(&node_id("1")).unwrap();
    let about = graph.node(&node_id("2")).unwrap();

    assert_eq!(home.internal.type_name, "Page");
    assert_eq!(about.internal.type_name, "Page");
    assert_eq!(about.parent, Some(home.id.clone()));
    assert_eq!(home.children, vec![about.id.clone()]);
    assert_eq!(graph.links(), vec![(home.id.clone(), about.id.clone())]);
}

#[tokio::test]
async fn rewrites_foreign_keys_and_remote_files_per_node() {
    let server = mock_cms().await;
    let graph = MemoryGraph::new();

    ingestion_for(&server).run(&graph).await.unwrap();

    let home = graph.node(&node_id("1")).unwrap();

    // The FK field points at the about node's stable id.
    assert!(home.fields.get("author___ID").is_none());
    assert_eq!(home.fields["author___NODE"], json!(node_id("2").to_string()));

    // The file field points at the materialized file node.
    let files = graph.files();
    assert_eq!(files.len(), 1);
    assert!(home.fields.get("hero___FILE").is_none());
    assert_eq!(home.fields["hero___NODE"], json!(files[0].id.to_string()));
    assert_eq!(files[0].parent, home.id);
    assert_eq!(files[0].content_type.as_deref(), Some("image/jpeg"));
}

#[tokio::test]
async fn declares_the_common_interface_over_discovered_types() {
    let server = mock_cms().await;
    let graph = MemoryGraph::new();

    ingestion_for(&server).run(&graph).await.unwrap();

    let definitions = graph.type_definitions();
    assert_eq!(definitions.len(), 2);

    let TypeDefinition::Interface { name, body } = &definitions[0] else {
        panic!("expected the interface first");
    };
    assert_eq!(name, "CmsNode");
    assert!(body.contains("id: ID!"));

    assert_eq!(
        definitions[1],
        TypeDefinition::Object {
            name: "Page".to_string(),
            interfaces: vec!["Node".to_string(), "CmsNode".to_string()],
        }
    );
}

#[tokio::test]
async fn re_ingestion_updates_nodes_instead_of_duplicating() {
    let server = mock_cms().await;
    let graph = MemoryGraph::new();
    let ingestion = ingestion_for(&server);

    ingestion.run(&graph).await.unwrap();
    ingestion.run(&graph).await.unwrap();

    assert_eq!(graph.nodes().len(), 3);
    assert_eq!(graph.files().len(), 1);
}

#[tokio::test]
async fn type_prefix_applies_to_discovered_types() {
    let server = mock_cms().await;
    let graph = MemoryGraph::new();

    let ingestion = Ingestion::new(RawOptions {
        url: Some(server.uri()),
        type_prefix: Some("Cms".to_string()),
        ..RawOptions::default()
    })
    .unwrap();
    ingestion.run(&graph).await.unwrap();

    let home = graph.node(&node_id("1")).unwrap();
    assert_eq!(home.internal.type_name, "CmsPage");
}

#[tokio::test]
async fn sitemap_fetch_failure_is_fatal() {
    let server = MockServer::start().await;
    mount_json(&server, "/globaldata", json!({})).await;
    // No /sitemap mock: 404.

    let graph = MemoryGraph::new();
    let err = ingestion_for(&server).run(&graph).await.unwrap_err();

    assert!(err.to_string().contains("sitemap"));
}

#[tokio::test]
async fn failed_remote_file_degrades_without_aborting() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/sitemap",
        json!({ "root": { "id": 1, "urlSegment": "home", "type": "page", "children": [] } }),
    )
    .await;
    let dead_url = format!("{}/media/dead.png", server.uri());
    mount_json(
        &server,
        "/home",
        json!({ "name": "Home", "hero___FILE": dead_url }),
    )
    .await;
    mount_json(&server, "/globaldata", json!({})).await;

    let graph = MemoryGraph::new();
    let stats = ingestion_for(&server).run(&graph).await.unwrap();

    assert_eq!(stats.files_created, 0);
    assert_eq!(stats.files_failed, 1);

    let home = graph.node(&node_id("1")).unwrap();
    assert_eq!(
        home.fields["hero___FILE"],
        json!(format!("{}/media/dead.png", server.uri()))
    );
}
