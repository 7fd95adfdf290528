// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 通过真实的 TCP 连接访问站点，验证页面、内容协商与停机流程。

mod common;

use std::io::Read;
use std::time::Duration;

use common::{exchange, get, parse_reply, start_site};
use flate2::read::GzDecoder;

#[tokio::test]
async fn test_home_page() {
    let site = start_site().await;
    let reply = exchange(site.addr, &get("/", &[])).await;

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Server"), Some("navserver"));
    assert_eq!(reply.header("Content-Type"), Some("text/html;charset=utf-8"));
    assert_eq!(
        reply.header("Content-Length"),
        Some(reply.body.len().to_string().as_str())
    );

    let body = reply.text();
    assert!(body.contains(r#"<body class="home _index">"#));
    assert!(body.contains(r#"<li class="active"><a href="/">Home</a></li>"#));
    assert!(body.contains("<title>Test Site</title>"));
}

#[tokio::test]
async fn test_nested_page_activates_section() {
    let site = start_site().await;
    let body = exchange(site.addr, &get("/admin/users/42?tab=roles", &[]))
        .await
        .text();

    assert!(body.contains(r#"<body class="users _show admin">"#));
    assert!(body.contains(r#"<li><a href="/">Home</a></li>"#));
    assert!(body.contains(
        r#"<li class="hide-xs active"><a href="/admin/users?filter=a%20b">Users</a></li>"#
    ));
}

#[tokio::test]
async fn test_json_context_when_preferred() {
    let site = start_site().await;
    let reply = exchange(
        site.addr,
        &get("/admin/users", &[("Accept", "application/json, text/html;q=0.8")]),
    )
    .await;
    assert_eq!(reply.header("Content-Type"), Some("application/json"));

    let context: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(context["title"], "Users - Test Site");
    assert_eq!(context["body_class"], "users _index admin");
    assert_eq!(context["nav"][1]["active"], true);

    let reply = exchange(
        site.addr,
        &get("/admin/users", &[("Accept", "text/html,application/json;q=0.1")]),
    )
    .await;
    assert_eq!(reply.header("Content-Type"), Some("text/html;charset=utf-8"));
}

#[tokio::test]
async fn test_gzip_body() {
    let site = start_site().await;
    let reply = exchange(site.addr, &get("/", &[("Accept-Encoding", "br, gzip")])).await;
    assert_eq!(reply.header("Content-Encoding"), Some("gzip"));

    let mut html = String::new();
    GzDecoder::new(&reply.body[..])
        .read_to_string(&mut html)
        .unwrap();
    assert!(html.contains(r#"<body class="home _index">"#));
}

#[tokio::test]
async fn test_head_request() {
    let site = start_site().await;
    let reply = exchange(site.addr, "HEAD / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

    assert_eq!(reply.status, 200);
    assert!(reply.body.is_empty());
    assert_ne!(reply.header("Content-Length"), Some("0"));
}

#[tokio::test]
async fn test_options_and_disallowed_methods() {
    let site = start_site().await;

    let reply = exchange(site.addr, "OPTIONS * HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status, 204);
    assert_eq!(reply.header("Allow"), Some("GET, HEAD, OPTIONS"));

    let reply = exchange(site.addr, "POST /admin/users HTTP/1.1\r\nContent-Length: 0\r\n\r\n").await;
    assert_eq!(reply.status, 405);
    assert_eq!(reply.header("Allow"), Some("GET, HEAD, OPTIONS"));
}

#[tokio::test]
async fn test_unknown_route() {
    let site = start_site().await;
    let reply = exchange(site.addr, &get("/nonexistent-page-12345", &[])).await;

    assert_eq!(reply.status, 404);
    assert!(reply.text().contains("404"));
}

#[tokio::test]
async fn test_concurrent_requests() {
    let site = start_site().await;
    let handles: Vec<_> = (0..10)
        .map(|i| {
            let addr = site.addr;
            tokio::spawn(async move { exchange(addr, &get(&format!("/admin/users/{}", i), &[])).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().status, 200);
    }
}

#[tokio::test]
async fn test_stop_ends_accept_loop() {
    let site = start_site().await;
    assert_eq!(exchange(site.addr, &get("/", &[])).await.status, 200);

    site.state.shutdown();
    let stopped = tokio::time::timeout(Duration::from_secs(2), site.handle).await;
    assert!(stopped.is_ok(), "主循环应在一个轮询周期内退出");
    assert_eq!(site.state.active_connections(), 0);
}

#[test]
fn test_parse_reply_splits_head_and_body() {
    let reply = parse_reply(b"HTTP/1.1 404 Not Found\r\nContent-Length: 5\r\nServer: navserver\r\n\r\nHello");

    assert_eq!(reply.status, 404);
    assert_eq!(reply.headers.len(), 2);
    assert_eq!(reply.header("Server"), Some("navserver"));
    assert_eq!(reply.text(), "Hello");
}

#[test]
fn test_parse_reply_without_body() {
    let reply = parse_reply(b"HTTP/1.1 204 No Content\r\nContent-Length: 0\r\n\r\n");
    assert_eq!(reply.status, 204);
    assert!(reply.body.is_empty());
}
