// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 在随机端口上启动完整站点的测试工具，供各个集成测试共用。

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use navserver::{
    server::{self, ServerState},
    Config, Site,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub const SITE: &str = r#"
    site_title = "Test Site"
    port = 0
    worker_threads = 1
    cache_size = 16
    local = true

    [[route]]
    path = "/"
    to = "home#index"
    name = "root"

    [[route]]
    path = "/admin/users"
    to = "admin/users#index"
    name = "admin_users"
    title = "Users"

    [[route]]
    path = "/admin/users/:id"
    to = "admin/users#show"

    [[nav]]
    caption = "Home"
    route = "root"
    strict = true

    [[nav]]
    caption = "Users"
    route = "admin_users"
    query = { filter = "a b" }
    just_path = true
    hide = ["xs"]
"#;

pub struct RunningSite {
    pub addr: SocketAddr,
    pub state: ServerState,
    pub handle: JoinHandle<()>,
}

pub async fn start_site() -> RunningSite {
    let config = Config::from_toml_str(SITE).unwrap();
    let site = Arc::new(Site::from_config(&config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = ServerState::default();
    let handle = tokio::spawn(server::run(listener, site, state.clone()));
    RunningSite { addr, state, handle }
}

pub struct Reply {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// 拆分状态行、报文头与响应体
pub fn parse_reply(bytes: &[u8]) -> Reply {
    let split = bytes
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .unwrap_or(bytes.len());
    let head = String::from_utf8_lossy(&bytes[..split]);
    let mut lines = head.split("\r\n");
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    let headers = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let body = bytes.get(split + 4..).unwrap_or_default().to_vec();
    Reply {
        status,
        headers,
        body,
    }
}

/// 发送原始报文并读到服务端关闭连接为止
pub async fn try_exchange(addr: SocketAddr, raw: &[u8]) -> std::io::Result<Reply> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(raw).await?;
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes).await?;
    Ok(parse_reply(&bytes))
}

pub async fn exchange(addr: SocketAddr, raw: &str) -> Reply {
    try_exchange(addr, raw.as_bytes()).await.unwrap()
}

pub fn get(path: &str, headers: &[(&str, &str)]) -> String {
    let mut raw = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n", path);
    for (name, value) in headers {
        raw.push_str(&format!("{}: {}\r\n", name, value));
    }
    raw.push_str("\r\n");
    raw
}
