// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 连接处理
//!
//! 主循环与单个连接的处理。每个连接只处理一个请求，响应发出后即关闭。
//! 日志、配置与运行时的初始化留在 `main` 中。

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, error, info};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

use crate::{request::Request, response::Response, view::Site};

/// 单个请求报文允许的最大长度，超出部分被截断
pub const REQUEST_BUFFER_SIZE: usize = 8192;

/// 主循环检查停机标志的间隔
const SHUTDOWN_POLL: Duration = Duration::from_millis(500);

/// 停机标志与活跃连接数，在主循环、连接任务与管理控制台之间共享
#[derive(Debug, Clone, Default)]
pub struct ServerState {
    shutdown: Arc<Mutex<bool>>,
    active_connection: Arc<Mutex<u32>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

impl ServerState {
    /// 请求主循环在下一次轮询时退出
    pub fn shutdown(&self) {
        *lock(&self.shutdown) = true;
    }

    pub fn is_shutting_down(&self) -> bool {
        *lock(&self.shutdown)
    }

    pub fn active_connections(&self) -> u32 {
        *lock(&self.active_connection)
    }
}

/// 接受连接直到收到停机指令。已经开始处理的连接不受影响。
pub async fn run(listener: TcpListener, site: Arc<Site>, state: ServerState) {
    let mut id: u128 = 0;

    loop {
        if state.is_shutting_down() {
            info!("主循环接收到停机指令，正在退出...");
            break;
        }

        let (mut stream, addr) = match tokio::time::timeout(SHUTDOWN_POLL, listener.accept()).await
        {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(e)) => {
                error!("接受连接失败：{}", e);
                continue;
            }
            Err(_) => continue,
        };
        debug!("[ID{}]新的连接：{}", id, addr);

        let site = Arc::clone(&site);
        let state = state.clone();
        tokio::spawn(async move {
            *lock(&state.active_connection) += 1;
            handle_connection(&mut stream, id, &site).await;
            *lock(&state.active_connection) -= 1;
        });
        id += 1;
    }
}

/// 读取一个请求、渲染并写回响应
pub async fn handle_connection(stream: &mut TcpStream, id: u128, site: &Site) {
    let mut buffer = vec![0; REQUEST_BUFFER_SIZE];
    let n = match stream.read(&mut buffer).await {
        Ok(0) => return,
        Ok(n) => n,
        Err(e) => {
            error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
            return;
        }
    };
    debug!("[ID{}]HTTP请求接收完毕，{} bytes", id, n);

    let start_time = Instant::now();
    let response = match Request::try_from(&buffer[..n], id) {
        Ok(request) => {
            let response = Response::from_page(&request, id, site);
            info!(
                "[ID{}] {}, {}, {}, {}, {}",
                id,
                request.method(),
                request.target(),
                response.status_code(),
                response.information(),
                request.user_agent(),
            );
            response
        }
        Err(e) => {
            error!("[ID{}]解析HTTP请求失败: {}", id, e);
            Response::bad_request(id)
        }
    };
    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );

    if let Err(e) = stream.write_all(&response.as_bytes()).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    let _ = stream.flush().await;
}
