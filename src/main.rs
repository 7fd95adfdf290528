// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 服务端渲染站点
//!
//! 基于 Tokio 运行时的多线程 HTTP 服务器，负责：
//! - 根据配置中的路由表识别 `controller#action`
//! - 使用视图辅助函数渲染带作用域类名与导航菜单的页面
//! - 按客户端能力压缩响应
//! - 后台管理控制台（CLI 指令交互）

use navserver::{
    server::{self, ServerState},
    Config, Site,
};

use log::{error, info};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::TcpListener,
    runtime::Builder,
};

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    sync::Arc,
};

const LOG_CONFIG: &str = "config/log4rs.yaml";
const SITE_CONFIG: &str = "config/development.toml";

fn main() {
    // 1. 初始化日志系统：通过外部 YAML 配置级别与输出目的地
    if let Err(e) = log4rs::init_file(LOG_CONFIG, Default::default()) {
        eprintln!("无法从{}初始化日志系统：{}", LOG_CONFIG, e);
    }

    // 2. 环境配置加载：读取失败时使用默认配置继续运行
    let config = match Config::from_toml(SITE_CONFIG) {
        Ok(config) => {
            info!("配置文件已载入");
            config
        }
        Err(e) => {
            error!("{}，使用默认配置", e);
            Config::new()
        }
    };

    // 3. 异步运行时：根据配置文件分配工作线程数
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建异步运行时：{}", e);
            return;
        }
    };

    runtime.block_on(serve(config));
}

async fn serve(config: Config) {
    let site = Arc::new(Site::from_config(&config));
    info!("站点{}已就绪", config.site_title());

    let port: u16 = config.port();
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    info!("服务端将在{}:{}上监听Socket连接", address, port);

    let listener = match TcpListener::bind(SocketAddrV4::new(address, port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            return;
        }
    };
    info!("端口{}绑定完成", port);

    let state = ServerState::default();
    tokio::spawn(console(state.clone()));
    server::run(listener, site, state).await;
}

/// # 管理控制台
///
/// 从标准输入读取 `stop`、`status`、`help` 指令。
async fn console(state: ServerState) {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut input = String::new();
    loop {
        input.clear();
        match reader.read_line(&mut input).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        match input.trim() {
            "stop" => {
                state.shutdown();
                println!("停机指令已激活，服务器即将关闭...");
                break;
            }
            "help" => {
                println!("== navserver Help ==");
                println!("stop   - 发出停机信号");
                println!("status - 查看当前服务器运行状态");
                println!("help   - 显示此帮助信息");
                println!("====================");
            }
            "status" => {
                println!("== navserver 状态 ==");
                println!("当前活跃连接数: {}", state.active_connections());
                println!("====================");
            }
            cmd => {
                println!("无效的命令：{}", cmd);
            }
        }
    }
}
