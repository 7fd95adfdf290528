// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由模块
//!
//! 把请求路径映射到 `controller#action`，同时负责把链接目标解析为 URL。
//!
//! 路由表来自配置文件中的 `[[route]]` 条目，例如：
//!
//! ```toml
//! [[route]]
//! path = "/admin/users/:id"
//! to = "admin/users#show"
//! ```
//!
//! `to` 中最后一段是控制器名，之前的段构成命名空间；`:name` 形式的路径段匹配任意一个非空段。

use log::{debug, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_derive::{Deserialize, Serialize};

use crate::exception::Exception;

/// 当前页面的路由上下文。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub controller: String,
    pub action: String,
    /// 仅当控制器位于命名空间下时存在，取最外层的命名空间
    pub namespace: Option<String>,
}

impl Route {
    pub fn new(controller: &str, action: &str) -> Self {
        Self {
            controller: controller.to_string(),
            action: action.to_string(),
            namespace: None,
        }
    }

    pub fn namespaced(namespace: &str, controller: &str, action: &str) -> Self {
        Self {
            controller: controller.to_string(),
            action: action.to_string(),
            namespace: Some(namespace.to_string()),
        }
    }

    /// 解析 `admin/users#show` 形式的描述，缺省动作为 `index`。
    pub fn parse(to: &str) -> Self {
        let (controller_path, action) = match to.split_once('#') {
            Some((c, a)) if !a.is_empty() => (c, a),
            Some((c, _)) => (c, "index"),
            None => (to, "index"),
        };
        let segments: Vec<&str> = controller_path
            .split(['/', ':'])
            .filter(|s| !s.is_empty())
            .collect();
        let controller = segments.last().copied().unwrap_or("");
        let namespace = if segments.len() > 1 {
            Some(segments[0].to_string())
        } else {
            None
        };
        Self {
            controller: controller.to_string(),
            action: action.to_string(),
            namespace,
        }
    }
}

/// 配置文件中的一条路由
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RouteSpec {
    pub path: String,
    pub to: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// 该页面额外附加到 `<body>` 上的类名
    #[serde(default)]
    pub extra_body_class: Option<String>,
}

/// 链接目标
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    /// 已经是 URL，原样使用
    Path(String),
    /// 多态路由，如 `["admin", "users"]` 对应 `/admin/users`
    Segments(Vec<String>),
    /// 路由表中的具名路由，可附带查询参数
    Named {
        name: String,
        query: Vec<(String, String)>,
    },
}

impl LinkTarget {
    pub fn path(p: &str) -> Self {
        LinkTarget::Path(p.to_string())
    }

    pub fn segments(segments: &[&str]) -> Self {
        LinkTarget::Segments(segments.iter().map(|s| s.to_string()).collect())
    }

    pub fn named(name: &str) -> Self {
        LinkTarget::Named {
            name: name.to_string(),
            query: vec![],
        }
    }
}

impl From<&str> for LinkTarget {
    fn from(p: &str) -> Self {
        LinkTarget::path(p)
    }
}

/// 路径段与查询参数中保留原样的字符，其余一律百分号编码
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn encode(component: &str) -> String {
    utf8_percent_encode(component, URL_COMPONENT).to_string()
}

/// URL 解析函数，由宿主框架提供给视图辅助函数
#[cfg_attr(test, mockall::automock)]
pub trait UrlFor {
    fn url_for(&self, target: &LinkTarget) -> String;
}

/// 路由表中的一条已解析条目
#[derive(Debug, Clone)]
pub struct RouteEntry {
    segments: Vec<String>,
    spec: RouteSpec,
    route: Route,
}

impl RouteEntry {
    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn title(&self) -> Option<&str> {
        self.spec.title.as_deref()
    }

    pub fn extra_body_class(&self) -> Option<&str> {
        self.spec.extra_body_class.as_deref()
    }

    fn matches(&self, segments: &[&str]) -> bool {
        self.segments.len() == segments.len()
            && self
                .segments
                .iter()
                .zip(segments)
                .all(|(pattern, actual)| pattern.starts_with(':') || pattern == actual)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

impl RouteTable {
    pub fn new(specs: &[RouteSpec]) -> Self {
        let entries = specs
            .iter()
            .map(|spec| RouteEntry {
                segments: split_path(&spec.path).into_iter().map(String::from).collect(),
                route: Route::parse(&spec.to),
                spec: spec.clone(),
            })
            .collect();
        Self { entries }
    }

    /// 识别请求路径（不含查询串），按配置顺序取第一条匹配的路由。
    pub fn recognize(&self, path: &str) -> Result<&RouteEntry, Exception> {
        let segments = split_path(path);
        match self.entries.iter().find(|e| e.matches(&segments)) {
            Some(entry) => {
                debug!(
                    "路径{}匹配路由{} -> {}#{}",
                    path, entry.spec.path, entry.route.controller, entry.route.action
                );
                Ok(entry)
            }
            None => Err(Exception::RouteNotFound),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl UrlFor for RouteTable {
    fn url_for(&self, target: &LinkTarget) -> String {
        match target {
            LinkTarget::Path(p) => p.clone(),
            LinkTarget::Segments(segments) => {
                let encoded: Vec<String> = segments.iter().map(|s| encode(s)).collect();
                format!("/{}", encoded.join("/"))
            }
            LinkTarget::Named { name, query } => {
                let entry = self
                    .entries
                    .iter()
                    .find(|e| e.spec.name.as_deref() == Some(name.as_str()));
                let mut url = match entry {
                    Some(e) => e.spec.path.clone(),
                    None => {
                        warn!("未找到名为{}的路由，链接将指向根路径", name);
                        "/".to_string()
                    }
                };
                if !query.is_empty() {
                    let pairs: Vec<String> = query
                        .iter()
                        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
                        .collect();
                    url.push('?');
                    url.push_str(&pairs.join("&"));
                }
                url
            }
        }
    }
}
