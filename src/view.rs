// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 页面渲染模块
//!
//! 站点布局由三部分组成：带作用域类名的 `<body>`、由 `[[nav]]` 配置生成的导航菜单，
//! 以及说明当前 `controller#action` 的正文。
//! 当客户端请求 `application/json` 时，返回同一页面上下文的 JSON 形式。

use std::collections::BTreeMap;
use std::sync::Mutex;

use log::{debug, error, warn};
use regex::Regex;
use serde_derive::{Deserialize, Serialize};

use crate::{
    cache::PatternCache,
    config::Config,
    exception::Exception,
    helper::{LinkOptions, ViewContext},
    routing::{LinkTarget, Route, RouteEntry, RouteTable},
    util::{html_escape, HtmlBuilder},
};

/// 配置文件中的一个导航项，字段与 `smart_link_to` 的选项一一对应。
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NavItem {
    pub caption: String,
    /// 直接给出的链接地址
    #[serde(default)]
    pub path: Option<String>,
    /// 具名路由，优先于 `path`
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub wrapper_class: Option<String>,
    #[serde(default)]
    pub just_path: bool,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub when_buying: Option<String>,
    #[serde(default)]
    pub hide: Vec<String>,
    #[serde(default)]
    pub show: Vec<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
    /// 只识别 `"right"`
    #[serde(default)]
    pub pull: Option<String>,
    #[serde(default)]
    pub action: bool,
    /// 强制激活
    #[serde(default)]
    pub active: bool,
}

impl NavItem {
    pub fn target(&self) -> LinkTarget {
        match (&self.route, &self.path) {
            (Some(name), _) => LinkTarget::Named {
                name: name.clone(),
                query: self
                    .query
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            },
            (None, Some(path)) => LinkTarget::Path(path.clone()),
            (None, None) => {
                warn!("导航项{}既没有path也没有route，链接将指向根路径", self.caption);
                LinkTarget::path("/")
            }
        }
    }

    /// 转换为链接选项。无法编译的模式会被丢弃，回退为从 URL 推导的默认模式。
    pub fn options(&self) -> LinkOptions {
        let pattern = self.pattern.as_deref().and_then(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(_) => {
                warn!(
                    "导航项{}：{}，改用默认模式",
                    self.caption,
                    Exception::InvalidPattern(p.to_string())
                );
                None
            }
        });
        LinkOptions {
            class: self.class.clone(),
            attrs: vec![],
            wrapper_class: self.wrapper_class.clone(),
            wrapper_attrs: vec![],
            just_path: self.just_path,
            pattern,
            strict: self.strict,
            count: self.count,
            icon: self.icon.clone(),
            when_buying: self.when_buying.clone(),
            hide: self.hide.clone(),
            show: self.show.clone(),
            tooltip: self.tooltip.clone(),
            force_active: self.active,
            pull_right: self.pull.as_deref() == Some("right"),
            action: self.action,
        }
    }
}

/// 预先转换好的导航链接
#[derive(Debug, Clone)]
struct NavLink {
    caption: String,
    target: LinkTarget,
    options: LinkOptions,
}

#[derive(Serialize, Debug)]
pub struct NavState {
    pub caption: String,
    pub url: String,
    pub active: bool,
}

/// JSON 形式的页面上下文
#[derive(Serialize, Debug)]
pub struct PageContext<'a> {
    pub title: String,
    pub body_class: String,
    pub route: &'a Route,
    pub path: &'a str,
    pub nav: Vec<NavState>,
}

/// 渲染站点页面所需的全部只读状态，在各连接任务间共享。
pub struct Site {
    title: String,
    routes: RouteTable,
    nav: Vec<NavLink>,
    patterns: Mutex<PatternCache>,
}

impl Site {
    pub fn from_config(config: &Config) -> Self {
        let nav = config
            .nav()
            .iter()
            .map(|item| NavLink {
                caption: item.caption.clone(),
                target: item.target(),
                options: item.options(),
            })
            .collect::<Vec<_>>();
        let routes = RouteTable::new(config.routes());
        debug!("站点载入{}条路由、{}个导航项", routes.len(), nav.len());
        Self {
            title: config.site_title().to_string(),
            routes,
            nav,
            patterns: Mutex::new(PatternCache::from_capacity(config.cache_size())),
        }
    }

    pub fn recognize(&self, path: &str) -> Result<&RouteEntry, Exception> {
        self.routes.recognize(path)
    }

    fn view<'a>(&'a self, entry: &'a RouteEntry, path: &'a str) -> ViewContext<'a> {
        ViewContext::new(entry.route(), path, &self.routes)
            .with_pattern_cache(&self.patterns)
            .with_extra_body_class(entry.extra_body_class())
    }

    fn page_title(&self, entry: &RouteEntry) -> String {
        match entry.title() {
            Some(t) => format!("{} - {}", t, self.title),
            None => self.title.clone(),
        }
    }

    /// 渲染完整的 HTML 页面
    pub fn render_html(&self, entry: &RouteEntry, path: &str) -> String {
        let view = self.view(entry, path);
        let nav: String = self
            .nav
            .iter()
            .map(|link| view.smart_link_to(&link.caption, &link.target, &link.options))
            .collect();
        let route = entry.route();
        let heading = entry.title().unwrap_or(&route.controller);
        let main = format!(
            "<h1>{}</h1><p><code>{}#{}</code></p>",
            html_escape(heading),
            html_escape(&route.controller),
            html_escape(&route.action)
        );
        HtmlBuilder::page(&self.page_title(entry), &view.body_class(), &nav, &main).build()
    }

    /// 页面上下文
    pub fn context<'a>(&'a self, entry: &'a RouteEntry, path: &'a str) -> PageContext<'a> {
        let view = self.view(entry, path);
        let nav = self
            .nav
            .iter()
            .map(|link| {
                let url = view.url_for(&link.target);
                let active = view.is_active(&url, &link.options);
                NavState {
                    caption: link.caption.clone(),
                    url,
                    active,
                }
            })
            .collect();
        PageContext {
            title: self.page_title(entry),
            body_class: view.body_class(),
            route: entry.route(),
            path: view.request_path(),
            nav,
        }
    }

    /// 渲染 JSON 形式的页面上下文
    pub fn render_json(&self, entry: &RouteEntry, path: &str) -> String {
        match serde_json::to_string(&self.context(entry, path)) {
            Ok(json) => json,
            Err(e) => {
                error!("序列化页面上下文失败：{}", e);
                "{}".to_string()
            }
        }
    }
}
