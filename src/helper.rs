// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 视图辅助函数
//!
//! 两个给页面模板使用的函数：
//!
//! - [`body_class`]：根据当前路由给 `<body>` 生成 CSS 作用域类名，
//!   顺序为 控制器、`_`+动作、命名空间、额外类名。
//! - [`ViewContext::smart_link_to`]：配合 Bootstrap 风格的 nav，
//!   把普通链接包进 `<li>`，并在当前页面与链接指向的位置相同时给 `<li>` 加上 `active`。
//!
//! 默认情况下，凡是以链接路径开头的请求路径都算激活，例如指向 `/admin/users` 的链接
//! 在 `/admin/users`、`/admin/users/1`、`/admin/users/new` 上都会高亮。
//! 不需要这种行为时可以传入自己的 `pattern`，或设置 `strict` 只做精确匹配：
//!
//! ```
//! use navserver::helper::{LinkOptions, ViewContext};
//! use navserver::routing::{LinkTarget, Route, RouteTable};
//!
//! let route = Route::new("home", "index");
//! let urls = RouteTable::default();
//! let view = ViewContext::new(&route, "/", &urls);
//! let home = view.smart_link_to("Home", &LinkTarget::path("/"), &LinkOptions::new().strict());
//! assert_eq!(home, r#"<li class="active"><a href="/">Home</a></li>"#);
//! ```

use std::sync::Mutex;

use log::{debug, error, warn};
use regex::Regex;

use crate::{
    cache::PatternCache,
    exception::Exception,
    routing::{LinkTarget, Route, UrlFor},
    util::{content_tag, html_escape},
};

/// 根据路由上下文生成 `<body>` 的类名。
///
/// 纯函数，没有错误路径：没有命名空间或额外类名为空白时对应的词元直接省略。
pub fn body_class(route: &Route, extra: Option<&str>) -> String {
    let mut tokens = vec![route.controller.clone(), format!("_{}", route.action)];
    if let Some(namespace) = &route.namespace {
        tokens.push(namespace.to_lowercase());
    }
    if let Some(extra) = extra.map(str::trim).filter(|e| !e.is_empty()) {
        tokens.push(extra.to_string());
    }
    tokens.join(" ")
}

/// 链接文字。
#[derive(Debug, Clone, PartialEq)]
pub enum Caption {
    /// 纯文本，渲染时转义
    Text(String),
    /// 由代码块渲染得到的标记，原样写入
    Html(String),
}

impl Caption {
    fn into_html(self) -> String {
        match self {
            Caption::Text(t) => html_escape(&t).into_owned(),
            Caption::Html(h) => h,
        }
    }
}

/// `smart_link_to` 的全部选项，缺省值都是空操作。
#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    /// `<a>` 的 class
    pub class: Option<String>,
    /// `<a>` 的其他属性
    pub attrs: Vec<(String, String)>,
    /// `<li>` 的 class，按空白拆分后放在最前面
    pub wrapper_class: Option<String>,
    /// `<li>` 的其他属性
    pub wrapper_attrs: Vec<(String, String)>,
    /// 推导激活模式前先去掉 URL 的查询串
    pub just_path: bool,
    /// 自定义激活模式，给出后不再从 URL 推导
    pub pattern: Option<Regex>,
    /// 推导出的模式要求整段匹配
    pub strict: bool,
    /// 大于 0 时在文字后追加徽标
    pub count: Option<i64>,
    /// Font Awesome 图标名
    pub icon: Option<String>,
    pub when_buying: Option<String>,
    /// 在这些断点下隐藏
    pub hide: Vec<String>,
    /// 在这些断点下显示
    pub show: Vec<String>,
    pub tooltip: Option<String>,
    /// 无论路径是否匹配都标记为激活
    pub force_active: bool,
    pub pull_right: bool,
    pub action: bool,
}

impl LinkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn wrapper_class(mut self, class: &str) -> Self {
        self.wrapper_class = Some(class.to_string());
        self
    }

    pub fn wrapper_attr(mut self, key: &str, value: &str) -> Self {
        self.wrapper_attrs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn just_path(mut self) -> Self {
        self.just_path = true;
        self
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn when_buying(mut self, tokens: &str) -> Self {
        self.when_buying = Some(tokens.to_string());
        self
    }

    pub fn hide(mut self, sizes: &[&str]) -> Self {
        self.hide = sizes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn show(mut self, sizes: &[&str]) -> Self {
        self.show = sizes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn tooltip(mut self, tooltip: &str) -> Self {
        self.tooltip = Some(tooltip.to_string());
        self
    }

    pub fn force_active(mut self) -> Self {
        self.force_active = true;
        self
    }

    pub fn pull_right(mut self) -> Self {
        self.pull_right = true;
        self
    }

    pub fn action(mut self) -> Self {
        self.action = true;
        self
    }
}

/// 计数徽标
pub fn decorate_pill(count: i64) -> String {
    content_tag(
        "span",
        &[("class".to_string(), "badge".to_string())],
        &count.to_string(),
    )
}

/// 从 URL 推导默认激活模式的源码：`^` + 转义后的 URL，严格模式再加 `$`。
pub fn default_pattern(url: &str, strict: bool) -> String {
    format!("^{}{}", regex::escape(url), if strict { "$" } else { "" })
}

fn split_classes(classes: Option<&str>) -> Vec<String> {
    classes
        .map(|c| c.split_whitespace().map(String::from).collect())
        .unwrap_or_default()
}

/// 属性列表里的 `class` 拆分后并入类名列表
fn classes_in(attrs: &[(String, String)]) -> Vec<String> {
    attrs
        .iter()
        .filter(|(k, _)| k == "class")
        .flat_map(|(_, v)| v.split_whitespace().map(String::from))
        .collect()
}

fn without<'o>(
    attrs: &'o [(String, String)],
    keys: &'o [&'o str],
) -> impl Iterator<Item = (String, String)> + 'o {
    attrs
        .iter()
        .filter(move |(k, _)| !keys.contains(&k.as_str()))
        .cloned()
}

/// 渲染时由宿主提供的上下文：当前路由、当前请求路径以及 URL 解析函数。
pub struct ViewContext<'a> {
    route: &'a Route,
    request_path: &'a str,
    urls: &'a dyn UrlFor,
    patterns: Option<&'a Mutex<PatternCache>>,
    extra_body_class: Option<&'a str>,
}

impl<'a> ViewContext<'a> {
    pub fn new(route: &'a Route, request_path: &'a str, urls: &'a dyn UrlFor) -> Self {
        // 与框架中的 request.path 一致，不含查询串
        let request_path = match request_path.split_once('?') {
            Some((p, _)) => p,
            None => request_path,
        };
        Self {
            route,
            request_path,
            urls,
            patterns: None,
            extra_body_class: None,
        }
    }

    pub fn with_pattern_cache(mut self, patterns: &'a Mutex<PatternCache>) -> Self {
        self.patterns = Some(patterns);
        self
    }

    pub fn with_extra_body_class(mut self, extra: Option<&'a str>) -> Self {
        self.extra_body_class = extra;
        self
    }

    pub fn route(&self) -> &'a Route {
        self.route
    }

    pub fn request_path(&self) -> &'a str {
        self.request_path
    }

    pub fn body_class(&self) -> String {
        body_class(self.route, self.extra_body_class)
    }

    pub fn url_for(&self, target: &LinkTarget) -> String {
        self.urls.url_for(target)
    }

    fn compile(&self, source: &str) -> Option<Regex> {
        let compiled = match self.patterns {
            Some(patterns) => {
                let mut lock = match patterns.lock() {
                    Ok(lock) => lock,
                    Err(poisoned) => {
                        warn!("模式缓存锁被污染，恢复并继续");
                        poisoned.into_inner()
                    }
                };
                lock.compile(source)
            }
            None => Regex::new(source).map_err(|_| Exception::InvalidPattern(source.to_string())),
        };
        match compiled {
            Ok(re) => Some(re),
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }

    /// 判断指向 `url` 的链接在当前请求下是否激活。
    pub fn is_active(&self, url: &str, options: &LinkOptions) -> bool {
        if options.force_active {
            return true;
        }
        let matched = match &options.pattern {
            Some(pattern) => pattern.is_match(self.request_path),
            None => {
                let url = if options.just_path {
                    url.split('?').next().unwrap_or(url)
                } else {
                    url
                };
                self.compile(&default_pattern(url, options.strict))
                    .map_or(false, |re| re.is_match(self.request_path))
            }
        };
        debug!("链接{}在路径{}下激活：{}", url, self.request_path, matched);
        matched
    }

    /// 文字形式的 `smart_link_to`，文字会被转义。
    pub fn smart_link_to(&self, caption: &str, target: &LinkTarget, options: &LinkOptions) -> String {
        self.render(Caption::Text(caption.to_string()), target, options)
    }

    /// 代码块形式的 `smart_link_to`，代码块返回的标记原样作为链接内容。
    pub fn smart_link_to_with<F>(&self, block: F, target: &LinkTarget, options: &LinkOptions) -> String
    where
        F: FnOnce() -> String,
    {
        self.render(Caption::Html(block()), target, options)
    }

    pub fn render(&self, caption: Caption, target: &LinkTarget, options: &LinkOptions) -> String {
        let url = self.urls.url_for(target);
        let mut caption = caption.into_html();

        let mut anchor_classes = split_classes(options.class.as_deref());
        anchor_classes.extend(classes_in(&options.attrs));
        if let Some(count) = options.count.filter(|&c| c > 0) {
            caption.push_str(&decorate_pill(count));
            anchor_classes.push("with-count".to_string());
        }
        if let Some(icon) = &options.icon {
            let icon_tag = content_tag(
                "i",
                &[("class".to_string(), format!("fa fa-fw fa-{}", icon))],
                "",
            );
            caption = format!("{} {}", icon_tag, caption);
        }

        let mut li_classes = split_classes(options.wrapper_class.as_deref());
        li_classes.extend(classes_in(&options.wrapper_attrs));
        if let Some(when_buying) = &options.when_buying {
            li_classes.extend(
                when_buying
                    .split_whitespace()
                    .map(|t| format!("{}-when-buying", t)),
            );
        }
        li_classes.extend(options.hide.iter().map(|size| format!("hide-{}", size)));
        li_classes.extend(options.show.iter().map(|size| format!("show-{}", size)));
        if self.is_active(&url, options) {
            li_classes.push("active".to_string());
        }
        if options.pull_right {
            li_classes.push("pull-right".to_string());
        }
        if options.action {
            li_classes.push("action".to_string());
        }

        let mut li_attrs = Vec::with_capacity(options.wrapper_attrs.len() + 3);
        if !li_classes.is_empty() {
            li_attrs.push(("class".to_string(), li_classes.join(" ")));
        }
        let tooltip_keys: &[&str] = match options.tooltip {
            Some(_) => &["class", "data-toggle", "data-title"],
            None => &["class"],
        };
        li_attrs.extend(without(&options.wrapper_attrs, tooltip_keys));
        if let Some(tooltip) = &options.tooltip {
            li_attrs.push(("data-toggle".to_string(), "tooltip".to_string()));
            li_attrs.push(("data-title".to_string(), tooltip.clone()));
        }

        let mut anchor_attrs = Vec::with_capacity(options.attrs.len() + 2);
        anchor_attrs.push(("href".to_string(), url));
        if !anchor_classes.is_empty() {
            anchor_attrs.push(("class".to_string(), anchor_classes.join(" ")));
        }
        anchor_attrs.extend(without(&options.attrs, &["class", "href"]));

        content_tag("li", &li_attrs, &content_tag("a", &anchor_attrs, &caption))
    }
}
