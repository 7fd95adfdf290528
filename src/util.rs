use std::borrow::Cow;

use crate::param::STATUS_CODES;

/// 转义 HTML 特殊字符。
///
/// 没有需要转义的字符时直接借用原字符串。
pub fn html_escape(s: &str) -> Cow<'_, str> {
    if s.contains(['&', '<', '>', '"', '\'']) {
        let mut escaped = String::with_capacity(s.len() + 8);
        for c in s.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&#x27;"),
                _ => escaped.push(c),
            }
        }
        Cow::Owned(escaped)
    } else {
        Cow::Borrowed(s)
    }
}

/// 生成一个完整的元素：`<name k="v" ...>inner</name>`。
///
/// 属性值会被转义，`inner` 视为已经安全的标记原样写入。
pub fn content_tag(name: &str, attrs: &[(String, String)], inner: &str) -> String {
    let mut tag = String::with_capacity(inner.len() + 32);
    tag.push('<');
    tag.push_str(name);
    for (key, value) in attrs {
        tag.push(' ');
        tag.push_str(key);
        tag.push_str("=\"");
        tag.push_str(&html_escape(value));
        tag.push('"');
    }
    tag.push('>');
    tag.push_str(inner);
    tag.push_str("</");
    tag.push_str(name);
    tag.push('>');
    tag
}

pub struct HtmlBuilder {
    title: String,
    css: String,
    body_class: String,
    body: String,
}

const BASE_CSS: &str = r"
            body {
                width: 48em;
                margin: 0 auto;
                font-family: Tahoma, Verdana, Arial, sans-serif;
            }
            ul.nav {
                list-style: none;
                padding: 0;
                display: flex;
                gap: 1em;
            }
            ul.nav li.active a {
                font-weight: bold;
            }
            ul.nav li.pull-right {
                margin-left: auto;
            }
            .badge {
                border-radius: 1em;
                padding: 0 0.5em;
                background: #999;
                color: #fff;
            }
            ";

impl HtmlBuilder {
    pub fn from_status_code(code: u16, note: Option<&str>) -> Self {
        let title = format!("{}", code);
        let description = match note {
            Some(n) => n,
            None => STATUS_CODES.get(&code).copied().unwrap_or("Unknown Status"),
        };
        let body = format!(
            r"
            <h1>{}</h1>
            <p>{}</p>
            ",
            code, description
        );
        Self {
            title,
            css: BASE_CSS.to_string(),
            body_class: "".to_string(),
            body,
        }
    }

    /// 站点布局：导航菜单在上，页面内容在下。
    /// `nav` 与 `main` 都是已经渲染好的标记。
    pub fn page(title: &str, body_class: &str, nav: &str, main: &str) -> Self {
        let body = format!(
            r#"
                    <ul class="nav">{}</ul>
                    <main>{}</main>
            "#,
            nav, main
        );
        Self {
            title: html_escape(title).into_owned(),
            css: BASE_CSS.to_string(),
            body_class: body_class.to_string(),
            body,
        }
    }

    pub fn build(&self) -> String {
        let body_open = if self.body_class.is_empty() {
            "<body>".to_string()
        } else {
            format!(r#"<body class="{}">"#, html_escape(&self.body_class))
        };
        format!(
            r##"<!DOCTYPE html>
            <html>
                <head>
                    <meta charset="utf-8">
                    <title>{}</title>
                    <style>{}</style>
                </head>
                {}
                {}
                </body>
            </html>"##,
            self.title, self.css, body_open, self.body
        )
    }
}
