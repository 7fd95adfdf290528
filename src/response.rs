// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 响应构建
//!
//! 请求最终只会得到三类响应：渲染好的页面（HTML 或 JSON）、状态页，以及 OPTIONS 的空响应。
//! 响应体按客户端给出的编码顺序压缩。HEAD 请求不压缩，只报告原文长度。

use std::io::{self, Write};

use brotli::enc::{self, backward_references::BrotliEncoderParams};
use bytes::Bytes;
use chrono::prelude::*;
use flate2::{
    write::{DeflateEncoder, GzEncoder},
    Compression,
};
use log::{debug, error, warn};

use crate::{
    exception::Exception,
    param::{
        ContentEncoding, Method, ALLOWED_METHODS, CRLF, HTTP_VERSION, MIME_HTML, MIME_JSON,
        SERVER_NAME, STATUS_CODES,
    },
    request::Request,
    util::HtmlBuilder,
    view::Site,
};

#[derive(Debug, Clone)]
pub struct Response {
    status_code: u16,
    content_type: Option<&'static str>,
    content_encoding: Option<ContentEncoding>,
    content_length: usize,
    content: Option<Bytes>,
    /// 是否附带 `Allow` 头
    allow: bool,
    date: DateTime<Utc>,
}

impl Response {
    fn with_status(status_code: u16) -> Self {
        Self {
            status_code,
            content_type: None,
            content_encoding: None,
            content_length: 0,
            content: None,
            allow: false,
            date: Utc::now(),
        }
    }

    /// 写入响应体并按 `accept_encoding` 压缩，压缩失败时回退为原文
    fn with_body(
        mut self,
        body: String,
        mime: &'static str,
        accept_encoding: &[ContentEncoding],
        id: u128,
    ) -> Self {
        let body = body.into_bytes();
        let mut encoding = negotiate(accept_encoding);
        let content = match compress(&body, encoding) {
            Ok(compressed) => {
                debug!(
                    "[ID{}]响应体编码：{:?}，{} -> {} bytes",
                    id,
                    encoding,
                    body.len(),
                    compressed.len()
                );
                compressed
            }
            Err(e) => {
                error!("[ID{}]压缩响应体失败: {}，返回未压缩内容", id, e);
                encoding = None;
                body
            }
        };
        self.content_type = Some(mime);
        self.content_encoding = encoding;
        self.content_length = content.len();
        self.content = Some(Bytes::from(content));
        self
    }

    /// 保留长度等报文头，去掉响应体
    fn without_body(mut self) -> Self {
        self.content = None;
        self
    }

    /// 带说明文字的状态页
    pub fn status_page(code: u16, accept_encoding: &[ContentEncoding], id: u128) -> Self {
        let note = match code {
            404 => Some("<h2>噢！</h2><p>你指定的网页无法找到。</p>"),
            405 => Some("<h2>噢！</h2><p>本站点只支持GET、HEAD与OPTIONS方法。</p>"),
            500 => Some("<h2>噢！</h2><p>服务器出现了一个内部错误。</p>"),
            _ => None,
        };
        let page = HtmlBuilder::from_status_code(code, note).build();
        let mut response = Self::with_status(code).with_body(page, MIME_HTML, accept_encoding, id);
        response.allow = code == 405;
        response
    }

    /// 请求无法解析时没有可用的编码列表，因此不压缩
    pub fn bad_request(id: u128) -> Self {
        Self::status_page(400, &[], id)
    }

    /// OPTIONS 的应答
    pub fn no_content() -> Self {
        let mut response = Self::with_status(204);
        response.allow = true;
        response
    }

    /// 渲染请求对应的页面。
    ///
    /// 路由识别失败时返回 404；客户端首选 JSON 时返回页面上下文。
    pub fn from_page(request: &Request, id: u128, site: &Site) -> Self {
        let method = request.method();
        if !method.is_allowed() {
            warn!("[ID{}]不允许的请求方法：{}，返回405", id, method);
            return Self::status_page(405, request.accept_encoding(), id);
        }
        if method == Method::Options {
            return Self::no_content();
        }

        let head_only = method == Method::Head;
        let accept_encoding: &[ContentEncoding] = match head_only {
            true => &[],
            false => request.accept_encoding(),
        };
        let path = request.path();

        let response = match site.recognize(path) {
            Ok(entry) if request.wants_json() => {
                debug!("[ID{}]返回JSON页面上下文", id);
                let body = site.render_json(entry, path);
                Self::with_status(200).with_body(body, MIME_JSON, accept_encoding, id)
            }
            Ok(entry) => {
                let body = site.render_html(entry, path);
                Self::with_status(200).with_body(body, MIME_HTML, accept_encoding, id)
            }
            Err(Exception::RouteNotFound) => {
                warn!("[ID{}]路径{}没有对应的路由，返回404", id, path);
                Self::status_page(404, accept_encoding, id)
            }
            Err(e) => {
                error!("[ID{}]识别路由时发生未知异常: {}", id, e);
                Self::status_page(500, accept_encoding, id)
            }
        };
        match head_only {
            true => response.without_body(),
            false => response,
        }
    }

    /// 状态行之后、空行之前的全部报文头
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::with_capacity(6);
        if let Some(content_type) = self.content_type {
            headers.push(("Content-Type", content_type.to_string()));
        }
        if let Some(encoding) = self.content_encoding {
            headers.push(("Content-Encoding", encoding.to_string()));
        }
        headers.push(("Content-Length", self.content_length.to_string()));
        headers.push(("Date", self.date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()));
        headers.push(("Server", SERVER_NAME.to_string()));
        if self.allow {
            let methods: Vec<&str> = ALLOWED_METHODS.iter().map(Method::as_str).collect();
            headers.push(("Allow", methods.join(", ")));
        }
        headers
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let mut head = format!("{} {} {}{}", HTTP_VERSION, self.status_code, self.information(), CRLF);
        for (name, value) in self.headers() {
            head.push_str(&format!("{}: {}{}", name, value, CRLF));
        }
        head.push_str(CRLF);

        let mut bytes = head.into_bytes();
        if let Some(content) = &self.content {
            bytes.extend_from_slice(content);
        }
        bytes
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &'static str {
        STATUS_CODES
            .get(&self.status_code)
            .copied()
            .unwrap_or("Unknown Status")
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type
    }

    pub fn content_encoding(&self) -> Option<ContentEncoding> {
        self.content_encoding
    }

    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }
}

// Brotli 暂不参与协商
fn negotiate(accept_encoding: &[ContentEncoding]) -> Option<ContentEncoding> {
    accept_encoding
        .iter()
        .copied()
        .find(|&e| e != ContentEncoding::Br)
}

fn compress(data: &[u8], encoding: Option<ContentEncoding>) -> io::Result<Vec<u8>> {
    match encoding {
        None => Ok(data.to_vec()),
        Some(ContentEncoding::Gzip) => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
        Some(ContentEncoding::Deflate) => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
        Some(ContentEncoding::Br) => {
            let mut output = Vec::new();
            enc::BrotliCompress(&mut &data[..], &mut output, &BrotliEncoderParams::default())?;
            Ok(output)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::GzDecoder;

    use super::*;
    use crate::config::Config;

    fn request(raw: &str) -> Request {
        Request::try_from(raw.as_bytes(), 1).unwrap()
    }

    fn site() -> Site {
        let config = Config::from_toml_str(
            r#"
            port = 7878
            worker_threads = 1
            cache_size = 8
            local = true

            [[route]]
            path = "/"
            to = "home#index"

            [[nav]]
            caption = "Home"
            path = "/"
            strict = true
            "#,
        )
        .unwrap();
        Site::from_config(&config)
    }

    fn text(response: &Response) -> String {
        String::from_utf8_lossy(&response.as_bytes()).into_owned()
    }

    #[test]
    fn test_negotiate_follows_client_order() {
        use ContentEncoding::*;
        assert_eq!(negotiate(&[Deflate, Gzip]), Some(Deflate));
        assert_eq!(negotiate(&[Br, Gzip]), Some(Gzip));
        assert_eq!(negotiate(&[Br]), None);
        assert_eq!(negotiate(&[]), None);
    }

    #[test]
    fn test_compressed_output_is_smaller() {
        let data = vec![b'A'; 10000];
        for encoding in [ContentEncoding::Gzip, ContentEncoding::Deflate, ContentEncoding::Br] {
            assert!(compress(&data, Some(encoding)).unwrap().len() < data.len());
        }
        assert_eq!(compress(&data, None).unwrap(), data);
    }

    #[test]
    fn test_html_page() {
        let response = Response::from_page(&request("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n"), 1, &site());
        let body = String::from_utf8_lossy(response.content().unwrap()).into_owned();

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.content_type(), Some(MIME_HTML));
        assert!(body.contains(r#"<body class="home _index">"#));
        assert!(body.contains(r#"<li class="active"><a href="/">Home</a></li>"#));
    }

    #[test]
    fn test_json_page_context() {
        let req = request("GET /?x=1 HTTP/1.1\r\nAccept: application/json\r\n\r\n");
        let response = Response::from_page(&req, 1, &site());
        let body: serde_json::Value = serde_json::from_slice(response.content().unwrap()).unwrap();

        assert_eq!(response.content_type(), Some(MIME_JSON));
        assert_eq!(body["body_class"], "home _index");
        assert_eq!(body["nav"][0]["active"], true);
    }

    #[test]
    fn test_html_preferred_over_low_weight_json() {
        let req = request("GET / HTTP/1.1\r\nAccept: text/html,application/json;q=0.1\r\n\r\n");
        let response = Response::from_page(&req, 1, &site());
        assert_eq!(response.content_type(), Some(MIME_HTML));
    }

    #[test]
    fn test_gzip_page_round_trips() {
        let req = request("GET / HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n");
        let response = Response::from_page(&req, 1, &site());
        assert_eq!(response.content_encoding(), Some(ContentEncoding::Gzip));
        assert!(text(&response).contains("Content-Encoding: gzip\r\n"));

        let mut html = String::new();
        GzDecoder::new(&response.content().unwrap()[..])
            .read_to_string(&mut html)
            .unwrap();
        assert!(html.contains(r#"<body class="home _index">"#));
    }

    #[test]
    fn test_head_reports_plain_length_without_body() {
        let get = Response::from_page(&request("GET / HTTP/1.1\r\n\r\n"), 1, &site());
        let head = Response::from_page(
            &request("HEAD / HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n"),
            1,
            &site(),
        );
        let raw = text(&head);

        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(raw.ends_with("\r\n\r\n"));
        assert!(head.content().is_none());
        assert_eq!(head.content_encoding(), None);
        assert!(raw.contains(&format!("Content-Length: {}\r\n", get.content().unwrap().len())));
    }

    #[test]
    fn test_unknown_route_is_404() {
        let response = Response::from_page(&request("GET /missing HTTP/1.1\r\n\r\n"), 1, &site());
        assert_eq!(response.status_code(), 404);
        assert!(String::from_utf8_lossy(response.content().unwrap()).contains("404"));

        let head = Response::from_page(&request("HEAD /missing HTTP/1.1\r\n\r\n"), 1, &site());
        assert_eq!(head.status_code(), 404);
        assert!(head.content().is_none());
    }

    #[test]
    fn test_options_is_204_with_allow() {
        let response = Response::from_page(&request("OPTIONS * HTTP/1.1\r\n\r\n"), 1, &site());
        let raw = text(&response);

        assert_eq!(response.status_code(), 204);
        assert!(raw.contains("Allow: GET, HEAD, OPTIONS\r\n"));
        assert!(raw.contains("Content-Length: 0\r\n"));
        assert!(!raw.contains("Content-Type"));
    }

    #[test]
    fn test_disallowed_method_is_405_with_allow() {
        for raw in ["POST / HTTP/1.1\r\nContent-Length: 0\r\n\r\n", "DELETE / HTTP/1.1\r\n\r\n"] {
            let response = Response::from_page(&request(raw), 1, &site());
            assert_eq!(response.status_code(), 405);
            assert!(text(&response).contains("Allow: GET, HEAD, OPTIONS\r\n"));
        }
    }

    #[test]
    fn test_bad_request() {
        let response = Response::bad_request(3);
        let raw = text(&response);

        assert!(raw.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(raw.contains("Server: navserver\r\n"));
        assert!(raw.contains(" GMT\r\n"));
        assert!(!raw.contains("Allow:"));
    }

    #[test]
    fn test_unknown_status_information() {
        assert_eq!(Response::with_status(418).information(), "Unknown Status");
    }
}
