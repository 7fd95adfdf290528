// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 协议常量
//!
//! 站点只说 HTTP/1.1。页面路由只接受 GET、HEAD 与 OPTIONS，
//! 其他能识别的方法返回 405，识别不了的方法按坏请求处理。

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;

use crate::exception::Exception;

pub const SERVER_NAME: &str = "navserver";
pub const HTTP_VERSION: &str = "HTTP/1.1";
pub const CRLF: &str = "\r\n";

pub const MIME_HTML: &str = "text/html;charset=utf-8";
pub const MIME_JSON: &str = "application/json";

lazy_static! {
    /// 页面路由接受的方法，也是 `Allow` 头的内容
    pub static ref ALLOWED_METHODS: Vec<Method> = vec![Method::Get, Method::Head, Method::Options];

    /// 站点会产生的状态码及原因短语
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = [
        (200, "OK"),
        (204, "No Content"),
        (400, "Bad Request"),
        (404, "Not Found"),
        (405, "Method Not Allowed"),
        (500, "Internal Server Error"),
    ]
    .into_iter()
    .collect();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    pub fn is_allowed(&self) -> bool {
        ALLOWED_METHODS.contains(self)
    }
}

impl FromStr for Method {
    type Err = Exception;

    /// 方法名不区分大小写
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            _ => Err(Exception::UnSupportedRequestMethod),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 响应体的压缩编码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
    Deflate,
    Br,
}

impl ContentEncoding {
    /// `Accept-Encoding` 中的一个编码名，不认识的返回 `None`
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "gzip" | "x-gzip" => Some(ContentEncoding::Gzip),
            "deflate" => Some(ContentEncoding::Deflate),
            "br" => Some(ContentEncoding::Br),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentEncoding::Gzip => "gzip",
            ContentEncoding::Deflate => "deflate",
            ContentEncoding::Br => "br",
        }
    }
}

impl fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
