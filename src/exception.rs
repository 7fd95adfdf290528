// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了服务器在请求处理、路由识别以及配置加载过程中可能出现的各类异常情况。
//!
//! 视图辅助函数本身没有错误路径（缺失的选项一律回退为默认值），
//! 因此这里的变体主要服务于协议解析、路由与配置层。

use std::fmt;

/// 服务器处理请求过程中发生的异常类型。
///
/// 该枚举通常作为 `Result` 的 `Err` 部分返回，用于指示处理失败的具体原因。
#[derive(Debug, Clone, PartialEq)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行中的方法名无法识别。
    UnSupportedRequestMethod,
    /// 请求行不是 `方法 目标 版本` 三段。
    MalformedRequestLine,
    /// 客户端使用了服务器不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 路由表中没有与请求路径匹配的条目。对应 `404 Not Found`。
    RouteNotFound,
    /// 配置中给出的正则表达式无法编译。携带出错的模式串。
    InvalidPattern(String),
    /// 配置文件无法读取。
    ConfigUnreadable(String),
    /// 配置文件内容不是合法的 TOML 或字段不匹配。
    ConfigMalformed(String),
}

use Exception::*;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            MalformedRequestLine => write!(f, "Malformed request line"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            RouteNotFound => write!(f, "No route matches the request path (404)"),
            InvalidPattern(p) => write!(f, "Invalid active pattern: {}", p),
            ConfigUnreadable(e) => write!(f, "Couldn't read config file: {}", e),
            ConfigMalformed(e) => write!(f, "Malformed config file: {}", e),
        }
    }
}

impl std::error::Error for Exception {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_detail() {
        let e = Exception::InvalidPattern("([".to_string());
        assert_eq!(e.to_string(), "Invalid active pattern: ([");
        assert!(Exception::RouteNotFound.to_string().contains("404"));
    }
}
