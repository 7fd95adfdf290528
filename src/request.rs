// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求解析
//!
//! 只读取渲染页面要用到的部分：请求行、`Accept`、`Accept-Encoding` 与 `User-Agent`。
//! 请求目标在解析时就拆成路径与查询串，路由识别和导航激活判断只看路径。
//! 报文头之后的内容一律忽略。

use log::{debug, error};

use crate::{
    exception::Exception,
    param::{ContentEncoding, Method, CRLF, HTTP_VERSION, MIME_JSON},
};

/// `Accept` 中的一项
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    pub media_type: String,
    pub quality: f32,
}

#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    target: String,
    path: String,
    query: Option<String>,
    user_agent: String,
    accept: Vec<MediaRange>,
    /// 按客户端给出的顺序，权重为 0 的编码不在其中
    accept_encoding: Vec<ContentEncoding>,
}

impl Request {
    /// 从读缓冲区解析请求。`id` 只用于日志。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        // 读缓冲区尾部的填充零字节不属于报文
        let end = buffer.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        let text = std::str::from_utf8(&buffer[..end]).map_err(|_| {
            error!("[ID{}]请求不是合法的UTF-8", id);
            Exception::RequestIsNotUtf8
        })?;
        let head = match text.split_once("\r\n\r\n") {
            Some((head, _)) => head,
            None => text,
        };

        let mut lines = head.split(CRLF);
        let (method, target) = parse_request_line(lines.next().unwrap_or(""), id)?;
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p.to_string(), Some(q.to_string())),
            None => (target.clone(), None),
        };

        let mut request = Self {
            method,
            target,
            path,
            query,
            user_agent: String::new(),
            accept: vec![],
            accept_encoding: vec![],
        };
        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "user-agent" => request.user_agent = value.to_string(),
                "accept" => request.accept = parse_accept(value),
                "accept-encoding" => request.accept_encoding = parse_accept_encoding(value),
                _ => {}
            }
        }
        debug!("[ID{}]请求解析完成：{} {}", id, request.method, request.target);
        Ok(request)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// 原始请求目标，含查询串
    pub fn target(&self) -> &str {
        &self.target
    }

    /// 不含查询串的路径，等价于框架中的 `request.path`
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn accept(&self) -> &[MediaRange] {
        &self.accept
    }

    pub fn accept_encoding(&self) -> &[ContentEncoding] {
        &self.accept_encoding
    }

    /// 权重最高的媒体类型是 JSON 时返回页面上下文。权重相同时取先出现的一项。
    pub fn wants_json(&self) -> bool {
        let mut best: Option<&MediaRange> = None;
        for range in &self.accept {
            if best.map_or(true, |b| range.quality > b.quality) {
                best = Some(range);
            }
        }
        best.map_or(false, |r| r.media_type == MIME_JSON && r.quality > 0.0)
    }
}

fn parse_request_line(line: &str, id: u128) -> Result<(Method, String), Exception> {
    let parts: Vec<&str> = line.split(' ').collect();
    let &[method, target, version] = parts.as_slice() else {
        error!("[ID{}]请求行格式不正确：{}", id, line);
        return Err(Exception::MalformedRequestLine);
    };
    if !version.eq_ignore_ascii_case(HTTP_VERSION) {
        error!("[ID{}]不支持的HTTP协议版本：{}", id, version);
        return Err(Exception::UnsupportedHttpVersion);
    }
    let method = method.parse::<Method>().map_err(|e| {
        error!("[ID{}]不支持的HTTP请求方法：{}", id, method);
        e
    })?;
    Ok((method, target.to_string()))
}

/// 拆分 `a;q=0.5, b` 形式的列表，缺省权重为 1
fn weighted(value: &str) -> impl Iterator<Item = (&str, f32)> + '_ {
    value.split(',').filter_map(|item| {
        let mut params = item.split(';');
        let name = params.next()?.trim();
        if name.is_empty() {
            return None;
        }
        let quality = params
            .filter_map(|p| p.trim().strip_prefix("q="))
            .find_map(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);
        Some((name, quality))
    })
}

fn parse_accept(value: &str) -> Vec<MediaRange> {
    weighted(value)
        .map(|(media_type, quality)| MediaRange {
            media_type: media_type.to_ascii_lowercase(),
            quality,
        })
        .collect()
}

fn parse_accept_encoding(value: &str) -> Vec<ContentEncoding> {
    weighted(value)
        .filter(|&(_, quality)| quality > 0.0)
        .filter_map(|(token, _)| ContentEncoding::from_token(token))
        .collect()
}
