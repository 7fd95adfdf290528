use num_cpus;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs::File;
use std::io::prelude::*;

use crate::{exception::Exception, routing::RouteSpec, view::NavItem};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_site_title")]
    site_title: String,
    port: u16,
    worker_threads: usize,
    cache_size: usize,
    local: bool,
    #[serde(default, rename = "route")]
    routes: Vec<RouteSpec>,
    #[serde(default, rename = "nav")]
    nav: Vec<NavItem>,
}

fn default_site_title() -> String {
    "navserver".to_string()
}

impl Config {
    pub fn new() -> Self {
        Self {
            site_title: default_site_title(),
            port: 7878,
            worker_threads: 0,
            cache_size: 64,
            local: true,
            routes: vec![RouteSpec {
                path: "/".to_string(),
                to: "home#index".to_string(),
                name: Some("root".to_string()),
                title: None,
                extra_body_class: None,
            }],
            nav: vec![],
        }
        .normalized()
    }

    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let mut file = File::open(filename)
            .map_err(|e| Exception::ConfigUnreadable(format!("{}: {}", filename, e)))?;
        let mut str_val = String::new();
        file.read_to_string(&mut str_val)
            .map_err(|e| Exception::ConfigUnreadable(format!("{}: {}", filename, e)))?;
        Self::from_toml_str(&str_val)
    }

    pub fn from_toml_str(str_val: &str) -> Result<Self, Exception> {
        match toml::from_str::<Config>(str_val) {
            Ok(raw_config) => Ok(raw_config.normalized()),
            Err(e) => {
                error!("无法成功从配置文件构建配置对象：{}", e);
                Err(Exception::ConfigMalformed(e.to_string()))
            }
        }
    }

    fn normalized(mut self) -> Self {
        if self.worker_threads == 0 {
            self.worker_threads = num_cpus::get();
        }
        if self.cache_size == 0 {
            warn!("cache_size被设置为0，但模式缓存不能被禁用，因此该值将被改为64。");
            self.cache_size = 64;
        }
        if self.routes.is_empty() {
            warn!("配置中没有任何路由，所有页面都将返回404");
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn site_title(&self) -> &str {
        &self.site_title
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn routes(&self) -> &[RouteSpec] {
        &self.routes
    }

    pub fn nav(&self) -> &[NavItem] {
        &self.nav
    }
}
