use std::num::NonZeroUsize;

use log::debug;
use lru::LruCache;
use regex::Regex;

use crate::exception::Exception;

/// 当配置给出的容量为 0 时使用的回退容量
pub const DEFAULT_PATTERN_CAPACITY: usize = 64;

/// 已编译的激活判断正则的 LRU 缓存。
///
/// 每次渲染导航菜单时，每个链接都会从目标 URL 推导出一个 `^/path` 形式的模式。
/// 同一批链接在每个请求中都会重复出现，编译结果按模式源码缓存即可。
pub struct PatternCache {
    cache: LruCache<String, Regex>,
}

impl PatternCache {
    // 根据容量构造，0 回退为默认容量
    pub fn from_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or(NonZeroUsize::MIN.saturating_add(DEFAULT_PATTERN_CAPACITY - 1));
        Self {
            cache: LruCache::new(capacity),
        }
    }

    // 查询，未命中时编译并放入
    pub fn compile(&mut self, source: &str) -> Result<Regex, Exception> {
        if let Some(re) = self.cache.get(source) {
            return Ok(re.clone());
        }
        debug!("编译激活模式：{}", source);
        let re = Regex::new(source).map_err(|_| Exception::InvalidPattern(source.to_string()))?;
        self.cache.put(source.to_string(), re.clone());
        Ok(re)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}
