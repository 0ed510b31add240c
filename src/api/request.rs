// api/request.rs - 列表请求类型
//! 将扁平查询字符串拆分为分页参数、排序参数和过滤条件

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::engine::{EngineError, EngineResult};
use crate::query::{Criteria, CriteriaParser, SortOrder};
use crate::schema::Record;

/// 分页请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 页码，从 0 开始
    pub page: usize,
    /// 每页数量，> 0
    pub size: usize,
    /// 排序键（按优先级）
    #[serde(default)]
    pub sort: Vec<SortOrder>,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size, sort: Vec::new() }
    }

    pub fn with_sort(mut self, order: SortOrder) -> Self {
        self.sort.push(order);
        self
    }

    /// 跳过的记录数
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    /// 检查 size 在 1..=max 之间
    pub fn validate(&self, max_size: usize) -> EngineResult<()> {
        if self.size == 0 {
            return Err(EngineError::InvalidPageRequest("page size must be greater than 0".to_string()));
        }
        if self.size > max_size {
            return Err(EngineError::InvalidPageRequest(format!(
                "page size {} exceeds maximum {}",
                self.size, max_size
            )));
        }
        Ok(())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, 20)
    }
}

/// 解析选项
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// 直接忽略的参数（如前端的 cacheBuster）
    pub ignored_params: Vec<String>,
}

impl RequestOptions {
    pub fn from_config(pagination: &PaginationConfig, ignored_params: &[String]) -> Self {
        Self {
            default_page_size: pagination.default_page_size,
            max_page_size: pagination.max_page_size,
            ignored_params: ignored_params.to_vec(),
        }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 2000,
            ignored_params: vec!["cacheBuster".to_string(), "eagerload".to_string()],
        }
    }
}

/// 列表请求：过滤条件 + 分页
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub criteria: Criteria,
    pub page: PageRequest,
}

impl ListRequest {
    /// 解析查询字符串，例如 `name.contains=AA&page=1&size=5&sort=id,desc`
    pub fn parse<R: Record>(query: &str, options: &RequestOptions) -> EngineResult<Self> {
        let parser = CriteriaParser::<R>::new();
        let mut criteria = Criteria::new();
        let mut page = PageRequest::new(0, options.default_page_size);

        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match &*key {
                "page" => page.page = parse_number("page", &value)?,
                "size" => page.size = parse_number("size", &value)?,
                "sort" => page.sort.extend(parse_sort(&value)?),
                k if options.ignored_params.iter().any(|p| p == k) => {}
                k => parser.apply_param(&mut criteria, k, &value)?,
            }
        }

        page.validate(options.max_page_size)?;
        Ok(Self { criteria, page })
    }
}

fn parse_number(name: &str, raw: &str) -> EngineResult<usize> {
    raw.trim()
        .parse()
        .map_err(|_| EngineError::InvalidPageRequest(format!("invalid {} value: {:?}", name, raw)))
}

/// 解析 `sort=field[,field..][,asc|desc]`，方向作用于前面所有字段
pub fn parse_sort(raw: &str) -> EngineResult<Vec<SortOrder>> {
    let mut parts: Vec<&str> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();

    let ascending = match parts.last().map(|s| s.to_ascii_lowercase()) {
        Some(dir) if dir == "asc" => {
            parts.pop();
            true
        }
        Some(dir) if dir == "desc" => {
            parts.pop();
            false
        }
        _ => true,
    };

    if parts.is_empty() {
        return Err(EngineError::InvalidPageRequest(format!("invalid sort value: {:?}", raw)));
    }

    Ok(parts
        .into_iter()
        .map(|field| SortOrder { field: field.to_string(), ascending })
        .collect())
}
