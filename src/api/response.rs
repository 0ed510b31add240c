// api/response.rs - 响应类型
//! 定义分页结果和错误响应

use serde::{Deserialize, Serialize};

use crate::engine::EngineError;
use crate::query::QueryError;

/// 一页结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// 当前页的记录
    pub content: Vec<T>,

    /// 总匹配数（不考虑分页）
    pub total_elements: usize,

    /// 分页信息
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total_elements: usize, page: usize, size: usize) -> Self {
        Self {
            pagination: Pagination::new(page, size, total_elements),
            content,
            total_elements,
        }
    }

    /// 转换记录类型，分页信息不变
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            pagination: self.pagination,
        }
    }
}

/// 分页信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub size: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(page: usize, size: usize, total: usize) -> Self {
        let total_pages = if size == 0 { 0 } else { total.div_ceil(size) };
        Self {
            page,
            size,
            total_pages,
            has_more: page.saturating_add(1) < total_pages,
        }
    }
}

/// 错误响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 对应的 HTTP 状态码
    pub status: u16,

    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<&EngineError> for ErrorResponse {
    fn from(err: &EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::Query(QueryError::UnknownFilterField { field }) => {
                ErrorResponse::new(400, "error.unknownfilterfield", message).with_details(field.clone())
            }
            EngineError::Query(QueryError::InvalidFilterValue { field, .. }) => {
                ErrorResponse::new(400, "error.invalidfiltervalue", message).with_details(field.clone())
            }
            EngineError::UnknownSortField(field) => {
                ErrorResponse::new(400, "error.unknownsortfield", message).with_details(field.clone())
            }
            EngineError::InvalidPageRequest(_) => ErrorResponse::new(400, "error.invalidpage", message),
            EngineError::BadRequest { entity, key, .. } => {
                ErrorResponse::new(400, format!("error.{}", key), message).with_details(*entity)
            }
            EngineError::Unauthenticated => ErrorResponse::new(401, "error.unauthenticated", message),
            EngineError::Forbidden { entity, .. } => {
                ErrorResponse::new(403, "error.forbidden", message).with_details(*entity)
            }
            EngineError::NotFound { entity, .. } => {
                ErrorResponse::new(404, "error.notfound", message).with_details(*entity)
            }
            EngineError::Store(_)
            | EngineError::Config(_)
            | EngineError::Io(_)
            | EngineError::Json(_) => ErrorResponse::new(500, "error.internal", message),
        }
    }
}
