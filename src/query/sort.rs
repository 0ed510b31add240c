// query/sort.rs - 排序
//! 按 (字段, 升/降序) 列表对记录排序，升序时 null 排在最前

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::schema::{FieldValue, Record};

/// 单个排序键
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: String,
    pub ascending: bool,
}

impl SortOrder {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), ascending: true }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), ascending: false }
    }
}

/// 找出第一个实体中不存在的排序字段
pub fn unknown_sort_field<R: Record>(orders: &[SortOrder]) -> Option<&str> {
    orders
        .iter()
        .map(|o| o.field.as_str())
        .find(|field| R::field_type(field).is_none())
}

/// 稳定排序；调用前应先用 `unknown_sort_field` 校验字段
pub fn sort_records<R: Record>(records: &mut [R], orders: &[SortOrder]) {
    if orders.is_empty() {
        return;
    }
    records.sort_by(|a, b| {
        for order in orders {
            let ord = compare_nullable(a.field(&order.field), b.field(&order.field));
            let ord = if order.ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

fn compare_nullable(a: Option<FieldValue>, b: Option<FieldValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.compare(&b).unwrap_or(Ordering::Equal),
    }
}
