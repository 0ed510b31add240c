// schema/mod.rs - Schema 定义模块
//! 定义实体的字段类型、字段值，以及每种实体的静态字段注册表

mod entity;
pub mod fields;

pub use entity::*;
pub use fields::*;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 字段的标量类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Integer,
    Float,
    Text,
    /// 日历日期，格式 YYYY-MM-DD
    Date,
}

impl FieldType {
    /// 是否支持范围比较（greaterThan 等）
    pub fn is_orderable(self) -> bool {
        !matches!(self, FieldType::Text)
    }
}

/// 字段值（序列化为裸值，只用于输出）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    /// 值对应的字段类型
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Integer(_) => FieldType::Integer,
            FieldValue::Float(_) => FieldType::Float,
            FieldValue::Text(_) => FieldType::Text,
            FieldValue::Date(_) => FieldType::Date,
        }
    }

    /// 能否作为 `ty` 类型的字段值参与比较
    ///
    /// 整数可以和浮点字段比较，其余要求类型一致。
    pub fn fits(&self, ty: FieldType) -> bool {
        match (self, ty) {
            (FieldValue::Integer(_), FieldType::Float) => true,
            (value, ty) => value.field_type() == ty,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// 同类型值之间的比较；类型不兼容（或浮点为 NaN）时返回 None
    ///
    /// 浮点按数值比较，0.0 与 -0.0 相等。
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.partial_cmp(b),
            (FieldValue::Integer(a), FieldValue::Float(b)) => (*a as f64).partial_cmp(b),
            (FieldValue::Float(a), FieldValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// 相等比较（整数和浮点按数值比较）
    pub fn same_as(&self, other: &FieldValue) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{}", v),
            FieldValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

/// 可被查询和持久化的实体
///
/// 每个实体在编译期列出自己可过滤的字段，过滤器只通过 `FIELDS` 和
/// `field` 访问实体，不做任何运行时反射。
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 实体名（用于日志、错误信息和存储树名）
    const ENTITY_NAME: &'static str;

    /// 可过滤字段表：(字段名, 类型)
    const FIELDS: &'static [(&'static str, FieldType)];

    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    /// 读取字段值；`None` 表示字段为 null 或不存在
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// 保存前的钩子（填充默认值）
    fn prepare_for_save(&mut self) {}

    /// 字段约束校验，失败时返回错误说明
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// 查找字段类型
    fn field_type(name: &str) -> Option<FieldType> {
        Self::FIELDS
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, ty)| *ty)
    }
}

/// 属于某个用户的实体（Bill / Favorite）
pub trait Owned: Record {
    fn owner_id(&self) -> Option<i64>;

    fn set_owner_id(&mut self, user_id: i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_mixed_numbers() {
        let a = FieldValue::Integer(3);
        let b = FieldValue::Float(3.0);
        assert!(a.same_as(&b));
        assert_eq!(FieldValue::Float(2.5).compare(&a), Some(Ordering::Less));
        assert_eq!(FieldValue::Text("x".into()).compare(&a), None);
    }

    #[test]
    fn test_signed_zero_is_equal() {
        assert!(FieldValue::Float(-0.0).same_as(&FieldValue::Integer(0)));
        assert!(FieldValue::Float(-0.0).same_as(&FieldValue::Float(0.0)));
        assert_eq!(FieldValue::Float(f64::NAN).compare(&FieldValue::Float(1.0)), None);
    }

    #[test]
    fn test_field_registry() {
        assert_eq!(Size::field_type(FIELD_NAME), Some(FieldType::Text));
        assert_eq!(Product::field_type(FIELD_PRICE), Some(FieldType::Float));
        assert_eq!(Size::field_type("color"), None);
        assert!(!FieldType::Text.is_orderable());
        assert!(FieldType::Date.is_orderable());
    }
}
