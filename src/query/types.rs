// query/types.rs - 查询相关类型定义
//! 定义过滤条件、查询条件集合 (Criteria) 和条件错误

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::schema::{FieldType, FieldValue};

/// 条件错误：只有两种，都在访问存储之前同步返回
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("Unknown filter field: {field}")]
    UnknownFilterField { field: String },

    #[error("Invalid filter value for '{field}': {value:?}")]
    InvalidFilterValue { field: String, value: String },
}

impl QueryError {
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownFilterField { field: field.into() }
    }

    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidFilterValue { field: field.into(), value: value.into() }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

/// 过滤操作符（即查询参数中 `field.` 之后的后缀）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Specified,
    Contains,
    DoesNotContain,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl Operator {
    pub const ALL: [Operator; 11] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::In,
        Operator::NotIn,
        Operator::Specified,
        Operator::Contains,
        Operator::DoesNotContain,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThan,
        Operator::LessThanOrEqual,
    ];

    /// 参数名中的写法
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "notEquals",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Specified => "specified",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "doesNotContain",
            Operator::GreaterThan => "greaterThan",
            Operator::GreaterThanOrEqual => "greaterThanOrEqual",
            Operator::LessThan => "lessThan",
            Operator::LessThanOrEqual => "lessThanOrEqual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }

    /// 该操作符能否用于某种字段类型
    pub fn applies_to(self, ty: FieldType) -> bool {
        match self {
            Operator::Equals
            | Operator::NotEquals
            | Operator::In
            | Operator::NotIn
            | Operator::Specified => true,
            Operator::Contains | Operator::DoesNotContain => ty == FieldType::Text,
            Operator::GreaterThan
            | Operator::GreaterThanOrEqual
            | Operator::LessThan
            | Operator::LessThanOrEqual => ty.is_orderable(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个字段上的过滤条件
///
/// 只能序列化：值的类型由实体字段表决定，脱离字段表无法从 JSON 还原。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FilterCondition {
    Equals(FieldValue),
    NotEquals(FieldValue),
    In(Vec<FieldValue>),
    NotIn(Vec<FieldValue>),
    /// true: 字段非空; false: 字段为空
    Specified(bool),
    Contains(String),
    DoesNotContain(String),
    GreaterThan(FieldValue),
    GreaterThanOrEqual(FieldValue),
    LessThan(FieldValue),
    LessThanOrEqual(FieldValue),
}

impl FilterCondition {
    pub fn operator(&self) -> Operator {
        match self {
            FilterCondition::Equals(_) => Operator::Equals,
            FilterCondition::NotEquals(_) => Operator::NotEquals,
            FilterCondition::In(_) => Operator::In,
            FilterCondition::NotIn(_) => Operator::NotIn,
            FilterCondition::Specified(_) => Operator::Specified,
            FilterCondition::Contains(_) => Operator::Contains,
            FilterCondition::DoesNotContain(_) => Operator::DoesNotContain,
            FilterCondition::GreaterThan(_) => Operator::GreaterThan,
            FilterCondition::GreaterThanOrEqual(_) => Operator::GreaterThanOrEqual,
            FilterCondition::LessThan(_) => Operator::LessThan,
            FilterCondition::LessThanOrEqual(_) => Operator::LessThanOrEqual,
        }
    }

    /// 条件中携带的值（用于类型校验）
    pub fn values(&self) -> Vec<&FieldValue> {
        match self {
            FilterCondition::Equals(v)
            | FilterCondition::NotEquals(v)
            | FilterCondition::GreaterThan(v)
            | FilterCondition::GreaterThanOrEqual(v)
            | FilterCondition::LessThan(v)
            | FilterCondition::LessThanOrEqual(v) => vec![v],
            FilterCondition::In(vs) | FilterCondition::NotIn(vs) => vs.iter().collect(),
            FilterCondition::Specified(_)
            | FilterCondition::Contains(_)
            | FilterCondition::DoesNotContain(_) => Vec::new(),
        }
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.operator();
        match self {
            FilterCondition::In(vs) | FilterCondition::NotIn(vs) => {
                let joined: Vec<String> = vs.iter().map(|v| v.to_string()).collect();
                write!(f, "{}=[{}]", op, joined.join(","))
            }
            FilterCondition::Specified(b) => write!(f, "{}={}", op, b),
            FilterCondition::Contains(s) | FilterCondition::DoesNotContain(s) => write!(f, "{}={}", op, s),
            other => match other.values().first() {
                Some(v) => write!(f, "{}={}", op, v),
                None => write!(f, "{}", op),
            },
        }
    }
}

/// 一次查询的条件集合
///
/// 每个字段最多一个条件；同一字段重复设置时后者覆盖前者。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Criteria {
    conditions: BTreeMap<String, FilterCondition>,
    distinct: Option<bool>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置字段条件，返回被覆盖的旧条件
    pub fn set(&mut self, field: impl Into<String>, condition: FilterCondition) -> Option<FilterCondition> {
        self.conditions.insert(field.into(), condition)
    }

    pub fn with(mut self, field: impl Into<String>, condition: FilterCondition) -> Self {
        self.set(field, condition);
        self
    }

    pub fn set_distinct(&mut self, distinct: bool) {
        self.distinct = Some(distinct);
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = Some(distinct);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FilterCondition> {
        self.conditions.get(field)
    }

    pub fn conditions(&self) -> impl Iterator<Item = (&str, &FilterCondition)> {
        self.conditions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 未设置时为 None（不去重）
    pub fn distinct(&self) -> Option<bool> {
        self.distinct
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.distinct.is_none()
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Criteria{{")?;
        let mut first = true;
        for (field, condition) in &self.conditions {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}.{}", field, condition)?;
        }
        if let Some(distinct) = self.distinct {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "distinct={}", distinct)?;
        }
        write!(f, "}}")
    }
}
