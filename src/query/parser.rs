// query/parser.rs - 查询条件解析器
//! 将扁平的查询参数解析为 Criteria
//!
//! 支持的语法:
//! - 字段条件: `name.contains=AA`, `id.greaterThan=3`, `name.in=A,B`
//! - 空值判断: `color.specified=false`
//! - 去重: `distinct=true`
//!
//! 值会按照实体字段表中的类型转换；同一字段出现多个操作符时只保留最后一个。

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::marker::PhantomData;

use super::types::*;
use crate::schema::{FieldType, FieldValue, Record, PARAM_DISTINCT};

// 匹配 field.operator
static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9_]*)\.([A-Za-z]+)$").expect("criteria key pattern")
});

/// 条件解析器（按实体类型区分字段表）
pub struct CriteriaParser<R: Record> {
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> CriteriaParser<R> {
    pub fn new() -> Self {
        Self { _record: PhantomData }
    }

    /// 解析 `a.b=c&d=e` 形式的查询字符串（会做 URL 解码）
    pub fn parse(&self, query: &str) -> QueryResult<Criteria> {
        let params: Vec<(String, String)> = url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect();
        self.parse_params(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// 解析已经拆分好的参数对
    pub fn parse_params<'a, I>(&self, params: I) -> QueryResult<Criteria>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut criteria = Criteria::new();
        for (key, raw) in params {
            self.apply_param(&mut criteria, key, raw)?;
        }
        Ok(criteria)
    }

    /// 把单个参数写入 Criteria
    pub fn apply_param(&self, criteria: &mut Criteria, key: &str, raw: &str) -> QueryResult<()> {
        if key == PARAM_DISTINCT {
            let distinct = parse_bool(raw).ok_or_else(|| QueryError::invalid_value(key, raw))?;
            criteria.set_distinct(distinct);
            return Ok(());
        }

        let cap = KEY_PATTERN
            .captures(key)
            .ok_or_else(|| QueryError::unknown_field(key))?;
        let field = &cap[1];
        let op_name = &cap[2];

        let ty = R::field_type(field).ok_or_else(|| QueryError::unknown_field(field))?;
        let op = Operator::parse(op_name)
            .filter(|op| op.applies_to(ty))
            .ok_or_else(|| QueryError::unknown_field(key))?;

        let condition = parse_condition(field, op, ty, raw)?;
        if let Some(previous) = criteria.set(field, condition) {
            tracing::warn!(
                "{} criteria: '{}' replaces earlier condition '{}' on the same field",
                R::ENTITY_NAME,
                key,
                previous
            );
        }
        Ok(())
    }
}

impl<R: Record> Default for CriteriaParser<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// 根据操作符和字段类型构造条件
fn parse_condition(field: &str, op: Operator, ty: FieldType, raw: &str) -> QueryResult<FilterCondition> {
    let single = || parse_value(field, ty, raw);
    let list = || parse_list(field, ty, raw);

    Ok(match op {
        Operator::Equals => FilterCondition::Equals(single()?),
        Operator::NotEquals => FilterCondition::NotEquals(single()?),
        Operator::In => FilterCondition::In(list()?),
        Operator::NotIn => FilterCondition::NotIn(list()?),
        Operator::Specified => {
            FilterCondition::Specified(parse_bool(raw).ok_or_else(|| QueryError::invalid_value(field, raw))?)
        }
        Operator::Contains => FilterCondition::Contains(raw.to_string()),
        Operator::DoesNotContain => FilterCondition::DoesNotContain(raw.to_string()),
        Operator::GreaterThan => FilterCondition::GreaterThan(single()?),
        Operator::GreaterThanOrEqual => FilterCondition::GreaterThanOrEqual(single()?),
        Operator::LessThan => FilterCondition::LessThan(single()?),
        Operator::LessThanOrEqual => FilterCondition::LessThanOrEqual(single()?),
    })
}

/// 按字段类型转换单个值
pub fn parse_value(field: &str, ty: FieldType, raw: &str) -> QueryResult<FieldValue> {
    let invalid = || QueryError::invalid_value(field, raw);
    match ty {
        FieldType::Text => Ok(FieldValue::Text(raw.to_string())),
        FieldType::Integer => raw.trim().parse::<i64>().map(FieldValue::Integer).map_err(|_| invalid()),
        FieldType::Float => {
            let v: f64 = raw.trim().parse().map_err(|_| invalid())?;
            if !v.is_finite() {
                return Err(invalid());
            }
            Ok(FieldValue::Float(v))
        }
        FieldType::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(FieldValue::Date)
            .map_err(|_| invalid()),
    }
}

/// 逗号分隔的值列表，每项去掉首尾空白；空字符串表示空集合
fn parse_list(field: &str, ty: FieldType, raw: &str) -> QueryResult<Vec<FieldValue>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',').map(|part| parse_value(field, ty, part.trim())).collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Bill, Product, Size};

    #[test]
    fn test_parse_simple_criteria() {
        let criteria = CriteriaParser::<Size>::new().parse("name.contains=AAAA").unwrap();
        assert_eq!(criteria.get("name"), Some(&FilterCondition::Contains("AAAA".into())));
        assert_eq!(criteria.distinct(), None);
    }

    #[test]
    fn test_parse_typed_values() {
        let parser = CriteriaParser::<Product>::new();
        let criteria = parser
            .parse("price.greaterThan=10.5&quantity.in=1,2,3&color.specified=false&distinct=true")
            .unwrap();
        assert_eq!(criteria.get("price"), Some(&FilterCondition::GreaterThan(FieldValue::Float(10.5))));
        assert_eq!(
            criteria.get("quantity"),
            Some(&FilterCondition::In(vec![FieldValue::Integer(1), FieldValue::Integer(2), FieldValue::Integer(3)]))
        );
        assert_eq!(criteria.get("color"), Some(&FilterCondition::Specified(false)));
        assert_eq!(criteria.distinct(), Some(true));
    }

    #[test]
    fn test_parse_date_and_url_decoding() {
        let criteria = CriteriaParser::<Bill>::new()
            .parse("?createdDate.lessThan=2022-01-31")
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2022, 1, 31).unwrap();
        assert_eq!(criteria.get("createdDate"), Some(&FilterCondition::LessThan(date.into())));

        let criteria = CriteriaParser::<Size>::new().parse("name.equals=Big%20One").unwrap();
        assert_eq!(criteria.get("name"), Some(&FilterCondition::Equals("Big One".into())));
    }

    #[test]
    fn test_unknown_field() {
        let err = CriteriaParser::<Size>::new().parse("color.equals=red").unwrap_err();
        assert_eq!(err, QueryError::unknown_field("color"));

        let err = CriteriaParser::<Size>::new().parse("name=red").unwrap_err();
        assert_eq!(err, QueryError::unknown_field("name"));
    }

    #[test]
    fn test_operator_not_supported_by_field() {
        let err = CriteriaParser::<Size>::new().parse("name.greaterThan=A").unwrap_err();
        assert_eq!(err, QueryError::unknown_field("name.greaterThan"));

        let err = CriteriaParser::<Size>::new().parse("id.contains=1").unwrap_err();
        assert_eq!(err, QueryError::unknown_field("id.contains"));
    }

    #[test]
    fn test_invalid_value() {
        let err = CriteriaParser::<Size>::new().parse("id.equals=abc").unwrap_err();
        assert_eq!(err, QueryError::invalid_value("id", "abc"));

        let err = CriteriaParser::<Size>::new().parse("id.in=1,x").unwrap_err();
        assert_eq!(err, QueryError::invalid_value("id", "x"));

        let err = CriteriaParser::<Size>::new().parse("distinct=maybe").unwrap_err();
        assert_eq!(err, QueryError::invalid_value("distinct", "maybe"));

        let err = CriteriaParser::<Product>::new().parse("price.equals=NaN").unwrap_err();
        assert_eq!(err, QueryError::invalid_value("price", "NaN"));
    }

    #[test]
    fn test_last_operator_wins() {
        let criteria = CriteriaParser::<Size>::new()
            .parse("id.greaterThanOrEqual=1&id.lessThanOrEqual=1")
            .unwrap();
        assert_eq!(criteria.get("id"), Some(&FilterCondition::LessThanOrEqual(1.into())));
        assert_eq!(criteria.conditions().count(), 1);
    }

    #[test]
    fn test_empty_in_list() {
        let criteria = CriteriaParser::<Size>::new().parse("name.in=").unwrap();
        assert_eq!(criteria.get("name"), Some(&FilterCondition::In(Vec::new())));
    }
}
