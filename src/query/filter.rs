// query/filter.rs - 过滤条件构建器
//! 将 Criteria 转换为可作用于记录集合的谓词 (Specification)
//!
//! 各字段条件之间是 AND 关系；除 `specified` 之外，字段为 null 时任何比较都不成立。

use std::cmp::Ordering;
use std::collections::HashSet;
use std::marker::PhantomData;

use super::types::*;
use crate::schema::{FieldType, FieldValue, Record};

/// 过滤选项
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterOptions {
    /// contains / doesNotContain 是否忽略大小写（与数据库 upper(..) LIKE 行为一致）
    pub case_insensitive_like: bool,
}

/// 单字段谓词
#[derive(Debug, Clone)]
struct FieldPredicate {
    field: &'static str,
    condition: FilterCondition,
}

/// 由 Criteria 构建出的组合谓词
///
/// 查询、分页和计数共用同一个 Specification，保证结果一致。
#[derive(Debug, Clone)]
pub struct Specification<R: Record> {
    predicates: Vec<FieldPredicate>,
    distinct: bool,
    options: FilterOptions,
    _record: PhantomData<fn(&R) -> bool>,
}

impl<R: Record> Specification<R> {
    /// 匹配所有记录
    pub fn all() -> Self {
        Self {
            predicates: Vec::new(),
            distinct: false,
            options: FilterOptions::default(),
            _record: PhantomData,
        }
    }

    /// 与另一个 Specification 取 AND
    pub fn and(mut self, other: Specification<R>) -> Self {
        self.predicates.extend(other.predicates);
        self.distinct |= other.distinct;
        self
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// 单条记录是否满足所有字段条件
    pub fn matches(&self, record: &R) -> bool {
        self.predicates.iter().all(|p| {
            let value = record.field(p.field);
            evaluate(&p.condition, value.as_ref(), self.options)
        })
    }

    /// 过滤记录集合；distinct 时按 id 去重（保留第一次出现）
    pub fn apply<I>(&self, records: I) -> Vec<R>
    where
        I: IntoIterator<Item = R>,
    {
        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|r| self.matches(r))
            .filter(|r| match (self.distinct, r.id()) {
                (true, Some(id)) => seen.insert(id),
                _ => true,
            })
            .collect()
    }

    /// 匹配数量，与 `apply(..).len()` 一致
    pub fn count<'a, I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = &'a R>,
    {
        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|r| self.matches(r))
            .filter(|r| match (self.distinct, r.id()) {
                (true, Some(id)) => seen.insert(id),
                _ => true,
            })
            .count()
    }
}

impl<R: Record> Default for Specification<R> {
    fn default() -> Self {
        Self::all()
    }
}

/// 过滤器构建器
pub struct FilterBuilder<R: Record> {
    options: FilterOptions,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> FilterBuilder<R> {
    pub fn new() -> Self {
        Self::with_options(FilterOptions::default())
    }

    pub fn with_options(options: FilterOptions) -> Self {
        Self { options, _record: PhantomData }
    }

    /// 构建完整的过滤谓词
    ///
    /// `criteria` 为 None 时匹配所有记录。字段名和值的类型在这里校验，
    /// 失败时不会产生任何谓词。
    pub fn build_specification(&self, criteria: Option<&Criteria>) -> QueryResult<Specification<R>> {
        let mut spec = Specification::all();
        spec.options = self.options;

        let Some(criteria) = criteria else {
            return Ok(spec);
        };

        // distinct 先处理，未设置时不去重
        if let Some(distinct) = criteria.distinct() {
            spec.distinct = distinct;
        }

        for (field, condition) in criteria.conditions() {
            let (name, ty) = R::FIELDS
                .iter()
                .find(|(name, _)| *name == field)
                .copied()
                .ok_or_else(|| QueryError::unknown_field(field))?;

            let op = condition.operator();
            if !op.applies_to(ty) {
                return Err(QueryError::unknown_field(format!("{}.{}", field, op)));
            }
            check_value_types(field, ty, condition)?;

            spec.predicates.push(FieldPredicate { field: name, condition: condition.clone() });
        }

        Ok(spec)
    }
}

impl<R: Record> Default for FilterBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// 程序构造的 Criteria 可能带错类型的值，这里拦截
fn check_value_types(field: &str, ty: FieldType, condition: &FilterCondition) -> QueryResult<()> {
    match condition.values().into_iter().find(|v| !v.fits(ty)) {
        Some(bad) => Err(QueryError::invalid_value(field, bad.to_string())),
        None => Ok(()),
    }
}

/// 在单个字段值上计算条件
fn evaluate(condition: &FilterCondition, value: Option<&FieldValue>, options: FilterOptions) -> bool {
    match (condition, value) {
        (FilterCondition::Specified(expected), value) => value.is_some() == *expected,
        (_, None) => false,
        (FilterCondition::Equals(target), Some(value)) => value.same_as(target),
        (FilterCondition::NotEquals(target), Some(value)) => !value.same_as(target),
        (FilterCondition::In(set), Some(value)) => set.iter().any(|v| value.same_as(v)),
        (FilterCondition::NotIn(set), Some(value)) => !set.iter().any(|v| value.same_as(v)),
        (FilterCondition::Contains(needle), Some(value)) => like(value, needle, options).unwrap_or(false),
        (FilterCondition::DoesNotContain(needle), Some(value)) => {
            like(value, needle, options).map(|m| !m).unwrap_or(false)
        }
        (FilterCondition::GreaterThan(bound), Some(value)) => value.compare(bound) == Some(Ordering::Greater),
        (FilterCondition::GreaterThanOrEqual(bound), Some(value)) => {
            matches!(value.compare(bound), Some(Ordering::Greater | Ordering::Equal))
        }
        (FilterCondition::LessThan(bound), Some(value)) => value.compare(bound) == Some(Ordering::Less),
        (FilterCondition::LessThanOrEqual(bound), Some(value)) => {
            matches!(value.compare(bound), Some(Ordering::Less | Ordering::Equal))
        }
    }
}

/// 子串匹配；非文本值返回 None
fn like(value: &FieldValue, needle: &str, options: FilterOptions) -> Option<bool> {
    let haystack = value.as_text()?;
    if options.case_insensitive_like {
        Some(haystack.to_uppercase().contains(&needle.to_uppercase()))
    } else {
        Some(haystack.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::CriteriaParser;
    use crate::schema::{Product, Size};

    fn sizes() -> Vec<Size> {
        vec![Size::new("AAAA").with_id(1), Size::new("BBBB").with_id(2)]
    }

    fn find(query: &str) -> Vec<Size> {
        let criteria = CriteriaParser::<Size>::new().parse(query).unwrap();
        let spec = FilterBuilder::<Size>::new().build_specification(Some(&criteria)).unwrap();
        let found = spec.apply(sizes());
        assert_eq!(spec.count(&sizes()), found.len());
        found
    }

    fn ids(records: &[Size]) -> Vec<i64> {
        records.iter().filter_map(|r| r.id).collect()
    }

    #[test]
    fn test_empty_criteria_matches_all() {
        let spec = FilterBuilder::<Size>::new().build_specification(None).unwrap();
        assert_eq!(spec.apply(sizes()).len(), 2);

        let spec = FilterBuilder::<Size>::new().build_specification(Some(&Criteria::new())).unwrap();
        assert_eq!(spec.count(&sizes()), 2);
    }

    #[test]
    fn test_contains_and_does_not_contain() {
        assert_eq!(ids(&find("name.contains=AAAA")), vec![1]);
        assert_eq!(ids(&find("name.doesNotContain=AAAA")), vec![2]);
        // 默认区分大小写
        assert!(find("name.contains=aaaa").is_empty());
    }

    #[test]
    fn test_case_insensitive_like_option() {
        let criteria = Criteria::new().with("name", FilterCondition::Contains("aa".into()));
        let spec = FilterBuilder::<Size>::with_options(FilterOptions { case_insensitive_like: true })
            .build_specification(Some(&criteria))
            .unwrap();
        assert_eq!(ids(&spec.apply(sizes())), vec![1]);
    }

    #[test]
    fn test_specified() {
        assert!(find("name.specified=false").is_empty());
        assert_eq!(find("name.specified=true").len(), 2);
    }

    #[test]
    fn test_equals_not_equals_in() {
        assert_eq!(ids(&find("name.equals=AAAA")), vec![1]);
        assert_eq!(ids(&find("name.notEquals=AAAA")), vec![2]);
        assert_eq!(ids(&find("name.in=AAAA,BBBB")), vec![1, 2]);
        assert!(find("name.in=CCCC").is_empty());
        assert_eq!(ids(&find("name.notIn=AAAA")), vec![2]);
    }

    #[test]
    fn test_in_list_items_are_trimmed() {
        assert_eq!(ids(&find("name.in=AAAA,%20BBBB")), vec![1, 2]);
        assert_eq!(ids(&find("name.notIn=%20AAAA%20")), vec![2]);
    }

    #[test]
    fn test_price_equals_zero_matches_negative_zero() {
        let mut free = Product::new("Free", -0.0, "free.png", 40);
        free.id = Some(1);
        let mut paid = Product::new("Paid", 5.0, "paid.png", 41);
        paid.id = Some(2);

        let criteria = CriteriaParser::<Product>::new().parse("price.equals=0").unwrap();
        let spec = FilterBuilder::<Product>::new().build_specification(Some(&criteria)).unwrap();
        let found: Vec<i64> = spec.apply(vec![free, paid]).into_iter().filter_map(|p| p.id).collect();
        assert_eq!(found, vec![1]);
    }

    #[test]
    fn test_id_ranges() {
        assert_eq!(ids(&find("id.equals=1")), vec![1]);
        assert_eq!(ids(&find("id.notEquals=1")), vec![2]);
        assert_eq!(ids(&find("id.greaterThanOrEqual=1")), vec![1, 2]);
        assert_eq!(ids(&find("id.greaterThan=1")), vec![2]);
        assert_eq!(ids(&find("id.lessThanOrEqual=1")), vec![1]);
        assert!(find("id.lessThan=1").is_empty());
    }

    #[test]
    fn test_fields_combine_with_and() {
        assert_eq!(ids(&find("id.greaterThan=0&name.contains=B")), vec![2]);
        assert!(find("id.equals=1&name.equals=BBBB").is_empty());
    }

    #[test]
    fn test_distinct_deduplicates_by_id() {
        let mut records = sizes();
        records.push(Size::new("AAAA").with_id(1));

        let criteria = Criteria::new().with_distinct(true);
        let spec = FilterBuilder::<Size>::new().build_specification(Some(&criteria)).unwrap();
        assert_eq!(spec.apply(records.clone()).len(), 2);
        assert_eq!(spec.count(&records), 2);

        let criteria = Criteria::new().with_distinct(false);
        let spec = FilterBuilder::<Size>::new().build_specification(Some(&criteria)).unwrap();
        assert_eq!(spec.apply(records.clone()).len(), 3);
        assert_eq!(spec.count(&records), 3);
    }

    #[test]
    fn test_null_fields_fail_comparisons() {
        let mut with_color = Product::new("A", 10.0, "a.png", 40);
        with_color.id = Some(1);
        with_color.color = Some("red".into());
        let mut without_color = Product::new("B", 20.0, "b.png", 41);
        without_color.id = Some(2);
        let records = vec![with_color, without_color];

        let run = |criteria: Criteria| {
            FilterBuilder::<Product>::new()
                .build_specification(Some(&criteria))
                .unwrap()
                .apply(records.clone())
                .into_iter()
                .filter_map(|p| p.id)
                .collect::<Vec<_>>()
        };

        assert_eq!(run(Criteria::new().with("color", FilterCondition::NotEquals("blue".into()))), vec![1]);
        assert_eq!(run(Criteria::new().with("color", FilterCondition::DoesNotContain("x".into()))), vec![1]);
        assert_eq!(run(Criteria::new().with("color", FilterCondition::Specified(false))), vec![2]);
        assert_eq!(run(Criteria::new().with("price", FilterCondition::GreaterThan(FieldValue::Integer(15)))), vec![2]);
    }

    #[test]
    fn test_programmatic_criteria_is_validated() {
        let builder = FilterBuilder::<Size>::new();

        let criteria = Criteria::new().with("color", FilterCondition::Equals("red".into()));
        assert_eq!(
            builder.build_specification(Some(&criteria)).unwrap_err(),
            QueryError::unknown_field("color")
        );

        let criteria = Criteria::new().with("id", FilterCondition::Equals("one".into()));
        assert_eq!(
            builder.build_specification(Some(&criteria)).unwrap_err(),
            QueryError::invalid_value("id", "one")
        );

        let criteria = Criteria::new().with("name", FilterCondition::LessThan("M".into()));
        assert_eq!(
            builder.build_specification(Some(&criteria)).unwrap_err(),
            QueryError::unknown_field("name.lessThan")
        );
    }

    #[test]
    fn test_and_combines_specifications() {
        let builder = FilterBuilder::<Size>::new();
        let by_id = builder
            .build_specification(Some(&Criteria::new().with("id", FilterCondition::GreaterThan(0.into()))))
            .unwrap();
        let by_name = builder
            .build_specification(Some(&Criteria::new().with("name", FilterCondition::Equals("BBBB".into()))))
            .unwrap();
        assert_eq!(ids(&by_id.and(by_name).apply(sizes())), vec![2]);
    }
}
