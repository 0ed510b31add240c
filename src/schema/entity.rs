// schema/entity.rs - 实体结构定义
//! 商店的五类实体及其字段注册表

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::fields::*;
use super::{FieldType, FieldValue, Owned, Record};

/// 鞋码
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Size {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

impl Size {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: None, name: name.into() }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

impl Record for Size {
    const ENTITY_NAME: &'static str = "size";
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        (FIELD_ID, FieldType::Integer),
        (FIELD_NAME, FieldType::Text),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            FIELD_ID => self.id.map(FieldValue::Integer),
            FIELD_NAME => Some(FieldValue::Text(self.name.clone())),
            _ => None,
        }
    }
}

/// 商品分类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: None, name: name.into() }
    }
}

impl Record for Category {
    const ENTITY_NAME: &'static str = "category";
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        (FIELD_ID, FieldType::Integer),
        (FIELD_NAME, FieldType::Text),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            FIELD_ID => self.id.map(FieldValue::Integer),
            FIELD_NAME => Some(FieldValue::Text(self.name.clone())),
            _ => None,
        }
    }
}

/// 商品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub image: String,
    pub product_size: i32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// 可选鞋码（多对多关系，只存 id）
    #[serde(default)]
    pub size_ids: Vec<i64>,
}

impl Product {
    pub fn new(name: impl Into<String>, price: f64, image: impl Into<String>, product_size: i32) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            price,
            image: image.into(),
            product_size,
            color: None,
            quantity: None,
            category_id: None,
            size_ids: Vec::new(),
        }
    }
}

impl Record for Product {
    const ENTITY_NAME: &'static str = "product";
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        (FIELD_ID, FieldType::Integer),
        (FIELD_NAME, FieldType::Text),
        (FIELD_DESCRIPTION, FieldType::Text),
        (FIELD_PRICE, FieldType::Float),
        (FIELD_IMAGE, FieldType::Text),
        (FIELD_PRODUCT_SIZE, FieldType::Integer),
        (FIELD_COLOR, FieldType::Text),
        (FIELD_QUANTITY, FieldType::Integer),
        (FIELD_CATEGORY_ID, FieldType::Integer),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            FIELD_ID => self.id.map(FieldValue::Integer),
            FIELD_NAME => Some(FieldValue::Text(self.name.clone())),
            FIELD_DESCRIPTION => self.description.clone().map(FieldValue::Text),
            FIELD_PRICE => Some(FieldValue::Float(self.price)),
            FIELD_IMAGE => Some(FieldValue::Text(self.image.clone())),
            FIELD_PRODUCT_SIZE => Some(FieldValue::Integer(self.product_size as i64)),
            FIELD_COLOR => self.color.clone().map(FieldValue::Text),
            FIELD_QUANTITY => self.quantity.map(|q| FieldValue::Integer(q as i64)),
            FIELD_CATEGORY_ID => self.category_id.map(FieldValue::Integer),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be blank".to_string());
        }
        if self.image.trim().is_empty() {
            return Err("image must not be blank".to_string());
        }
        if let Some(quantity) = self.quantity {
            if quantity < 0 {
                return Err(format!("quantity must be >= 0, got {}", quantity));
            }
        }
        Ok(())
    }
}

/// 账单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub created_date: Option<NaiveDate>,
    pub total_price: f64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub product_ids: Vec<i64>,
}

impl Bill {
    pub fn new(total_price: f64, product_ids: Vec<i64>) -> Self {
        Self {
            id: None,
            created_date: None,
            total_price,
            user_id: None,
            product_ids,
        }
    }
}

impl Record for Bill {
    const ENTITY_NAME: &'static str = "bill";
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        (FIELD_ID, FieldType::Integer),
        (FIELD_CREATED_DATE, FieldType::Date),
        (FIELD_TOTAL_PRICE, FieldType::Float),
        (FIELD_USER_ID, FieldType::Integer),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            FIELD_ID => self.id.map(FieldValue::Integer),
            FIELD_CREATED_DATE => self.created_date.map(FieldValue::Date),
            FIELD_TOTAL_PRICE => Some(FieldValue::Float(self.total_price)),
            FIELD_USER_ID => self.user_id.map(FieldValue::Integer),
            _ => None,
        }
    }

    /// 未指定创建日期时使用当天
    fn prepare_for_save(&mut self) {
        if self.created_date.is_none() {
            self.created_date = Some(Local::now().date_naive());
        }
    }
}

impl Owned for Bill {
    fn owner_id(&self) -> Option<i64> {
        self.user_id
    }

    fn set_owner_id(&mut self, user_id: i64) {
        self.user_id = Some(user_id);
    }
}

/// 收藏
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub created_date: Option<NaiveDate>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub product_id: Option<i64>,
}

impl Favorite {
    pub fn new(user_id: i64, product_id: i64) -> Self {
        Self {
            id: None,
            created_date: None,
            user_id: Some(user_id),
            product_id: Some(product_id),
        }
    }
}

impl Record for Favorite {
    const ENTITY_NAME: &'static str = "favorite";
    const FIELDS: &'static [(&'static str, FieldType)] = &[
        (FIELD_ID, FieldType::Integer),
        (FIELD_CREATED_DATE, FieldType::Date),
        (FIELD_USER_ID, FieldType::Integer),
        (FIELD_PRODUCT_ID, FieldType::Integer),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            FIELD_ID => self.id.map(FieldValue::Integer),
            FIELD_CREATED_DATE => self.created_date.map(FieldValue::Date),
            FIELD_USER_ID => self.user_id.map(FieldValue::Integer),
            FIELD_PRODUCT_ID => self.product_id.map(FieldValue::Integer),
            _ => None,
        }
    }
}

impl Owned for Favorite {
    fn owner_id(&self) -> Option<i64> {
        self.user_id
    }

    fn set_owner_id(&mut self, user_id: i64) {
        self.user_id = Some(user_id);
    }
}
