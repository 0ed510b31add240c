// engine/ownership.rs - 归属检查
//! 收藏和账单只能由其所属用户访问，调用方显式传入当前用户

use serde::{Deserialize, Serialize};

use crate::query::{Criteria, FilterBuilder, FilterCondition};
use crate::schema::fields::{FIELD_PRODUCT_ID, FIELD_USER_ID};
use crate::schema::{Bill, Favorite, FieldValue, Owned};

use super::core::{EngineError, EngineResult};
use super::service::EntityService;

/// 当前登录用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub user_id: i64,
    pub login: String,
}

impl Subject {
    pub fn new(user_id: i64, login: impl Into<String>) -> Self {
        Self { user_id, login: login.into() }
    }
}

fn require(subject: Option<&Subject>) -> EngineResult<&Subject> {
    subject.ok_or(EngineError::Unauthenticated)
}

fn owner_criteria(subject: &Subject) -> Criteria {
    Criteria::new().with(FIELD_USER_ID, FilterCondition::Equals(FieldValue::Integer(subject.user_id)))
}

impl<R: Owned> EntityService<R> {
    /// 当前用户拥有的全部记录
    pub fn owned_by(&self, subject: Option<&Subject>) -> EngineResult<Vec<R>> {
        let subject = require(subject)?;
        self.find_matching(&owner_criteria(subject))
    }

    /// 以当前用户身份新建记录
    pub fn create_for(&self, subject: Option<&Subject>, mut record: R) -> EngineResult<R> {
        let subject = require(subject)?;
        record.set_owner_id(subject.user_id);
        self.create(record)
    }

    /// 删除当前用户的记录，别人的记录返回 Forbidden
    pub fn delete_owned(&self, subject: Option<&Subject>, id: i64) -> EngineResult<()> {
        let subject = require(subject)?;
        let record = self.get(id)?;
        if record.owner_id() != Some(subject.user_id) {
            tracing::warn!("user {} tried to delete {} {} owned by someone else", subject.login, R::ENTITY_NAME, id);
            return Err(EngineError::Forbidden { entity: R::ENTITY_NAME, id });
        }
        self.delete(id)?;
        Ok(())
    }

    fn find_matching(&self, criteria: &Criteria) -> EngineResult<Vec<R>> {
        let spec = FilterBuilder::<R>::new().build_specification(Some(criteria))?;
        Ok(spec.apply(self.repository.find_all()?))
    }
}

impl EntityService<Favorite> {
    pub fn favorites_of(&self, subject: Option<&Subject>) -> EngineResult<Vec<Favorite>> {
        self.owned_by(subject)
    }

    /// 取消收藏：删除当前用户对某商品的所有收藏，返回删除数量
    pub fn unlike(&self, subject: Option<&Subject>, product_id: i64) -> EngineResult<usize> {
        let subject = require(subject)?;
        tracing::debug!("Request to unlike product {} for {}", product_id, subject.login);

        let criteria = owner_criteria(subject)
            .with(FIELD_PRODUCT_ID, FilterCondition::Equals(FieldValue::Integer(product_id)));
        let mut removed = 0;
        for favorite in self.find_matching(&criteria)? {
            if let Some(id) = favorite.id {
                if self.delete(id)? {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    pub fn delete_owned_favorite(&self, subject: Option<&Subject>, id: i64) -> EngineResult<()> {
        self.delete_owned(subject, id)
    }
}

impl EntityService<Bill> {
    pub fn bills_of(&self, subject: Option<&Subject>) -> EngineResult<Vec<Bill>> {
        self.owned_by(subject)
    }

    pub fn create_bill_for(&self, subject: Option<&Subject>, bill: Bill) -> EngineResult<Bill> {
        self.create_for(subject, bill)
    }
}
