// schema/fields.rs - 字段名常量定义
//! 统一管理所有实体的过滤字段名（对外的 camelCase 名称），避免魔法字符串

/// 主键
pub const FIELD_ID: &str = "id";
/// 名称（Size / Category / Product）
pub const FIELD_NAME: &str = "name";

// === Product ===
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_PRICE: &str = "price";
pub const FIELD_IMAGE: &str = "image";
pub const FIELD_PRODUCT_SIZE: &str = "productSize";
pub const FIELD_COLOR: &str = "color";
pub const FIELD_QUANTITY: &str = "quantity";
/// 所属分类的 id
pub const FIELD_CATEGORY_ID: &str = "categoryId";

// === Bill / Favorite ===
/// 创建日期 (YYYY-MM-DD)
pub const FIELD_CREATED_DATE: &str = "createdDate";
pub const FIELD_TOTAL_PRICE: &str = "totalPrice";
/// 所属用户的 id
pub const FIELD_USER_ID: &str = "userId";
pub const FIELD_PRODUCT_ID: &str = "productId";

/// 顶层去重参数
pub const PARAM_DISTINCT: &str = "distinct";
