// engine/mod.rs - 商店引擎
//! 组合仓库、条件查询和实体服务，对外提供统一入口

pub mod builder;
pub mod core;
pub mod ownership;
pub mod resource;
pub mod service;

pub use builder::*;
pub use core::*;
pub use ownership::*;
pub use resource::*;
pub use service::*;
