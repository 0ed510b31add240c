// query/mod.rs - 查询模块
//! 查询条件解析、谓词构建和排序

mod parser;
pub mod filter;
pub mod sort;
pub mod types;

pub use parser::*;
pub use filter::*;
pub use sort::*;
pub use types::*;
