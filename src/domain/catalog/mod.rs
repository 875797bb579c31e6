//! Catalog Context - 曲库限界上下文
//!
//! 职责:
//! - 曲目元数据（标题 + 艺术家）
//! - 曲库访问凭证租约

mod credential;
mod value_objects;

pub use credential::Credential;
pub use value_objects::Track;
