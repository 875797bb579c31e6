//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod catalog;
pub mod chat;
pub mod fake;
pub mod resolver;
pub mod voice;

pub use catalog::*;
pub use chat::*;
pub use resolver::*;
pub use voice::*;
