//! Catalog Port - 曲库检索抽象
//!
//! 定义曲库检索和访问凭证的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::catalog::Track;

/// 曲库错误
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Catalog Port
///
/// 根据自由文本返回最匹配的曲目
#[async_trait]
pub trait CatalogPort: Send + Sync {
    /// 检索曲目，没有结果时返回 `Ok(None)`
    async fn search(&self, query: &str) -> Result<Option<Track>, CatalogError>;
}

/// Credential Provider Port
///
/// 曲库调用所需的 bearer token，调用前惰性检查并按需刷新
#[async_trait]
pub trait CredentialProviderPort: Send + Sync {
    /// 获取当前有效的 access token
    async fn token(&self) -> Result<String, CatalogError>;

    /// 丢弃缓存的凭证（例如服务端返回 401 后）
    async fn invalidate(&self) {}
}
