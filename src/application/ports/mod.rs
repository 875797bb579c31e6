//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod catalog;
mod chat;
mod session_registry;
mod stream_resolver;
mod voice_gateway;

pub use catalog::{CatalogError, CatalogPort, CredentialProviderPort};
pub use chat::{ChatError, ChatPort};
pub use session_registry::{SessionError, SessionRegistryPort};
pub use stream_resolver::{ResolverError, StreamResolverPort};
pub use voice_gateway::{PlayerEvent, PlayerEvents, VoiceError, VoiceGatewayPort};
