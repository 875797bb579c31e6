//! Voice Adapters - songbird 语音网关

mod songbird_gateway;

pub use songbird_gateway::{SongbirdGatewayConfig, SongbirdVoiceGateway};
