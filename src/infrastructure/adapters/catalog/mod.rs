//! Catalog Adapters - Spotify Web API

mod spotify_catalog;
mod spotify_credentials;

pub use spotify_catalog::{SpotifyCatalog, SpotifyCatalogConfig};
pub use spotify_credentials::{SpotifyCredentialProvider, SpotifyCredentialsConfig};
