//! Stream Resolver Adapters

mod ytdlp_resolver;

pub use ytdlp_resolver::{YtDlpResolver, YtDlpResolverConfig};
