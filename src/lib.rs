//! integral-lens: reframe free-text input through fixed integral lenses
//!
//! A request flows through [`pipeline::LensPipeline`]: validation, one call to
//! the completion service, then [`normalizer::normalize`]. Every lens shares the
//! same pipeline and differs only in its [`lenses::LensSpec`].

pub mod clients;
pub mod config;
pub mod error;
pub mod http;
pub mod lenses;
pub mod normalizer;
pub mod panels;
pub mod pipeline;

pub use error::{LensError, Result};
pub use lenses::{LensSpec, LensTable};
pub use normalizer::LensResult;
pub use pipeline::LensPipeline;

/// Initialize tracing once, with the given filter unless RUST_LOG overrides it.
/// Logs go to stderr so CLI output on stdout stays clean.
pub fn init_tracing(default_filter: &str) {
    init_tracing_with_writer(default_filter, std::io::stderr);
}

pub fn init_tracing_with_writer<W>(default_filter: &str, writer: W)
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
}

/// Read `.env`, install tracing, then load the config so load-time warnings
/// reach the subscriber.
pub fn bootstrap(default_filter: &str) -> anyhow::Result<config::Config> {
    bootstrap_with_writer(default_filter, std::io::stderr)
}

pub fn bootstrap_with_writer<W>(
    default_filter: &str,
    writer: W,
) -> anyhow::Result<config::Config>
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    config::Config::load_env_file();
    init_tracing_with_writer(default_filter, writer);
    config::Config::load()
}
