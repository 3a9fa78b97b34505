// 10.0: logging bootstrap for binaries. the library only emits tracing events;
// whoever embeds it decides whether to install a subscriber.

use tracing_subscriber::{
    fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

pub fn init_logging(verbose: bool) {
    let filter = log_filter(verbose, std::env::var("RUST_LOG").ok().as_deref());

    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().without_time())
        .with(filter)
        .try_init();
}

// 10.1: RUST_LOG wins when it parses; otherwise our own targets at warn, or debug with -v
pub fn log_filter(verbose: bool, directives: Option<&str>) -> EnvFilter {
    let level = if verbose { "debug" } else { "warn" };
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(format!("valuation_core={level},valuation_sim={level}")))
}
