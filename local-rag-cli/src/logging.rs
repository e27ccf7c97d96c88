use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is unset. Logs go to stderr so they never
/// mix with answers on stdout.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "local_rag=debug,local_rag_cli=debug,warn"
    } else {
        "local_rag=info,local_rag_cli=info,warn"
    }
}

pub fn init(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let stderr_layer =
        tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr);

    tracing_subscriber::registry().with(env_filter).with(stderr_layer).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filters_parse() {
        for verbose in [false, true] {
            assert!(EnvFilter::try_new(default_filter(verbose)).is_ok());
        }
    }
}
