use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Overrides the default filter; `RUST_LOG` is honoured as a fallback.
pub const LOG_ENV: &str = "VOTE_CHECK_LOG";

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        // 連線細節也印出來，方便查逾時
        "vote_check=debug,reqwest=debug,warn"
    } else {
        "vote_check=info,warn"
    }
}

/// Compact, stderr-only CLI logger.
pub fn init_cli_logger(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    // 設定讀取失敗時可能已經初始化過一次
    if tracing_subscriber::registry().with(filter).with(layer).try_init().is_err() {
        tracing::debug!("Logger already initialised");
    }
}
