//! tracing 初始化：互動執行用精簡格式，排程或批次執行輸出 JSON 行。

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATE_TARGET: &str = "shipment_insight";

/// 未設定 RUST_LOG 時的過濾條件；verbose 時本 crate 開到 debug，其他套件維持 info
fn default_directives(verbose: bool) -> String {
    if verbose {
        format!("{}=debug,info", CRATE_TARGET)
    } else {
        format!("{}=info", CRATE_TARGET)
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(fmt::layer().with_target(false).compact())
        .init();
}

pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(env_filter(false))
        .with(fmt::layer().json().with_current_span(false))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(false), "shipment_insight=info");
        assert_eq!(default_directives(true), "shipment_insight=debug,info");
    }
}
