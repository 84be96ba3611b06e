//! ログ初期化
//!
//! 解析結果は stdout、ログは stderr に出す。

use tracing_subscriber::EnvFilter;

/// `XRAY_AI_LOG` が設定されていればそれを優先（例: `XRAY_AI_LOG=xray_ai_rust=trace`）
pub const LOG_ENV: &str = "XRAY_AI_LOG";

pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    // 二重初期化（テスト等）は無視
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
