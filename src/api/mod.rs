//! 解析APIとの通信
//!
//! ワークフローは [`AnalysisApi`] 越しに送信するため、
//! テストではHTTPを使わない実装に差し替えられる。

mod http;

pub use http::HttpApi;

use std::future::Future;
use xray_ai_common::{AnalysisError, AnalysisOutcome, Flow, UploadedFile};

pub trait AnalysisApi: Send + Sync {
    /// ファイルを1回だけ送信し、フローに応じた結果を返す（リトライなし）
    fn submit(
        &self,
        flow: Flow,
        file: &UploadedFile,
    ) -> impl Future<Output = Result<AnalysisOutcome, AnalysisError>> + Send;

    /// 結果画像などの相対パスを解決するベースURL
    fn base_url(&self) -> &str;
}
