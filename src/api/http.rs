//! reqwest による解析APIクライアント

use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, info, warn};
use xray_ai_common::{
    decode_response, resolve_asset_url, AnalysisError, AnalysisOutcome, Flow, ServerStatus,
    UploadedFile,
};

use super::AnalysisApi;
use crate::error::{Result, XrayAiError};

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| XrayAiError::Http(format!("HTTPクライアント初期化エラー: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, flow: Flow) -> String {
        format!("{}{}", self.base_url, flow.endpoint_path())
    }

    /// `GET /api/v1/system/status`
    pub async fn server_status(&self) -> Result<ServerStatus> {
        let url = format!("{}/api/v1/system/status", self.base_url);
        let resp = self.get_ok(&url).await?;
        resp.json::<ServerStatus>()
            .await
            .map_err(|e| XrayAiError::Http(format!("ステータス応答の解析に失敗: {}", e)))
    }

    /// `GET /health` の `status` フィールド
    pub async fn health(&self) -> Result<String> {
        let url = format!("{}/health", self.base_url);
        let resp = self.get_ok(&url).await?;
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| XrayAiError::Http(format!("ヘルスチェック応答の解析に失敗: {}", e)))?;
        Ok(body["status"].as_str().unwrap_or("unknown").to_string())
    }

    /// 結果画像（`/results/...`）をダウンロード
    pub async fn fetch_asset(&self, path: &str) -> Result<Vec<u8>> {
        let url = resolve_asset_url(&self.base_url, path);
        let resp = self.get_ok(&url).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| XrayAiError::Http(format!("{}: {}", url, e)))?;
        debug!(url = %url, size = bytes.len(), "asset downloaded");
        Ok(bytes.to_vec())
    }

    async fn get_ok(&self, url: &str) -> Result<reqwest::Response> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| XrayAiError::Http(format!("{}: {}", url, e)))?;

        if !resp.status().is_success() {
            return Err(XrayAiError::Http(format!("{}: HTTP {}", url, resp.status())));
        }
        Ok(resp)
    }
}

impl AnalysisApi for HttpApi {
    async fn submit(
        &self,
        flow: Flow,
        file: &UploadedFile,
    ) -> std::result::Result<AnalysisOutcome, AnalysisError> {
        let url = self.endpoint(flow);

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(file.media_type.as_mime())
            .map_err(|e| AnalysisError::Transport(format!("multipart: {}", e)))?;
        let form = Form::new().part("file", part);

        info!(%flow, url = %url, file = %file.name, size = file.size(), "submitting");

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "request failed without response");
                AnalysisError::Transport(e.to_string())
            })?;

        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| AnalysisError::Transport(format!("reading response body: {}", e)))?;

        debug!(status, bytes = body.len(), "response received");
        decode_response(flow, status, &body)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_and_path() {
        let api = HttpApi::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(
            api.endpoint(Flow::Detection),
            "http://localhost:8000/api/v1/analysis/detect"
        );
        assert_eq!(
            api.endpoint(Flow::Report),
            "http://localhost:8000/api/v1/medical-report/analyze"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // ポート1は通常リッスンされていない
        let api = HttpApi::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let file = UploadedFile {
            name: "a.jpg".to_string(),
            media_type: xray_ai_common::MediaType::Jpeg,
            bytes: vec![0xFF, 0xD8],
        };
        let err = api.submit(Flow::Detection, &file).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Transport(_)));
    }
}
