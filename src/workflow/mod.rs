//! アップロード → 送信 → 結果表示 のワークフロー制御
//!
//! 1インスタンスが1フロー（骨折検出 or レポート解析）を担当する。
//! メソッドはすべて `&self` で、送信待ちの間にも `reset` を呼べる。
//! 内部状態の Mutex は `.await` をまたいで保持しない。
//!
//! リセット時は世代カウンタを進め、古い世代の送信結果は破棄する。

mod presenter;
mod preview;

pub use presenter::ProgressPresenter;
pub use preview::PreviewHandle;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use xray_ai_common::{
    stages_for, transition, AnalysisError, AnalysisOutcome, FileCandidate, Flow,
    ProgressSnapshot, RevealPolicy, UploadSurface, UploadedFile, WorkflowAction, WorkflowState,
};

use crate::api::AnalysisApi;
use crate::config::Config;
use crate::error::{Result, XrayAiError};

/// 進捗表示と結果表示タイミングの設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkflowOptions {
    pub stage_interval: Duration,
    pub reveal: RevealPolicy,
}

impl WorkflowOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            stage_interval: config.stage_interval(),
            reveal: config.reveal_policy(),
        }
    }
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// `submit` の結末
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Completed,
    Failed(AnalysisError),
    /// 待機中にリセットされ、レスポンスを破棄した
    Discarded,
}

/// 表示用の読み取り専用コピー
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSnapshot {
    pub state: WorkflowState,
    pub file_name: Option<String>,
    pub preview: Option<PreviewHandle>,
    pub result: Option<AnalysisOutcome>,
    pub error: Option<AnalysisError>,
}

struct Inner {
    state: WorkflowState,
    surface: UploadSurface,
    file: Option<Arc<UploadedFile>>,
    preview: Option<PreviewHandle>,
    result: Option<AnalysisOutcome>,
    error: Option<AnalysisError>,
    generation: u64,
    presenter: Option<ProgressPresenter>,
}

impl Inner {
    fn apply(&mut self, action: WorkflowAction) -> Result<()> {
        let next = transition(self.state, action)?;
        debug!(from = %self.state, to = %next, %action, "transition");
        self.state = next;
        Ok(())
    }

    fn stop_presenter(&mut self) {
        if let Some(presenter) = self.presenter.take() {
            presenter.stop();
        }
    }
}

pub struct Workflow<A> {
    flow: Flow,
    api: A,
    options: WorkflowOptions,
    inner: Mutex<Inner>,
    progress: Arc<watch::Sender<ProgressSnapshot>>,
    /// リセットで進む世代番号の通知
    cancel: watch::Sender<u64>,
}

impl<A: AnalysisApi> Workflow<A> {
    pub fn new(flow: Flow, api: A, options: WorkflowOptions) -> Self {
        let (progress, _) = watch::channel(ProgressSnapshot::idle());
        let (cancel, _) = watch::channel(0);

        Self {
            flow,
            api,
            options,
            inner: Mutex::new(Inner {
                state: WorkflowState::Idle,
                surface: UploadSurface::new(flow),
                file: None,
                preview: None,
                result: None,
                error: None,
                generation: 0,
                presenter: None,
            }),
            progress: Arc::new(progress),
            cancel,
        }
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn state(&self) -> WorkflowState {
        self.lock().state
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let inner = self.lock();
        WorkflowSnapshot {
            state: inner.state,
            file_name: inner.file.as_ref().map(|f| f.name.clone()),
            preview: inner.preview.clone(),
            result: inner.result.clone(),
            error: inner.error.clone(),
        }
    }

    /// 進捗スナップショットの購読
    pub fn subscribe_progress(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress.subscribe()
    }

    // =============================================
    // アップロード面
    // =============================================

    pub fn drag_enter(&self) {
        self.lock().surface.drag_enter();
    }

    pub fn drag_over(&self) {
        self.lock().surface.drag_over();
    }

    pub fn drag_leave(&self) {
        self.lock().surface.drag_leave();
    }

    pub fn is_dragging(&self) -> bool {
        self.lock().surface.is_dragging()
    }

    /// ドロップされたファイル（先頭のみ）を選択。空のドロップは何もしない
    pub async fn drop_files(&self, files: Vec<FileCandidate>) -> Result<()> {
        let validated = self.lock().surface.drop_files(files);
        match validated {
            Some(file) => self.accept(file?).await,
            None => Ok(()),
        }
    }

    /// ファイル選択ダイアログ相当
    pub async fn select(&self, candidate: FileCandidate) -> Result<()> {
        let file = self.lock().surface.pick(candidate)?;
        self.accept(file).await
    }

    /// パスから読み込んで選択（宣言タイプは拡張子から決まる）
    pub async fn select_path(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(XrayAiError::FileNotFound(path.display().to_string()));
        }
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        self.select(FileCandidate::new(name, None, bytes)).await
    }

    /// 検証済みファイルを受け入れ、プレビューを非同期に生成する
    async fn accept(&self, file: UploadedFile) -> Result<()> {
        let file = Arc::new(file);
        {
            let mut inner = self.lock();
            inner.apply(WorkflowAction::Select)?;
            self.advance_generation(&mut inner);
            inner.file = Some(file.clone());
            inner.preview = None;
            inner.result = None;
            inner.error = None;
        }
        info!(flow = %self.flow, file = %file.name, size = file.size(), "file selected");

        let source = file.clone();
        let preview = tokio::task::spawn_blocking(move || PreviewHandle::derive(&source))
            .await
            .map_err(|e| XrayAiError::Preview(e.to_string()))?;

        // 生成中に失敗・リセット・差し替えがあればファイルは別物（または None）
        let mut inner = self.lock();
        let still_current = inner
            .file
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &file));
        if still_current {
            inner.preview = Some(preview);
        } else {
            debug!("preview discarded: file changed");
        }
        Ok(())
    }

    // =============================================
    // 送信
    // =============================================

    /// 選択中のファイルを送信する
    ///
    /// `FileSelected` 以外（送信中を含む）では `InvalidTransition`。
    /// 解析の失敗は `Ok(Submission::Failed)` として返り、状態は `Failed` になる。
    pub async fn submit(&self) -> Result<Submission> {
        let (file, generation) = {
            let mut inner = self.lock();
            let file = match &inner.file {
                Some(file) if inner.state.can_submit() => file.clone(),
                _ => {
                    return Err(xray_ai_common::Error::InvalidTransition {
                        state: inner.state,
                        action: WorkflowAction::Submit,
                    }
                    .into())
                }
            };
            inner.apply(WorkflowAction::Submit)?;
            inner.result = None;
            inner.error = None;
            inner.presenter = Some(ProgressPresenter::start(
                self.progress.clone(),
                stages_for(self.flow),
                self.options.stage_interval,
            ));
            (file, inner.generation)
        };

        let started = Instant::now();
        let mut cancel = self.cancel.subscribe();

        let response = tokio::select! {
            response = self.api.submit(self.flow, &file) => response,
            _ = reset_signal(&mut cancel, generation) => {
                info!(generation, "submission abandoned by reset");
                return Ok(Submission::Discarded);
            }
        };

        if response.is_ok() {
            let remaining = self.options.reveal.remaining(started.elapsed());
            if !remaining.is_zero() {
                debug!(?remaining, "holding result until minimum display time");
                tokio::select! {
                    _ = tokio::time::sleep(remaining) => {}
                    _ = reset_signal(&mut cancel, generation) => {
                        info!(generation, "result discarded by reset");
                        return Ok(Submission::Discarded);
                    }
                }
            }
        }

        let mut inner = self.lock();
        if inner.generation != generation || inner.state != WorkflowState::Submitting {
            info!(generation, "late response discarded");
            return Ok(Submission::Discarded);
        }
        inner.stop_presenter();

        match response {
            Ok(outcome) => {
                inner.apply(WorkflowAction::Complete)?;
                inner.result = Some(outcome);
                info!(flow = %self.flow, elapsed = ?started.elapsed(), "analysis completed");
                Ok(Submission::Completed)
            }
            Err(err) => {
                inner.apply(WorkflowAction::Fail)?;
                inner.result = None;
                inner.file = None;
                inner.preview = None;
                inner.error = Some(err.clone());
                self.progress.send_replace(ProgressSnapshot {
                    percent: 0,
                    message: "Error occurred. Please try again.".to_string(),
                });
                warn!(flow = %self.flow, error = %err, "analysis failed");
                Ok(Submission::Failed(err))
            }
        }
    }

    // =============================================
    // リセット
    // =============================================

    /// どの状態からでも Idle に戻す
    ///
    /// 進捗タイマーを止め、送信待ちがあれば破棄させる。
    pub fn reset(&self) {
        let mut inner = self.lock();
        if let Err(e) = inner.apply(WorkflowAction::Reset) {
            warn!(error = %e, "reset transition rejected");
            inner.state = WorkflowState::Idle;
        }
        self.advance_generation(&mut inner);
        inner.stop_presenter();
        inner.file = None;
        inner.preview = None;
        inner.result = None;
        inner.error = None;
        inner.surface.drag_leave();
        self.progress.send_replace(ProgressSnapshot::idle());
        debug!(generation = inner.generation, "workflow reset");
    }

    /// 世代を進め、送信待ちの `submit` に通知する
    fn advance_generation(&self, inner: &mut Inner) {
        inner.generation += 1;
        self.cancel.send_replace(inner.generation);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// 世代番号が `generation` から変わるまで待つ
async fn reset_signal(rx: &mut watch::Receiver<u64>, generation: u64) {
    loop {
        if *rx.borrow_and_update() != generation {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xray_ai_common::DetectionResult;

    struct InstantApi;

    impl AnalysisApi for InstantApi {
        async fn submit(
            &self,
            _flow: Flow,
            _file: &UploadedFile,
        ) -> std::result::Result<AnalysisOutcome, AnalysisError> {
            Ok(AnalysisOutcome::Detection(DetectionResult::default()))
        }

        fn base_url(&self) -> &str {
            "http://localhost:8000"
        }
    }

    fn jpeg() -> FileCandidate {
        FileCandidate::new("hand.jpg", Some("image/jpeg"), vec![0xFF, 0xD8, 0xFF])
    }

    #[tokio::test]
    async fn test_select_sets_file_and_preview() {
        let wf = Workflow::new(Flow::Detection, InstantApi, WorkflowOptions::default());
        wf.select(jpeg()).await.unwrap();

        let snapshot = wf.snapshot();
        assert_eq!(snapshot.state, WorkflowState::FileSelected);
        assert_eq!(snapshot.file_name.as_deref(), Some("hand.jpg"));
        assert!(snapshot.preview.unwrap().data_url.starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn test_submit_without_file_is_rejected() {
        let wf = Workflow::new(Flow::Detection, InstantApi, WorkflowOptions::default());
        let err = wf.submit().await.unwrap_err();
        assert!(matches!(
            err,
            XrayAiError::Common(xray_ai_common::Error::InvalidTransition { .. })
        ));
        assert_eq!(wf.state(), WorkflowState::Idle);
    }

    #[tokio::test]
    async fn test_on_data_policy_completes_immediately() {
        let options = WorkflowOptions {
            stage_interval: Duration::from_secs(2),
            reveal: RevealPolicy::OnData,
        };
        let wf = Workflow::new(Flow::Detection, InstantApi, options);
        wf.select(jpeg()).await.unwrap();
        assert_eq!(wf.submit().await.unwrap(), Submission::Completed);
        assert_eq!(wf.state(), WorkflowState::Completed);
    }

    #[tokio::test]
    async fn test_reselect_then_submit_completes() {
        let options = WorkflowOptions {
            stage_interval: Duration::from_secs(2),
            reveal: RevealPolicy::OnData,
        };
        let wf = Workflow::new(Flow::Detection, InstantApi, options);
        wf.select(jpeg()).await.unwrap();
        wf.select(FileCandidate::new("knee.png", Some("image/png"), vec![0x89])).await.unwrap();

        assert_eq!(wf.submit().await.unwrap(), Submission::Completed);
        let snapshot = wf.snapshot();
        assert_eq!(snapshot.state, WorkflowState::Completed);
        assert_eq!(snapshot.file_name.as_deref(), Some("knee.png"));
        assert!(snapshot.result.is_some());
    }

    #[tokio::test]
    async fn test_drop_files_uses_surface() {
        let wf = Workflow::new(Flow::Detection, InstantApi, WorkflowOptions::default());
        wf.drag_enter();
        assert!(wf.is_dragging());
        wf.drop_files(vec![jpeg()]).await.unwrap();
        assert!(!wf.is_dragging());
        assert_eq!(wf.state(), WorkflowState::FileSelected);

        wf.drop_files(vec![]).await.unwrap();
        assert_eq!(wf.state(), WorkflowState::FileSelected);
    }
}
