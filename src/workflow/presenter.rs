//! 疑似進捗の表示タイマー
//!
//! 送信中のみ動作し、停止（drop）した時点でタスクを abort する。
//! 停止後にスナップショットが配信されることはない。

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::trace;
use xray_ai_common::{ProgressSnapshot, ProgressStage};

pub struct ProgressPresenter {
    handle: JoinHandle<()>,
}

impl ProgressPresenter {
    /// `starting` を即時配信し、以降 `interval` ごとに次のステージを配信する
    pub fn start(
        tx: Arc<watch::Sender<ProgressSnapshot>>,
        stages: &'static [ProgressStage],
        interval: Duration,
    ) -> Self {
        tx.send_replace(ProgressSnapshot::starting());

        let handle = tokio::spawn(async move {
            for stage in stages {
                tokio::time::sleep(interval).await;
                trace!(percent = stage.percent, "progress stage");
                tx.send_replace(ProgressSnapshot::from(stage));
            }
        });

        Self { handle }
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for ProgressPresenter {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
