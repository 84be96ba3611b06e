//! 端末表示（進捗バーと結果）

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use xray_ai_common::{AnalysisOutcome, DetectionView, ProgressSnapshot, ReportView};

/// 進捗スナップショットを indicatif のバーに反映する
pub struct ProgressDisplay {
    bar: ProgressBar,
    task: JoinHandle<()>,
}

impl ProgressDisplay {
    pub fn attach(mut rx: watch::Receiver<ProgressSnapshot>) -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("  {bar:40.cyan/blue} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        bar.set_style(style);
        apply(&bar, &rx.borrow_and_update());

        let task_bar = bar.clone();
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                apply(&task_bar, &snapshot);
            }
        });

        Self { bar, task }
    }

    /// 成功時はバーを残し、失敗・中断時は消す
    pub fn finish(self, keep: bool) {
        self.task.abort();
        if keep {
            self.bar.finish();
        } else {
            self.bar.finish_and_clear();
        }
    }
}

fn apply(bar: &ProgressBar, snapshot: &ProgressSnapshot) {
    bar.set_position(u64::from(snapshot.percent));
    bar.set_message(snapshot.message.clone());
}

/// 解析結果を端末向けテキストに整形
pub fn render_outcome(outcome: &AnalysisOutcome, base_url: &str, original: &str) -> String {
    match outcome {
        AnalysisOutcome::Detection(result) => {
            DetectionView::build(result, base_url, original).to_string()
        }
        AnalysisOutcome::Report(result) => ReportView::build(result).to_string(),
    }
}
