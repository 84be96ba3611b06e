//! 疑似進捗ステージと結果表示ポリシー
//!
//! 進捗はサーバーの実際の処理状況とは無関係で、一定間隔で
//! 固定のステージを進めるだけの表示用シミュレーション。

use serde::Serialize;
use std::time::Duration;

use crate::media::Flow;

/// 進捗ステージ（割合, メッセージ）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStage {
    pub percent: u8,
    pub message: &'static str,
}

const fn stage(percent: u8, message: &'static str) -> ProgressStage {
    ProgressStage { percent, message }
}

const DETECTION_STAGES: &[ProgressStage] = &[
    stage(20, "Uploading X-ray image..."),
    stage(40, "Processing image analysis..."),
    stage(60, "Identifying fracture patterns..."),
    stage(80, "Generating visualization..."),
    stage(100, "Finalizing report..."),
];

const REPORT_STAGES: &[ProgressStage] = &[
    stage(20, "Uploading document..."),
    stage(40, "Extracting text from document..."),
    stage(60, "Reading test parameters..."),
    stage(80, "Writing simplified explanation..."),
    stage(100, "Finalizing analysis..."),
];

/// ステージ切り替え間隔のデフォルト
pub const DEFAULT_STAGE_INTERVAL: Duration = Duration::from_secs(2);

/// フローごとのステージ表
pub fn stages_for(flow: Flow) -> &'static [ProgressStage] {
    match flow {
        Flow::Detection => DETECTION_STAGES,
        Flow::Report => REPORT_STAGES,
    }
}

/// 購読者に配信される進捗スナップショット
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProgressSnapshot {
    pub percent: u8,
    pub message: String,
}

impl ProgressSnapshot {
    /// 待機中（リセット直後）
    pub fn idle() -> Self {
        Self::default()
    }

    /// 送信開始直後
    pub fn starting() -> Self {
        Self {
            percent: 0,
            message: "Uploading...".to_string(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.percent == 0 && self.message.is_empty()
    }
}

impl From<&ProgressStage> for ProgressSnapshot {
    fn from(stage: &ProgressStage) -> Self {
        Self {
            percent: stage.percent,
            message: stage.message.to_string(),
        }
    }
}

/// 結果をいつ表示するか
///
/// 「タイマー完了」と「データ到着」の結合を明示的なポリシーとして扱う。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPolicy {
    /// データ到着と同時に表示
    OnData,
    /// 送信開始から最低この時間は進捗を表示してから結果を出す
    MinimumDisplay(Duration),
}

impl RevealPolicy {
    /// 全ステージ + 1間隔分（元のUIと同じ 5×2秒+2秒 = 12秒）
    pub fn full_presentation(stage_count: usize, interval: Duration) -> Self {
        let steps = u32::try_from(stage_count).unwrap_or(u32::MAX).saturating_add(1);
        RevealPolicy::MinimumDisplay(interval.saturating_mul(steps))
    }

    /// 送信開始からの経過時間に対し、あとどれだけ待つか
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        match self {
            RevealPolicy::OnData => Duration::ZERO,
            RevealPolicy::MinimumDisplay(minimum) => minimum.saturating_sub(elapsed),
        }
    }
}

impl Default for RevealPolicy {
    fn default() -> Self {
        Self::full_presentation(DETECTION_STAGES.len(), DEFAULT_STAGE_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_are_ordered_and_end_at_100() {
        for flow in [Flow::Detection, Flow::Report] {
            let stages = stages_for(flow);
            assert_eq!(stages.len(), 5);
            assert!(stages.windows(2).all(|w| w[0].percent < w[1].percent));
            assert_eq!(stages.last().map(|s| s.percent), Some(100));
        }
    }

    #[test]
    fn test_default_policy_is_twelve_seconds() {
        assert_eq!(
            RevealPolicy::default(),
            RevealPolicy::MinimumDisplay(Duration::from_secs(12))
        );
    }

    #[test]
    fn test_remaining_saturates() {
        let policy = RevealPolicy::MinimumDisplay(Duration::from_secs(12));
        assert_eq!(policy.remaining(Duration::from_secs(3)), Duration::from_secs(9));
        assert_eq!(policy.remaining(Duration::from_secs(30)), Duration::ZERO);
        assert_eq!(RevealPolicy::OnData.remaining(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_snapshot_from_stage() {
        let snapshot = ProgressSnapshot::from(&stages_for(Flow::Detection)[2]);
        assert_eq!(snapshot.percent, 60);
        assert_eq!(snapshot.message, "Identifying fracture patterns...");
        assert!(ProgressSnapshot::idle().is_idle());
        assert!(!ProgressSnapshot::starting().is_idle());
    }
}
