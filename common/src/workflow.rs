//! ワークフロー状態機械
//!
//! ```text
//! Idle ──select──▶ FileSelected ──submit──▶ Submitting ──complete──▶ Completed
//!                    ▲    │                      │
//!                    └────┘ select               └──fail──▶ Failed ──select──▶ FileSelected
//! (any) ──reset──▶ Idle
//! ```
//!
//! 状態遷移はすべて [`transition`] を通す。

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// ワークフローの状態（1インスタンスにつき常に1つ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Idle,
    FileSelected,
    Submitting,
    Completed,
    Failed,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::FileSelected => "file-selected",
            WorkflowState::Submitting => "submitting",
            WorkflowState::Completed => "completed",
            WorkflowState::Failed => "failed",
        }
    }

    pub fn can_submit(&self) -> bool {
        transition(*self, WorkflowAction::Submit).is_ok()
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 状態遷移を起こす操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Select,
    Submit,
    Complete,
    Fail,
    Reset,
}

impl WorkflowAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::Select => "select a file",
            WorkflowAction::Submit => "submit",
            WorkflowAction::Complete => "complete",
            WorkflowAction::Fail => "fail",
            WorkflowAction::Reset => "reset",
        }
    }
}

impl std::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 遷移先の状態を返す。許可されない遷移は `Error::InvalidTransition`
pub fn transition(state: WorkflowState, action: WorkflowAction) -> Result<WorkflowState> {
    use WorkflowAction as A;
    use WorkflowState as S;

    let next = match (state, action) {
        (_, A::Reset) => S::Idle,
        (S::Idle | S::FileSelected | S::Failed, A::Select) => S::FileSelected,
        (S::FileSelected, A::Submit) => S::Submitting,
        (S::Submitting, A::Complete) => S::Completed,
        (S::Submitting, A::Fail) => S::Failed,
        _ => return Err(Error::InvalidTransition { state, action }),
    };

    Ok(next)
}
