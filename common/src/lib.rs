//! X-ray AI Common Library
//!
//! CLIクライアントと共有される型・状態機械・表示ロジック
//! （I/Oを含まない純粋な処理のみ）

pub mod error;
pub mod markdown;
pub mod media;
pub mod parser;
pub mod progress;
pub mod render;
pub mod types;
pub mod upload;
pub mod workflow;

pub use error::{AnalysisError, Error, Result};
pub use markdown::render_markdown;
pub use media::{FileCandidate, Flow, MediaType, UploadedFile};
pub use parser::{decode_response, extract_parameters, resolve_asset_url};
pub use progress::{stages_for, ProgressSnapshot, ProgressStage, RevealPolicy};
pub use render::{ConfidenceTier, DetectionView, Findings, ReportView};
pub use types::{
    AnalysisOutcome, BoundingBox, Detection, DetectionResult, ExtractedParameter, ReportResult,
    ServerStatus,
};
pub use upload::UploadSurface;
pub use workflow::{transition, WorkflowAction, WorkflowState};
