//! 結果JSON出力テスト

use serde_json::Value;
use tempfile::tempdir;
use xray_ai_common::{decode_response, Flow};
use xray_ai_rust::export::{load_json, save_json, SavedAnalysis};

const DETECTION_BODY: &str = r#"{
    "detection_id": "a1",
    "result_image": "/results/a1_result.jpg",
    "detections": [
        {"class": "fracture", "confidence": 0.88, "box": {"x1": 1, "y1": 2, "x2": 3, "y2": 4}}
    ]
}"#;

/// 保存したJSONはフロー名・結果・解析日時を含む
#[test]
fn test_saved_json_shape() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("result.json");

    let outcome = decode_response(Flow::Detection, 200, DETECTION_BODY.as_bytes()).unwrap();
    let saved = SavedAnalysis::new("wrist.jpg", "http://localhost:8000", outcome);
    save_json(&path, &[saved]).unwrap();

    let json: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let entry = &json[0];
    assert_eq!(entry["flow"], "detection");
    assert_eq!(entry["fileName"], "wrist.jpg");
    assert_eq!(entry["apiUrl"], "http://localhost:8000");
    assert!(entry["analyzedAt"].is_string());
    assert_eq!(entry["outcome"]["flow"], "detection");
    assert_eq!(entry["outcome"]["result"]["detections"][0]["class"], "fracture");
    assert_eq!(entry["outcome"]["result"]["detections"][0]["confidence"], 0.88);
}

/// バッチ結果は1ファイルの配列としてそのまま読み戻せる
#[test]
fn test_batch_round_trip_keeps_order() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("batch.json");

    let results: Vec<_> = ["a.jpg", "b.jpg", "c.jpg"]
        .iter()
        .map(|name| {
            let outcome = decode_response(Flow::Detection, 200, br#"{"detections": []}"#).unwrap();
            SavedAnalysis::new(name, "http://localhost:8000", outcome)
        })
        .collect();
    save_json(&path, &results).unwrap();

    let loaded = load_json(&path).unwrap();
    let names: Vec<_> = loaded.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
}
