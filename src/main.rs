use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use xray_ai_common::{Flow, RevealPolicy};
use xray_ai_rust::api::{AnalysisApi, HttpApi};
use xray_ai_rust::cli::{Cli, Commands};
use xray_ai_rust::config::{validate_api_url, Config, API_URL_ENV};
use xray_ai_rust::display::{render_outcome, ProgressDisplay};
use xray_ai_rust::error::XrayAiError;
use xray_ai_rust::export::{self, SavedAnalysis};
use xray_ai_rust::workflow::{Submission, Workflow, WorkflowOptions};
use xray_ai_rust::{logging, scanner};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = Config::load().context("設定ファイルを読み込めません")?;
    let api_url = match cli.api_url.as_deref() {
        Some(url) => validate_api_url(url)?,
        None => config.api_url(),
    };

    match cli.command {
        Commands::Detect { path, output, save_images, no_delay, recursive } => {
            println!("🩻 xray-ai - 骨折検出\n");

            // 1. 対象ファイル
            let files = if path.is_dir() {
                println!("[1/3] 画像をスキャン中...");
                let scanned = scanner::scan_folder(&path, Flow::Detection, recursive)?;
                if scanned.is_empty() {
                    return Err(XrayAiError::NoFilesFound(path.display().to_string()).into());
                }
                println!("✔ {}件の画像を検出\n", scanned.len());
                scanned.into_iter().map(|f| f.path).collect()
            } else {
                println!("[1/3] 画像を確認中...");
                println!("✔ {}\n", path.display());
                vec![path]
            };

            // 2. 解析
            println!("[2/3] 解析中... ({})", api_url);
            let api = HttpApi::new(&api_url, config.timeout())?;
            let workflow = Workflow::new(Flow::Detection, api, workflow_options(&config, no_delay));
            let batch = run_batch(&workflow, &files, &api_url, save_images.as_deref(), false).await?;

            // 3. 保存
            finish_batch(&batch, files.len(), output.as_deref())?;
        }

        Commands::Report { file, output, no_delay, show_source } => {
            println!("📄 xray-ai - 検査レポート解析\n");

            println!("[1/2] 解析中... ({})", api_url);
            let api = HttpApi::new(&api_url, config.timeout())?;
            let workflow = Workflow::new(Flow::Report, api, workflow_options(&config, no_delay));
            let batch = run_batch(&workflow, &[file], &api_url, None, show_source).await?;

            finish_batch(&batch, 1, output.as_deref())?;
        }

        Commands::Status => {
            println!("🔌 xray-ai - サーバー状態\n");
            println!("  URL: {}", api_url);

            let api = HttpApi::new(&api_url, config.timeout())?;
            let health = api
                .health()
                .await
                .with_context(|| format!("サーバーに接続できません: {}", api_url))?;
            println!("  health: {}", health);

            match api.server_status().await {
                Ok(status) => {
                    println!("  status: {}", status.status);
                    if !status.message.is_empty() {
                        println!("  message: {}", status.message);
                    }
                    if !status.version.is_empty() {
                        println!("  version: {}", status.version);
                    }
                }
                Err(e) => println!("  ステータス取得失敗: {}", e),
            }
        }

        Commands::Config { set_api_url, show } => {
            if let Some(url) = set_api_url {
                config.set_api_url(url)?;
                println!("✔ APIのURLを設定しました");
            }

            if show {
                println!("設定:");
                if let Ok(path) = Config::config_path() {
                    println!("  ファイル: {}", path.display());
                }
                println!("  API URL: {}", api_url);
                if std::env::var(API_URL_ENV).is_ok() {
                    println!("    ({} により上書き)", API_URL_ENV);
                }
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  ステージ間隔: {}ms", config.stage_interval_ms);
                println!("  最低表示時間: {}ms", config.minimum_display_ms);
            }
        }
    }

    Ok(())
}

fn workflow_options(config: &Config, no_delay: bool) -> WorkflowOptions {
    let mut options = WorkflowOptions::from_config(config);
    if no_delay {
        options.reveal = RevealPolicy::OnData;
    }
    options
}

struct BatchOutcome {
    saved: Vec<SavedAnalysis>,
    failed: usize,
    interrupted: bool,
}

/// 1ファイルずつ select → submit → 表示 → reset を繰り返す
async fn run_batch(
    workflow: &Workflow<HttpApi>,
    files: &[PathBuf],
    api_url: &str,
    save_images: Option<&Path>,
    show_source: bool,
) -> Result<BatchOutcome> {
    let mut batch = BatchOutcome {
        saved: Vec::new(),
        failed: 0,
        interrupted: false,
    };

    for (i, path) in files.iter().enumerate() {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if files.len() > 1 {
            println!("\n[{}/{}] {}", i + 1, files.len(), file_name);
        }

        if let Err(e) = workflow.select_path(path).await {
            println!("❌ {}", e);
            batch.failed += 1;
            workflow.reset();
            continue;
        }

        let display = ProgressDisplay::attach(workflow.subscribe_progress());
        let submit = workflow.submit();
        tokio::pin!(submit);

        // Ctrl-C はリセットとして扱い、送信中のレスポンスは破棄される
        let finished = tokio::select! {
            submission = &mut submit => Some(submission),
            _ = tokio::signal::ctrl_c() => None,
        };
        let submission = match finished {
            Some(submission) => submission?,
            None => {
                workflow.reset();
                submit.await?
            }
        };

        match submission {
            Submission::Completed => {
                display.finish(true);
                let snapshot = workflow.snapshot();
                if let Some(outcome) = snapshot.result {
                    let base_url = workflow.api().base_url();
                    println!("{}", render_outcome(&outcome, base_url, &file_name));

                    if show_source {
                        if let Some(source) =
                            outcome.as_report().and_then(|r| r.original_document.as_deref())
                        {
                            println!("Original Document\n─────────────────\n{}\n", source);
                        }
                    }

                    if let (Some(dir), Some(result)) = (save_images, outcome.as_detection()) {
                        let saved =
                            export::download_assets(workflow.api(), result, &file_name, dir).await?;
                        println!("✔ 画像を{}件保存: {}", saved.len(), dir.display());
                    }

                    batch.saved.push(SavedAnalysis::new(&file_name, api_url, outcome));
                }
            }
            Submission::Failed(err) => {
                display.finish(false);
                println!("❌ {}: {}", file_name, err);
                batch.failed += 1;
            }
            Submission::Discarded => {
                display.finish(false);
                println!("⚠ 中断しました");
                batch.interrupted = true;
                break;
            }
        }

        workflow.reset();
    }

    Ok(batch)
}

fn finish_batch(batch: &BatchOutcome, total: usize, output: Option<&Path>) -> Result<()> {
    if let Some(output) = output {
        if !batch.saved.is_empty() {
            export::save_json(output, &batch.saved)?;
            println!("✔ 結果を保存: {}", output.display());
        }
    }

    if batch.interrupted {
        bail!("中断されました（{}/{}件完了）", batch.saved.len(), total);
    }
    if batch.saved.is_empty() && batch.failed > 0 {
        bail!("解析に失敗しました（{}件）", batch.failed);
    }

    println!("\n✅ 完了 ({}/{}件成功)", batch.saved.len(), total);
    Ok(())
}
