use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xray-ai")]
#[command(about = "X線画像の骨折検出・検査レポート解析クライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 解析APIのベースURL（環境変数・設定ファイルより優先）
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// X線画像の骨折検出（フォルダ指定で一括処理）
    Detect {
        /// 画像ファイルまたはフォルダのパス
        #[arg(required = true)]
        path: PathBuf,

        /// 結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 検出結果画像・Grad-CAM画像の保存先フォルダ
        #[arg(long)]
        save_images: Option<PathBuf>,

        /// 最低表示時間を待たずに結果を表示
        #[arg(long)]
        no_delay: bool,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// 検査レポート（PDF/画像）の解析
    Report {
        /// レポートファイルのパス
        #[arg(required = true)]
        file: PathBuf,

        /// 結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 最低表示時間を待たずに結果を表示
        #[arg(long)]
        no_delay: bool,

        /// 抽出された原文も表示
        #[arg(long)]
        show_source: bool,
    },

    /// 解析サーバーの状態を確認
    Status,

    /// 設定を表示/編集
    Config {
        /// APIのベースURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detect_folder() {
        let cli = Cli::parse_from([
            "xray-ai", "detect", "scans", "-r", "--no-delay", "--save-images", "out",
        ]);
        match cli.command {
            Commands::Detect { path, recursive, no_delay, save_images, output } => {
                assert_eq!(path, PathBuf::from("scans"));
                assert!(recursive);
                assert!(no_delay);
                assert_eq!(save_images, Some(PathBuf::from("out")));
                assert!(output.is_none());
            }
            _ => panic!("expected detect"),
        }
    }

    #[test]
    fn test_global_api_url_after_subcommand() {
        let cli = Cli::parse_from([
            "xray-ai", "report", "labs.pdf", "--api-url", "http://10.0.0.5:8000", "-v",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://10.0.0.5:8000"));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Report { show_source: false, .. }));
    }

    #[test]
    fn test_detect_requires_path() {
        assert!(Cli::try_parse_from(["xray-ai", "detect"]).is_err());
    }
}
