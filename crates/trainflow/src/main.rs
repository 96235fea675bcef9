mod commands;
mod confirm;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "train")]
#[command(about = "リソースの鎖を、一歩ずつ。MLプロビジョニングは、対話になった。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// プロビジョニングウォークスルーを実行
    Up(UpArgs),
    /// リソースチェーンの状態を表示
    Status(StatusArgs),
    /// 保存済みの実行設定でジョブを送信
    Submit(SubmitArgs),
    /// バージョン情報を表示
    Version,
}

#[derive(Args)]
struct UpArgs {
    /// リソースグループ名
    #[arg(short = 'g', long, env = "TRAIN_RESOURCE_GROUP")]
    resource_group: String,

    /// リソースグループ作成時のロケーション
    #[arg(short = 'l', long, env = "TRAIN_LOCATION", default_value = "eastus")]
    location: String,

    /// ワークスペース名
    #[arg(short = 'w', long, env = "TRAIN_WORKSPACE")]
    workspace: String,

    /// コンピュートターゲット名
    #[arg(short = 'c', long, env = "TRAIN_COMPUTE_TARGET")]
    compute_target: String,

    /// コンピュート作成時のVMサイズ
    #[arg(long, default_value = "STANDARD_DS2_V2")]
    vm_size: String,

    /// オートスケールの最大ノード数
    #[arg(long, default_value_t = 4)]
    max_nodes: u32,

    /// サブスクリプションID（省略時はazのデフォルト）
    #[arg(long, env = "TRAIN_SUBSCRIPTION")]
    subscription: Option<String>,

    /// 実験名
    #[arg(short = 'e', long, env = "TRAIN_EXPERIMENT")]
    experiment: String,

    /// 学習スクリプトのパス
    #[arg(long, default_value = "train.py")]
    script: String,

    /// 既存データセット名（未登録ならデフォルト定義での登録を提案）
    #[arg(long, group = "dataset_selector")]
    dataset_name: Option<String>,

    /// データセット定義ファイル
    #[arg(long, group = "dataset_selector")]
    dataset_file: Option<PathBuf>,

    /// 登録済みデータセットID
    #[arg(long, group = "dataset_selector")]
    dataset_id: Option<String>,

    /// 環境名（完全一致）
    #[arg(long, group = "environment_selector")]
    environment: Option<String>,

    /// 環境名の部分文字列（最も新しいバージョンを選択）
    #[arg(long, group = "environment_selector")]
    environment_match: Option<String>,

    /// 既存の実行設定を作り直す
    #[arg(long)]
    regenerate: bool,

    /// 実行設定をジョブとして送信する
    #[arg(long)]
    submit: bool,

    /// 確認なしで実行
    #[arg(short, long)]
    yes: bool,
}

#[derive(Args)]
struct StatusArgs {
    /// リソースグループ名
    #[arg(short = 'g', long, env = "TRAIN_RESOURCE_GROUP")]
    resource_group: String,

    /// ワークスペース名
    #[arg(short = 'w', long, env = "TRAIN_WORKSPACE")]
    workspace: Option<String>,

    /// コンピュートターゲット名
    #[arg(short = 'c', long, env = "TRAIN_COMPUTE_TARGET")]
    compute_target: Option<String>,

    /// データセット名
    #[arg(long)]
    dataset_name: Option<String>,

    /// サブスクリプションID（省略時はazのデフォルト）
    #[arg(long, env = "TRAIN_SUBSCRIPTION")]
    subscription: Option<String>,
}

#[derive(Args)]
struct SubmitArgs {
    /// リソースグループ名
    #[arg(short = 'g', long, env = "TRAIN_RESOURCE_GROUP")]
    resource_group: String,

    /// ワークスペース名
    #[arg(short = 'w', long, env = "TRAIN_WORKSPACE")]
    workspace: String,

    /// コンピュートターゲット名（実行設定のキー）
    #[arg(short = 'c', long, env = "TRAIN_COMPUTE_TARGET")]
    compute_target: String,

    /// サブスクリプションID（省略時はazのデフォルト）
    #[arg(long, env = "TRAIN_SUBSCRIPTION")]
    subscription: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // CLIコマンドはstderrにログ出力
    tracing_subscriber::fmt::init();

    // Versionコマンドはazもプロジェクトも不要
    if matches!(cli.command, Commands::Version) {
        println!("trainflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    match cli.command {
        Commands::Up(args) => commands::up::handle(args).await?,
        Commands::Status(args) => commands::status::handle(args).await?,
        Commands::Submit(args) => commands::submit::handle(args).await?,
        Commands::Version => {
            unreachable!("Version is handled before dispatch");
        }
    }

    Ok(())
}
