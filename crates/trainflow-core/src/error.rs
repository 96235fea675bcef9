use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSONエラー: {0}")]
    Json(#[from] serde_json::Error),

    #[error("実行設定が見つかりません: {0}\nヒント: 先に 'train up' を実行してください")]
    RunConfigNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, CoreError>;
