//! 実行設定の永続化
//!
//! `.trainflow/runconfigs/` 配下にコンピュートターゲット名をキーとして
//! 実行設定を保存します。ファイルは構造化された値をそのままJSONとして
//! 書き出したもので、プレースホルダ置換は行いません。一度書かれた
//! ファイルは変更されず、再生成が明示的に確認された場合のみ上書き
//! されます。

use crate::discovery::PROJECT_DIR;
use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const RUNCONFIG_SUBDIR: &str = "runconfigs";

/// 実行設定
///
/// すべての参照先リソースが解決済みになってから作成される束縛レコード。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// 学習スクリプトのパス（プロジェクトルートからの相対）
    pub script: String,

    /// コンピュートターゲット名
    pub compute_target: String,

    /// 解決済みの環境名
    pub environment: String,

    /// 登録済みデータセットID（データセットなしの実行では省略）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,

    /// 実験名
    pub experiment: String,

    /// 最初に書き出された日時
    pub created_at: DateTime<Utc>,
}

/// 実行設定の書き込み結果
#[derive(Debug)]
pub enum Materialized {
    /// 新しく書き出した
    Written(PathBuf),

    /// 既存ファイルをそのまま再利用した
    Reused(PathBuf, RunConfig),
}

impl Materialized {
    pub fn path(&self) -> &Path {
        match self {
            Materialized::Written(path) => path,
            Materialized::Reused(path, _) => path,
        }
    }
}

/// 実行設定ファイルの読み書き
pub struct RunConfigStore {
    project_root: PathBuf,
}

impl RunConfigStore {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    /// 実行設定ディレクトリのパス
    fn dir(&self) -> PathBuf {
        self.project_root.join(PROJECT_DIR).join(RUNCONFIG_SUBDIR)
    }

    /// コンピュートターゲット名に対応するファイルパス
    pub fn path_for(&self, compute_target: &str) -> PathBuf {
        self.dir().join(format!("{compute_target}.json"))
    }

    /// 実行設定ファイルが存在するか
    pub fn exists(&self, compute_target: &str) -> bool {
        self.path_for(compute_target).exists()
    }

    /// 実行設定を読み込む
    pub async fn load(&self, compute_target: &str) -> Result<RunConfig> {
        let path = self.path_for(compute_target);
        if !path.exists() {
            return Err(CoreError::RunConfigNotFound(path));
        }

        let content = fs::read_to_string(&path).await?;
        let config: RunConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 実行設定を書き出す
    pub async fn save(&self, config: &RunConfig) -> Result<PathBuf> {
        let dir = self.dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created runconfig directory: {}", dir.display());
        }

        let path = self.path_for(&config.compute_target);
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved run configuration: {}", path.display());
        Ok(path)
    }

    /// 実行設定を具現化する
    ///
    /// 既存ファイルがある場合は `regenerate` が真のときだけ書き直し、
    /// それ以外は既存の内容をそのまま採用します。
    pub async fn materialize(&self, config: &RunConfig, regenerate: bool) -> Result<Materialized> {
        let path = self.path_for(&config.compute_target);

        if path.exists() && !regenerate {
            let existing = self.load(&config.compute_target).await?;
            tracing::debug!("Reusing existing run configuration: {}", path.display());
            return Ok(Materialized::Reused(path, existing));
        }

        let path = self.save(config).await?;
        Ok(Materialized::Written(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_config() -> RunConfig {
        RunConfig {
            script: "train.py".to_string(),
            compute_target: "cpu1".to_string(),
            environment: "TF-Env".to_string(),
            dataset_id: Some("ds-123".to_string()),
            experiment: "digits".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let store = RunConfigStore::new(temp_dir.path());

        let config = sample_config();
        let path = store.save(&config).await.unwrap();
        assert!(path.ends_with(".trainflow/runconfigs/cpu1.json"));

        let loaded = store.load("cpu1").await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_written_file_contains_resolved_values_only() {
        let temp_dir = tempdir().unwrap();
        let store = RunConfigStore::new(temp_dir.path());

        let path = store.save(&sample_config()).await.unwrap();
        let content = std::fs::read_to_string(path).unwrap();

        // 解決済みの4つの値がそのまま書かれ、プレースホルダは残らない
        assert!(content.contains("cpu1"));
        assert!(content.contains("train.py"));
        assert!(content.contains("TF-Env"));
        assert!(content.contains("ds-123"));
        assert!(!content.contains('$'));
    }

    #[tokio::test]
    async fn test_materialize_reuses_existing_file() {
        let temp_dir = tempdir().unwrap();
        let store = RunConfigStore::new(temp_dir.path());

        let original = sample_config();
        store.save(&original).await.unwrap();

        // 内容を変えて再実行しても、既存ファイルが勝つ
        let mut changed = sample_config();
        changed.environment = "PyTorch-Env".to_string();

        match store.materialize(&changed, false).await.unwrap() {
            Materialized::Reused(_, existing) => {
                assert_eq!(existing.environment, "TF-Env");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_materialize_regenerates_when_confirmed() {
        let temp_dir = tempdir().unwrap();
        let store = RunConfigStore::new(temp_dir.path());

        store.save(&sample_config()).await.unwrap();

        let mut changed = sample_config();
        changed.environment = "PyTorch-Env".to_string();

        match store.materialize(&changed, true).await.unwrap() {
            Materialized::Written(_) => {}
            other => panic!("unexpected result: {other:?}"),
        }

        let loaded = store.load("cpu1").await.unwrap();
        assert_eq!(loaded.environment, "PyTorch-Env");
    }

    #[tokio::test]
    async fn test_load_missing_config() {
        let temp_dir = tempdir().unwrap();
        let store = RunConfigStore::new(temp_dir.path());

        let err = store.load("gpu1").await.unwrap_err();
        assert!(matches!(err, CoreError::RunConfigNotFound(_)));
    }

    #[tokio::test]
    async fn test_dataset_id_omitted_when_absent() {
        let temp_dir = tempdir().unwrap();
        let store = RunConfigStore::new(temp_dir.path());

        let mut config = sample_config();
        config.dataset_id = None;

        let path = store.save(&config).await.unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(!content.contains("dataset_id"));
    }
}
