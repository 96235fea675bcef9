//! プロジェクトルートの発見
//!
//! `.trainflow/` ディレクトリを持つ最も近い祖先ディレクトリをプロジェクト
//! ルートとして扱います。見つからない場合は開始ディレクトリをそのまま
//! 返します（初回実行時に `.trainflow/` が作成されるため）。

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// プロジェクトルートの目印となるディレクトリ
pub const PROJECT_DIR: &str = ".trainflow";

/// プロジェクトルートを検出
///
/// 以下の優先順位で検索:
/// 1. 環境変数 TRAINFLOW_PROJECT_ROOT
/// 2. カレントディレクトリから上に向かって `.trainflow/` を探す
/// 3. 見つからなければカレントディレクトリ
pub fn find_project_root() -> std::io::Result<PathBuf> {
    // 1. 環境変数
    if let Ok(root) = std::env::var("TRAINFLOW_PROJECT_ROOT") {
        let path = PathBuf::from(&root);
        debug!(env_root = %root, "Checking TRAINFLOW_PROJECT_ROOT");
        if path.is_dir() {
            info!(project_root = %path.display(), "Found project root from environment variable");
            return Ok(path);
        }
    }

    // 2. カレントディレクトリから探索
    let start_dir = std::env::current_dir()?;
    Ok(find_project_root_from(&start_dir))
}

/// 指定ディレクトリから上に向かってプロジェクトルートを探す
pub fn find_project_root_from(start: &Path) -> PathBuf {
    for dir in start.ancestors() {
        if dir.join(PROJECT_DIR).is_dir() {
            debug!(project_root = %dir.display(), "Found project root");
            return dir.to_path_buf();
        }
    }

    debug!(start_dir = %start.display(), "No project root marker, using start directory");
    start.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_marker_in_ancestor() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join(".trainflow")).unwrap();
        fs::create_dir_all(root.join("src/models")).unwrap();

        let found = find_project_root_from(&root.join("src/models"));
        assert_eq!(found, root);
    }

    #[test]
    fn test_no_marker_falls_back_to_start() {
        let temp_dir = tempfile::tempdir().unwrap();
        let start = temp_dir.path().join("work");
        fs::create_dir_all(&start).unwrap();

        let found = find_project_root_from(&start);
        assert_eq!(found, start);
    }
}
