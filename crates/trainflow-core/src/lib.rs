//! trainflow のコア機能
//!
//! 実行設定 (run configuration) の永続化と、`.trainflow/` ディレクトリを
//! 基準にしたプロジェクトルートの発見を提供します。

pub mod discovery;
pub mod error;
pub mod runconfig;

pub use discovery::{find_project_root, find_project_root_from};
pub use error::{CoreError, Result};
pub use runconfig::{Materialized, RunConfig, RunConfigStore};
