//! dockpack-core エラー型

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("YAMLパースエラー: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error(
        "プロジェクト設定が見つかりません\n探索開始位置: {0}\nヒント: dockpack.yaml ファイルを含むディレクトリで実行してください"
    )]
    ProjectNotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, CoreError>;
