//! プロジェクト設定発見ロジック
//!
//! dockpack.yaml を自動的に発見する（環境変数 → 上方向探索）。

use crate::error::{CoreError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// プロジェクト設定ファイル名
const PROJECT_FILENAME: &str = "dockpack.yaml";

/// プロジェクト設定ファイルの環境変数
const PROJECT_PATH_ENV: &str = "DOCKPACK_PATH";

/// dockpack.yaml を発見する
///
/// 検索順序:
/// 1. DOCKPACK_PATH 環境変数
/// 2. カレントディレクトリから上方向探索
pub fn find_project_file() -> Result<PathBuf> {
    if let Ok(path_str) = std::env::var(PROJECT_PATH_ENV) {
        let path = PathBuf::from(&path_str);
        debug!(env_path = %path_str, "Checking DOCKPACK_PATH");
        if path.exists() {
            info!(project_path = %path.display(), "Found project file from environment variable");
            return Ok(path);
        }
        warn!(env_path = %path_str, "DOCKPACK_PATH is set but file does not exist");
    }

    let start_dir = std::env::current_dir()?;
    find_project_file_from(&start_dir)
}

/// 指定ディレクトリから上方向に dockpack.yaml を探す
pub fn find_project_file_from(start_dir: &Path) -> Result<PathBuf> {
    let mut current = start_dir.to_path_buf();
    debug!(start_dir = %start_dir.display(), "Searching for {}", PROJECT_FILENAME);

    loop {
        let project_file = current.join(PROJECT_FILENAME);
        if project_file.exists() {
            info!(project_path = %project_file.display(), "Found project file");
            return Ok(project_file);
        }
        if !current.pop() {
            return Err(CoreError::ProjectNotFound(start_dir.to_path_buf()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_find_from_current_dir() {
        let temp = tempdir().unwrap();
        let file = temp.path().join(PROJECT_FILENAME);
        fs::write(&file, "group: g\nartifact: a\nversion: 1.0\n").unwrap();

        let found = find_project_file_from(temp.path()).unwrap();
        assert_eq!(found, file);
    }

    #[test]
    fn test_find_walks_upward() {
        let temp = tempdir().unwrap();
        let file = temp.path().join(PROJECT_FILENAME);
        fs::write(&file, "group: g\nartifact: a\nversion: 1.0\n").unwrap();

        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        let found = find_project_file_from(&nested).unwrap();
        assert_eq!(found, file);
    }

    #[test]
    fn test_not_found() {
        let temp = tempdir().unwrap();
        let result = find_project_file_from(temp.path());
        assert!(matches!(result, Err(CoreError::ProjectNotFound(_))));
    }
}
