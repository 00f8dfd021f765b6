//! ビルド状態のディレクトリレイアウト
//!
//! `<build_dir>/dockerbuild/` 配下にコンテキスト、ビルドログ、
//! 解決済みイメージ参照を置く。`image` ファイルは build が書き、
//! push が読み戻す受け渡し点。

use crate::error::{BuildError, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(build_dir: &Path) -> Self {
        Self {
            root: build_dir.join("dockerbuild"),
        }
    }

    pub fn context(&self) -> PathBuf {
        self.root.join("context")
    }

    pub fn build_log(&self) -> PathBuf {
        self.root.join("build.log")
    }

    pub fn image_file(&self) -> PathBuf {
        self.root.join("image")
    }

    /// 解決済みイメージ参照を永続化する
    pub fn write_image(&self, image: &str) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.image_file(), format!("{}\n", image))?;
        Ok(())
    }

    /// 永続化されたイメージ参照を読み戻す
    pub fn read_image(&self) -> Result<String> {
        let path = self.image_file();
        if !path.is_file() {
            return Err(BuildError::ImageNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(&path).map_err(|e| BuildError::ReadFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(content.trim().to_string())
    }
}
