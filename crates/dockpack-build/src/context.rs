//! Docker ビルドコンテキストの管理
//!
//! dockerbuild テンプレートをコンテキストディレクトリに展開し、
//! デーモンに渡す tar.gz アーカイブを作る。

use crate::dockerfile::{self, FormalArgs};
use crate::error::{BuildError, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::{Path, PathBuf};
use tar::Builder;

/// パッケージングメタデータの除外サブツリー
const EXCLUDED: &[&str] = &["META-INF"];

pub struct Context {
    directory: PathBuf,
}

impl Context {
    /// テンプレートディレクトリをコンテキストとして展開する
    ///
    /// 既存のコンテキストは削除してから作り直す（クリーンスレート保証）。
    /// テンプレートは相対パスを保ってコピーされるが、EXCLUDED 配下は除く。
    pub fn create(template: &Path, dest: &Path) -> Result<Context> {
        if !template.is_dir() {
            return Err(BuildError::TemplateNotFound(template.to_path_buf()));
        }
        if dest.exists() {
            std::fs::remove_dir_all(dest)?;
        }
        std::fs::create_dir_all(dest)?;
        copy_tree(template, dest)?;
        tracing::debug!(
            template = %template.display(),
            context = %dest.display(),
            "Build context created"
        );
        Ok(Context {
            directory: dest.to_path_buf(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn dockerfile(&self) -> PathBuf {
        self.directory.join("Dockerfile")
    }

    /// コンテキストの Dockerfile からフォーマル引数表を作る
    pub fn formals(&self) -> Result<FormalArgs> {
        dockerfile::scan(&self.dockerfile())
    }

    /// ファイルをコンテキスト直下にコピーし、コピー先のファイル名を返す
    ///
    /// コピー先は常にコンテキスト直下のファイル名のみ。呼び出し側の入力から
    /// パスを合成しないので、コンテキスト外への書き込みは起こらない。
    pub fn add_file(&self, src: &Path) -> Result<String> {
        if !src.is_file() {
            return Err(BuildError::FileNotFound(src.to_path_buf()));
        }
        let name = src
            .file_name()
            .ok_or_else(|| BuildError::FileNotFound(src.to_path_buf()))?
            .to_string_lossy()
            .to_string();
        let dest = self.directory.join(&name);
        std::fs::copy(src, &dest)?;
        tracing::info!("cp {} {}", src.display(), dest.display());
        Ok(name)
    }

    /// コンテキストを tar.gz アーカイブにエンコードする
    pub fn tar(&self) -> Result<Vec<u8>> {
        let mut archive_data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut archive_data, Compression::default());
            let mut tar = Builder::new(encoder);
            tar.append_dir_all(".", &self.directory)
                .map_err(BuildError::Io)?;
            tar.finish().map_err(BuildError::Io)?;
        }
        tracing::debug!("Build context encoded: {} bytes", archive_data.len());
        check_context_size(archive_data.len());
        Ok(archive_data)
    }
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.directory.display())
    }
}

fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        let src_path = entry.path();
        let dest_path = dest.join(&name);
        if src_path.is_dir() {
            if EXCLUDED.iter().any(|e| name == *e) {
                continue;
            }
            std::fs::create_dir_all(&dest_path)?;
            copy_tree(&src_path, &dest_path)?;
        } else {
            std::fs::copy(&src_path, &dest_path)?;
        }
    }
    Ok(())
}

/// コンテキストサイズのチェックと警告
fn check_context_size(size: usize) {
    const MAX_CONTEXT_SIZE: usize = 500 * 1024 * 1024; // 500MB

    if size > MAX_CONTEXT_SIZE {
        tracing::warn!(
            "ビルドコンテキストが大きすぎます（{}MB）。\
             テンプレートに不要なファイルが含まれていないか確認してください。",
            size / 1024 / 1024
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn template_with(files: &[(&str, &str)]) -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        for (path, content) in files {
            let full = temp.path().join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(full, content).unwrap();
        }
        temp
    }

    #[test]
    fn test_create_copies_template_tree() {
        let template = template_with(&[
            ("Dockerfile", "FROM alpine\nARG greeting=hi\n"),
            ("scripts/run.sh", "#!/bin/sh\n"),
        ]);
        let dest = tempdir().unwrap();
        let context_dir = dest.path().join("context");

        let context = Context::create(template.path(), &context_dir).unwrap();
        assert!(context.dockerfile().is_file());
        assert!(context_dir.join("scripts/run.sh").is_file());

        let formals = context.formals().unwrap();
        assert!(formals.contains("greeting"));
    }

    #[test]
    fn test_create_is_clean_slate() {
        let template = template_with(&[("Dockerfile", "FROM alpine\n")]);
        let dest = tempdir().unwrap();
        let context_dir = dest.path().join("context");

        fs::create_dir_all(&context_dir).unwrap();
        fs::write(context_dir.join("stale.txt"), "old").unwrap();

        Context::create(template.path(), &context_dir).unwrap();
        assert!(!context_dir.join("stale.txt").exists());
    }

    #[test]
    fn test_create_excludes_metadata() {
        let template = template_with(&[
            ("Dockerfile", "FROM alpine\n"),
            ("META-INF/MANIFEST.MF", "Manifest-Version: 1.0\n"),
        ]);
        let dest = tempdir().unwrap();
        let context_dir = dest.path().join("context");

        Context::create(template.path(), &context_dir).unwrap();
        assert!(!context_dir.join("META-INF").exists());
    }

    #[test]
    fn test_create_missing_template() {
        let dest = tempdir().unwrap();
        let result = Context::create(&dest.path().join("nope"), &dest.path().join("context"));
        assert!(matches!(result, Err(BuildError::TemplateNotFound(_))));
    }

    #[test]
    fn test_add_file_returns_name() {
        let template = template_with(&[("Dockerfile", "FROM alpine\n")]);
        let dest = tempdir().unwrap();
        let context = Context::create(template.path(), &dest.path().join("context")).unwrap();

        let extra = dest.path().join("my-service-1.2.0.jar");
        fs::write(&extra, "jar bytes").unwrap();

        let name = context.add_file(&extra).unwrap();
        assert_eq!(name, "my-service-1.2.0.jar");
        assert!(context.directory().join(name).is_file());
    }

    #[test]
    fn test_add_file_missing_source() {
        let template = template_with(&[("Dockerfile", "FROM alpine\n")]);
        let dest = tempdir().unwrap();
        let context = Context::create(template.path(), &dest.path().join("context")).unwrap();

        let result = context.add_file(&dest.path().join("missing.jar"));
        assert!(matches!(result, Err(BuildError::FileNotFound(_))));
    }

    #[test]
    fn test_tar_round_trip() {
        let template = template_with(&[
            ("Dockerfile", "FROM alpine\n"),
            ("scripts/run.sh", "#!/bin/sh\n"),
        ]);
        let dest = tempdir().unwrap();
        let context = Context::create(template.path(), &dest.path().join("context")).unwrap();

        let archive = context.tar().unwrap();
        assert!(!archive.is_empty());

        let extract = tempdir().unwrap();
        let decoder = flate2::read::GzDecoder::new(std::io::Cursor::new(archive));
        let mut tar = tar::Archive::new(decoder);
        tar.unpack(extract.path()).unwrap();
        assert!(extract.path().join("Dockerfile").is_file());
        assert!(extract.path().join("scripts/run.sh").is_file());
    }
}
