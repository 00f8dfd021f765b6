//! VCS コラボレータ
//!
//! git への同期的な外部プロセス呼び出し。origin の発見は失敗しても
//! "unknown" に退化するが、ブランチ解決の失敗は呼び出し側でエラーになる。

use crate::error::{BuildError, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// カレントブランチ名を返す（`git symbolic-ref --short -q HEAD`）
///
/// detached HEAD やリポジトリ外ではエラー。
pub fn current_branch(working: &Path) -> Result<String> {
    let output = git(working, &["symbolic-ref", "--short", "-q", "HEAD"])
        .map_err(|e| BuildError::BranchLookup(e.to_string()))?;
    if !output.status.success() {
        return Err(BuildError::BranchLookup(format!(
            "git symbolic-ref exited with {}",
            output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// ビルド元のSCM URLを返す
///
/// `working` から上方向に `.git` ディレクトリを探し、見つかれば
/// `git:<remote.origin.url>`、見つからない（または git が失敗する）場合は
/// "unknown" を返す。
pub fn origin_or_unknown(working: &Path) -> String {
    let mut dir = Some(working);
    while let Some(current) = dir {
        if current.join(".git").is_dir() {
            match remote_origin_url(current) {
                Some(url) => return format!("git:{}", url),
                None => break,
            }
        }
        dir = current.parent();
    }
    "unknown".to_string()
}

fn remote_origin_url(dir: &Path) -> Option<String> {
    let output = git(dir, &["config", "--get", "remote.origin.url"]).ok()?;
    if !output.status.success() {
        debug!(dir = %dir.display(), "git config --get remote.origin.url failed");
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn git(cwd: &Path, args: &[&str]) -> std::io::Result<std::process::Output> {
    Command::new("git").current_dir(cwd).args(args).output()
}
