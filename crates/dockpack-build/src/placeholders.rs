//! イメージ参照テンプレートのプレースホルダ解決
//!
//! `%a`（アーティファクトID）、`%g`（グループID末尾）、`%V`（バージョン）、
//! `%b`（カレントブランチ）を展開する。`%-x` は解決結果が空のとき
//! 先頭のハイフンごと出力を抑制する。
//! fabric8 のイメージ名プレースホルダに触発された記法。

use crate::error::{BuildError, Result};
use crate::vcs;
use chrono::{DateTime, Utc};
use dockpack_core::{BranchEmission, Project, SNAPSHOT_SUFFIX};
use std::path::{Path, PathBuf};

/// SNAPSHOTタイムスタンプのフォーマット（yyyyMMdd-HHmmss-SSS 相当）
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S-%3f";

pub struct Placeholders<'a> {
    project: &'a Project,
    working: PathBuf,
}

impl<'a> Placeholders<'a> {
    pub fn new(project: &'a Project, working: &Path) -> Self {
        Self {
            project,
            working: working.to_path_buf(),
        }
    }

    /// テンプレートを現在時刻で解決
    pub fn resolve(&self, template: &str) -> Result<String> {
        self.resolve_at(template, Utc::now())
    }

    /// テンプレートを指定時刻で解決（テストで時刻を固定するために分離）
    pub fn resolve_at(&self, template: &str, now: DateTime<Utc>) -> Result<String> {
        let mut result = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                result.push(c);
                continue;
            }
            let mut suppress_if_empty = false;
            let mut selector = chars
                .next()
                .ok_or_else(|| BuildError::InvalidPlaceholder(template.to_string()))?;
            if selector == '-' {
                suppress_if_empty = true;
                selector = chars
                    .next()
                    .ok_or_else(|| BuildError::InvalidPlaceholder(template.to_string()))?;
            }
            let value = match selector {
                'a' => self.artifact(),
                'g' => self.group(),
                'V' => self.version(now),
                'b' => self.branch()?,
                _ => return Err(BuildError::UnknownPlaceholder(template.to_string())),
            };
            if suppress_if_empty {
                if !value.is_empty() {
                    result.push('-');
                    result.push_str(&value);
                }
            } else {
                result.push_str(&value);
            }
        }
        Ok(result)
    }

    fn artifact(&self) -> String {
        sanitize(&self.project.artifact)
    }

    fn group(&self) -> String {
        let group = &self.project.group;
        let last = match group.rfind('.') {
            Some(idx) => &group[idx + 1..],
            None => group.as_str(),
        };
        sanitize(last)
    }

    // 注意: fabric8 の version プレースホルダとは異なり、SNAPSHOT は
    // タイムスタンプ付きに書き換える（連続リビルドでもタグが一意になる）
    fn version(&self, now: DateTime<Utc>) -> String {
        let version = &self.project.version;
        let resolved = match version.strip_suffix(SNAPSHOT_SUFFIX) {
            Some(base) => format!("{}.{}", base, now.format(TIMESTAMP_FORMAT)),
            None => version.clone(),
        };
        sanitize(&resolved)
    }

    fn branch(&self) -> Result<String> {
        if self.project.build.branch == BranchEmission::SnapshotOnly && !self.project.is_snapshot()
        {
            // リリースビルドではブランチを出力しない
            return Ok(String::new());
        }
        Ok(sanitize(&vcs::current_branch(&self.working)?))
    }
}

/// イメージ参照の構成要素として安全な文字列に正規化する
///
/// `[a-z0-9_\-.]` はそのまま、大文字は小文字化、それ以外（非ASCII含む）は
/// 黙って捨てる。冪等。
pub fn sanitize(str: &str) -> String {
    let mut result = String::with_capacity(str.len());
    for c in str.chars() {
        match c {
            'a'..='z' | '0'..='9' | '_' | '-' | '.' => result.push(c),
            'A'..='Z' => result.push(c.to_ascii_lowercase()),
            _ => {}
        }
    }
    result
}
