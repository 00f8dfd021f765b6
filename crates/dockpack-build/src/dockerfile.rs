//! Dockerfile ARG スキャナ
//!
//! Dockerfile のテキストから宣言済みビルド引数（フォーマル引数）を抽出する。

use crate::error::{BuildError, Result};
use std::path::Path;

/// Dockerfile が宣言するビルド引数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArgument {
    pub name: String,
    /// デフォルト値。None は必須引数
    pub default: Option<String>,
}

/// フォーマル引数表（宣言順を保持）
#[derive(Debug, Clone, Default)]
pub struct FormalArgs {
    args: Vec<BuildArgument>,
}

impl FormalArgs {
    pub fn get(&self, name: &str) -> Option<&BuildArgument> {
        self.args.iter().find(|a| a.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 宣言順で引数を列挙
    pub fn iter(&self) -> impl Iterator<Item = &BuildArgument> {
        self.args.iter()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// 診断用の引数一覧（宣言順）
    pub fn available(&self) -> String {
        let mut result = String::from("(available build arguments:");
        for arg in &self.args {
            result.push(' ');
            result.push_str(&arg.name);
        }
        result.push_str(")\n");
        result
    }

    fn insert(&mut self, name: String, default: Option<String>) {
        // 再宣言は後勝ち（Dockerfileのセマンティクス）。宣言位置は最初のまま
        if let Some(existing) = self.args.iter_mut().find(|a| a.name == name) {
            existing.default = default;
        } else {
            self.args.push(BuildArgument { name, default });
        }
    }
}

/// Dockerfile をスキャンしてフォーマル引数表を作る
pub fn scan(dockerfile: &Path) -> Result<FormalArgs> {
    if !dockerfile.is_file() {
        return Err(BuildError::DockerfileNotFound(dockerfile.to_path_buf()));
    }
    let content = std::fs::read_to_string(dockerfile).map_err(|e| BuildError::ReadFailed {
        path: dockerfile.to_path_buf(),
        message: e.to_string(),
    })?;
    scan_str(&content, dockerfile)
}

fn scan_str(content: &str, origin: &Path) -> Result<FormalArgs> {
    let mut formals = FormalArgs::default();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((instruction, rest)) = split_instruction(line) else {
            continue;
        };
        if !instruction.eq_ignore_ascii_case("ARG") {
            continue;
        }
        let (name, default) = match rest.split_once('=') {
            Some((name, default)) => (name.trim(), Some(unquote(default.trim()).to_string())),
            None => (rest.trim(), None),
        };
        if !valid_name(name) {
            return Err(BuildError::MalformedArg {
                path: origin.to_path_buf(),
                line: idx + 1,
                text: raw.to_string(),
            });
        }
        tracing::debug!(name = %name, default = ?default, "Found build argument");
        formals.insert(name.to_string(), default);
    }
    Ok(formals)
}

fn split_instruction(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(char::is_whitespace)?;
    Some((&line[..idx], line[idx..].trim_start()))
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return &value[1..value.len() - 1];
        }
    }
    value
}
