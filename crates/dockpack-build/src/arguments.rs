//! ビルド引数の解決エンジン
//!
//! Dockerfile が宣言したフォーマル引数に対して、値の供給パス
//! （成果物、ビルドメタデータ、POM情報、明示的な上書き）を固定順で実行し、
//! デフォルト値の充当と必須引数の検証を行う。
//!
//! 明示的な値は `%<directive>:<value>` 形式の小さな式言語を受け付ける。
//! 評価は内側から外側へ（右再帰）: まず `<value>` を再帰的に評価し、
//! その結果にディレクティブの変換を適用する。

use crate::context::Context;
use crate::dockerfile::FormalArgs;
use crate::error::{BuildError, Result};
use base64::Engine;
use dockpack_core::Project;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// ディレクティブ実装。評価済みの内側の値を受け取り、変換結果を返す
type DirectiveFn = fn(&str, &EvalContext) -> Result<String>;

/// ディレクティブレジストリ（名前 → 変換関数）
const DIRECTIVES: &[(&str, DirectiveFn)] = &[
    ("base64", base64_directive),
    ("file", file_directive),
    ("filter", filter_directive),
    ("artifact", artifact_directive),
    ("copy", copy_directive),
    ("scm", scm_directive),
    ("property", property_directive),
];

/// ディレクティブ評価が参照する環境
pub struct EvalContext<'a> {
    pub project: &'a Project,
    pub context: &'a Context,
}

/// 値を評価する
///
/// `%` で始まらない値はリテラルとしてそのまま返す。
pub fn eval(raw: &str, ctx: &EvalContext) -> Result<String> {
    let Some(expr) = raw.strip_prefix('%') else {
        return Ok(raw.to_string());
    };
    let Some((name, inner)) = expr.split_once(':') else {
        return Err(BuildError::InvalidValue(raw.to_string()));
    };
    let handler = DIRECTIVES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| f)
        .ok_or_else(|| BuildError::UnknownDirective(name.to_string()))?;
    let inner_value = eval(inner, ctx)?;
    handler(&inner_value, ctx)
}

fn base64_directive(value: &str, _ctx: &EvalContext) -> Result<String> {
    Ok(base64::engine::general_purpose::STANDARD.encode(value.as_bytes()))
}

fn file_directive(value: &str, _ctx: &EvalContext) -> Result<String> {
    let path = Path::new(value);
    std::fs::read_to_string(path).map_err(|e| BuildError::ReadFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// ファイルを読み、プロジェクトのプロパティでテンプレート展開して返す
fn filter_directive(value: &str, ctx: &EvalContext) -> Result<String> {
    let path = Path::new(value);
    let content = std::fs::read_to_string(path).map_err(|e| BuildError::ReadFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut tera_ctx = tera::Context::new();
    for (key, val) in &ctx.project.properties {
        tera_ctx.insert(key, val);
    }
    tera_ctx.insert("group", &ctx.project.group);
    tera_ctx.insert("artifact", &ctx.project.artifact);
    tera_ctx.insert("version", &ctx.project.version);

    tera::Tera::one_off(&content, &tera_ctx, false).map_err(|e| BuildError::FilterFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// 成果物をコンテキストにコピーし、ファイル名を返す
///
/// 値は `<ext>` または `<classifier>.<ext>`。
fn artifact_directive(value: &str, ctx: &EvalContext) -> Result<String> {
    let src = artifact_file(ctx.project, value);
    ctx.context.add_file(&src)
}

fn copy_directive(value: &str, ctx: &EvalContext) -> Result<String> {
    ctx.context.add_file(Path::new(value))
}

fn scm_directive(value: &str, ctx: &EvalContext) -> Result<String> {
    let scm = ctx.project.scm.as_ref();
    let resolved = match value {
        "developer" => scm.and_then(|s| {
            s.developer_connection
                .clone()
                .or_else(|| s.connection.clone())
        }),
        "connection" => scm.and_then(|s| s.connection.clone()),
        other => {
            return Err(BuildError::InvalidValue(format!("%scm:{}", other)));
        }
    };
    resolved.ok_or_else(|| BuildError::ScmNotDefined {
        directive: "scm".to_string(),
    })
}

fn property_directive(value: &str, ctx: &EvalContext) -> Result<String> {
    ctx.project
        .properties
        .get(value)
        .cloned()
        .ok_or_else(|| BuildError::UnknownProperty(value.to_string()))
}

/// `<finalName>[-<classifier>].<ext>` をビルドディレクトリ内で指す
fn artifact_file(project: &Project, selector: &str) -> PathBuf {
    let file_name = match selector.rsplit_once('.') {
        Some((classifier, ext)) => {
            format!("{}-{}.{}", project.final_name(), classifier, ext)
        }
        None => format!("{}.{}", project.final_name(), selector),
    };
    project.build_dir.join(file_name)
}

//--

/// フォーマル引数名のプレフィックス（供給パスの名前空間）
const ARTIFACT_PREFIX: &str = "artifact";
const POM_PREFIX: &str = "pom";
const BUILD_PREFIX: &str = "build";

/// docker build に渡す実引数の解決状態
pub struct Arguments {
    formals: FormalArgs,
    result: BTreeMap<String, String>,
}

impl Arguments {
    pub fn new(formals: FormalArgs) -> Self {
        Self {
            formals,
            result: BTreeMap::new(),
        }
    }

    /// 供給パスを固定順で実行して最終マッピングを返す
    ///
    /// 順序: 成果物 → ビルドメタデータ → POM → 明示的な上書き。
    /// 同じキーは後から書いた側が勝つ（明示的な上書きが常に最終決定）。
    pub fn resolve(
        formals: FormalArgs,
        ctx: &EvalContext,
        comment: &str,
        origin: &str,
        overrides: &HashMap<String, String>,
    ) -> Result<BTreeMap<String, String>> {
        let mut arguments = Arguments::new(formals);
        arguments.add_artifacts(ctx)?;
        arguments.add_build_metadata(comment, origin)?;
        arguments.add_pom(ctx)?;
        arguments.add_explicit(overrides, ctx)?;
        arguments.result()
    }

    /// `artifact*` 引数を解決し、成果物をコンテキストにコピーする
    pub fn add_artifacts(&mut self, ctx: &EvalContext) -> Result<()> {
        for arg in self.formals.iter() {
            if let Some(suffix) = arg.name.strip_prefix(ARTIFACT_PREFIX) {
                let extension = suffix.to_lowercase();
                let src = artifact_file(ctx.project, &extension);
                let name = ctx.context.add_file(&src)?;
                self.result.insert(arg.name.clone(), name);
            }
        }
        Ok(())
    }

    /// `build*` 引数（ビルド由来の計算メタデータ）を解決する
    pub fn add_build_metadata(&mut self, comment: &str, origin: &str) -> Result<()> {
        let mut bound = Vec::new();
        for arg in self.formals.iter() {
            if !arg.name.starts_with(BUILD_PREFIX) {
                continue;
            }
            match arg.name.as_str() {
                "buildOrigin" => bound.push((arg.name.clone(), origin.to_string())),
                "buildComment" => bound.push((arg.name.clone(), comment.to_string())),
                other => return Err(BuildError::UnknownBuildArgument(other.to_string())),
            }
        }
        self.result.extend(bound);
        Ok(())
    }

    /// `pom*` 引数（プロジェクトメタデータ）を解決する
    pub fn add_pom(&mut self, ctx: &EvalContext) -> Result<()> {
        let mut bound = Vec::new();
        for arg in self.formals.iter() {
            if !arg.name.starts_with(POM_PREFIX) {
                continue;
            }
            match arg.name.as_str() {
                "pomScm" => {
                    let scm = ctx.project.scm.as_ref().and_then(|s| {
                        s.developer_connection
                            .clone()
                            .or_else(|| s.connection.clone())
                    });
                    let value = scm.ok_or_else(|| BuildError::ScmNotDefined {
                        directive: "pomScm".to_string(),
                    })?;
                    bound.push((arg.name.clone(), value));
                }
                other => return Err(BuildError::UnknownPomArgument(other.to_string())),
            }
        }
        self.result.extend(bound);
        Ok(())
    }

    /// 明示的な上書きを検証・評価して束縛する
    ///
    /// フォーマル引数に無い名前は致命的エラーで、有効な引数一覧を添える。
    pub fn add_explicit(
        &mut self,
        overrides: &HashMap<String, String>,
        ctx: &EvalContext,
    ) -> Result<()> {
        // HashMap 順に依存しないよう、キーを整列してから処理する
        let mut names: Vec<&String> = overrides.keys().collect();
        names.sort();
        for name in names {
            if !self.formals.contains(name) {
                return Err(BuildError::UnknownArgument {
                    name: name.clone(),
                    available: self.formals.available(),
                });
            }
            let value = eval(&overrides[name], ctx)?;
            self.result.insert(name.clone(), value);
        }
        Ok(())
    }

    /// デフォルト値を充当し、完全性を検証して最終マッピングを返す
    ///
    /// 束縛もデフォルトも無いフォーマル引数があれば致命的エラー。
    /// 検証は触れたキーだけでなくフォーマル引数全体に対して走る。
    pub fn result(mut self) -> Result<BTreeMap<String, String>> {
        for arg in self.formals.iter() {
            if self.result.contains_key(&arg.name) {
                continue;
            }
            match &arg.default {
                Some(default) => {
                    self.result.insert(arg.name.clone(), default.clone());
                }
                None => {
                    return Err(BuildError::MandatoryArgumentMissing(arg.name.clone()));
                }
            }
        }
        Ok(self.result)
    }
}
