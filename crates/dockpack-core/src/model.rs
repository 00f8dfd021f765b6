//! プロジェクトメタデータモデル
//!
//! dockpack.yaml が記述するモジュール情報（座標、成果物、SCM、プロパティ）と
//! イメージビルド設定を表現する。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// SNAPSHOTバージョンの接尾辞
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// プロジェクト定義（dockpack.yaml のトップレベル）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Project {
    /// グループID（例: "com.example.app"）
    pub group: String,
    /// アーティファクトID（例: "my-service"）
    pub artifact: String,
    /// バージョン。`-SNAPSHOT` 接尾辞でスナップショット扱い
    pub version: String,
    /// 成果物のベース名。省略時は `{artifact}-{version}`
    #[serde(default)]
    pub final_name: Option<String>,
    /// ビルド出力ディレクトリ（成果物と dockerbuild 状態の置き場所）
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
    /// SCM接続情報
    #[serde(default)]
    pub scm: Option<Scm>,
    /// 自由形式のプロパティ（filter ディレクティブと property ディレクティブが参照）
    #[serde(default)]
    pub properties: HashMap<String, String>,
    /// イメージビルド設定
    #[serde(default)]
    pub build: BuildConfig,
}

/// SCM接続情報
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Scm {
    #[serde(default)]
    pub connection: Option<String>,
    #[serde(default)]
    pub developer_connection: Option<String>,
}

/// イメージビルド設定（dockpack.yaml の build セクション）
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildConfig {
    /// dockerbuild テンプレート名（library 配下のディレクトリ名）
    pub template: Option<String>,
    /// テンプレートライブラリのパス
    pub library: PathBuf,
    /// イメージ参照テンプレート
    pub image: String,
    /// `%b` プレースホルダを出力する条件
    pub branch: BranchEmission,
    /// Dockerfile 引数の明示的な上書き
    pub arguments: HashMap<String, String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            template: None,
            library: PathBuf::from("dockerbuilds"),
            image: "%g/%a:%V".to_string(),
            branch: BranchEmission::default(),
            arguments: HashMap::new(),
        }
    }
}

/// `%b` プレースホルダの出力条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BranchEmission {
    /// SNAPSHOTバージョンのときのみ出力（リリースでは空文字列に解決）
    #[default]
    SnapshotOnly,
    /// 常に出力
    Always,
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("target")
}

impl Project {
    /// 成果物のベース名を返す
    pub fn final_name(&self) -> String {
        self.final_name
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.artifact, self.version))
    }

    /// SNAPSHOTバージョンかどうか
    pub fn is_snapshot(&self) -> bool {
        self.version.ends_with(SNAPSHOT_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(version: &str) -> Project {
        Project {
            group: "com.example.app".to_string(),
            artifact: "my-service".to_string(),
            version: version.to_string(),
            final_name: None,
            build_dir: default_build_dir(),
            scm: None,
            properties: HashMap::new(),
            build: BuildConfig::default(),
        }
    }

    #[test]
    fn test_final_name_default() {
        let p = project("1.2.0");
        assert_eq!(p.final_name(), "my-service-1.2.0");
    }

    #[test]
    fn test_final_name_explicit() {
        let mut p = project("1.2.0");
        p.final_name = Some("app".to_string());
        assert_eq!(p.final_name(), "app");
    }

    #[test]
    fn test_is_snapshot() {
        assert!(project("1.2.0-SNAPSHOT").is_snapshot());
        assert!(!project("1.2.0").is_snapshot());
    }
}
