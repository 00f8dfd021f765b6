//! プロジェクト設定ローダー
//!
//! ファイル発見、YAMLパース、検証を統合

use crate::discovery::find_project_file;
use crate::error::{CoreError, Result};
use crate::model::Project;
use std::path::Path;
use tracing::{debug, info};

/// dockpack.yaml を発見してプロジェクトをロード
pub fn load_project() -> Result<Project> {
    let path = find_project_file()?;
    load_project_from(&path)
}

/// 指定されたファイルからプロジェクトをロード
///
/// 相対パス（build_dir、build.library）は設定ファイルの
/// 置かれたディレクトリを基準に解決する。
pub fn load_project_from(path: &Path) -> Result<Project> {
    debug!(path = %path.display(), "Loading project file");
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut project: Project = serde_yaml::from_str(&content)?;
    validate(&project)?;

    if let Some(root) = path.parent() {
        if project.build_dir.is_relative() {
            project.build_dir = root.join(&project.build_dir);
        }
        if project.build.library.is_relative() {
            project.build.library = root.join(&project.build.library);
        }
    }

    info!(
        group = %project.group,
        artifact = %project.artifact,
        version = %project.version,
        "Project loaded"
    );
    Ok(project)
}

fn validate(project: &Project) -> Result<()> {
    if project.group.is_empty() {
        return Err(CoreError::InvalidConfig("group が指定されていません".to_string()));
    }
    if project.artifact.is_empty() {
        return Err(CoreError::InvalidConfig(
            "artifact が指定されていません".to_string(),
        ));
    }
    if project.version.is_empty() {
        return Err(CoreError::InvalidConfig(
            "version が指定されていません".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_minimal() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("dockpack.yaml");
        fs::write(
            &file,
            "group: com.example.app\nartifact: my-service\nversion: 1.2.0\n",
        )
        .unwrap();

        let project = load_project_from(&file).unwrap();
        assert_eq!(project.group, "com.example.app");
        assert_eq!(project.artifact, "my-service");
        assert_eq!(project.version, "1.2.0");
        // 相対パスは設定ファイルの場所を基準に解決される
        assert_eq!(project.build_dir, temp.path().join("target"));
        assert_eq!(project.build.image, "%g/%a:%V");
    }

    #[test]
    fn test_load_full() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("dockpack.yaml");
        fs::write(
            &file,
            r#"
group: com.example.app
artifact: my-service
version: 1.2.0-SNAPSHOT
final_name: app
scm:
  connection: "scm:git:https://example.com/repo.git"
properties:
  greeting: hello
build:
  template: vanilla-jar
  image: "%g/%a:%V%-b"
  branch: always
  arguments:
    greeting: "%base64:hi"
"#,
        )
        .unwrap();

        let project = load_project_from(&file).unwrap();
        assert!(project.is_snapshot());
        assert_eq!(project.final_name(), "app");
        assert_eq!(project.build.template.as_deref(), Some("vanilla-jar"));
        assert_eq!(
            project.build.arguments.get("greeting").map(String::as_str),
            Some("%base64:hi")
        );
        assert_eq!(
            project.scm.unwrap().connection.as_deref(),
            Some("scm:git:https://example.com/repo.git")
        );
    }

    #[test]
    fn test_load_rejects_empty_version() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("dockpack.yaml");
        fs::write(&file, "group: g\nartifact: a\nversion: \"\"\n").unwrap();

        let result = load_project_from(&file);
        assert!(matches!(result, Err(CoreError::InvalidConfig(_))));
    }
}
