//! レジストリ認証
//!
//! Docker config.json の `auths` エントリ（base64 "user:pass"）か、
//! `credsStore` が指す credential helper（`docker-credential-<store> get`）
//! から認証情報を取得し、Bollard の DockerCredentials に変換する。

use crate::error::{BuildError, Result};
use base64::Engine;
use bollard::auth::DockerCredentials;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Docker config.json の構造
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DockerConfig {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
    /// credential helper 名（例: "osxkeychain", "desktop"）
    #[serde(default)]
    creds_store: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthEntry {
    /// Base64エンコードされた "username:password"
    auth: Option<String>,
}

/// credential helper からのレスポンス（stdout の JSON）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialResponse {
    username: String,
    secret: String,
}

/// レジストリ認証を管理
#[derive(Debug)]
pub struct RegistryAuth {
    config_path: PathBuf,
}

impl Default for RegistryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryAuth {
    /// DOCKER_CONFIG（未設定なら ~/.docker）の config.json を使う
    pub fn new() -> Self {
        let config_path = std::env::var("DOCKER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|h| h.join(".docker"))
                    .unwrap_or_else(|| PathBuf::from(".docker"))
            })
            .join("config.json");

        Self { config_path }
    }

    /// 指定したパスの config.json を使用
    pub fn with_config_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// イメージ参照からレジストリを特定して認証情報を取得する
    ///
    /// config.json が無い、またはエントリが無い場合は None（認証なしで続行）。
    pub fn get_credentials(&self, image: &str) -> Result<Option<DockerCredentials>> {
        let registry = extract_registry(image);

        if !self.config_path.exists() {
            tracing::debug!("Docker config.json not found at {:?}", self.config_path);
            return Ok(None);
        }

        let config = self.load_docker_config()?;

        if let Some(entry) = config.auths.get(&registry)
            && let Some(auth_b64) = &entry.auth
            && let Some(creds) = self.decode_auth(auth_b64, &registry)?
        {
            tracing::debug!("Found credentials in auths for {}", registry);
            return Ok(Some(creds));
        }

        if let Some(helper) = &config.creds_store {
            tracing::debug!("Trying credential helper: {}", helper);
            if let Ok(Some(creds)) = self.get_from_helper(helper, &registry) {
                return Ok(Some(creds));
            }
        }

        tracing::debug!("No credentials found for {}", registry);
        Ok(None)
    }

    fn load_docker_config(&self) -> Result<DockerConfig> {
        let content =
            std::fs::read_to_string(&self.config_path).map_err(|e| BuildError::AuthFailed {
                registry: self.config_path.display().to_string(),
                message: format!("Failed to read config.json: {}", e),
            })?;

        serde_json::from_str(&content).map_err(|e| BuildError::AuthFailed {
            registry: self.config_path.display().to_string(),
            message: format!("Failed to parse config.json: {}", e),
        })
    }

    fn decode_auth(
        &self,
        auth_b64: &str,
        registry: &str,
    ) -> Result<Option<DockerCredentials>> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(auth_b64)
            .map_err(|e| BuildError::AuthFailed {
                registry: registry.to_string(),
                message: format!("Failed to decode auth: {}", e),
            })?;

        let auth_str = String::from_utf8(decoded).map_err(|e| BuildError::AuthFailed {
            registry: registry.to_string(),
            message: format!("Invalid UTF-8 in auth: {}", e),
        })?;

        if let Some((username, password)) = auth_str.split_once(':') {
            Ok(Some(DockerCredentials {
                username: Some(username.to_string()),
                password: Some(password.to_string()),
                serveraddress: Some(registry.to_string()),
                ..Default::default()
            }))
        } else {
            Ok(None)
        }
    }

    /// credential helper から認証情報を取得
    ///
    /// レジストリ名を stdin に渡し、stdout の JSON から
    /// Username/Secret を読む。helper がエントリを持たない場合は None。
    fn get_from_helper(
        &self,
        helper: &str,
        registry: &str,
    ) -> Result<Option<DockerCredentials>> {
        let helper_cmd = format!("docker-credential-{}", helper);

        let mut child = Command::new(&helper_cmd)
            .arg("get")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BuildError::AuthFailed {
                registry: registry.to_string(),
                message: format!("Failed to run {}: {}", helper_cmd, e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(registry.as_bytes()).ok();
        }

        let output = child
            .wait_with_output()
            .map_err(|e| BuildError::AuthFailed {
                registry: registry.to_string(),
                message: format!("Credential helper failed: {}", e),
            })?;

        if !output.status.success() {
            tracing::debug!(
                "Credential helper returned error for {}: {}",
                registry,
                String::from_utf8_lossy(&output.stderr)
            );
            return Ok(None);
        }

        let response: CredentialResponse =
            serde_json::from_slice(&output.stdout).map_err(|e| BuildError::AuthFailed {
                registry: registry.to_string(),
                message: format!("Failed to parse credential helper response: {}", e),
            })?;

        Ok(Some(DockerCredentials {
            username: Some(response.username),
            password: Some(response.secret),
            serveraddress: Some(registry.to_string()),
            ..Default::default()
        }))
    }
}

/// イメージ参照からレジストリ部分を抽出する
///
/// 最初のセグメントが `.` か `:` を含むときだけレジストリとみなす。
/// それ以外は Docker Hub。
pub fn extract_registry(image: &str) -> String {
    if let Some((first, _)) = image.split_once('/')
        && (first.contains('.') || first.contains(':'))
    {
        return first.to_string();
    }
    "docker.io".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_extract_registry() {
        assert_eq!(extract_registry("ghcr.io/org/app:v1.0"), "ghcr.io");
        assert_eq!(extract_registry("myuser/app:latest"), "docker.io");
        assert_eq!(extract_registry("nginx"), "docker.io");
        assert_eq!(extract_registry("localhost:5000/myapp"), "localhost:5000");
        assert_eq!(
            extract_registry("123456789.dkr.ecr.ap-northeast-1.amazonaws.com/app"),
            "123456789.dkr.ecr.ap-northeast-1.amazonaws.com"
        );
    }

    #[test]
    fn test_get_credentials_missing_config() {
        let temp = tempdir().unwrap();
        let auth = RegistryAuth::with_config_path(temp.path().join("config.json"));
        assert!(auth.get_credentials("ghcr.io/org/app").unwrap().is_none());
    }

    #[test]
    fn test_get_credentials_from_auths() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("config.json");
        // "user:pass" を base64 エンコードしたエントリ
        fs::write(
            &config_path,
            r#"{"auths":{"ghcr.io":{"auth":"dXNlcjpwYXNz"}}}"#,
        )
        .unwrap();

        let auth = RegistryAuth::with_config_path(config_path);
        let creds = auth.get_credentials("ghcr.io/org/app").unwrap().unwrap();
        assert_eq!(creds.username.as_deref(), Some("user"));
        assert_eq!(creds.password.as_deref(), Some("pass"));
        assert_eq!(creds.serveraddress.as_deref(), Some("ghcr.io"));
    }

    #[test]
    fn test_get_credentials_unknown_registry() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("config.json");
        fs::write(
            &config_path,
            r#"{"auths":{"ghcr.io":{"auth":"dXNlcjpwYXNz"}}}"#,
        )
        .unwrap();

        let auth = RegistryAuth::with_config_path(config_path);
        assert!(auth.get_credentials("gcr.io/org/app").unwrap().is_none());
    }
}
