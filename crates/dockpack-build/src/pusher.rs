//! イメージプッシュ処理
//!
//! build が永続化したイメージ参照をレジストリにプッシュする。

use crate::auth::RegistryAuth;
use crate::error::{BuildError, Result};
use bollard::Docker;
use futures_util::StreamExt;
use tracing::debug;

/// イメージプッシュを実行するハンドラ
pub struct ImagePusher {
    docker: Docker,
    auth: RegistryAuth,
}

impl ImagePusher {
    pub fn new(docker: Docker) -> Self {
        Self {
            docker,
            auth: RegistryAuth::new(),
        }
    }

    /// 認証情報マネージャーを指定して作成
    pub fn with_auth(docker: Docker, auth: RegistryAuth) -> Self {
        Self { docker, auth }
    }

    /// イメージ参照（タグ込み）をプッシュする
    ///
    /// エラー通知を受け取った場合、またはストリームがエラーで途切れた場合は
    /// プッシュ失敗。
    pub async fn push(&self, image_ref: &str) -> Result<()> {
        let (image, tag) = split_image_tag(image_ref);
        validate_tag(&tag)?;

        // デーモン側に存在しないイメージは早めに分かりやすく失敗させる
        if !self.image_exists(image_ref).await? {
            return Err(BuildError::ImageNotFound(image_ref.to_string()));
        }

        let credentials = self.auth.get_credentials(image_ref)?;

        #[allow(deprecated)]
        let options = bollard::image::PushImageOptions::<String> { tag };

        #[allow(deprecated)]
        let mut stream = self.docker.push_image(&image, Some(options), credentials);

        let mut error_message: Option<String> = None;
        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(err) = info.error {
                        error_message = Some(err);
                    } else if let Some(status) = info.status {
                        debug!(status = %status, progress = ?info.progress, "push");
                    }
                }
                Err(e) => {
                    return Err(BuildError::PushFailed {
                        message: e.to_string(),
                    });
                }
            }
        }

        if let Some(err) = error_message {
            return Err(BuildError::PushFailed { message: err });
        }
        Ok(())
    }

    /// イメージの存在確認
    async fn image_exists(&self, image_ref: &str) -> Result<bool> {
        match self.docker.inspect_image(image_ref).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(BuildError::DockerConnection(e)),
        }
    }
}

/// イメージ参照をイメージ名とタグに分離する
///
/// 最後の `:` より後ろが `/` を含まなければタグ（数字のみのタグも含む）。
/// `/` を含む場合はレジストリのポート区切り。タグが無ければ "latest"。
pub fn split_image_tag(image: &str) -> (String, String) {
    if let Some(pos) = image.rfind(':') {
        let potential_tag = &image[pos + 1..];
        if !potential_tag.contains('/') {
            return (image[..pos].to_string(), potential_tag.to_string());
        }
    }
    (image.to_string(), "latest".to_string())
}

/// タグのバリデーション
///
/// Docker タグの制約: 128文字以下、`[A-Za-z0-9._-]` のみ、
/// 先頭はピリオドまたはハイフンではない。
fn validate_tag(tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(BuildError::InvalidTag {
            tag: "(empty)".to_string(),
        });
    }
    if tag.len() > 128 {
        return Err(BuildError::InvalidTag {
            tag: format!("tag too long ({} characters, max 128)", tag.len()),
        });
    }
    if tag.starts_with('.') || tag.starts_with('-') {
        return Err(BuildError::InvalidTag {
            tag: tag.to_string(),
        });
    }
    for c in tag.chars() {
        if !c.is_ascii_alphanumeric() && c != '.' && c != '-' && c != '_' {
            return Err(BuildError::InvalidTag {
                tag: format!("invalid character '{}' in tag: {}", c, tag),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_image_tag_with_tag() {
        let (image, tag) = split_image_tag("ghcr.io/org/app:v1.0");
        assert_eq!(image, "ghcr.io/org/app");
        assert_eq!(tag, "v1.0");
    }

    #[test]
    fn test_split_image_tag_without_tag() {
        let (image, tag) = split_image_tag("ghcr.io/org/app");
        assert_eq!(image, "ghcr.io/org/app");
        assert_eq!(tag, "latest");
    }

    #[test]
    fn test_split_image_tag_with_port() {
        // localhost:5000/app はポート番号を含むレジストリ
        let (image, tag) = split_image_tag("localhost:5000/app");
        assert_eq!(image, "localhost:5000/app");
        assert_eq!(tag, "latest");
    }

    #[test]
    fn test_split_image_tag_with_port_and_tag() {
        let (image, tag) = split_image_tag("localhost:5000/app:dev");
        assert_eq!(image, "localhost:5000/app");
        assert_eq!(tag, "dev");
    }

    #[test]
    fn test_split_image_tag_numeric_tag() {
        let (image, tag) = split_image_tag("app:123");
        assert_eq!(image, "app");
        assert_eq!(tag, "123");

        let (image, tag) = split_image_tag("localhost:5000/app:123");
        assert_eq!(image, "localhost:5000/app");
        assert_eq!(tag, "123");
    }

    #[test]
    fn test_validate_tag() {
        assert!(validate_tag("1.2.0").is_ok());
        assert!(validate_tag("1.2.0.20240102-030405-006").is_ok());
        assert!(validate_tag("").is_err());
        assert!(validate_tag("-leading").is_err());
        assert!(validate_tag("white space").is_err());
        assert!(validate_tag(&"x".repeat(129)).is_err());
    }
}
