//! イメージビルドの実行
//!
//! コンテキストの tar ストリームを Docker デーモンの build API に渡し、
//! 進捗ストリームをビルドログに書き出しながら完了までブロックする。
//! ストリームがイメージIDを報告せずに閉じた場合もビルド失敗として扱う。

use crate::context::Context;
use crate::error::{BuildError, Result};
use bollard::Docker;
#[allow(deprecated)]
use bollard::image::BuildImageOptions;
use bytes::Bytes;
use futures_util::stream::StreamExt;
use http_body_util::{Either, Full};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;

/// イメージに付与するラベルのキー
const LABEL_COMMENT: &str = "dockpack.comment";
const LABEL_ORIGIN: &str = "dockpack.origin-scm";
const LABEL_ARG_PREFIX: &str = "dockpack.arg.";

pub struct ImageBuilder {
    docker: Docker,
}

impl ImageBuilder {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// イメージをビルドし、イメージIDを返す
    ///
    /// 進捗ストリームの `stream` チャンクは `build_log` に追記される。
    /// エラー通知、またはイメージID無しでのストリーム終了はビルド失敗。
    pub async fn build_image(
        &self,
        context: &Context,
        build_log: &Path,
        tag: &str,
        build_args: &BTreeMap<String, String>,
        labels: &BTreeMap<String, String>,
        no_cache: bool,
    ) -> Result<String> {
        let started = std::time::Instant::now();
        tracing::info!("{}", render_cli(tag, no_cache, build_args, context.directory(), build_log));

        let build_args_refs: HashMap<&str, &str> = build_args
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let labels_refs: HashMap<&str, &str> = labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        #[allow(deprecated)]
        let options = BuildImageOptions {
            dockerfile: "Dockerfile",
            t: tag,
            buildargs: build_args_refs,
            labels: labels_refs,
            nocache: no_cache,
            rm: true,
            forcerm: true,
            ..Default::default()
        };

        let context_bytes = Bytes::from(context.tar()?);
        let body = Full::new(context_bytes);

        let mut logfile = std::fs::File::create(build_log)?;
        let mut captured = String::new();
        let mut image_id: Option<String> = None;
        let mut error: Option<String> = None;

        // ストリームはこのスコープが所有する。どの経路で抜けても
        // drop は一度だけ起こる
        #[allow(deprecated)]
        let mut stream = self
            .docker
            .build_image(options, None, Some(Either::Left(body)));

        while let Some(msg) = stream.next().await {
            let output = msg.map_err(BuildError::DockerConnection)?;
            if let Some(chunk) = output.stream {
                logfile.write_all(chunk.as_bytes())?;
                captured.push_str(&chunk);
            }
            if let Some(aux) = output.aux {
                if let Some(id) = aux.id {
                    image_id = Some(id);
                }
            }
            if let Some(err) = output.error {
                error = Some(err);
                break;
            }
            if let Some(detail) = output.error_detail {
                if let Some(message) = detail.message {
                    error = Some(message);
                    break;
                }
            }
        }
        drop(stream);
        logfile.flush()?;

        if let Some(err) = error {
            return Err(BuildError::BuildFailed {
                error: err,
                output: captured,
            });
        }
        match image_id {
            Some(id) => {
                tracing::info!(
                    "Done: tag={} id={} seconds={}",
                    tag,
                    id,
                    started.elapsed().as_secs()
                );
                Ok(id)
            }
            // 成功通知なしでストリームが閉じた
            None => Err(BuildError::BuildFailed {
                error: "build stream closed without an image id".to_string(),
                output: captured,
            }),
        }
    }
}

/// ビルドに付与するラベルを組み立てる
pub fn labels(
    comment: &str,
    origin: &str,
    build_args: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();
    result.insert(LABEL_COMMENT.to_string(), comment.to_string());
    result.insert(LABEL_ORIGIN.to_string(), origin.to_string());
    for (name, value) in build_args {
        result.insert(format!("{}{}", LABEL_ARG_PREFIX, name), value.clone());
    }
    result
}

/// 人間向けログのための等価な docker build コマンドラインを描画する
///
/// フラグの順序: タグ、--no-cache（指定時のみ）、--build-arg（引数ごと）、
/// コンテキストパス、ログリダイレクト。
pub fn render_cli(
    tag: &str,
    no_cache: bool,
    build_args: &BTreeMap<String, String>,
    context_dir: &Path,
    build_log: &Path,
) -> String {
    let mut cli = format!("docker build -t \"{}\"", tag);
    if no_cache {
        cli.push_str(" --no-cache");
    }
    for (name, value) in build_args {
        cli.push_str(" --build-arg ");
        cli.push_str(name);
        cli.push('=');
        cli.push_str(value);
    }
    cli.push(' ');
    cli.push_str(&context_dir.display().to_string());
    cli.push_str(" >");
    cli.push_str(&build_log.display().to_string());
    cli
}
