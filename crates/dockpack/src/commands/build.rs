//! build コマンド
//!
//! dockerbuild テンプレートの展開 → 引数解決 → イメージビルドまでを
//! 逐次実行する。

use anyhow::Context as _;
use bollard::Docker;
use colored::Colorize;
use dockpack_build::arguments::{Arguments, EvalContext};
use dockpack_build::{Context, ImageBuilder, Layout, Placeholders, builder, vcs};
use std::collections::HashMap;

pub async fn handle_build_command(
    image: Option<&str>,
    template: Option<&str>,
    no_cache: bool,
    comment: &str,
    cli_args: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let project = dockpack_core::load_project()?;
    let working = std::env::current_dir()?;

    // テンプレートの決定（CLI > dockpack.yaml）
    let template_name = template
        .or(project.build.template.as_deref())
        .context("dockerbuild テンプレートが指定されていません (--template か build.template)")?;
    let template_dir = project.build.library.join(template_name);

    println!("{}", format!("unpacking dockerbuild {}", template_name).green());
    let layout = Layout::new(&project.build_dir);
    let context = Context::create(&template_dir, &layout.context())?;

    // イメージ参照の解決と永続化
    let image_template = image.unwrap_or(&project.build.image);
    let placeholders = Placeholders::new(&project, &working);
    let image_ref = placeholders.resolve(image_template)?;
    layout.write_image(&image_ref)?;

    // 引数解決: 成果物 → ビルドメタデータ → POM → 明示的な上書き。
    // 上書きは dockpack.yaml の build.arguments の上に CLI の --arg を重ねる
    let formals = context.formals()?;
    let origin = vcs::origin_or_unknown(&working);
    let mut overrides: HashMap<String, String> = project.build.arguments.clone();
    overrides.extend(cli_args);

    let eval_ctx = EvalContext {
        project: &project,
        context: &context,
    };
    let args = Arguments::resolve(formals, &eval_ctx, comment, &origin, &overrides)?;
    let labels = builder::labels(comment, &origin, &args);

    let docker = Docker::connect_with_local_defaults()?;
    let image_builder = ImageBuilder::new(docker);
    let id = image_builder
        .build_image(&context, &layout.build_log(), &image_ref, &args, &labels, no_cache)
        .await?;

    println!("{} {} ({})", "built".green(), image_ref.cyan(), id);
    Ok(())
}
