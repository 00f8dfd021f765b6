//! push コマンド
//!
//! build が永続化したイメージ参照を読み戻してプッシュする。

use bollard::Docker;
use colored::Colorize;
use dockpack_build::{ImagePusher, Layout};

pub async fn handle_push_command() -> anyhow::Result<()> {
    let project = dockpack_core::load_project()?;
    let layout = Layout::new(&project.build_dir);
    let image_ref = layout.read_image()?;

    let docker = Docker::connect_with_local_defaults()?;
    let pusher = ImagePusher::new(docker);
    pusher.push(&image_ref).await?;

    println!("{} {}", "pushed".green(), image_ref.cyan());
    Ok(())
}
