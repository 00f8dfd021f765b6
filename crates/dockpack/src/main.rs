mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dockpack", version)]
#[command(about = "モジュールの成果物をDockerイメージにパッケージする", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// イメージをビルド
    Build {
        /// イメージ参照テンプレート（デフォルトは dockpack.yaml の build.image）
        #[arg(short, long)]
        image: Option<String>,
        /// dockerbuild テンプレート名（デフォルトは dockpack.yaml の build.template）
        #[arg(short, long)]
        template: Option<String>,
        /// Dockerキャッシュを使わない
        #[arg(long)]
        no_cache: bool,
        /// イメージに付与するコメント
        #[arg(short, long, default_value = "")]
        comment: String,
        /// Dockerfile 引数の上書き（name=value、複数可）
        #[arg(short, long = "arg", value_name = "NAME=VALUE", value_parser = parse_key_value)]
        arg: Vec<(String, String)>,
    },
    /// ビルド済みイメージをレジストリにプッシュ
    Push,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got: {}", raw)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build {
            image,
            template,
            no_cache,
            comment,
            arg,
        } => {
            commands::build::handle_build_command(
                image.as_deref(),
                template.as_deref(),
                no_cache,
                &comment,
                arg,
            )
            .await
        }
        Commands::Push => commands::push::handle_push_command().await,
    }
}
