//! dockpack のイメージビルドエンジン
//!
//! Dockerfile のビルド引数解決、プレースホルダ展開、コンテキスト組み立て、
//! イメージビルドとプッシュを提供する。

pub mod arguments;
pub mod auth;
pub mod builder;
pub mod context;
pub mod dockerfile;
pub mod error;
pub mod layout;
pub mod placeholders;
pub mod pusher;
pub mod vcs;

pub use arguments::{Arguments, EvalContext, eval};
pub use auth::RegistryAuth;
pub use builder::{ImageBuilder, labels, render_cli};
pub use context::Context;
pub use dockerfile::{BuildArgument, FormalArgs, scan};
pub use error::BuildError;
pub use layout::Layout;
pub use placeholders::{Placeholders, sanitize};
pub use pusher::{ImagePusher, split_image_tag};
