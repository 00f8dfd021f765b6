//! dockpack-core — プロジェクトメタデータと設定ロード
//!
//! dockpack.yaml が記述するモジュール情報（座標、成果物、SCM、プロパティ）を
//! モデル化し、設定ファイルの発見とロードを提供する。

pub mod discovery;
pub mod error;
pub mod loader;
pub mod model;

pub use discovery::*;
pub use error::*;
pub use loader::*;
pub use model::*;
