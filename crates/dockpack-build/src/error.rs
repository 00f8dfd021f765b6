use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("dockerbuild template not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("Dockerfile not found: {0}")]
    DockerfileNotFound(PathBuf),

    #[error("invalid ARG declaration in {path} (line {line}): {text}")]
    MalformedArg {
        path: PathBuf,
        line: usize,
        text: String,
    },

    #[error("invalid placeholder: {0}")]
    InvalidPlaceholder(String),

    #[error("unknown placeholder: {0}")]
    UnknownPlaceholder(String),

    #[error("cannot determine current branch: {0}")]
    BranchLookup(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("unknown directive: {0}")]
    UnknownDirective(String),

    #[error("unknown argument: {name}\n{available}")]
    UnknownArgument { name: String, available: String },

    #[error("unknown pom argument: {0}")]
    UnknownPomArgument(String),

    #[error("unknown build argument: {0}")]
    UnknownBuildArgument(String),

    #[error("mandatory argument is missing: {0}")]
    MandatoryArgumentMissing(String),

    #[error("{directive} argument: scm is not defined in this project")]
    ScmNotDefined { directive: String },

    #[error("unknown property: {0}")]
    UnknownProperty(String),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("cannot read {path}: {message}")]
    ReadFailed { path: PathBuf, message: String },

    #[error("template filtering failed: {path}\n{message}")]
    FilterFailed { path: PathBuf, message: String },

    #[error("Docker connection error: {0}")]
    DockerConnection(#[from] bollard::errors::Error),

    #[error("Docker build failed: {error}")]
    BuildFailed { error: String, output: String },

    #[error("push failed: {message}")]
    PushFailed { message: String },

    #[error("authentication failed for {registry}: {message}")]
    AuthFailed { registry: String, message: String },

    #[error("invalid image tag: {tag}")]
    InvalidTag { tag: String },

    #[error("image not found: {0} (run `dockpack build` first?)")]
    ImageNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BuildError>;
