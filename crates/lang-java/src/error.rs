use saber_core::SaberError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Malformed class file {path}: {message}")]
    ClassFormat { path: String, message: String },
    #[error("Failed to write class {class}: {message}")]
    ClassWrite { class: String, message: String },
    #[error("Not a jar, jimage or class directory: {0}")]
    UnsupportedContainer(PathBuf),
    #[error("Entry path escapes the output root: {0}")]
    UnsafeEntryPath(String),
    #[error("JImage error in {path}: {message}")]
    JImage { path: PathBuf, message: String },
    #[error(transparent)]
    Core(#[from] SaberError),
}

impl WeaveError {
    pub(crate) fn class_format(path: impl Into<String>, error: impl std::fmt::Debug) -> Self {
        WeaveError::ClassFormat {
            path: path.into(),
            message: format!("{error:?}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, WeaveError>;
