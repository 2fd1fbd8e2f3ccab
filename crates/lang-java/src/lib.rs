//! JVM class-file side of the saber weaver: reading class containers,
//! converting class files to [`saber_core::ClassMetadata`] and running the
//! weaving pipeline over a jar or class directory.

pub mod classfile;
pub mod error;
pub mod jdk;
pub mod pipeline;
pub mod source;

pub use error::{Result, WeaveError};
pub use pipeline::{ClassFailure, WeaveConfig, WeaveReport, WeaveSession, Weaver};
