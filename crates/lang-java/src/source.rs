//! Class containers: jars, class directories and the JDK `modules` image.

use crate::classfile;
use crate::error::{Result, WeaveError};
use rayon::prelude::*;
use ristretto_jimage::Image;
use saber_core::ClassMetadata;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::ZipArchive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Jar,
    Directory,
    JImage,
}

impl ContainerKind {
    pub fn detect(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Ok(ContainerKind::Directory);
        }

        // Detect format via magic bytes
        let mut file = File::open(path)?;
        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)
            .map_err(|_| WeaveError::UnsupportedContainer(path.to_path_buf()))?;

        match &magic {
            // ZIP magic: PK\x03\x04 or PK\x05\x06 (empty)
            [0x50, 0x4B, _, _] => Ok(ContainerKind::Jar),
            // JImage magic: CAFEDADA (big-endian) or DADAFECA (little-endian)
            [0xCA, 0xFE, 0xDA, 0xDA] | [0xDA, 0xDA, 0xFE, 0xCA] => Ok(ContainerKind::JImage),
            _ => Err(WeaveError::UnsupportedContainer(path.to_path_buf())),
        }
    }
}

/// One file inside a container, addressed by its `/`-separated relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEntry {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl ContainerEntry {
    pub fn is_class(&self) -> bool {
        self.path.ends_with(".class")
    }

    /// `module-info.class` and `package-info.class` carry no hierarchy.
    pub fn is_descriptor_class(&self) -> bool {
        self.path.ends_with("module-info.class") || self.path.ends_with("package-info.class")
    }
}

pub fn read_entries(path: &Path) -> Result<Vec<ContainerEntry>> {
    match ContainerKind::detect(path)? {
        ContainerKind::Jar => read_jar(path),
        ContainerKind::Directory => read_directory(path),
        ContainerKind::JImage => read_jimage(path),
    }
}

fn read_jar(path: &Path) -> Result<Vec<ContainerEntry>> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        // Names that would escape the container root (`../`, absolute) are dropped.
        let Some(name) = entry.enclosed_name() else {
            tracing::warn!(
                "Skipping entry {} in {}: path escapes the archive root",
                entry.name(),
                path.display()
            );
            continue;
        };
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        entries.push(ContainerEntry {
            path: slash_path(&name),
            bytes,
        });
    }

    Ok(entries)
}

fn read_directory(root: &Path) -> Result<Vec<ContainerEntry>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| WeaveError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        entries.push(ContainerEntry {
            path: slash_path(relative),
            bytes: std::fs::read(entry.path())?,
        });
    }
    Ok(entries)
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_jimage(path: &Path) -> Result<Vec<ContainerEntry>> {
    let image = Image::from_file(path).map_err(|e| WeaveError::JImage {
        path: path.to_path_buf(),
        message: format!("{e:?}"),
    })?;

    let mut entries = Vec::new();
    for resource in image.iter().flatten() {
        if resource.extension() != "class" {
            continue;
        }
        entries.push(ContainerEntry {
            path: resource.name().to_string(),
            bytes: resource.data().to_vec(),
        });
    }
    Ok(entries)
}

/// Reads class metadata from every container, skipping (with a warning)
/// containers and classes that cannot be read. Used for the classpath and
/// boot classpath, which only feed the hierarchy registry.
pub fn load_metadata(containers: &[PathBuf]) -> Vec<ClassMetadata> {
    containers
        .par_iter()
        .flat_map_iter(|container| {
            let entries = match read_entries(container) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Skipping classpath entry {}: {}", container.display(), e);
                    Vec::new()
                }
            };
            tracing::debug!("{}: {} entries", container.display(), entries.len());
            entries
        })
        .filter(|entry| entry.is_class() && !entry.is_descriptor_class())
        .filter_map(|entry| match classfile::metadata_from_bytes(&entry.path, &entry.bytes) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        })
        .collect()
}
