//! Weaving pipeline: load, index, patch, write.
//!
//! The input container is read once, every class in it is parsed into the
//! registry's `processed` layer alongside the classpath and boot classpath,
//! and then each class is patched independently against that immutable
//! registry. Resources and classes without injection targets pass through
//! byte-for-byte.

use crate::classfile;
use crate::error::{Result, WeaveError};
use crate::jdk;
use crate::source::{self, ContainerEntry, ContainerKind};
use rayon::prelude::*;
use saber_core::patcher::patch;
use saber_core::{
    ClassMetadata, ClassRegistry, ClassSource, CommonSuperclassResolver, InjectionTargets,
};
use std::fs::File;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

#[derive(Debug, Clone, Default)]
pub struct WeaveConfig {
    /// Jar or class directory to rewrite.
    pub input: PathBuf,
    /// Jar (`.jar`/`.zip` extension) or directory to write.
    pub output: PathBuf,
    pub classpath: Vec<PathBuf>,
    /// Defaults to the JDK found through `JAVA_HOME` when empty.
    pub boot_classpath: Vec<PathBuf>,
    pub abort_on_first_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFailure {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeaveReport {
    pub classes: usize,
    pub patched: usize,
    pub resources: usize,
    pub missing_members: usize,
    pub resolver_fallbacks: usize,
    pub failures: Vec<ClassFailure>,
}

impl WeaveReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

enum InputEntry {
    Class {
        entry: ContainerEntry,
        metadata: ClassMetadata,
    },
    Resource(ContainerEntry),
    Broken {
        entry: ContainerEntry,
        message: String,
    },
}

enum EntryOutcome {
    Patched { missing: usize },
    Unchanged,
    Resource,
    Failed(ClassFailure),
}

pub struct Weaver {
    config: WeaveConfig,
    targets: InjectionTargets,
}

impl Weaver {
    pub fn new(config: WeaveConfig, targets: InjectionTargets) -> Self {
        Self { config, targets }
    }

    pub fn config(&self) -> &WeaveConfig {
        &self.config
    }

    /// Reads every input and builds the registry. Fails only on unreadable
    /// input containers, or on the first malformed class when
    /// `abort_on_first_error` is set.
    pub fn prepare(&self) -> Result<WeaveSession> {
        let input = &self.config.input;
        match ContainerKind::detect(input)? {
            ContainerKind::Jar | ContainerKind::Directory => {}
            ContainerKind::JImage => return Err(WeaveError::UnsupportedContainer(input.clone())),
        }

        tracing::info!("Reading classes from {}", input.display());
        let entries = source::read_entries(input)?;
        let inputs = entries
            .into_par_iter()
            .map(|entry| {
                if !entry.is_class() || entry.is_descriptor_class() {
                    return InputEntry::Resource(entry);
                }
                match classfile::metadata_from_bytes(&entry.path, &entry.bytes) {
                    Ok(metadata) => InputEntry::Class { entry, metadata },
                    Err(e) => InputEntry::Broken {
                        message: e.to_string(),
                        entry,
                    },
                }
            })
            .collect::<Vec<_>>();

        if self.config.abort_on_first_error {
            if let Some(InputEntry::Broken { entry, message }) = inputs
                .iter()
                .find(|input| matches!(input, InputEntry::Broken { .. }))
            {
                return Err(WeaveError::ClassFormat {
                    path: entry.path.clone(),
                    message: message.clone(),
                });
            }
        }

        let boot_classpath = if self.config.boot_classpath.is_empty() {
            let discovered = jdk::default_boot_classpath();
            if discovered.is_empty() {
                tracing::warn!(
                    "No boot classpath given and no JDK found; JDK supertypes will resolve to java/lang/Object"
                );
            } else {
                tracing::info!("Using {} JDK boot containers", discovered.len());
            }
            discovered
        } else {
            self.config.boot_classpath.clone()
        };

        let mut builder = ClassRegistry::builder();
        builder.extend(
            ClassSource::Processed,
            inputs.iter().filter_map(|input| match input {
                InputEntry::Class { metadata, .. } => Some(metadata.clone()),
                _ => None,
            }),
        );
        builder.extend(
            ClassSource::Classpath,
            source::load_metadata(&self.config.classpath),
        );
        builder.extend(ClassSource::BootClasspath, source::load_metadata(&boot_classpath));
        let registry = Arc::new(builder.build());
        tracing::info!("Class registry holds {} classes", registry.len());

        Ok(WeaveSession {
            inputs,
            resolver: CommonSuperclassResolver::new(registry.clone()),
            registry,
            abort_on_first_error: self.config.abort_on_first_error,
        })
    }

    pub fn run(&self) -> Result<WeaveReport> {
        let session = self.prepare()?;
        let (entries, report) = session.weave(&self.targets)?;
        write_output(&self.config.output, &entries)?;

        tracing::info!(
            "Weaving complete: {} classes, {} patched, {} resources, {} failures",
            report.classes,
            report.patched,
            report.resources,
            report.failures.len()
        );
        if report.resolver_fallbacks > 0 {
            tracing::warn!(
                "{} common superclass lookups fell back to java/lang/Object; the classpath may be incomplete",
                report.resolver_fallbacks
            );
        }
        Ok(report)
    }
}

/// A prepared run: parsed inputs plus the registry they were indexed into.
pub struct WeaveSession {
    inputs: Vec<InputEntry>,
    registry: Arc<ClassRegistry>,
    resolver: CommonSuperclassResolver,
    abort_on_first_error: bool,
}

impl WeaveSession {
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Answers type-merge queries for bytecode generated against this run.
    pub fn resolver(&self) -> &CommonSuperclassResolver {
        &self.resolver
    }

    /// Patches every class and returns the output entries in input order.
    pub fn weave(&self, targets: &InjectionTargets) -> Result<(Vec<ContainerEntry>, WeaveReport)> {
        let processed = self
            .inputs
            .par_iter()
            .map(|input| {
                let result = weave_entry(input, targets);
                match result {
                    Err(e) if !self.abort_on_first_error => {
                        let entry = input_entry(input);
                        tracing::error!("{}", e);
                        Ok((
                            entry.clone(),
                            EntryOutcome::Failed(ClassFailure {
                                path: entry.path.clone(),
                                message: e.to_string(),
                            }),
                        ))
                    }
                    other => other,
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let mut report = WeaveReport::default();
        let mut entries = Vec::with_capacity(processed.len());
        for (entry, outcome) in processed {
            match outcome {
                EntryOutcome::Patched { missing } => {
                    report.classes += 1;
                    report.patched += 1;
                    report.missing_members += missing;
                }
                EntryOutcome::Unchanged => report.classes += 1,
                EntryOutcome::Resource => report.resources += 1,
                EntryOutcome::Failed(failure) => report.failures.push(failure),
            }
            entries.push(entry);
        }
        report.resolver_fallbacks = self.resolver.fallback_count();

        Ok((entries, report))
    }
}

fn input_entry(input: &InputEntry) -> &ContainerEntry {
    match input {
        InputEntry::Class { entry, .. } => entry,
        InputEntry::Resource(entry) => entry,
        InputEntry::Broken { entry, .. } => entry,
    }
}

fn weave_entry(
    input: &InputEntry,
    targets: &InjectionTargets,
) -> Result<(ContainerEntry, EntryOutcome)> {
    let (entry, metadata) = match input {
        InputEntry::Resource(entry) => return Ok((entry.clone(), EntryOutcome::Resource)),
        InputEntry::Broken { entry, message } => {
            return Err(WeaveError::ClassFormat {
                path: entry.path.clone(),
                message: message.clone(),
            });
        }
        InputEntry::Class { entry, metadata } => (entry, metadata),
    };

    let Some(target) = targets.get(&metadata.name) else {
        return Ok((entry.clone(), EntryOutcome::Unchanged));
    };

    let patched = patch(metadata, target);
    if !patched.dirty {
        tracing::debug!("{} already accessible", metadata.name);
        return Ok((entry.clone(), EntryOutcome::Unchanged));
    }

    for change in patched.changes() {
        tracing::debug!(
            "{}: {} {} -> {}",
            metadata.name,
            change.member,
            change.before,
            change.after
        );
    }

    let mut class = classfile::parse_class(&entry.path, &entry.bytes)?;
    classfile::apply_patch(&entry.path, &mut class, &patched)?;
    let bytes = classfile::write_class(&class, &metadata.name)?;

    Ok((
        ContainerEntry {
            path: entry.path.clone(),
            bytes,
        },
        EntryOutcome::Patched {
            missing: patched.missing_members().len(),
        },
    ))
}

fn is_enclosed(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

fn is_archive_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Writes `entries` as a jar or below a directory. Entry paths must be
/// relative and free of `..`; anything else is rejected before writing.
pub fn write_output(output: &Path, entries: &[ContainerEntry]) -> Result<()> {
    if let Some(entry) = entries.iter().find(|entry| !is_enclosed(&entry.path)) {
        return Err(WeaveError::UnsafeEntryPath(entry.path.clone()));
    }

    if is_archive_path(output) {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut zip = ZipWriter::new(File::create(output)?);
        let options = SimpleFileOptions::default();
        for entry in entries {
            zip.start_file(entry.path.as_str(), options)?;
            zip.write_all(&entry.bytes)?;
        }
        zip.finish()?;
    } else {
        for entry in entries {
            let path = output.join(&entry.path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &entry.bytes)?;
        }
    }
    tracing::info!("Wrote {} entries to {}", entries.len(), output.display());
    Ok(())
}
