mod common;

use common::{ClassBytes, create_test_jar, read_jar_entry};
use saber_core::{AccessFlags, ClassSource, InjectionTarget, InjectionTargets, OBJECT};
use saber_java::classfile::metadata_from_bytes;
use saber_java::pipeline::write_output;
use saber_java::source::{ContainerEntry, ContainerKind, read_entries};
use saber_java::{WeaveConfig, WeaveError, Weaver};
use std::path::Path;
use tempfile::tempdir;

const CONSUMER: &str = "com/example/Consumer.class";
const PLAIN: &str = "com/example/Plain.class";

fn consumer() -> Vec<u8> {
    ClassBytes::new("com/example/Consumer", Some("com/example/Base"))
        .access(0x0020)
        .field(0x0002, "service", "Lcom/example/Service;")
        .method(0x0001, "<init>", "()V")
        .build()
}

fn plain() -> Vec<u8> {
    ClassBytes::new("com/example/Plain", Some(OBJECT))
        .field(0x0002, "secret", "I")
        .build()
}

fn base() -> Vec<u8> {
    ClassBytes::new("com/example/Base", Some(OBJECT)).build()
}

fn targets() -> InjectionTargets {
    [InjectionTarget::new("com/example/Consumer").with_field("service", "Lcom/example/Service;")]
        .into_iter()
        .collect()
}

fn object_jar(dir: &Path) -> std::path::PathBuf {
    let boot = dir.join("boot.jar");
    create_test_jar(
        &boot,
        &[("java/lang/Object.class", ClassBytes::new(OBJECT, None).build())],
    );
    boot
}

#[test]
fn test_weave_jar() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("app.jar");
    let classpath = dir.path().join("lib.jar");
    let output = dir.path().join("out/app.jar");
    let manifest = b"Manifest-Version: 1.0\n".to_vec();

    create_test_jar(
        &input,
        &[
            ("META-INF/MANIFEST.MF", manifest.clone()),
            (CONSUMER, consumer()),
            (PLAIN, plain()),
        ],
    );
    create_test_jar(&classpath, &[("com/example/Base.class", base())]);

    let config = WeaveConfig {
        input: input.clone(),
        output: output.clone(),
        classpath: vec![classpath],
        boot_classpath: vec![object_jar(dir.path())],
        abort_on_first_error: false,
    };
    let report = Weaver::new(config, targets()).run().unwrap();

    assert!(report.is_success());
    assert_eq!(report.classes, 2);
    assert_eq!(report.patched, 1);
    assert_eq!(report.resources, 1);
    assert_eq!(report.resolver_fallbacks, 0);

    let patched = metadata_from_bytes(CONSUMER, &read_jar_entry(&output, CONSUMER)).unwrap();
    assert_eq!(patched.access, AccessFlags::PUBLIC | AccessFlags::SUPER);
    assert_eq!(patched.fields[0].access, AccessFlags::empty());

    // Untouched entries are copied byte-for-byte.
    assert_eq!(read_jar_entry(&output, PLAIN), plain());
    assert_eq!(read_jar_entry(&output, "META-INF/MANIFEST.MF"), manifest);
}

#[test]
fn test_weave_directory_is_idempotent() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("classes");
    let first = dir.path().join("woven");
    let second = dir.path().join("woven-again");
    std::fs::create_dir_all(input.join("com/example")).unwrap();
    std::fs::write(input.join(CONSUMER), consumer()).unwrap();
    std::fs::write(input.join("com/example/Base.class"), base()).unwrap();

    let boot = object_jar(dir.path());
    let run = |from: &Path, to: &Path| {
        let config = WeaveConfig {
            input: from.to_path_buf(),
            output: to.to_path_buf(),
            boot_classpath: vec![boot.clone()],
            ..WeaveConfig::default()
        };
        Weaver::new(config, targets()).run().unwrap()
    };

    let report = run(&input, &first);
    assert_eq!(report.patched, 1);
    assert_eq!(ContainerKind::detect(&first).unwrap(), ContainerKind::Directory);

    let report = run(&first, &second);
    assert_eq!(report.patched, 0);
    assert_eq!(
        std::fs::read(first.join(CONSUMER)).unwrap(),
        std::fs::read(second.join(CONSUMER)).unwrap()
    );
}

#[test]
fn test_broken_class_is_reported_but_others_are_woven() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("app.jar");
    let output = dir.path().join("out.jar");
    create_test_jar(
        &input,
        &[
            ("com/example/Broken.class", vec![0xCA, 0xFE, 0xBA, 0xBE]),
            (CONSUMER, consumer()),
        ],
    );

    let config = WeaveConfig {
        input: input.clone(),
        output: output.clone(),
        boot_classpath: vec![object_jar(dir.path())],
        ..WeaveConfig::default()
    };
    let report = Weaver::new(config.clone(), targets()).run().unwrap();
    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "com/example/Broken.class");
    assert_eq!(report.patched, 1);
    assert_eq!(
        read_jar_entry(&output, "com/example/Broken.class"),
        vec![0xCA, 0xFE, 0xBA, 0xBE]
    );

    let strict = WeaveConfig {
        abort_on_first_error: true,
        ..config
    };
    assert!(Weaver::new(strict, targets()).run().is_err());
}

#[test]
fn test_session_resolver_sees_all_layers() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("app.jar");
    let classpath = dir.path().join("lib.jar");
    let sibling = ClassBytes::new("com/example/Sibling", Some("com/example/Base")).build();
    create_test_jar(
        &input,
        &[(CONSUMER, consumer()), ("com/example/Sibling.class", sibling)],
    );
    create_test_jar(&classpath, &[("com/example/Base.class", base())]);

    let config = WeaveConfig {
        input,
        output: dir.path().join("out.jar"),
        classpath: vec![classpath],
        boot_classpath: vec![object_jar(dir.path())],
        abort_on_first_error: true,
    };
    let session = Weaver::new(config, targets()).prepare().unwrap();

    assert_eq!(
        session.registry().layer_of("com/example/Base"),
        Some(ClassSource::Classpath)
    );
    assert_eq!(
        session.registry().layer_of(OBJECT),
        Some(ClassSource::BootClasspath)
    );
    let common = session
        .resolver()
        .resolve("com/example/Consumer", "com/example/Sibling");
    assert_eq!(common.name, "com/example/Base");
    assert!(!common.is_fallback());

    let unknown = session
        .resolver()
        .resolve("com/example/Consumer", "com/other/Unknown");
    assert!(unknown.is_fallback());
    assert_eq!(session.resolver().fallback_count(), 1);
}

#[test]
fn test_read_entries_rejects_unknown_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"hello world").unwrap();
    assert!(read_entries(&path).is_err());
}

#[test]
fn test_jar_entries_cannot_escape_output_dir() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("app.jar");
    let output = dir.path().join("a/b/out");
    create_test_jar(
        &input,
        &[
            ("../../escaped.txt", b"outside".to_vec()),
            (CONSUMER, consumer()),
        ],
    );

    let config = WeaveConfig {
        input,
        output: output.clone(),
        boot_classpath: vec![object_jar(dir.path())],
        ..WeaveConfig::default()
    };
    let report = Weaver::new(config, targets()).run().unwrap();

    assert_eq!(report.resources, 0);
    assert_eq!(report.patched, 1);
    assert!(!dir.path().join("escaped.txt").exists());
    assert!(output.join(CONSUMER).is_file());
}

#[test]
fn test_write_output_rejects_relative_escapes() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out");
    let entries = vec![
        ContainerEntry {
            path: "ok.txt".to_string(),
            bytes: b"ok".to_vec(),
        },
        ContainerEntry {
            path: "../escaped.txt".to_string(),
            bytes: b"outside".to_vec(),
        },
    ];

    let err = write_output(&output, &entries).unwrap_err();
    assert!(matches!(err, WeaveError::UnsafeEntryPath(ref path) if path == "../escaped.txt"));
    assert!(!dir.path().join("escaped.txt").exists());
    assert!(!output.join("ok.txt").exists());
}
