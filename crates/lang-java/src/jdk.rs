//! Default boot classpath, taken from the JDK the weaver runs next to.

use std::iter;
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

/// Boot class containers of the first JDK found through `JAVA_HOME`, the
/// macOS `java_home` tool or the `java` launcher on `PATH`. Empty when no
/// JDK is found.
pub fn default_boot_classpath() -> Vec<PathBuf> {
    let candidates = std::env::var_os("JAVA_HOME")
        .map(PathBuf::from)
        .into_iter()
        .chain(iter::once_with(macos_java_home).flatten())
        .chain(iter::once_with(launcher_java_home).flatten());

    for home in candidates {
        let containers = boot_classpath_of(&home);
        if !containers.is_empty() {
            tracing::debug!("JDK at {}: {} boot containers", home.display(), containers.len());
            return containers;
        }
        tracing::debug!("{} holds no boot classes", home.display());
    }
    Vec::new()
}

/// The `lib/modules` image on Java 9+. On Java 8 every jar in `lib/` and
/// `lib/ext/` of the JRE, so that `jce.jar`, `jsse.jar` and the extension
/// providers contribute their hierarchy alongside `rt.jar`.
pub fn boot_classpath_of(home: &Path) -> Vec<PathBuf> {
    let modules = home.join("lib").join("modules");
    if modules.is_file() {
        return vec![modules];
    }

    // A JDK 8 home nests the JRE; a JRE home is the JRE itself.
    let jre = if home.join("jre").join("lib").is_dir() {
        home.join("jre")
    } else {
        home.to_path_buf()
    };

    [jre.join("lib"), jre.join("lib").join("ext")]
        .iter()
        .flat_map(|dir| jars_in(dir))
        .collect()
}

fn jars_in(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "jar"))
        .collect()
}

#[cfg(target_os = "macos")]
fn macos_java_home() -> Option<PathBuf> {
    let output = Command::new("/usr/libexec/java_home").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let home = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!home.is_empty()).then(|| PathBuf::from(home))
}

#[cfg(not(target_os = "macos"))]
fn macos_java_home() -> Option<PathBuf> {
    None
}

/// `java.home` as reported by `java -XshowSettings:properties` (on stderr).
fn launcher_java_home() -> Option<PathBuf> {
    let output = Command::new("java")
        .args(["-XshowSettings:properties", "-version"])
        .output()
        .ok()?;
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .find_map(|line| line.trim().strip_prefix("java.home = "))
        .map(|home| PathBuf::from(home.trim()))
}
