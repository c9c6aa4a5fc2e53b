//! Application entry point discovery from source files
//!
//! Best-effort heuristic, kept behind [`MainClassLocator`] so a parser-based
//! implementation can replace the text scan.

use ignore::WalkBuilder;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub trait MainClassLocator: Send + Sync {
    /// Fully qualified name of the class holding the entry point of the
    /// module rooted at `module_dir`
    fn locate(&self, module_dir: &Path) -> Option<String>;

    fn name(&self) -> &str;
}

struct SourceRoot {
    dir: &'static str,
    extension: &'static str,
    marker: &'static str,
}

const SOURCE_ROOTS: &[SourceRoot] = &[
    SourceRoot {
        dir: "src/main/java",
        extension: "java",
        marker: "public static void main(",
    },
    SourceRoot {
        dir: "src/main/kotlin",
        extension: "kt",
        marker: "fun main(",
    },
];

/// Scans `src/main/java` and `src/main/kotlin` for the first file declaring a
/// `main` entry point, in path order
#[derive(Debug, Clone, Default)]
pub struct SourceScanLocator;

impl SourceScanLocator {
    pub fn new() -> Self {
        Self
    }

    fn scan_root(&self, module_dir: &Path, root: &SourceRoot) -> Option<String> {
        let source_dir = module_dir.join(root.dir);
        if !source_dir.is_dir() {
            return None;
        }

        let walker = WalkBuilder::new(&source_dir)
            .hidden(false)
            .git_ignore(true)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        for result in walker {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    warn!(error = %err, "Failed to read directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(root.extension) {
                continue;
            }

            let Ok(content) = fs::read_to_string(path) else {
                debug!(path = %path.display(), "Skipping unreadable source file");
                continue;
            };
            if !content.contains(root.marker) {
                continue;
            }

            if let Some(class_name) = class_name_for(&source_dir, path, root.extension) {
                info!(main_class = %class_name, "Discovered main class from sources");
                return Some(class_name);
            }
        }

        None
    }
}

impl MainClassLocator for SourceScanLocator {
    fn locate(&self, module_dir: &Path) -> Option<String> {
        SOURCE_ROOTS
            .iter()
            .find_map(|root| self.scan_root(module_dir, root))
    }

    fn name(&self) -> &str {
        "SourceScanLocator"
    }
}

/// `src/main/java/com/example/App.java` -> `com.example.App`. Kotlin
/// top-level functions compile to `<File>Kt`.
fn class_name_for(source_dir: &Path, file: &Path, extension: &str) -> Option<String> {
    let relative = file.strip_prefix(source_dir).ok()?;
    let stem = relative.file_stem()?.to_str()?;

    let mut segments: Vec<String> = relative
        .parent()
        .into_iter()
        .flat_map(|p| p.components())
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if extension == "kt" {
        segments.push(format!("{}Kt", stem));
    } else {
        segments.push(stem.to_string());
    }
    Some(segments.join("."))
}
