use std::path::{Path, PathBuf};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const INTAKE_DIR: &str = ".pine-intake";
pub const SESSIONS_DIR: &str = ".pine-intake/sessions";
pub const CONFIG_FILE: &str = ".pine-intake/config.yaml";

/// Default location for accepted specifications, relative to the root.
pub const ANALYSIS_DIR: &str = "projects/analysis";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn intake_dir(root: &Path) -> PathBuf {
    root.join(INTAKE_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn sessions_dir(root: &Path) -> PathBuf {
    root.join(SESSIONS_DIR)
}

pub fn session_path(root: &Path, id: &Uuid) -> PathBuf {
    sessions_dir(root).join(format!("{id}.yaml"))
}

/// `analysis_dir` is taken from configuration and may be absolute.
pub fn analysis_path(root: &Path, analysis_dir: &str, analysis_id: &str) -> PathBuf {
    root.join(analysis_dir).join(format!("analysis_{analysis_id}.json"))
}

pub fn is_initialized(root: &Path) -> bool {
    config_path(root).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_path_uses_id() {
        let id = Uuid::nil();
        let path = session_path(Path::new("/r"), &id);
        assert_eq!(
            path,
            PathBuf::from("/r/.pine-intake/sessions/00000000-0000-0000-0000-000000000000.yaml")
        );
    }

    #[test]
    fn analysis_path_layout() {
        let path = analysis_path(Path::new("/r"), ANALYSIS_DIR, "abcd1234");
        assert_eq!(path, PathBuf::from("/r/projects/analysis/analysis_abcd1234.json"));
        let abs = analysis_path(Path::new("/r"), "/out", "x");
        assert_eq!(abs, PathBuf::from("/out/analysis_x.json"));
    }
}
