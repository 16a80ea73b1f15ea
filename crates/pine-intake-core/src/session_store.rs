//! YAML persistence for interview sessions, one file per session under
//! `.pine-intake/sessions/`.

use crate::error::{IntakeError, Result};
use crate::io;
use crate::navigator::Session;
use crate::paths;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub fn save(root: &Path, session: &Session) -> Result<PathBuf> {
    let path = paths::session_path(root, &session.id);
    io::write_yaml(&path, session)?;
    Ok(path)
}

pub fn load(root: &Path, id: &str) -> Result<Session> {
    let uuid = Uuid::parse_str(id).map_err(|_| IntakeError::SessionNotFound(id.to_string()))?;
    let path = paths::session_path(root, &uuid);
    if !path.exists() {
        return Err(IntakeError::SessionNotFound(id.to_string()));
    }
    let data = std::fs::read_to_string(&path)?;
    let session: Session = serde_yaml::from_str(&data)?;
    Ok(session)
}

/// All stored sessions, oldest first.
pub fn list(root: &Path) -> Result<Vec<Session>> {
    let dir = paths::sessions_dir(root);
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut sessions = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
            continue;
        }
        let data = std::fs::read_to_string(&path)?;
        match serde_yaml::from_str::<Session>(&data) {
            Ok(s) => sessions.push(s),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable session"),
        }
    }
    sessions.sort_by_key(|s| s.started_at);
    Ok(sessions)
}

pub fn remove(root: &Path, id: &str) -> Result<()> {
    let session = load(root, id)?;
    std::fs::remove_file(paths::session_path(root, &session.id))?;
    Ok(())
}
