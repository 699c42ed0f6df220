use anyhow::{Context, Result};
use blog_content::AuthSession;
use std::fs;
use std::path::{Path, PathBuf};

/// Persists the admin session between CLI runs.
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(custom_path: Option<PathBuf>) -> Result<Self> {
        let path = match custom_path {
            Some(path) => path,
            None => {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                home.join(".blog_admin_session")
            }
        };

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, session: &AuthSession) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to save session to {:?}", self.path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        tracing::debug!("Session saved to {:?}", self.path);
        Ok(())
    }

    /// A missing, empty or unreadable-as-JSON file means "not logged in".
    pub fn load(&self) -> Result<Option<AuthSession>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to read session file"),
        };

        if raw.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!("Ignoring malformed session file {:?}: {}", self.path, e);
                Ok(None)
            }
        }
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove session file {:?}", self.path))?;
            tracing::debug!("Session file removed");
        }
        Ok(())
    }

    /// Mirror the in-memory session to disk.
    pub fn sync(&self, session: Option<&AuthSession>) -> Result<()> {
        match session {
            Some(session) => self.save(session),
            None => self.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(Some(dir.path().join("session.json"))).unwrap();

        assert_eq!(file.load().unwrap(), None);

        let session = AuthSession::new("token-1", "admin@example.com");
        file.save(&session).unwrap();
        assert_eq!(file.load().unwrap(), Some(session));

        file.clear().unwrap();
        assert!(!file.path().exists());
        assert_eq!(file.load().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(Some(dir.path().join("session.json"))).unwrap();
        file.save(&AuthSession::new("t", "a@b.c")).unwrap();

        let mode = fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let file = SessionFile::new(Some(path)).unwrap();
        assert_eq!(file.load().unwrap(), None);
    }
}
