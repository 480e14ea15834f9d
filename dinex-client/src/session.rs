/// Persisted identity token for silent session restoration
///
/// The token is just the last logged-in username, written to a small file
/// so the terminal can attempt a silent login on the next launch. A failed
/// restore clears the file.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Resolve the session file path: `DINEX_SESSION_FILE`, else
/// `$HOME/.dinex_session`, else a dotfile in the working directory.
fn default_session_path() -> PathBuf {
    if let Ok(path) = std::env::var("DINEX_SESSION_FILE") {
        return PathBuf::from(path);
    }
    match std::env::var("HOME") {
        Ok(home) => Path::new(&home).join(".dinex_session"),
        Err(_) => PathBuf::from(".dinex_session"),
    }
}

/// File-backed store for the identity token
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store at the environment-resolved default path
    pub fn from_env() -> Self {
        Self::new(default_session_path())
    }

    /// Store at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the saved username, if any
    pub fn load(&self) -> Option<String> {
        let token = fs::read_to_string(&self.path).ok()?;
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    /// Persist `username` as the restoration token
    pub fn save(&self, username: &str) -> io::Result<()> {
        fs::write(&self.path, username)
    }

    /// Forget the saved token
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
