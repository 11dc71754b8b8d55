use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] =
    &["https://4m-nutrition.vercel.app", "http://localhost:5173"];

pub struct Config {
    pub workbook_dir: PathBuf,
    pub session_path: PathBuf,
    pub api_url: String,
    pub allowed_origins: Vec<String>,
}

/// Saved login. The token is what the server checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub token: String,
    pub name: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var_os("FOURM_DATA_DIR") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => ProjectDirs::from("", "", "fourm")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        Self::with_data_dir(
            &data_dir,
            std::env::var("FOURM_API_URL").ok().as_deref(),
            std::env::var("FOURM_ALLOWED_ORIGINS").ok().as_deref(),
        )
    }

    fn with_data_dir(
        data_dir: &Path,
        api_url: Option<&str>,
        allowed_origins: Option<&str>,
    ) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let api_url = api_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .to_string();
        let allowed_origins: Vec<String> = match allowed_origins {
            Some(list) if !list.trim().is_empty() => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            _ => DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|o| (*o).to_string())
                .collect(),
        };

        Ok(Config {
            workbook_dir: data_dir.join("workbooks"),
            session_path: data_dir.join("session.json"),
            api_url,
            allowed_origins,
        })
    }

    pub fn load_session(&self) -> Result<Option<Session>> {
        if !self.session_path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.session_path)
            .context("Failed to read session file")?;
        let session = serde_json::from_str(&raw).context("Session file is corrupt")?;
        Ok(Some(session))
    }

    /// The saved session, or an error telling the user to log in.
    pub fn require_session(&self) -> Result<Session> {
        match self.load_session()? {
            Some(session) => Ok(session),
            None => bail!("Not logged in. Run `fourm login <email>` first"),
        }
    }

    pub fn save_session(&self, session: &Session) -> Result<()> {
        let raw = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.session_path, raw).context("Failed to write session file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.session_path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set session file permissions")?;
        }
        Ok(())
    }

    /// Returns false when there was no session to clear.
    pub fn clear_session(&self) -> Result<bool> {
        if !self.session_path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.session_path).context("Failed to remove session file")?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_data_dir(dir.path(), None, None).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.allowed_origins, DEFAULT_ALLOWED_ORIGINS);
        assert_eq!(config.workbook_dir, dir.path().join("workbooks"));
        assert_eq!(config.session_path, dir.path().join("session.json"));
    }

    #[test]
    fn overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_data_dir(
            dir.path(),
            Some("https://api.example.com"),
            Some("https://a.example.com, https://b.example.com,"),
        )
        .unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(
            config.allowed_origins,
            ["https://a.example.com", "https://b.example.com"]
        );
    }

    #[test]
    fn session_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_data_dir(dir.path(), None, None).unwrap();
        assert!(config.load_session().unwrap().is_none());
        assert!(config.require_session().is_err());

        let session = Session {
            email: "ana@example.com".to_string(),
            token: "ana@example.com".to_string(),
            name: "ana".to_string(),
        };
        config.save_session(&session).unwrap();
        assert_eq!(config.require_session().unwrap(), session);

        assert!(config.clear_session().unwrap());
        assert!(!config.clear_session().unwrap());
        assert!(config.load_session().unwrap().is_none());
    }
}
