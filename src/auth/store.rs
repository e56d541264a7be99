use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use super::error::AuthError;
use super::token::Credential;

/// Storage abstraction for per-profile credentials.
///
/// `load` distinguishes a missing record ([`AuthError::NotLoggedIn`]) from an
/// unreadable one ([`AuthError::Storage`]); `delete` succeeds when nothing is
/// stored.
pub trait TokenStore: Send + Sync {
    fn load(&self, profile: &str) -> Result<Credential, AuthError>;
    fn save(&self, profile: &str, credential: &Credential) -> Result<(), AuthError>;
    fn delete(&self, profile: &str) -> Result<(), AuthError>;
    /// Profiles that currently have a stored record, sorted.
    fn profiles(&self) -> Result<Vec<String>, AuthError>;
}

/// Configuration for file-backed token storage.
#[derive(Debug, Clone)]
pub struct TokenStoreConfig {
    /// Configuration root; token files live in `<root>/tokens/`.
    pub root: PathBuf,
}

impl TokenStoreConfig {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

/// File-backed token store writing one JSON file per profile.
///
/// # Example
/// ```no_run
/// use chrono::{Duration, Utc};
/// use gauth::auth::{Credential, FileTokenStore, TokenStore, TokenStoreConfig};
///
/// let store = FileTokenStore::new(TokenStoreConfig::new("/tmp/gauth".into()));
/// let credential = Credential {
///     access_token: "access".to_string(),
///     refresh_token: None,
///     expires_at: Utc::now() + Duration::hours(1),
///     scopes: vec!["openid".to_string()],
/// };
/// store.save("default", &credential)?;
/// # Ok::<(), gauth::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    root: PathBuf,
}

impl FileTokenStore {
    pub fn new(config: TokenStoreConfig) -> Self {
        Self { root: config.root }
    }

    /// `<root>/tokens/<profile>.json`.
    pub fn path_for(&self, profile: &str) -> PathBuf {
        self.tokens_dir().join(format!("{profile}.json"))
    }

    fn tokens_dir(&self) -> PathBuf {
        self.root.join("tokens")
    }

    fn checked_path(&self, profile: &str) -> Result<PathBuf, AuthError> {
        validate_profile(profile)?;
        Ok(self.path_for(profile))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self, profile: &str) -> Result<Credential, AuthError> {
        let path = self.checked_path(profile)?;
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::NotLoggedIn)
            }
            Err(err) => return Err(AuthError::Storage(format!("{}: {err}", path.display()))),
        };
        let credential: Credential = serde_json::from_str(&raw)
            .map_err(|err| AuthError::CorruptCredential(format!("{}: {err}", path.display())))?;
        credential.validate()?;
        Ok(credential)
    }

    fn save(&self, profile: &str, credential: &Credential) -> Result<(), AuthError> {
        let path = self.checked_path(profile)?;
        let serialized = serde_json::to_vec_pretty(credential)?;
        atomic_write(&path, &serialized)?;
        tracing::debug!(profile, path = %path.display(), "saved credential");
        Ok(())
    }

    fn delete(&self, profile: &str) -> Result<(), AuthError> {
        let path = self.checked_path(profile)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Storage(format!("{}: {err}", path.display()))),
        }
    }

    fn profiles(&self) -> Result<Vec<String>, AuthError> {
        let entries = match fs::read_dir(self.tokens_dir()) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut profiles = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                profiles.push(stem.to_string());
            }
        }
        profiles.sort();
        Ok(profiles)
    }
}

/// Profile names become file stems, so anything that could escape the
/// tokens directory is rejected.
pub fn validate_profile(profile: &str) -> Result<(), AuthError> {
    let invalid = profile.trim().is_empty()
        || profile == "."
        || profile == ".."
        || profile.contains(['/', '\\'])
        || profile.starts_with('.');
    if invalid {
        return Err(AuthError::InvalidProfile(profile.to_string()));
    }
    Ok(())
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AuthError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_private_dir(parent)?;
        }
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| AuthError::Storage(format!("{} has no file name", path.display())))?;
    let temp_name = format!(
        ".{}.tmp-{}-{}",
        file_name.to_string_lossy(),
        std::process::id(),
        uuid::Uuid::new_v4().simple()
    );
    let temp_path = path.with_file_name(temp_name);

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let write_result = (|| -> std::io::Result<()> {
        let mut temp_file = options.open(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.sync_all()?;
        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(AuthError::Storage(format!("{}: {err}", path.display())));
    }

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(AuthError::Storage(format!("{}: {err}", path.display())));
    }

    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;

    Ok(())
}

fn create_private_dir(dir: &Path) -> Result<(), AuthError> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;
    #[cfg(unix)]
    fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    Ok(())
}
