use std::io::Write;
use std::path::{Path, PathBuf};
use std::{fs, io};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use super::parsing::env_optional;

const SECRET_FILE_ENV: &str = "VERIVIVA_SECRET_FILE";
const DEFAULT_SECRET_FILE: &str = ".secret_key";

/// Signing key used when `JWT_SECRET` is absent. The key is generated once and
/// persisted so tokens survive restarts of a development server.
pub(super) fn load_or_create_secret_key() -> String {
    let path = env_optional(SECRET_FILE_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRET_FILE));

    if let Some(existing) = read_secret(&path) {
        return existing;
    }

    let generated = generate_secret_key();
    match persist_secret(&path, &generated) {
        Ok(()) => {
            tracing::warn!(path = %path.display(), "JWT_SECRET not set; generated a signing key");
            generated
        }
        // Another process won the race to create the file.
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            read_secret(&path).unwrap_or(generated)
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %path.display(),
                "Failed to persist generated signing key; tokens will not survive a restart"
            );
            generated
        }
    }
}

fn read_secret(path: &Path) -> Option<String> {
    let value = fs::read_to_string(path).ok()?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn persist_secret(path: &Path, secret: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(secret.as_bytes())
}

fn generate_secret_key() -> String {
    let mut bytes = [0u8; 64];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_long_and_distinct() {
        let first = generate_secret_key();
        let second = generate_secret_key();
        assert!(first.len() >= 80);
        assert_ne!(first, second);
    }

    #[test]
    fn persisted_secret_is_read_back() {
        let path = std::env::temp_dir().join(format!("veriviva-secret-{}", uuid::Uuid::new_v4()));
        persist_secret(&path, "  stored-secret \n").expect("persist");
        assert_eq!(read_secret(&path).as_deref(), Some("stored-secret"));
        let second = persist_secret(&path, "other").expect_err("file exists");
        assert_eq!(second.kind(), io::ErrorKind::AlreadyExists);
        let _ = fs::remove_file(&path);
    }
}
