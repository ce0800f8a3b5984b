//! Local configuration: the credential file and the fuse client settings

mod store;

pub use store::{FileCredentialStore, InMemoryCredentialStore, CREDENTIALS_TABLE};

use crate::error::Result;
use std::path::Path;

/// Default credential file, relative to the user's home directory
pub const DEFAULT_CREDENTIAL_FILE: &str = ".metal-volumes/credentials.toml";

/// Key naming the local mount root in the fuse client configuration
pub const FUSE_MOUNT_POINT_KEY: &str = "fuse.mount.point";

/// Read the mount root from a fuse client configuration file.
///
/// The file is line-oriented `key=value`; `#` starts a comment.
pub fn read_fuse_mount_point(path: &Path) -> Result<Option<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_fuse_mount_point(&content))
}

fn parse_fuse_mount_point(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == FUSE_MOUNT_POINT_KEY)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Resolve the credential file location when none is given
pub fn default_credential_path() -> std::path::PathBuf {
    std::env::var_os("HOME")
        .map(std::path::PathBuf::from)
        .unwrap_or_default()
        .join(DEFAULT_CREDENTIAL_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mount_point() {
        let conf = "# client\nfuse.log.level=info\n fuse.mount.point = /mnt/metal \n";
        assert_eq!(parse_fuse_mount_point(conf).as_deref(), Some("/mnt/metal"));

        assert_eq!(parse_fuse_mount_point("#fuse.mount.point=/x\n"), None);
        assert_eq!(parse_fuse_mount_point("fuse.mount.point=\n"), None);
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        tokio_test::assert_err!(read_fuse_mount_point(&dir.path().join("absent.conf")));
    }
}
