use std::fmt::Display;
use std::path::{Component, Path, PathBuf};

use crate::{UploadError, UploadStore};
use async_trait::async_trait;

/// Upload store writing to `<root>/<domain>/<file_name>`.
///
/// Both `domain` and `file_name` must be single plain path components. After
/// the domain directory exists, the destination is resolved and must still
/// lie under the canonical root, and an existing destination must be a
/// regular file (not a symlink or directory).
pub struct DirUploadStore {
    root: PathBuf,
}

impl DirUploadStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn create_dir(path: &Path) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|source| UploadError::CreateDir {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn canonicalize(path: &Path) -> Result<PathBuf, UploadError> {
        tokio::fs::canonicalize(path)
            .await
            .map_err(|source| UploadError::CreateDir {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// True when `name` is exactly one normal path component.
fn is_plain_component(name: &str) -> bool {
    if name.is_empty() || name.contains('\0') || name.contains('\\') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains('/')
}

impl Display for DirUploadStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DirUploadStore({})", self.root.display())
    }
}

#[async_trait]
impl UploadStore for DirUploadStore {
    async fn store_file(
        &self,
        domain: &str,
        file_name: &str,
        content: &[u8],
    ) -> Result<PathBuf, UploadError> {
        let requested = self.root.join(domain).join(file_name);
        if !is_plain_component(domain) || !is_plain_component(file_name) {
            return Err(UploadError::InvalidPath(requested));
        }

        Self::create_dir(&self.root).await?;
        let root = Self::canonicalize(&self.root).await?;

        let domain_dir = root.join(domain);
        Self::create_dir(&domain_dir).await?;
        let domain_dir = Self::canonicalize(&domain_dir).await?;
        if domain_dir.parent() != Some(root.as_path()) {
            return Err(UploadError::InvalidPath(requested));
        }

        let path = domain_dir.join(file_name);
        if let Ok(meta) = tokio::fs::symlink_metadata(&path).await {
            if !meta.is_file() {
                return Err(UploadError::InvalidPath(requested));
            }
        }

        tokio::fs::write(&path, content)
            .await
            .map_err(|source| UploadError::Write {
                path: path.clone(),
                source,
            })?;
        log::info!("{} uploaded", path.display());
        Ok(path)
    }
}
