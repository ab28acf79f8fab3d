//! Artifact persistence.

use super::{Artifact, ArtifactFormat};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes artifacts under a single output directory.
///
/// Files are named `<logical-name>.<ext>`; saving under an existing name
/// overwrites it.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an artifact with this name and format is stored at.
    pub fn path_for(&self, name: &str, format: ArtifactFormat) -> Result<PathBuf> {
        let stem = slug(name);
        if stem.is_empty() {
            return Err(Error::invalid_argument(format!(
                "artifact name '{name}' has no usable characters"
            )));
        }
        Ok(self.root.join(format!("{stem}.{}", format.extension())))
    }

    /// Persist `artifact`, returning the written path.
    pub async fn save(&self, name: &str, artifact: &Artifact) -> Result<PathBuf> {
        let path = self.path_for(name, artifact.format())?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, artifact.as_bytes()).await?;
        info!("Saved {} artifact to {}", artifact.format(), path.display());
        Ok(path)
    }

    /// Read an artifact back, inferring its format from the extension.
    pub async fn load(path: &Path) -> Result<Artifact> {
        let format: ArtifactFormat = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::invalid_argument(format!("no extension on {}", path.display())))?
            .parse()?;

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ArtifactNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(match format {
            ArtifactFormat::Png => Artifact::Raster(bytes),
            ArtifactFormat::Html => Artifact::Markup(String::from_utf8_lossy(&bytes).into_owned()),
            ArtifactFormat::Svg => Artifact::Vector(String::from_utf8_lossy(&bytes).into_owned()),
        })
    }
}

/// Lower-case, dash-separated file stem. Path separators and dots never
/// survive, so names cannot escape the output directory.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch.to_ascii_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(slug("Ethereum TVL trends"), "ethereum-tvl-trends");
        assert_eq!(slug("../../etc/passwd"), "etc-passwd");
        assert_eq!(slug("eth_price--chart!"), "eth_price-chart");
        assert_eq!(slug("///"), "");
    }

    #[tokio::test]
    async fn test_save_overwrites_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("out"));

        let first = store
            .save("ETH Price", &Artifact::Markup("<html>1</html>".into()))
            .await
            .unwrap();
        let second = store
            .save("ETH Price", &Artifact::Markup("<html>2</html>".into()))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.file_name().unwrap(), "eth-price.html");
        let loaded = ArtifactStore::load(&first).await.unwrap();
        assert_eq!(loaded, Artifact::Markup("<html>2</html>".into()));
    }

    #[tokio::test]
    async fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactStore::load(&dir.path().join("nope.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ArtifactNotFound(_)));
    }

    #[test]
    fn test_rejects_empty_name() {
        let store = ArtifactStore::new("/tmp/out");
        assert!(store.path_for("!!!", ArtifactFormat::Png).is_err());
    }
}
