//! Chart signature verification
//!
//! A signed chart archive `demo-0.1.0.tgz` carries a minisign signature in
//! `demo-0.1.0.tgz.minisig`, checked against the public key at the keyring
//! path.

use minisign::{PublicKeyBox, SignatureBox};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::error::{RepoError, Result};

/// Signature file of an archive
pub fn signature_path(archive: &Path) -> PathBuf {
    PathBuf::from(format!("{}.minisig", archive.display()))
}

/// Verify a chart archive against its detached signature
pub fn verify_chart(archive: &Path, keyring: &Path) -> Result<()> {
    let metadata = std::fs::metadata(archive)?;
    if metadata.is_dir() {
        return Err(RepoError::verification("cannot verify a directory"));
    }
    if !rudder_core::archive::is_archive(archive) {
        return Err(RepoError::verification("chart must be a tgz file"));
    }

    let pk_content = std::fs::read_to_string(keyring).map_err(|e| {
        RepoError::verification(format!("failed to read keyring {}: {}", keyring.display(), e))
    })?;
    let pk = PublicKeyBox::from_string(&pk_content)
        .and_then(|pk_box| pk_box.into_public_key())
        .map_err(|e| RepoError::verification(format!("invalid public key: {}", e)))?;

    let sig_path = signature_path(archive);
    let sig_content = std::fs::read_to_string(&sig_path).map_err(|e| {
        RepoError::verification(format!(
            "failed to read signature {}: {}",
            sig_path.display(),
            e
        ))
    })?;
    let sig_box = SignatureBox::from_string(&sig_content)
        .map_err(|e| RepoError::verification(format!("invalid signature: {}", e)))?;

    let data = std::fs::read(archive)?;
    let mut cursor = Cursor::new(&data);
    minisign::verify(&pk, &sig_box, &mut cursor, true, false, false)
        .map_err(|e| RepoError::verification(format!("{}: {}", archive.display(), e)))?;

    tracing::debug!(archive = %archive.display(), "signature verified");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use minisign::KeyPair;
    use tempfile::TempDir;

    /// Write a public key to `dir/rudder.pub` and return a signer for data
    pub(crate) fn keyring(dir: &Path) -> (PathBuf, impl Fn(&[u8]) -> String) {
        let KeyPair { pk, sk } = KeyPair::generate_unencrypted_keypair().unwrap();
        let key_path = dir.join("rudder.pub");
        std::fs::write(&key_path, pk.to_box().unwrap().to_string()).unwrap();

        let sign = move |data: &[u8]| {
            let mut cursor = Cursor::new(data);
            minisign::sign(None, &sk, &mut cursor, Some("rudder test"), None)
                .unwrap()
                .to_string()
        };
        (key_path, sign)
    }

    #[test]
    fn test_valid_signature() {
        let temp = TempDir::new().unwrap();
        let (key, sign) = keyring(temp.path());
        let archive = temp.path().join("demo-0.1.0.tgz");
        std::fs::write(&archive, b"chart bytes").unwrap();
        std::fs::write(signature_path(&archive), sign(b"chart bytes")).unwrap();

        verify_chart(&archive, &key).unwrap();
    }

    #[test]
    fn test_tampered_archive() {
        let temp = TempDir::new().unwrap();
        let (key, sign) = keyring(temp.path());
        let archive = temp.path().join("demo-0.1.0.tgz");
        std::fs::write(&archive, b"tampered").unwrap();
        std::fs::write(signature_path(&archive), sign(b"chart bytes")).unwrap();

        let err = verify_chart(&archive, &key).unwrap_err();
        assert!(matches!(err, RepoError::VerificationFailed { .. }));
    }

    #[test]
    fn test_missing_signature() {
        let temp = TempDir::new().unwrap();
        let (key, _) = keyring(temp.path());
        let archive = temp.path().join("demo-0.1.0.tgz");
        std::fs::write(&archive, b"chart bytes").unwrap();

        let err = verify_chart(&archive, &key).unwrap_err();
        assert!(err.to_string().contains("failed to read signature"));
    }

    #[test]
    fn test_rejects_directory() {
        let temp = TempDir::new().unwrap();
        let err = verify_chart(temp.path(), &temp.path().join("rudder.pub")).unwrap_err();
        assert_eq!(err.to_string(), "verification failed: cannot verify a directory");
    }
}
