//! Certificate management for OPC-UA connections
//!
//! Handles the PKI directory structure and trusting the configured server
//! certificate. Certificates are only loaded from paths, never generated.

use anyhow::{Context, Result};
use opcua::crypto::{CertificateStore, X509};
use std::fs;
use std::path::{Path, PathBuf};

/// Certificate manager for OPC-UA PKI operations
pub struct CertificateManager {
    /// Root PKI directory
    pki_dir: PathBuf,
    /// Layout owned by the client stack
    store: CertificateStore,
}

impl CertificateManager {
    pub fn new(pki_dir: impl Into<PathBuf>) -> Self {
        let pki_dir = pki_dir.into();
        let store = CertificateStore::new(&pki_dir);
        Self { pki_dir, store }
    }

    /// Get the PKI directory path
    pub fn pki_directory(&self) -> &Path {
        &self.pki_dir
    }

    /// Ensure PKI directory structure exists
    pub fn ensure_pki_structure(&self) -> Result<()> {
        // pki/
        //   own/       - client certificate
        //   private/   - client private key
        //   trusted/   - trusted server certificates, "<CN> [<thumbprint>].der"
        //   rejected/  - certificates the stack refused
        let dirs = [
            self.pki_dir.join("own"),
            self.pki_dir.join("private"),
            self.store.trusted_certs_dir(),
            self.store.rejected_certs_dir(),
        ];

        for dir in &dirs {
            if !dir.exists() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {:?}", dir))?;
                tracing::info!("Created PKI directory: {:?}", dir);
            }
        }

        Ok(())
    }

    /// Store a server certificate in the trusted store under the name the
    /// stack validates against, returning its new path.
    ///
    /// A copy left in `rejected/` by an earlier failed handshake is removed,
    /// otherwise the stack keeps refusing the certificate.
    pub fn trust_server_certificate(&self, cert_path: &Path) -> Result<PathBuf> {
        if !cert_path.is_file() {
            anyhow::bail!("Certificate file not found: {:?}", cert_path);
        }

        let cert = read_certificate(cert_path)?;
        let file_name = CertificateStore::cert_file_name(&cert);
        let der = cert
            .to_der()
            .map_err(|e| anyhow::anyhow!("Failed to encode certificate {:?}: {}", cert_path, e))?;

        let dest = self.store.trusted_certs_dir().join(&file_name);
        fs::write(&dest, der)
            .with_context(|| format!("Failed to write certificate to trusted store: {:?}", dest))?;

        let rejected = self.store.rejected_certs_dir().join(&file_name);
        if rejected.exists() {
            fs::remove_file(&rejected)
                .with_context(|| format!("Failed to remove rejected copy: {:?}", rejected))?;
            tracing::warn!("Removed previously rejected copy of {}", file_name);
        }

        tracing::info!("Trusted server certificate: {}", file_name);
        Ok(dest)
    }
}

/// Read a DER or PEM certificate regardless of its file extension
fn read_certificate(path: &Path) -> Result<X509> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read certificate {:?}", path))?;
    X509::from_der(&bytes)
        .or_else(|_| X509::from_pem(&bytes))
        .map_err(|_| anyhow::anyhow!("{:?} is neither a DER nor a PEM certificate", path))
}
