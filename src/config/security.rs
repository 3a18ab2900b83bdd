//! Transport security configuration and the certificate material it resolves to

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ExerciserError;

/// Transport security selected for the session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    #[default]
    None,
    Tls,
}

impl SecurityMode {
    /// OPC-UA security policy name used for endpoint matching
    pub fn policy_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Tls => "Basic256Sha256",
        }
    }
}

impl std::str::FromStr for SecurityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "tls" => Ok(Self::Tls),
            other => Err(format!("unknown security mode \"{}\" (expected none or tls)", other)),
        }
    }
}

impl std::fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Tls => write!(f, "tls"),
        }
    }
}

/// Security section of the settings file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    pub mode: SecurityMode,
    pub server_cert_path: Option<PathBuf>,
    /// Falls back to the server certificate when unset
    pub client_cert_path: Option<PathBuf>,
    pub private_key_path: Option<PathBuf>,
}

/// Certificate and key files resolved for a secured session.
///
/// Paths are absolute: the client stack joins relative ones onto its PKI
/// directory.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityMaterial {
    pub server_cert: PathBuf,
    /// Certificate presented as the client's own identity
    pub own_cert: PathBuf,
    pub private_key: PathBuf,
}

impl SecurityConfig {
    /// Resolve the artifacts the configured mode needs.
    ///
    /// Returns `Ok(None)` when no security is selected. With TLS selected
    /// the server certificate and private key must both be configured and
    /// present on disk; the client certificate is optional and falls back
    /// to the server certificate. Relative paths are taken from the working
    /// directory.
    pub fn resolve(&self) -> Result<Option<SecurityMaterial>, ExerciserError> {
        if self.mode == SecurityMode::None {
            return Ok(None);
        }

        let server_cert = require_file(
            self.server_cert_path.as_deref(),
            "tls is enabled, but server cert is missing with current configuration",
        )?;
        let private_key = require_file(
            self.private_key_path.as_deref(),
            "tls is enabled, but private key is missing with current configuration",
        )?;
        let own_cert = match self.client_cert_path.as_deref() {
            Some(path) => require_file(Some(path), "client cert is configured but unreadable")?,
            None => server_cert.clone(),
        };

        tracing::debug!("Resolved TLS material: own cert {:?}, key {:?}", own_cert, private_key);

        Ok(Some(SecurityMaterial {
            server_cert,
            own_cert,
            private_key,
        }))
    }
}

fn require_file(path: Option<&Path>, missing: &str) -> Result<PathBuf, ExerciserError> {
    let path = path.ok_or_else(|| ExerciserError::Configuration(missing.to_string()))?;
    if !path.is_file() {
        return Err(ExerciserError::Configuration(format!("{} ({:?} not found)", missing, path)));
    }
    std::fs::canonicalize(path)
        .map_err(|e| ExerciserError::Configuration(format!("{} ({:?}: {})", missing, path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"-----BEGIN-----").unwrap();
        path
    }

    #[test]
    fn test_none_mode_needs_nothing() {
        let config = SecurityConfig::default();
        assert_eq!(config.resolve().unwrap(), None);
    }

    #[test]
    fn test_tls_without_server_cert_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = SecurityConfig {
            mode: SecurityMode::Tls,
            private_key_path: Some(touch(dir.path(), "key.pem")),
            ..Default::default()
        };
        let err = config.resolve().unwrap_err();
        assert!(matches!(err, ExerciserError::Configuration(ref m) if m.contains("server cert")));
    }

    #[test]
    fn test_tls_without_private_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = SecurityConfig {
            mode: SecurityMode::Tls,
            server_cert_path: Some(touch(dir.path(), "server.der")),
            ..Default::default()
        };
        let err = config.resolve().unwrap_err();
        assert!(matches!(err, ExerciserError::Configuration(ref m) if m.contains("private key")));
    }

    #[test]
    fn test_tls_with_configured_but_absent_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = SecurityConfig {
            mode: SecurityMode::Tls,
            server_cert_path: Some(dir.path().join("nope.der")),
            private_key_path: Some(touch(dir.path(), "key.pem")),
            ..Default::default()
        };
        assert!(config.resolve().is_err());
    }

    #[test]
    fn test_client_cert_falls_back_to_server_cert() {
        let dir = tempfile::tempdir().unwrap();
        let server = touch(dir.path(), "server.der");
        let config = SecurityConfig {
            mode: SecurityMode::Tls,
            server_cert_path: Some(server.clone()),
            private_key_path: Some(touch(dir.path(), "key.pem")),
            client_cert_path: None,
        };
        let material = config.resolve().unwrap().unwrap();
        assert_eq!(material.own_cert, std::fs::canonicalize(&server).unwrap());
        assert_eq!(material.own_cert, material.server_cert);

        let client = touch(dir.path(), "client.der");
        let config = SecurityConfig {
            client_cert_path: Some(client.clone()),
            ..config
        };
        assert_eq!(config.resolve().unwrap().unwrap().own_cert, std::fs::canonicalize(&client).unwrap());
    }

    #[test]
    fn test_relative_paths_resolve_to_loadable_absolute_paths() {
        use opcua::crypto::{CertificateStore, X509Data};

        // Relative to the working directory, the way they arrive from the command line
        let dir = tempfile::tempdir_in(".").unwrap();
        let cwd = std::env::current_dir().unwrap();
        let relative = dir.path().strip_prefix(&cwd).unwrap_or(dir.path()).to_path_buf();
        assert!(relative.is_relative());

        let cert = relative.join("client.der");
        let key = relative.join("key.pem");
        CertificateStore::create_certificate_and_key(&X509Data::sample_cert(), true, &cert, &key).unwrap();

        let config = SecurityConfig {
            mode: SecurityMode::Tls,
            server_cert_path: Some(cert.clone()),
            client_cert_path: Some(cert),
            private_key_path: Some(key),
        };
        let material = config.resolve().unwrap().unwrap();

        assert!(material.server_cert.is_absolute());
        assert!(material.own_cert.is_absolute());
        assert!(material.private_key.is_absolute());

        // The stack joins these onto its PKI directory; absolute paths win the join
        let pki = Path::new("pki");
        assert_eq!(pki.join(&material.own_cert), material.own_cert);
        assert!(CertificateStore::read_cert(&pki.join(&material.own_cert)).is_ok());
        assert!(CertificateStore::read_pkey(&pki.join(&material.private_key)).is_ok());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("TLS".parse::<SecurityMode>().unwrap(), SecurityMode::Tls);
        assert_eq!("none".parse::<SecurityMode>().unwrap(), SecurityMode::None);
        assert!("sign".parse::<SecurityMode>().is_err());
        assert_eq!(SecurityMode::Tls.policy_name(), "Basic256Sha256");
    }
}
