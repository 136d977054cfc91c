//! Auth token storage.
//!
//! The marketplace keeps three independent sessions: a shopper, a vendor and
//! an admin can all be signed in at once and signing out of one leaves the
//! others untouched. Each lives in its own [`TokenNamespace`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which session a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenNamespace {
    Customer,
    Vendor,
    Admin,
}

impl TokenNamespace {
    /// All namespaces, in display order.
    pub const ALL: [Self; 3] = [Self::Customer, Self::Vendor, Self::Admin];

    /// Path prefix of this namespace's auth endpoints.
    #[must_use]
    pub const fn auth_prefix(self) -> &'static str {
        match self {
            Self::Customer => "auth",
            Self::Vendor => "vendor/auth",
            Self::Admin => "admin/auth",
        }
    }
}

impl fmt::Display for TokenNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Customer => "customer",
            Self::Vendor => "vendor",
            Self::Admin => "admin",
        })
    }
}

impl std::str::FromStr for TokenNamespace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "vendor" => Ok(Self::Vendor),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid session namespace: {s}")),
        }
    }
}

/// Errors persisting tokens.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to access token file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("token file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Storage for bearer tokens, one per namespace.
pub trait TokenStore: Send + Sync {
    /// Current token for `namespace`.
    fn get(&self, namespace: TokenNamespace) -> Option<SecretString>;

    /// Replace the token for `namespace`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the token cannot be persisted.
    fn set(&self, namespace: TokenNamespace, token: SecretString) -> Result<(), SessionError>;

    /// Forget the token for `namespace`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the change cannot be persisted.
    fn clear(&self, namespace: TokenNamespace) -> Result<(), SessionError>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local token store.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<TokenNamespace, SecretString>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, namespace: TokenNamespace) -> Option<SecretString> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&namespace)
            .cloned()
    }

    fn set(&self, namespace: TokenNamespace, token: SecretString) -> Result<(), SessionError> {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(namespace, token);
        Ok(())
    }

    fn clear(&self, namespace: TokenNamespace) -> Result<(), SessionError> {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&namespace);
        Ok(())
    }
}

// =============================================================================
// File-backed store
// =============================================================================

/// On-disk layout, keyed the way the web storefront names its tokens.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenFile {
    #[serde(default, rename = "token", skip_serializing_if = "Option::is_none")]
    customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vendor_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    admin_token: Option<String>,
}

impl TokenFile {
    fn slot(&mut self, namespace: TokenNamespace) -> &mut Option<String> {
        match namespace {
            TokenNamespace::Customer => &mut self.customer,
            TokenNamespace::Vendor => &mut self.vendor_token,
            TokenNamespace::Admin => &mut self.admin_token,
        }
    }
}

/// Token store persisted as a small JSON file, written on every change.
pub struct FileTokenStore {
    path: PathBuf,
    memory: MemoryTokenStore,
}

impl FileTokenStore {
    /// Open (or lazily create) the token file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if an existing file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let memory = MemoryTokenStore::new();

        if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|source| SessionError::Io {
                path: path.clone(),
                source,
            })?;
            let mut file: TokenFile = if raw.trim().is_empty() {
                TokenFile::default()
            } else {
                serde_json::from_str(&raw).map_err(|source| SessionError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            };
            for namespace in TokenNamespace::ALL {
                if let Some(token) = file.slot(namespace).take() {
                    memory.set(namespace, SecretString::from(token))?;
                }
            }
        }

        Ok(Self { path, memory })
    }

    /// Location of the token file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), SessionError> {
        let io_err = |source: std::io::Error| SessionError::Io {
            path: self.path.clone(),
            source,
        };

        let mut file = TokenFile::default();
        for namespace in TokenNamespace::ALL {
            *file.slot(namespace) = self
                .memory
                .get(namespace)
                .map(|t| t.expose_secret().to_string());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_string_pretty(&file).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, body).map_err(io_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(io_err)?;
        }

        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, namespace: TokenNamespace) -> Option<SecretString> {
        self.memory.get(namespace)
    }

    fn set(&self, namespace: TokenNamespace, token: SecretString) -> Result<(), SessionError> {
        self.memory.set(namespace, token)?;
        self.persist()
    }

    fn clear(&self, namespace: TokenNamespace) -> Result<(), SessionError> {
        self.memory.clear(namespace)?;
        self.persist()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("hoe-session-test-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_namespaces_are_independent() {
        let store = MemoryTokenStore::new();
        store
            .set(TokenNamespace::Customer, SecretString::from("c-token"))
            .unwrap();
        store
            .set(TokenNamespace::Admin, SecretString::from("a-token"))
            .unwrap();

        store.clear(TokenNamespace::Customer).unwrap();

        assert!(store.get(TokenNamespace::Customer).is_none());
        assert!(store.get(TokenNamespace::Vendor).is_none());
        assert_eq!(
            store.get(TokenNamespace::Admin).unwrap().expose_secret(),
            "a-token"
        );
    }

    #[test]
    fn test_file_store_round_trips_across_opens() {
        let path = temp_path("tokens.json");
        {
            let store = FileTokenStore::open(&path).unwrap();
            store
                .set(TokenNamespace::Vendor, SecretString::from("v-token"))
                .unwrap();
        }

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"vendorToken\""));
        assert!(!raw.contains("adminToken"));

        let reopened = FileTokenStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(TokenNamespace::Vendor).unwrap().expose_secret(),
            "v-token"
        );

        reopened.clear(TokenNamespace::Vendor).unwrap();
        let again = FileTokenStore::open(&path).unwrap();
        assert!(again.get(TokenNamespace::Vendor).is_none());
    }

    #[test]
    fn test_corrupt_file_reported() {
        let path = temp_path("tokens.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            FileTokenStore::open(&path),
            Err(SessionError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_namespace_parse_and_display() {
        for ns in TokenNamespace::ALL {
            assert_eq!(ns.to_string().parse::<TokenNamespace>().unwrap(), ns);
        }
        assert!("root".parse::<TokenNamespace>().is_err());
    }
}
