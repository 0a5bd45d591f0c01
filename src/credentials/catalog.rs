//! Named credentials built from configuration.

use std::collections::HashMap;
use std::fs;

use thiserror::Error;

use crate::config::{CredentialConfig, CredentialSource};
use crate::credentials::credential::Credential;
use crate::credentials::factory::CredentialFactory;
use crate::credentials::types::CredentialError;

/// Errors that can occur while building a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("credential '{name}': failed to read {path}: {source}")]
    Read {
        name: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("credential '{name}': {source}")]
    Credential {
        name: String,
        #[source]
        source: CredentialError,
    },

    #[error("credential '{name}' references unknown credential '{reference}'")]
    UnknownReference { name: String, reference: String },

    #[error("credential '{0}' is defined more than once")]
    Duplicate(String),
}

/// Credentials by name, in declaration order.
#[derive(Debug, Default)]
pub struct CredentialCatalog {
    order: Vec<String>,
    entries: HashMap<String, Credential>,
}

impl CredentialCatalog {
    /// Build every entry in order. Composites share their children with the
    /// catalog entries they name.
    pub fn build(factory: &CredentialFactory, configs: &[CredentialConfig]) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        for config in configs {
            if catalog.entries.contains_key(&config.name) {
                return Err(CatalogError::Duplicate(config.name.clone()));
            }
            let credential = catalog.create(factory, config)?;
            tracing::debug!(
                name = %config.name,
                kind = %credential.kind(),
                credential_id = %credential.id(),
                "Catalog credential built"
            );
            catalog.order.push(config.name.clone());
            catalog.entries.insert(config.name.clone(), credential);
        }
        Ok(catalog)
    }

    fn create(&self, factory: &CredentialFactory, config: &CredentialConfig) -> Result<Credential, CatalogError> {
        let name = &config.name;
        let wrap = |source: CredentialError| CatalogError::Credential {
            name: name.clone(),
            source,
        };

        match &config.source {
            CredentialSource::Default => factory.create_default().map_err(wrap),
            CredentialSource::Gce => factory.create_compute_engine_identity().map_err(wrap),
            CredentialSource::Fake => factory.create_fake_transport_security().map_err(wrap),
            CredentialSource::Iam { token, selector } => {
                factory.create_call_token(token.as_str(), selector.as_str()).map_err(wrap)
            }
            CredentialSource::Ssl {
                root_certs_path,
                private_key_path,
                cert_chain_path,
            } => {
                let root_certs = read_optional(name, root_certs_path.as_deref())?;
                let private_key = read_optional(name, private_key_path.as_deref())?;
                let cert_chain = read_optional(name, cert_chain_path.as_deref())?;
                factory
                    .create_transport_security(root_certs, private_key, cert_chain)
                    .map_err(wrap)
            }
            CredentialSource::Composite { first, second } => {
                let first = self.lookup(name, first)?;
                let second = self.lookup(name, second)?;
                Ok(factory.create_composite(first, second))
            }
        }
    }

    fn lookup(&self, name: &str, reference: &str) -> Result<&Credential, CatalogError> {
        self.entries
            .get(reference)
            .ok_or_else(|| CatalogError::UnknownReference {
                name: name.to_string(),
                reference: reference.to_string(),
            })
    }

    pub fn get(&self, name: &str) -> Option<&Credential> {
        self.entries.get(name)
    }

    /// Names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Credential)> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name).map(|c| (name.as_str(), c)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn read_optional(name: &str, path: Option<&str>) -> Result<Option<Vec<u8>>, CatalogError> {
    path.map(|path| {
        fs::read(path).map_err(|source| CatalogError::Read {
            name: name.to_string(),
            path: path.to_string(),
            source,
        })
    })
    .transpose()
}
