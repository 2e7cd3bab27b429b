//! Single-variable lookup
//!
//! [`VariableResolver`] answers "what is the value of this name?" for one
//! placeholder. Without a provider the name is a dotted path into the local
//! variable map; with a provider the raw expression is delegated.

pub mod provider;

use log::trace;

use crate::error::Result;
use crate::path;
use crate::value::{ConfigMap, ConfigValue};

pub use provider::{
    EnvProvider, FileProvider, MapProvider, ProviderCache, ProviderContext, ProviderRegistry,
    ValueProvider,
};

/// Looks up variables locally or through registered providers.
#[derive(Debug, Clone, Copy)]
pub struct VariableResolver<'a> {
    providers: &'a ProviderRegistry,
}

impl<'a> VariableResolver<'a> {
    pub fn new(providers: &'a ProviderRegistry) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &'a ProviderRegistry {
        self.providers
    }

    /// Resolve `path` either in `variables` or with the named provider.
    ///
    /// A missing local path yields `Ok(None)`; only provider failures and
    /// unknown provider names are errors.
    pub fn resolve(
        &self,
        provider: Option<&str>,
        path: &str,
        variables: &ConfigMap,
    ) -> Result<Option<ConfigValue>> {
        match provider.filter(|name| !name.is_empty()) {
            None => Ok(path::lookup(variables, path).cloned()),
            Some(name) => {
                trace!("Delegating '{}' to value provider '{}'", path, name);
                self.providers.resolve(name, path, variables)
            }
        }
    }
}
