//! Value providers and their shared cache
//!
//! A placeholder of the form `${provider::expression}` is handed to the
//! provider registered under `provider`. Providers interpret `expression`
//! however they like. Returning `Ok(None)` means "no value" and lets a
//! placeholder default apply.
//!
//! Providers that memoize lookups must do so through the [`ProviderCache`]
//! passed in the [`ProviderContext`], because the same provider instance is
//! invoked for many nodes and roles within one generation run.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::value::{ConfigMap, ConfigValue};

/// Per-run cache of provider state, keyed by provider name.
///
/// Cloning the cache shares the underlying storage.
#[derive(Debug, Clone, Default)]
pub struct ProviderCache {
    entries: Arc<Mutex<HashMap<String, ConfigMap>>>,
}

impl ProviderCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached value for `provider`, or compute and cache it.
    pub fn get_or_insert_with<F>(&self, provider: &str, key: &str, compute: F) -> Result<Option<ConfigValue>>
    where
        F: FnOnce() -> Result<Option<ConfigValue>>,
    {
        if let Some(cached) = self.get(provider, key)? {
            return Ok(Some(cached));
        }

        let value = compute()?;

        if let Some(value) = &value {
            self.insert(provider, key, value.clone())?;
        }

        Ok(value)
    }

    /// Get a cached value without computing.
    pub fn get(&self, provider: &str, key: &str) -> Result<Option<ConfigValue>> {
        let entries = self.entries.lock().map_err(|_| Error::LockPoisoned {
            context: "provider cache".to_string(),
        })?;
        Ok(entries.get(provider).and_then(|state| state.get(key)).cloned())
    }

    /// Store a value for `provider` under `key`.
    pub fn insert(&self, provider: &str, key: &str, value: ConfigValue) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| Error::LockPoisoned {
            context: "provider cache".to_string(),
        })?;
        entries
            .entry(provider.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    /// Number of entries cached for `provider`.
    pub fn len(&self, provider: &str) -> Result<usize> {
        let entries = self.entries.lock().map_err(|_| Error::LockPoisoned {
            context: "provider cache".to_string(),
        })?;
        Ok(entries.get(provider).map_or(0, ConfigMap::len))
    }
}

/// What a provider is given besides the expression.
#[derive(Debug, Clone, Copy)]
pub struct ProviderContext<'a> {
    /// The variable map the placeholder is being resolved against
    pub variables: &'a ConfigMap,
    /// Run-scoped cache
    pub cache: &'a ProviderCache,
}

/// A named capability that resolves expressions to values.
pub trait ValueProvider: Send + Sync {
    /// Name used in `${name::expression}` placeholders
    fn name(&self) -> &str;

    /// Resolve `expression`. `Ok(None)` signals that nothing matched.
    fn resolve(&self, expression: &str, ctx: &ProviderContext<'_>) -> Result<Option<ConfigValue>>;
}

/// Registered value providers plus the run-scoped cache they share.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ValueProvider>>,
    cache: ProviderCache,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.providers.keys().collect();
        names.sort();
        f.debug_struct("ProviderRegistry")
            .field("providers", &names)
            .finish()
    }
}

impl ProviderRegistry {
    /// An empty registry with a fresh cache
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `env` and `file` providers.
    pub fn with_builtins(base_dir: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new();
        registry.register(EnvProvider);
        registry.register(FileProvider::new(base_dir));
        registry
    }

    /// Register a provider, replacing any provider with the same name.
    pub fn register<P: ValueProvider + 'static>(&mut self, provider: P) {
        self.providers
            .insert(provider.name().to_string(), Arc::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ValueProvider>> {
        self.providers.get(name)
    }

    pub fn cache(&self) -> &ProviderCache {
        &self.cache
    }

    /// Resolve `expression` with the provider called `name`.
    pub fn resolve(&self, name: &str, expression: &str, variables: &ConfigMap) -> Result<Option<ConfigValue>> {
        let provider = self.get(name).ok_or_else(|| Error::UnknownProvider {
            provider: name.to_string(),
        })?;
        let ctx = ProviderContext {
            variables,
            cache: &self.cache,
        };
        provider.resolve(expression, &ctx)
    }
}

/// `${env::NAME}` reads a process environment variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProvider;

impl ValueProvider for EnvProvider {
    fn name(&self) -> &str {
        "env"
    }

    fn resolve(&self, expression: &str, _ctx: &ProviderContext<'_>) -> Result<Option<ConfigValue>> {
        Ok(std::env::var(expression.trim()).ok().map(ConfigValue::String))
    }
}

/// `${file::relative/path}` reads a UTF-8 text file below a base directory.
///
/// File contents are memoized in the provider cache; a missing file yields
/// no value so a default can apply.
#[derive(Debug, Clone)]
pub struct FileProvider {
    base_dir: PathBuf,
}

impl FileProvider {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl ValueProvider for FileProvider {
    fn name(&self) -> &str {
        "file"
    }

    fn resolve(&self, expression: &str, ctx: &ProviderContext<'_>) -> Result<Option<ConfigValue>> {
        let relative = expression.trim();
        ctx.cache.get_or_insert_with(self.name(), relative, || {
            let path = self.base_dir.join(relative);
            if !path.is_file() {
                return Ok(None);
            }
            let content = std::fs::read_to_string(&path).map_err(|err| Error::Provider {
                provider: "file".to_string(),
                message: format!("cannot read {}: {}", path.display(), err),
            })?;
            Ok(Some(ConfigValue::String(content.trim_end_matches('\n').to_string())))
        })
    }
}

/// A fixed lookup table, addressed by dotted path.
#[derive(Debug, Clone)]
pub struct MapProvider {
    name: String,
    values: ConfigMap,
}

impl MapProvider {
    pub fn new(name: impl Into<String>, values: ConfigMap) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

impl ValueProvider for MapProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, expression: &str, _ctx: &ProviderContext<'_>) -> Result<Option<ConfigValue>> {
        Ok(crate::path::lookup(&self.values, expression.trim()).cloned())
    }
}
