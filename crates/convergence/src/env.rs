//! Environment propagation store
//!
//! The single key/value bus between gatherers, properties, item options and
//! published variables. It is an explicit value owned by the caller; the host
//! process environment is only read once (by [`EnvStore::inherit`]) and never
//! written. Every child process gets the store's full contents as its
//! environment.

use std::collections::BTreeMap;
use std::env::{self, JoinPathsError};
use std::ops::Deref;
use std::path::PathBuf;

/// Sequentially visible variable bindings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvStore {
    vars: BTreeMap<String, String>,
}

impl EnvStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the host process environment
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped. Child
    /// processes get only the store's contents, so they never see those.
    pub fn inherit() -> Self {
        let vars = env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    /// Bind `key` to `value`, replacing any previous binding
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Remove a binding, returning its previous value
    pub fn unset(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    /// Current value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Whether `key` is bound to a non-empty value
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    /// Iterate bindings in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Bind every pair, in iteration order
    pub fn extend<I, K, V>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in bindings {
            self.set(key, value);
        }
    }

    /// Apply bindings until the returned guard is dropped
    ///
    /// On drop every key is restored to exactly what it was before: its old
    /// value, or absent.
    pub fn scoped<I, K, V>(&mut self, bindings: I) -> ScopedBindings<'_>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut saved = Vec::new();
        for (key, value) in bindings {
            let key = key.into();
            let previous = self.vars.insert(key.clone(), value.into());
            saved.push((key, previous));
        }
        ScopedBindings { store: self, saved }
    }

    /// Put directories in front of `PATH`, first one first
    pub fn prepend_path<I>(&mut self, dirs: I) -> Result<(), JoinPathsError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut paths: Vec<PathBuf> = dirs.into_iter().collect();
        if paths.is_empty() {
            return Ok(());
        }
        if let Some(current) = self.get("PATH") {
            paths.extend(env::split_paths(current));
        }
        let joined = env::join_paths(paths)?;
        self.set("PATH", joined.to_string_lossy());
        Ok(())
    }

    /// Expand `$VAR` and `${VAR}` against the store
    ///
    /// Unknown variables are left as written.
    pub fn expand(&self, value: &str) -> String {
        shellexpand::env_with_context_no_errors(value, |name| self.get(name)).into_owned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        store.extend(iter);
        store
    }
}

/// Guard returned by [`EnvStore::scoped`]
pub struct ScopedBindings<'a> {
    store: &'a mut EnvStore,
    saved: Vec<(String, Option<String>)>,
}

impl Deref for ScopedBindings<'_> {
    type Target = EnvStore;

    fn deref(&self) -> &EnvStore {
        self.store
    }
}

impl Drop for ScopedBindings<'_> {
    fn drop(&mut self) {
        // Reverse order so a key bound twice ends at its original value.
        for (key, previous) in self.saved.drain(..).rev() {
            match previous {
                Some(value) => {
                    self.store.vars.insert(key, value);
                }
                None => {
                    self.store.vars.remove(&key);
                }
            }
        }
    }
}
