//! Mapping from `(target, action)` dispatch keys to handlers.
//!
//! The registry is populated once during startup and then moved into the
//! [`DispatchEngine`](crate::DispatchEngine). It has no interior mutability, so
//! shared references can be read from any number of threads without locking.
//! Keys match exactly: comparison is case-sensitive and there are no
//! wildcards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::RegistryError;
use crate::handler::Handler;

const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// A `(target, action)` pair identifying a handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DispatchKey {
    target: String,
    action: String,
}

impl DispatchKey {
    /// Creates a key.
    #[must_use]
    pub fn new(target: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            action: action.into(),
        }
    }

    /// Namespace half of the key.
    #[must_use]
    pub const fn target(&self) -> &str {
        self.target.as_str()
    }

    /// Verb half of the key.
    #[must_use]
    pub const fn action(&self) -> &str {
        self.action.as_str()
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.target, self.action)
    }
}

/// Handlers indexed by target, then action.
///
/// The two-level map lets lookups borrow the envelope's strings directly.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, HashMap<String, Arc<dyn Handler>>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `(target, action)`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Conflict`] if the key is already taken, or
    /// [`RegistryError::EmptyKey`] if either half of the key is empty. The
    /// registry is unchanged on error.
    pub fn register<H>(
        &mut self,
        target: impl Into<String>,
        action: impl Into<String>,
        handler: H,
    ) -> Result<(), RegistryError>
    where
        H: Handler + 'static,
    {
        self.register_arc(target, action, Arc::new(handler))
    }

    /// Registers an already shared handler under `(target, action)`.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn register_arc(
        &mut self,
        target: impl Into<String>,
        action: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RegistryError> {
        let (target_name, action_name) = (target.into(), action.into());
        if target_name.is_empty() || action_name.is_empty() {
            return Err(RegistryError::EmptyKey {
                target: target_name,
                action: action_name,
            });
        }

        let actions = self.handlers.entry(target_name.clone()).or_default();
        if actions.contains_key(action_name.as_str()) {
            return Err(RegistryError::Conflict {
                target: target_name,
                action: action_name,
            });
        }
        debug!(
            target: REGISTRY_TARGET,
            dispatch_target = %target_name,
            action = %action_name,
            "registered handler"
        );
        actions.insert(action_name, handler);
        Ok(())
    }

    /// Returns the handler registered under `(target, action)`, if any.
    #[must_use]
    pub fn lookup(&self, target: &str, action: &str) -> Option<Arc<dyn Handler>> {
        self.handlers
            .get(target)
            .and_then(|actions| actions.get(action))
            .map(Arc::clone)
    }

    /// Returns `true` if a handler is registered under `(target, action)`.
    #[must_use]
    pub fn contains(&self, target: &str, action: &str) -> bool {
        self.handlers
            .get(target)
            .is_some_and(|actions| actions.contains_key(action))
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.values().map(HashMap::len).sum()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<DispatchKey> {
        let mut keys: Vec<DispatchKey> = self
            .handlers
            .iter()
            .flat_map(|(target, actions)| {
                actions
                    .keys()
                    .map(move |action| DispatchKey::new(target.as_str(), action.as_str()))
            })
            .collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests;
