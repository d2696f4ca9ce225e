//! Provider registry
//!
//! The registry is an ordinary value built at startup and handed to the
//! components that need it. Providers advertise optional capabilities through
//! accessor methods returning `Option`, so "this provider has no argument
//! schema" is a normal branch rather than a failed downcast.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{AccessError, Result};
use crate::model::{TargetField, TargetKind};

/// One argument a provider accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub required: bool,
    /// When set, the value must be one of these
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<BTreeSet<String>>,
}

/// The arguments a provider accepts, keyed by argument id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentSchema {
    pub arguments: BTreeMap<String, Argument>,
}

impl ArgumentSchema {
    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.arguments.insert(argument.id.clone(), argument);
        self
    }

    /// Check requester-selected field values against the schema
    ///
    /// # Errors
    ///
    /// Returns `InvalidFields` for unknown fields, missing required fields, or
    /// values outside an argument's allowed set.
    pub fn check(&self, kind: &TargetKind, fields: &[TargetField]) -> Result<()> {
        let invalid = |reason: String| AccessError::InvalidFields {
            target_kind: kind.to_string(),
            reason,
        };

        for field in fields {
            let arg = self
                .arguments
                .get(&field.id)
                .ok_or_else(|| invalid(format!("unknown field '{}'", field.id)))?;
            if let Some(allowed) = &arg.allowed_values {
                if !allowed.contains(&field.value) {
                    return Err(invalid(format!(
                        "'{}' is not an allowed value for '{}'",
                        field.value, field.id
                    )));
                }
            }
        }

        for arg in self.arguments.values().filter(|a| a.required) {
            if !fields.iter().any(|f| f.id == arg.id) {
                return Err(invalid(format!("missing required field '{}'", arg.id)));
            }
        }
        Ok(())
    }
}

/// Capability: the provider can describe the arguments it accepts
pub trait ArgumentSchemaProvider: Send + Sync {
    fn argument_schema(&self) -> ArgumentSchema;
}

/// A provider integration registered with the engine
pub trait Provider: Send + Sync {
    fn kind(&self) -> &TargetKind;

    /// The provider's argument-schema capability, if it has one
    fn argument_schema_provider(&self) -> Option<&dyn ArgumentSchemaProvider> {
        None
    }
}

/// Providers available to this process, keyed by target kind
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<TargetKind, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any earlier one for the same kind
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.kind().clone(), provider);
    }

    /// # Errors
    ///
    /// Returns `ProviderNotFound` when nothing is registered for `kind`.
    pub fn lookup(&self, kind: &TargetKind) -> Result<&Arc<dyn Provider>> {
        self.providers
            .get(kind)
            .ok_or_else(|| AccessError::ProviderNotFound {
                target_kind: kind.to_string(),
            })
    }

    /// Validate field values for a target of `kind`.
    ///
    /// Providers without an argument schema accept any fields.
    ///
    /// # Errors
    ///
    /// Returns `ProviderNotFound` or `InvalidFields`.
    pub fn validate_fields(&self, kind: &TargetKind, fields: &[TargetField]) -> Result<()> {
        let provider = self.lookup(kind)?;
        match provider.argument_schema_provider() {
            Some(schema_provider) => schema_provider.argument_schema().check(kind, fields),
            None => {
                tracing::debug!(target_kind = %kind, "provider has no argument schema");
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("kinds", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}
