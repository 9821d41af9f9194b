//! Name-keyed store of action descriptors
//!
//! Filled once during startup, then frozen behind an `Arc` inside the
//! invoker. Listing order is registration order so the driver sees a stable
//! catalogue across restarts.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use super::ActionDescriptor;
use super::schema::json_schema;
use crate::{Error, Result};

/// Registry of named actions
#[derive(Debug, Default)]
pub struct ActionRegistry {
    actions: Vec<ActionDescriptor>,
    index: HashMap<String, usize>,
}

/// Catalogue entry handed to the Dialogue Driver
#[derive(Debug, Clone, Serialize)]
pub struct ActionSummary {
    pub name: String,
    pub description: String,
    pub group: String,
    pub parameters: Value,
}

impl ActionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateAction` if the name is taken, or
    /// `Error::Config` if the action or one of its parameters is badly named
    pub fn register(&mut self, descriptor: ActionDescriptor) -> Result<()> {
        if !is_identifier(&descriptor.name) {
            return Err(Error::Config(format!(
                "invalid action name '{}': use lowercase letters, digits and underscores",
                descriptor.name
            )));
        }
        if self.index.contains_key(&descriptor.name) {
            return Err(Error::DuplicateAction(descriptor.name));
        }

        let mut seen = HashSet::new();
        for spec in &descriptor.params {
            if !is_identifier(&spec.name) {
                return Err(Error::Config(format!(
                    "action '{}' has invalid parameter name '{}'",
                    descriptor.name, spec.name
                )));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(Error::Config(format!(
                    "action '{}' declares parameter '{}' twice",
                    descriptor.name, spec.name
                )));
            }
        }

        tracing::debug!(
            action = %descriptor.name,
            group = %descriptor.group,
            params = descriptor.params.len(),
            "registered action"
        );
        self.index.insert(descriptor.name.clone(), self.actions.len());
        self.actions.push(descriptor);
        Ok(())
    }

    /// Find an action by name
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownAction` if nothing is registered under `name`
    pub fn lookup(&self, name: &str) -> Result<&ActionDescriptor> {
        self.index
            .get(name)
            .map(|&i| &self.actions[i])
            .ok_or_else(|| Error::UnknownAction(name.to_string()))
    }

    /// All descriptors in registration order
    #[must_use]
    pub fn list(&self) -> &[ActionDescriptor] {
        &self.actions
    }

    /// Names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|a| a.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Catalogue for the Dialogue Driver, parameters as JSON Schema
    #[must_use]
    pub fn summaries(&self) -> Vec<ActionSummary> {
        self.actions
            .iter()
            .map(|a| ActionSummary {
                name: a.name.clone(),
                description: a.description.clone(),
                group: a.group.clone(),
                parameters: json_schema(&a.params),
            })
            .collect()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
