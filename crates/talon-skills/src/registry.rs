//! Skill registry: an immutable name-to-capability mapping built once per run.
//!
//! Registration is an explicit, statically declared table - no directory
//! scanning, no reflection - so the registry's contents are verifiable at
//! build time. Duplicate names fail fast at registration instead of the
//! later entry silently replacing the earlier one.

use std::collections::HashMap;

use tracing::debug;

use crate::{files, http, osv, secrets, Skill, SkillSpec};

/// Registry construction errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Two capabilities tried to claim the same name.
    #[error("skill '{0}' is already registered")]
    DuplicateSkill(String),
}

/// Immutable mapping from skill name to capability.
pub struct SkillRegistry {
    skills: HashMap<String, Box<dyn Skill>>,
}

impl SkillRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            skills: HashMap::new(),
        }
    }

    /// Build the registry of built-in skills.
    ///
    /// Called fresh at the start of every run so each run holds its own
    /// immutable snapshot.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(Box::new(files::ReadFileSkill))?;
        registry.register(Box::new(files::WriteFileSkill))?;
        registry.register(Box::new(http::HttpFetchSkill))?;
        registry.register(Box::new(osv::OsvDepsScanSkill))?;
        registry.register(Box::new(secrets::SecretsScanSkill))?;
        debug!("skill registry built with {} skills", registry.len());
        Ok(registry)
    }

    /// Register a capability, failing fast on a duplicate name.
    pub fn register(&mut self, skill: Box<dyn Skill>) -> Result<(), RegistryError> {
        let name = skill.spec().name.to_string();
        if self.skills.contains_key(&name) {
            return Err(RegistryError::DuplicateSkill(name));
        }
        self.skills.insert(name, skill);
        Ok(())
    }

    /// Look up a capability by name.
    pub fn get(&self, name: &str) -> Option<&dyn Skill> {
        self.skills.get(name).map(Box::as_ref)
    }

    /// All registered specs, sorted by name for stable listings.
    pub fn specs(&self) -> Vec<SkillSpec> {
        let mut specs: Vec<SkillSpec> = self.skills.values().map(|s| s.spec()).collect();
        specs.sort_by_key(|s| s.name);
        specs
    }

    /// Number of registered skills.
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

impl Default for SkillRegistry {
    fn default() -> Self {
        Self::new()
    }
}
