//! Policy rule model and first-match evaluation.
//!
//! # Purpose
//! Defines the persisted rule shape and the immutable snapshot the engine
//! evaluates requests against.
//!
//! # Key invariants
//! - Rule order is part of the policy: the first matching rule decides.
//! - No matching rule means deny.
//! - A snapshot never changes after construction; reloads build a new one.
use crate::matcher::{action_matches, resource_matches, validate_action_pattern, validate_resource_pattern};
use crate::{PolicyError, PolicyResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::Allow => "allow",
            Effect::Deny => "deny",
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Effect {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "allow" => Ok(Effect::Allow),
            "deny" => Ok(Effect::Deny),
            _ => Err(()),
        }
    }
}

/// Roles minted by the auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Provider,
    Customer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Provider => "provider",
            Role::Customer => "customer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Role::Admin),
            "provider" => Ok(Role::Provider),
            "customer" => Ok(Role::Customer),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub role: String,
    pub resource_pattern: String,
    pub action_pattern: String,
    pub effect: Effect,
}

impl PolicyRule {
    pub fn new(
        role: impl Into<String>,
        resource_pattern: impl Into<String>,
        action_pattern: impl Into<String>,
        effect: Effect,
    ) -> Self {
        Self {
            role: role.into(),
            resource_pattern: resource_pattern.into(),
            action_pattern: action_pattern.into(),
            effect,
        }
    }

    pub fn allow(
        role: impl Into<String>,
        resource_pattern: impl Into<String>,
        action_pattern: impl Into<String>,
    ) -> Self {
        Self::new(role, resource_pattern, action_pattern, Effect::Allow)
    }

    pub fn deny(
        role: impl Into<String>,
        resource_pattern: impl Into<String>,
        action_pattern: impl Into<String>,
    ) -> Self {
        Self::new(role, resource_pattern, action_pattern, Effect::Deny)
    }

    pub fn matches(&self, role: &str, resource_path: &str, action: &str) -> bool {
        self.role == role
            && resource_matches(&self.resource_pattern, resource_path)
            && action_matches(&self.action_pattern, action)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.role.trim().is_empty() {
            return Err("role is empty".to_string());
        }
        validate_resource_pattern(&self.resource_pattern)?;
        validate_action_pattern(&self.action_pattern)
    }
}

/// Validate a whole rule sequence, reporting the first bad position.
pub fn validate_rules(rules: &[PolicyRule]) -> PolicyResult<()> {
    for (index, rule) in rules.iter().enumerate() {
        rule.validate()
            .map_err(|reason| PolicyError::InvalidRule { index, reason })?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub matched_rule: Option<PolicyRule>,
}

impl Decision {
    fn default_deny() -> Self {
        Self {
            allowed: false,
            matched_rule: None,
        }
    }
}

/// Immutable, ordered rule set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySnapshot {
    rules: Vec<PolicyRule>,
}

impl PolicySnapshot {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn evaluate(&self, role: &str, resource_path: &str, action: &str) -> Decision {
        self.rules
            .iter()
            .find(|rule| rule.matches(role, resource_path, action))
            .map(|rule| Decision {
                allowed: rule.effect == Effect::Allow,
                matched_rule: Some(rule.clone()),
            })
            .unwrap_or_else(Decision::default_deny)
    }

    pub fn decide(&self, role: &str, resource_path: &str, action: &str) -> bool {
        self.evaluate(role, resource_path, action).allowed
    }
}

/// Stock rule set seeded at deployment time.
pub fn default_rules() -> Vec<PolicyRule> {
    vec![
        PolicyRule::allow(Role::Admin.as_str(), "/car-wash/*", "*"),
        PolicyRule::allow(Role::Provider.as_str(), "/car-wash/*", "*"),
        PolicyRule::allow(Role::Customer.as_str(), "/car-wash/users/profile", "*"),
        PolicyRule::allow(Role::Customer.as_str(), "/car-wash/*", "GET"),
    ]
}
