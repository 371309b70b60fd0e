use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ConfigError;

/// Role
///
/// The closed set of portal roles. Anything that does not parse into one of
/// these variants is treated as "no access" by every consumer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Admin,
    CspAgent,
    FieldAuditor,
    Auditor,
    ClusterManager,
    OpsTraining,
    Compliance,
    ItInfra,
    Hr,
    CustomerSupport,
    BankOfficer,
    FiAgent,
    Customer,
}

impl Role {
    pub const ALL: [Role; 13] = [
        Role::Admin,
        Role::CspAgent,
        Role::FieldAuditor,
        Role::Auditor,
        Role::ClusterManager,
        Role::OpsTraining,
        Role::Compliance,
        Role::ItInfra,
        Role::Hr,
        Role::CustomerSupport,
        Role::BankOfficer,
        Role::FiAgent,
        Role::Customer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::CspAgent => "csp_agent",
            Role::FieldAuditor => "field_auditor",
            Role::Auditor => "auditor",
            Role::ClusterManager => "cluster_manager",
            Role::OpsTraining => "ops_training",
            Role::Compliance => "compliance",
            Role::ItInfra => "it_infra",
            Role::Hr => "hr",
            Role::CustomerSupport => "customer_support",
            Role::BankOfficer => "bank_officer",
            Role::FiAgent => "fi_agent",
            Role::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ConfigError;

    /// Exact match on the snake_case name. `"Admin"` or `"csp-agent"` is not a role.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == raw)
            .ok_or_else(|| ConfigError::UnknownRoleName(raw.to_string()))
    }
}

/// ResolvedRole
///
/// Output of role resolution: either a canonical role, or `Unknown` for any
/// input outside the closed set. `Unknown` is never a wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "status", content = "role", rename_all = "snake_case")]
#[ts(export)]
pub enum ResolvedRole {
    Known(Role),
    Unknown,
}

impl ResolvedRole {
    pub fn role(self) -> Option<Role> {
        match self {
            ResolvedRole::Known(role) => Some(role),
            ResolvedRole::Unknown => None,
        }
    }
}

/// RoleRegistry
///
/// Owns the alias relation (synonym role -> canonical role) and is the only
/// place where role strings are turned into canonical roles. Both the Route
/// Table Builder and the Route Guard resolve through this type, so the
/// `auditor` / `field_auditor` equivalence is defined exactly once.
///
/// Alias chains (`a -> b -> c`) are collapsed at construction; cycles are
/// rejected with `ConfigError::AliasCycle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRegistry {
    // Alias -> fully collapsed canonical role.
    canonical: BTreeMap<Role, Role>,
}

impl Default for RoleRegistry {
    /// The portal's built-in alias map: `auditor` shares the `field_auditor` route table.
    fn default() -> Self {
        Self {
            canonical: BTreeMap::from([(Role::Auditor, Role::FieldAuditor)]),
        }
    }
}

impl RoleRegistry {
    /// new
    ///
    /// Builds a registry from raw `(alias, target)` pairs, collapsing chains
    /// and failing on the first cycle found. A later pair for the same alias
    /// replaces an earlier one.
    pub fn new(aliases: impl IntoIterator<Item = (Role, Role)>) -> Result<Self, ConfigError> {
        let direct: BTreeMap<Role, Role> = aliases.into_iter().collect();
        let mut canonical = BTreeMap::new();

        for &alias in direct.keys() {
            let mut seen = BTreeSet::from([alias]);
            let mut current = alias;
            while let Some(&next) = direct.get(&current) {
                if !seen.insert(next) {
                    return Err(ConfigError::AliasCycle { role: alias });
                }
                current = next;
            }
            canonical.insert(alias, current);
        }

        Ok(Self { canonical })
    }

    /// The built-in aliases plus any extra pairs, validated together.
    pub fn with_extra_aliases(
        extra: impl IntoIterator<Item = (Role, Role)>,
    ) -> Result<Self, ConfigError> {
        let builtin = Self::default().canonical.into_iter();
        Self::new(builtin.chain(extra))
    }

    /// resolve_role
    ///
    /// Maps a raw session role string to its canonical role, or `Unknown`.
    /// Side-effect free and idempotent on canonical roles.
    pub fn resolve_role(&self, input: &str) -> ResolvedRole {
        match input.parse::<Role>() {
            Ok(role) => ResolvedRole::Known(self.canonical(role)),
            Err(_) => ResolvedRole::Unknown,
        }
    }

    pub fn canonical(&self, role: Role) -> Role {
        self.canonical.get(&role).copied().unwrap_or(role)
    }

    pub fn is_canonical(&self, role: Role) -> bool {
        !self.canonical.contains_key(&role)
    }

    /// Every role that is not itself an alias, in declaration order.
    pub fn canonical_roles(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.is_canonical(*role))
            .collect()
    }

    /// Aliases that resolve to `canonical`.
    pub fn aliases_of(&self, canonical: Role) -> Vec<Role> {
        self.canonical
            .iter()
            .filter(|(_, target)| **target == canonical)
            .map(|(alias, _)| *alias)
            .collect()
    }

    /// Resolves and deduplicates a list of roles, as used for required-role-sets.
    pub fn canonical_set(&self, roles: &[Role]) -> BTreeSet<Role> {
        roles.iter().map(|role| self.canonical(*role)).collect()
    }
}

/// parse_aliases
///
/// Parses `alias=canonical` pairs separated by commas, e.g.
/// `"auditor=field_auditor, fi_agent=csp_agent"`. Blank entries are ignored.
pub fn parse_aliases(raw: &str) -> Result<Vec<(Role, Role)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (alias, target) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidAlias(entry.to_string()))?;
            Ok((alias.trim().parse::<Role>()?, target.trim().parse::<Role>()?))
        })
        .collect()
}
