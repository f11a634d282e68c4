//! The fixed provisioning plan applied to a fresh engine.

use std::fmt;

use serde::Serialize;

pub const TARGET_DATABASE: &str = "tcresults";
pub const PRINCIPAL_USERNAME: &str = "tc_usr";
pub const PRINCIPAL_SECRET: &str = "trashcan";
pub const COLLECTION_NAME: &str = "trashcan_results";

/// Marker line printed before any engine call is made.
pub const START_MARKER: &str =
    "Start #################################################################";

const REDACTED: &str = "********";

/// Built-in role granted to the application principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    #[serde(rename = "read")]
    Read,
    #[serde(rename = "readWrite")]
    ReadWrite,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Read => "read",
            Role::ReadWrite => "readWrite",
        }
    }

    pub fn allows_write(&self) -> bool {
        matches!(self, Role::ReadWrite)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (role, database) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Grant {
    pub role: Role,
    #[serde(rename = "db")]
    pub database: String,
}

impl Grant {
    pub fn new(role: Role, database: impl Into<String>) -> Self {
        Self {
            role,
            database: database.into(),
        }
    }
}

/// Authenticatable identity created by the routine.
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub secret: String,
    pub grants: Vec<Grant>,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("username", &self.username)
            .field("secret", &REDACTED)
            .field("grants", &self.grants)
            .finish()
    }
}

/// Everything the routine creates, in one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningPlan {
    pub database: String,
    pub principal: Principal,
    pub collection: String,
}

impl ProvisioningPlan {
    /// The plan for the results store. Not configurable.
    pub fn tcresults() -> Self {
        Self {
            database: TARGET_DATABASE.to_string(),
            principal: Principal {
                username: PRINCIPAL_USERNAME.to_string(),
                secret: PRINCIPAL_SECRET.to_string(),
                grants: vec![Grant::new(Role::ReadWrite, TARGET_DATABASE)],
            },
            collection: COLLECTION_NAME.to_string(),
        }
    }

    /// Grants the principal is expected to hold after initialization.
    pub fn expected_grants(&self) -> &[Grant] {
        &self.principal.grants
    }

    /// Serializable view with the secret masked.
    pub fn redacted(&self) -> RedactedPlan {
        RedactedPlan {
            database: self.database.clone(),
            username: self.principal.username.clone(),
            secret: REDACTED.to_string(),
            grants: self.principal.grants.clone(),
            collection: self.collection.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RedactedPlan {
    pub database: String,
    pub username: String,
    pub secret: String,
    pub grants: Vec<Grant>,
    pub collection: String,
}

impl fmt::Display for RedactedPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "database:   {}", self.database)?;
        writeln!(f, "username:   {}", self.username)?;
        writeln!(f, "secret:     {}", self.secret)?;
        for grant in &self.grants {
            writeln!(f, "grant:      {} on {}", grant.role, grant.database)?;
        }
        write!(f, "collection: {}", self.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_uses_fixed_literals() {
        let plan = ProvisioningPlan::tcresults();
        assert_eq!(plan.database, "tcresults");
        assert_eq!(plan.principal.username, "tc_usr");
        assert_eq!(plan.principal.secret, "trashcan");
        assert_eq!(plan.collection, "trashcan_results");
    }

    #[test]
    fn principal_has_exactly_one_grant_on_target_database() {
        let plan = ProvisioningPlan::tcresults();
        assert_eq!(
            plan.expected_grants(),
            &[Grant::new(Role::ReadWrite, "tcresults")]
        );
    }

    #[test]
    fn plan_is_deterministic() {
        assert_eq!(ProvisioningPlan::tcresults(), ProvisioningPlan::tcresults());
    }

    #[test]
    fn debug_output_hides_secret() {
        let plan = ProvisioningPlan::tcresults();
        let rendered = format!("{:?}", plan);
        assert!(!rendered.contains("secret: \"trashcan\""));
        assert!(rendered.contains("secret: \"********\""));
    }

    #[test]
    fn redacted_plan_serializes_grant_like_the_engine() {
        let json = serde_json::to_value(ProvisioningPlan::tcresults().redacted()).unwrap();
        assert_eq!(json["secret"], "********");
        assert_eq!(
            json["grants"],
            serde_json::json!([{ "role": "readWrite", "db": "tcresults" }])
        );
    }

    #[test]
    fn only_read_write_allows_writes() {
        assert_eq!(Role::ReadWrite.as_str(), "readWrite");
        assert!(Role::ReadWrite.allows_write());
        assert!(!Role::Read.allows_write());
    }
}
