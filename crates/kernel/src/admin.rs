use async_trait::async_trait;
use thiserror::Error;

use crate::plan::{Grant, Principal};

/// Errors surfaced by an administrative engine connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error("user '{username}' already exists in database '{database}'")]
    PrincipalExists { username: String, database: String },

    #[error("collection '{name}' already exists in database '{database}'")]
    CollectionExists { name: String, database: String },

    #[error("{operation} requires a selected database")]
    NoDatabaseSelected { operation: &'static str },

    #[error("invalid {kind} name '{name}'")]
    InvalidName { kind: &'static str, name: String },

    #[error("{operation} failed: {message}")]
    Engine {
        operation: &'static str,
        message: String,
    },
}

impl AdminError {
    pub fn engine(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Engine {
            operation,
            message: message.into(),
        }
    }

    /// True for the "resource already exists" family.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            AdminError::PrincipalExists { .. } | AdminError::CollectionExists { .. }
        )
    }
}

/// A role assignment as the engine reports it, with the role name verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoleBinding {
    pub role: String,
    pub database: String,
}

impl From<&Grant> for RoleBinding {
    fn from(grant: &Grant) -> Self {
        Self {
            role: grant.role.as_str().to_string(),
            database: grant.database.clone(),
        }
    }
}

/// A principal as reported back by the engine. The secret is never returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub database: String,
    pub roles: Vec<RoleBinding>,
}

/// Administrative operations the initialization routine and verifier need.
#[async_trait]
pub trait AdminClient: Send + Sync {
    /// Round-trip to the engine to confirm it is reachable.
    async fn ping(&self) -> Result<(), AdminError>;

    /// Create `principal` in the credential store of `database`.
    async fn create_user(&self, database: &str, principal: &Principal) -> Result<(), AdminError>;

    /// Create an empty collection with default options.
    async fn create_collection(&self, database: &str, name: &str) -> Result<(), AdminError>;

    async fn user_info(
        &self,
        database: &str,
        username: &str,
    ) -> Result<Option<UserRecord>, AdminError>;

    async fn collection_names(&self, database: &str) -> Result<Vec<String>, AdminError>;

    async fn count_documents(&self, database: &str, collection: &str) -> Result<u64, AdminError>;
}
