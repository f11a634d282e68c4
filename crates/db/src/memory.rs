//! In-process engine with the creation semantics of a MongoDB server.
//!
//! Namespaces are created lazily: a database exists once a user or collection
//! has been created in it. Duplicate users and collections are rejected the same
//! way the server rejects them.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bson::Document;
use tcinit_kernel::{AdminClient, AdminError, Grant, Principal, RoleBinding, UserRecord};

const MAX_DATABASE_NAME_LEN: usize = 64;
const INVALID_DATABASE_CHARS: &[char] = &['/', '\\', '.', ' ', '"', '$', '\0'];

#[derive(Debug, Clone)]
struct StoredUser {
    secret: String,
    grants: Vec<Grant>,
}

#[derive(Debug, Default)]
struct DatabaseState {
    users: BTreeMap<String, StoredUser>,
    collections: BTreeMap<String, Vec<Document>>,
}

/// Observable state of one database, without secrets or document bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSnapshot {
    pub users: BTreeMap<String, Vec<Grant>>,
    pub collections: BTreeMap<String, u64>,
}

/// Access a successfully authenticated principal holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    grants: Vec<Grant>,
}

impl Access {
    pub fn can_read(&self, database: &str) -> bool {
        self.grants.iter().any(|grant| grant.database == database)
    }

    pub fn can_write(&self, database: &str) -> bool {
        self.grants
            .iter()
            .any(|grant| grant.database == database && grant.role.allows_write())
    }
}

#[derive(Debug, Default)]
pub struct MemoryAdmin {
    databases: Mutex<BTreeMap<String, DatabaseState>>,
}

impl MemoryAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BTreeMap<String, DatabaseState>> {
        self.databases
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a document the way application code would, creating the
    /// collection implicitly if needed.
    pub fn insert_document(
        &self,
        database: &str,
        collection: &str,
        document: Document,
    ) -> Result<(), AdminError> {
        validate_database_name(database)?;
        validate_collection_name(collection)?;

        self.state()
            .entry(database.to_string())
            .or_default()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }

    /// Check `secret` against the principal stored in `database`.
    pub fn authenticate(&self, database: &str, username: &str, secret: &str) -> Option<Access> {
        let state = self.state();
        let user = state.get(database)?.users.get(username)?;
        (user.secret == secret).then(|| Access {
            grants: user.grants.clone(),
        })
    }

    /// Names of databases that currently hold at least one user or collection.
    pub fn database_names(&self) -> Vec<String> {
        self.state().keys().cloned().collect()
    }

    pub fn snapshot(&self) -> BTreeMap<String, DatabaseSnapshot> {
        self.state()
            .iter()
            .map(|(name, db)| {
                let snapshot = DatabaseSnapshot {
                    users: db
                        .users
                        .iter()
                        .map(|(user, stored)| (user.clone(), stored.grants.clone()))
                        .collect(),
                    collections: db
                        .collections
                        .iter()
                        .map(|(coll, docs)| (coll.clone(), docs.len() as u64))
                        .collect(),
                };
                (name.clone(), snapshot)
            })
            .collect()
    }
}

#[async_trait]
impl AdminClient for MemoryAdmin {
    async fn ping(&self) -> Result<(), AdminError> {
        Ok(())
    }

    async fn create_user(&self, database: &str, principal: &Principal) -> Result<(), AdminError> {
        validate_database_name(database)?;
        for grant in &principal.grants {
            validate_database_name(&grant.database)?;
        }

        let mut state = self.state();
        let db = state.entry(database.to_string()).or_default();

        if db.users.contains_key(&principal.username) {
            return Err(AdminError::PrincipalExists {
                username: principal.username.clone(),
                database: database.to_string(),
            });
        }

        db.users.insert(
            principal.username.clone(),
            StoredUser {
                secret: principal.secret.clone(),
                grants: principal.grants.clone(),
            },
        );
        Ok(())
    }

    async fn create_collection(&self, database: &str, name: &str) -> Result<(), AdminError> {
        validate_database_name(database)?;
        validate_collection_name(name)?;

        let mut state = self.state();
        let db = state.entry(database.to_string()).or_default();

        if db.collections.contains_key(name) {
            return Err(AdminError::CollectionExists {
                name: name.to_string(),
                database: database.to_string(),
            });
        }

        db.collections.insert(name.to_string(), Vec::new());
        Ok(())
    }

    async fn user_info(
        &self,
        database: &str,
        username: &str,
    ) -> Result<Option<UserRecord>, AdminError> {
        let state = self.state();
        let record = state
            .get(database)
            .and_then(|db| db.users.get(username))
            .map(|user| UserRecord {
                username: username.to_string(),
                database: database.to_string(),
                roles: user.grants.iter().map(RoleBinding::from).collect(),
            });
        Ok(record)
    }

    async fn collection_names(&self, database: &str) -> Result<Vec<String>, AdminError> {
        let state = self.state();
        Ok(state
            .get(database)
            .map(|db| db.collections.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn count_documents(&self, database: &str, collection: &str) -> Result<u64, AdminError> {
        let state = self.state();
        Ok(state
            .get(database)
            .and_then(|db| db.collections.get(collection))
            .map(|docs| docs.len() as u64)
            .unwrap_or(0))
    }
}

fn validate_database_name(name: &str) -> Result<(), AdminError> {
    if name.is_empty()
        || name.len() >= MAX_DATABASE_NAME_LEN
        || name.contains(INVALID_DATABASE_CHARS)
    {
        return Err(AdminError::InvalidName {
            kind: "database",
            name: name.to_string(),
        });
    }
    Ok(())
}

fn validate_collection_name(name: &str) -> Result<(), AdminError> {
    if name.is_empty() || name.contains(['$', '\0']) || name.starts_with("system.") {
        return Err(AdminError::InvalidName {
            kind: "collection",
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use tcinit_kernel::{ProvisioningPlan, Role};

    fn principal() -> Principal {
        ProvisioningPlan::tcresults().principal
    }

    #[tokio::test]
    async fn duplicate_user_is_rejected() {
        let admin = MemoryAdmin::new();
        admin.create_user("tcresults", &principal()).await.unwrap();

        let err = admin
            .create_user("tcresults", &principal())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AdminError::PrincipalExists {
                username: "tc_usr".into(),
                database: "tcresults".into(),
            }
        );
    }

    #[tokio::test]
    async fn same_username_in_another_database_is_a_different_user() {
        let admin = MemoryAdmin::new();
        admin.create_user("tcresults", &principal()).await.unwrap();
        admin.create_user("other", &principal()).await.unwrap();
        assert_eq!(admin.database_names(), vec!["other", "tcresults"]);
    }

    #[tokio::test]
    async fn duplicate_collection_is_rejected() {
        let admin = MemoryAdmin::new();
        admin
            .create_collection("tcresults", "trashcan_results")
            .await
            .unwrap();

        let err = admin
            .create_collection("tcresults", "trashcan_results")
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::CollectionExists { .. }));
    }

    #[tokio::test]
    async fn namespace_is_created_lazily() {
        let admin = MemoryAdmin::new();
        assert!(admin.database_names().is_empty());
        assert!(admin.collection_names("tcresults").await.unwrap().is_empty());

        admin
            .create_collection("tcresults", "trashcan_results")
            .await
            .unwrap();
        assert_eq!(admin.database_names(), vec!["tcresults"]);
    }

    #[tokio::test]
    async fn invalid_names_are_rejected_on_write() {
        let admin = MemoryAdmin::new();
        let err = admin
            .create_collection("tc.results", "trashcan_results")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AdminError::InvalidName {
                kind: "database",
                name: "tc.results".into(),
            }
        );

        let err = admin
            .create_collection("tcresults", "system.users")
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidName { kind: "collection", .. }));
    }

    #[tokio::test]
    async fn authentication_checks_secret_and_scope() {
        let admin = MemoryAdmin::new();
        admin.create_user("tcresults", &principal()).await.unwrap();

        assert!(admin.authenticate("tcresults", "tc_usr", "wrong").is_none());
        assert!(admin.authenticate("admin", "tc_usr", "trashcan").is_none());

        let access = admin.authenticate("tcresults", "tc_usr", "trashcan").unwrap();
        assert!(access.can_read("tcresults"));
        assert!(access.can_write("tcresults"));
        assert!(!access.can_read("admin"));
    }

    #[test]
    fn read_only_grant_cannot_write() {
        let access = Access {
            grants: vec![Grant::new(Role::Read, "tcresults")],
        };
        assert!(access.can_read("tcresults"));
        assert!(!access.can_write("tcresults"));
    }

    #[tokio::test]
    async fn inserted_documents_are_counted() {
        let admin = MemoryAdmin::new();
        admin
            .insert_document("tcresults", "trashcan_results", doc! { "gateway_check": true })
            .unwrap();
        assert_eq!(
            admin
                .count_documents("tcresults", "trashcan_results")
                .await
                .unwrap(),
            1
        );
        assert_eq!(admin.snapshot()["tcresults"].collections["trashcan_results"], 1);
    }
}
