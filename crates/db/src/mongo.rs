//! Administrative client backed by the MongoDB driver.

use std::time::Duration;

use async_trait::async_trait;
use bson::{doc, Document};
use mongodb::{error::ErrorKind, options::ClientOptions, Client};
use serde::Deserialize;
use tcinit_kernel::settings::DatabaseSettings;
use tcinit_kernel::{AdminClient, AdminError, Principal, RoleBinding, UserRecord};
use tracing::{debug, info};

/// Server error code for `createUser` on an existing user.
const USER_ALREADY_EXISTS: i32 = 51003;
/// Server error code for `create` on an existing collection.
const NAMESPACE_EXISTS: i32 = 48;
const INVALID_NAMESPACE: i32 = 73;

#[derive(Clone)]
pub struct MongoAdmin {
    client: Client,
}

impl MongoAdmin {
    /// Build a client from settings and confirm the server answers.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, AdminError> {
        info!(app_name = %settings.app_name, "connecting to MongoDB");

        let mut options = ClientOptions::parse(settings.uri.as_str())
            .await
            .map_err(|e| AdminError::engine("connect", e.to_string()))?;
        options.app_name = Some(settings.app_name.clone());
        options.server_selection_timeout =
            Some(Duration::from_millis(settings.server_selection_timeout_ms));
        options.connect_timeout = Some(Duration::from_millis(settings.connect_timeout_ms));

        let client =
            Client::with_options(options).map_err(|e| AdminError::engine("connect", e.to_string()))?;

        let admin = Self { client };
        admin.ping().await?;

        info!("connected to MongoDB");
        Ok(admin)
    }
}

#[async_trait]
impl AdminClient for MongoAdmin {
    async fn ping(&self) -> Result<(), AdminError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AdminError::engine("ping", e.to_string()))?;
        Ok(())
    }

    async fn create_user(&self, database: &str, principal: &Principal) -> Result<(), AdminError> {
        let roles: Vec<Document> = principal
            .grants
            .iter()
            .map(|grant| doc! { "role": grant.role.as_str(), "db": grant.database.as_str() })
            .collect();

        debug!(database, username = %principal.username, "sending createUser");

        self.client
            .database(database)
            .run_command(doc! {
                "createUser": principal.username.as_str(),
                "pwd": principal.secret.as_str(),
                "roles": roles,
            })
            .await
            .map_err(|e| {
                classify(
                    server_code(&e),
                    "createUser",
                    database,
                    &principal.username,
                    e.to_string(),
                )
            })?;
        Ok(())
    }

    async fn create_collection(&self, database: &str, name: &str) -> Result<(), AdminError> {
        debug!(database, collection = name, "sending create");

        self.client
            .database(database)
            .create_collection(name)
            .await
            .map_err(|e| classify(server_code(&e), "createCollection", database, name, e.to_string()))
    }

    async fn user_info(
        &self,
        database: &str,
        username: &str,
    ) -> Result<Option<UserRecord>, AdminError> {
        let reply = self
            .client
            .database(database)
            .run_command(doc! { "usersInfo": { "user": username, "db": database } })
            .await
            .map_err(|e| AdminError::engine("usersInfo", e.to_string()))?;

        let reply: UsersInfoReply = bson::from_document(reply)
            .map_err(|e| AdminError::engine("usersInfo", e.to_string()))?;

        Ok(reply.users.into_iter().next().map(UserRecord::from))
    }

    async fn collection_names(&self, database: &str) -> Result<Vec<String>, AdminError> {
        self.client
            .database(database)
            .list_collection_names()
            .await
            .map_err(|e| AdminError::engine("listCollections", e.to_string()))
    }

    async fn count_documents(&self, database: &str, collection: &str) -> Result<u64, AdminError> {
        self.client
            .database(database)
            .collection::<Document>(collection)
            .count_documents(doc! {})
            .await
            .map_err(|e| AdminError::engine("count", e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct UsersInfoReply {
    #[serde(default)]
    users: Vec<UserEntry>,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    user: String,
    db: String,
    #[serde(default)]
    roles: Vec<RoleEntry>,
}

#[derive(Debug, Deserialize)]
struct RoleEntry {
    role: String,
    db: String,
}

impl From<UserEntry> for UserRecord {
    fn from(entry: UserEntry) -> Self {
        Self {
            username: entry.user,
            database: entry.db,
            roles: entry
                .roles
                .into_iter()
                .map(|r| RoleBinding {
                    role: r.role,
                    database: r.db,
                })
                .collect(),
        }
    }
}

fn server_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        _ => None,
    }
}

/// Map a server error code to the routine's error taxonomy.
fn classify(
    code: Option<i32>,
    operation: &'static str,
    database: &str,
    name: &str,
    message: String,
) -> AdminError {
    match (code, operation) {
        (Some(USER_ALREADY_EXISTS), _) => AdminError::PrincipalExists {
            username: name.to_string(),
            database: database.to_string(),
        },
        (Some(NAMESPACE_EXISTS), "createCollection") => AdminError::CollectionExists {
            name: name.to_string(),
            database: database.to_string(),
        },
        (Some(INVALID_NAMESPACE), "createUser") => AdminError::InvalidName {
            kind: "database",
            name: database.to_string(),
        },
        (Some(INVALID_NAMESPACE), _) => AdminError::InvalidName {
            kind: "namespace",
            name: format!("{}.{}", database, name),
        },
        _ => AdminError::Engine { operation, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_user_code_maps_to_principal_exists() {
        let err = classify(
            Some(51003),
            "createUser",
            "tcresults",
            "tc_usr",
            "User \"tc_usr@tcresults\" already exists".into(),
        );
        assert_eq!(
            err,
            AdminError::PrincipalExists {
                username: "tc_usr".into(),
                database: "tcresults".into(),
            }
        );
    }

    #[test]
    fn namespace_exists_maps_to_collection_exists() {
        let err = classify(
            Some(48),
            "createCollection",
            "tcresults",
            "trashcan_results",
            "Collection tcresults.trashcan_results already exists.".into(),
        );
        assert!(matches!(err, AdminError::CollectionExists { .. }));
    }

    #[test]
    fn invalid_namespace_on_create_user_names_the_database() {
        let err = classify(
            Some(73),
            "createUser",
            "bad.db",
            "tc_usr",
            "Invalid database name".into(),
        );
        assert_eq!(
            err,
            AdminError::InvalidName {
                kind: "database",
                name: "bad.db".into(),
            }
        );
    }

    #[test]
    fn invalid_namespace_on_create_collection_names_the_namespace() {
        let err = classify(
            Some(73),
            "createCollection",
            "tcresults",
            "bad$name",
            "Invalid collection name".into(),
        );
        assert_eq!(
            err,
            AdminError::InvalidName {
                kind: "namespace",
                name: "tcresults.bad$name".into(),
            }
        );
    }

    #[test]
    fn unknown_codes_stay_engine_errors() {
        let err = classify(Some(13), "createUser", "tcresults", "tc_usr", "unauthorized".into());
        assert_eq!(err, AdminError::engine("createUser", "unauthorized"));

        let err = classify(None, "createCollection", "tcresults", "x", "timed out".into());
        assert_eq!(err, AdminError::engine("createCollection", "timed out"));
    }

    #[test]
    fn users_info_reply_parses_roles() {
        let reply = doc! {
            "users": [{
                "_id": "tcresults.tc_usr",
                "user": "tc_usr",
                "db": "tcresults",
                "roles": [{ "role": "readWrite", "db": "tcresults" }],
                "mechanisms": ["SCRAM-SHA-1", "SCRAM-SHA-256"],
            }],
            "ok": 1.0,
        };

        let parsed: UsersInfoReply = bson::from_document(reply).unwrap();
        let record = parsed.users.into_iter().next().map(UserRecord::from).unwrap();

        assert_eq!(record.username, "tc_usr");
        assert_eq!(
            record.roles,
            vec![RoleBinding {
                role: "readWrite".into(),
                database: "tcresults".into(),
            }]
        );
    }

    #[test]
    fn empty_users_info_reply_has_no_user() {
        let parsed: UsersInfoReply = bson::from_document(doc! { "users": [], "ok": 1.0 }).unwrap();
        assert!(parsed.users.is_empty());
    }
}
