use async_trait::async_trait;
use tcinit_kernel::{AdminError, Session, Step};

/// Creates the empty results collection in the selected database.
pub struct CreateCollection;

impl CreateCollection {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Step for CreateCollection {
    fn name(&self) -> &'static str {
        "create-collection"
    }

    async fn run(&self, session: &mut Session<'_>) -> Result<(), AdminError> {
        let database = session.require_database("createCollection")?.to_string();
        let admin = session.admin;
        let collection = session.plan.collection.as_str();

        tracing::info!(database = %database, collection, "creating collection");

        admin.create_collection(&database, collection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcinit_db::MemoryAdmin;
    use tcinit_kernel::{AdminClient, ProvisioningPlan};

    #[tokio::test]
    async fn creates_empty_collection() {
        let admin = MemoryAdmin::new();
        let plan = ProvisioningPlan::tcresults();
        let mut out = Vec::<u8>::new();
        let mut session = Session::new(&admin, &plan, &mut out);
        session.use_database("tcresults");

        CreateCollection::new().run(&mut session).await.unwrap();

        assert_eq!(
            admin.collection_names("tcresults").await.unwrap(),
            vec!["trashcan_results"]
        );
        assert_eq!(
            admin
                .count_documents("tcresults", "trashcan_results")
                .await
                .unwrap(),
            0
        );
    }
}
