use async_trait::async_trait;
use tcinit_kernel::{AdminError, Session, Step};

/// Binds the rest of the run to the plan's target database.
pub struct SelectDatabase;

impl SelectDatabase {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Step for SelectDatabase {
    fn name(&self) -> &'static str {
        "select-database"
    }

    async fn run(&self, session: &mut Session<'_>) -> Result<(), AdminError> {
        let database = session.plan.database.clone();
        tracing::info!(database = %database, "selecting database");
        session.use_database(database);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcinit_db::MemoryAdmin;
    use tcinit_kernel::ProvisioningPlan;

    #[tokio::test]
    async fn selects_target_database_without_creating_it() {
        let admin = MemoryAdmin::new();
        let plan = ProvisioningPlan::tcresults();
        let mut out = Vec::<u8>::new();
        let mut session = Session::new(&admin, &plan, &mut out);

        SelectDatabase::new().run(&mut session).await.unwrap();

        assert_eq!(session.database(), Some("tcresults"));
        assert!(admin.database_names().is_empty());
    }
}
