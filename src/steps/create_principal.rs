use async_trait::async_trait;
use tcinit_kernel::{AdminError, Session, Step};

/// Creates the application principal in the selected database.
pub struct CreatePrincipal;

impl CreatePrincipal {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Step for CreatePrincipal {
    fn name(&self) -> &'static str {
        "create-principal"
    }

    async fn run(&self, session: &mut Session<'_>) -> Result<(), AdminError> {
        let database = session.require_database("createUser")?.to_string();
        let admin = session.admin;
        let principal = &session.plan.principal;

        tracing::info!(
            database = %database,
            username = %principal.username,
            grants = ?principal.grants,
            "creating principal"
        );

        admin.create_user(&database, principal).await
    }
}
