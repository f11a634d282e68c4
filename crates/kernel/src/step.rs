use std::io::Write;

use async_trait::async_trait;

use crate::admin::{AdminClient, AdminError};
use crate::plan::ProvisioningPlan;

/// State shared by the steps of a single initialization run.
pub struct Session<'a> {
    pub admin: &'a dyn AdminClient,
    pub plan: &'a ProvisioningPlan,
    /// Operator-visible output stream for the start marker.
    pub out: &'a mut (dyn Write + Send),
    database: Option<String>,
}

impl<'a> Session<'a> {
    pub fn new(
        admin: &'a dyn AdminClient,
        plan: &'a ProvisioningPlan,
        out: &'a mut (dyn Write + Send),
    ) -> Self {
        Self {
            admin,
            plan,
            out,
            database: None,
        }
    }

    /// Bind subsequent operations to `name`. The engine creates the namespace
    /// lazily on first write, so nothing is sent here.
    pub fn use_database(&mut self, name: impl Into<String>) {
        self.database = Some(name.into());
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// The selected database, or an error naming the operation that needed it.
    pub fn require_database(&self, operation: &'static str) -> Result<&str, AdminError> {
        self.database()
            .ok_or(AdminError::NoDatabaseSelected { operation })
    }
}

/// One unconditional operation of the initialization routine.
#[async_trait]
pub trait Step: Sync + Send {
    /// Stable identifier used in logs and failure reports.
    fn name(&self) -> &'static str;

    async fn run(&self, session: &mut Session<'_>) -> Result<(), AdminError>;
}
