use std::io::Write;

use tcinit_kernel::{AdminClient, ProvisioningPlan, RunReport, Session, StepFailure, StepRunner};

use crate::steps;

/// Build the runner with every initialization step registered.
pub fn runner() -> StepRunner {
    let mut runner = StepRunner::new();
    steps::register_all(&mut runner);
    runner
}

/// Run the initialization routine once against `admin`.
///
/// The start marker goes to `out`. Any failure aborts the remaining steps and
/// is returned as-is; there is no retry and no rollback of earlier steps.
pub async fn initialize(
    admin: &dyn AdminClient,
    out: &mut (dyn Write + Send),
) -> Result<RunReport, StepFailure> {
    let plan = ProvisioningPlan::tcresults();
    let mut session = Session::new(admin, &plan, out);

    let report = runner().run(&mut session).await?;

    tracing::info!(
        database = %plan.database,
        username = %plan.principal.username,
        collection = %plan.collection,
        "initialization complete"
    );

    Ok(report)
}
