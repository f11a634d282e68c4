use anyhow::Context;
use tcinit_db::MongoAdmin;
use tcinit_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load tcresults-init settings")?;
    tcinit_telemetry::init(&settings.telemetry)?;

    tracing::info!(env = ?settings.environment, "tcresults-init starting");

    let admin = MongoAdmin::connect(&settings.database)
        .await
        .with_context(|| "failed to connect to MongoDB")?;

    let mut stdout = std::io::stdout();
    tcresults_init::initialize(&admin, &mut stdout)
        .await
        .with_context(|| "database initialization aborted")?;

    Ok(())
}
