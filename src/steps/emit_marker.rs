use async_trait::async_trait;
use tcinit_kernel::plan::START_MARKER;
use tcinit_kernel::{AdminError, Session, Step};

/// Writes the start marker line to the session output.
pub struct EmitMarker;

impl EmitMarker {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Step for EmitMarker {
    fn name(&self) -> &'static str {
        "emit-marker"
    }

    async fn run(&self, session: &mut Session<'_>) -> Result<(), AdminError> {
        // The marker is observational only; a closed stdout must not abort startup.
        if let Err(err) = writeln!(session.out, "{}", START_MARKER).and_then(|_| session.out.flush())
        {
            tracing::warn!(error = %err, "could not write start marker");
        }
        Ok(())
    }
}
