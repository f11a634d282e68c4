mod create_collection;
mod create_principal;
mod emit_marker;
mod select_database;

use std::sync::Arc;

use tcinit_kernel::StepRunner;

pub use create_collection::CreateCollection;
pub use create_principal::CreatePrincipal;
pub use emit_marker::EmitMarker;
pub use select_database::SelectDatabase;

/// Register the initialization steps in execution order.
pub fn register_all(runner: &mut StepRunner) {
    runner.register(Arc::new(EmitMarker::new()));
    runner.register(Arc::new(SelectDatabase::new()));
    runner.register(Arc::new(CreatePrincipal::new()));
    runner.register(Arc::new(CreateCollection::new()));
}
