pub mod admin;
pub mod plan;
pub mod runner;
pub mod settings;
pub mod step;

pub use admin::{AdminClient, AdminError, RoleBinding, UserRecord};
pub use plan::{Grant, Principal, ProvisioningPlan, Role};
pub use runner::{RunReport, StepFailure, StepRunner};
pub use step::{Session, Step};
