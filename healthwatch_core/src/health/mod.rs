pub mod check;
pub mod checks;
pub mod executor;
pub mod registry;
pub mod report;
pub mod status;
pub mod views;


pub use check::{CheckContext, CheckOutcome, HealthCheck};
pub use checks::{build_registry, CustomCheck, DatabaseCheck, FilePathWriteCheck, MemoryCheck, UrlCheck};
pub use executor::{HealthExecutor, DEFAULT_CHECK_TIMEOUT};
pub use registry::{CheckDescriptor, RegisteredCheck, Registry, TagPredicate};
pub use report::{CheckResult, Report, StatusSummary};
pub use status::{aggregate, HealthStatus};
pub use views::{DashboardView, EntryView, LivenessView, ReadinessView};
