//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem)
//! but are themselves concrete structs, not traits.

mod distribution;
mod lifecycle;
mod link;
mod publish;

pub use distribution::{BuildReport, DistributionService};
pub use lifecycle::{InstallReport, LifecycleService, OperationReport};
pub use link::{list_command_files, LinkService, StatusReport, UnlinkReport};
pub use publish::{PublishReport, PublishService};
