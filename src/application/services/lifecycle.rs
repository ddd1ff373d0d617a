//! Install/uninstall orchestration
//!
//! Sequences the stages and fails fast. Nothing is rolled back: after a
//! failure the earlier stages stay in effect, and `clean`/`uninstall` bring the
//! system back to a known state.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::services::{
    BuildReport, DistributionService, LinkService, PublishReport, PublishService, StatusReport,
    UnlinkReport,
};
use crate::application::ApplicationResult;
use crate::domain::{LinkEntry, Operation, RemoveOutcome};

/// Result of a full install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub cleaned: RemoveOutcome,
    pub built: BuildReport,
    pub published: PublishReport,
    pub linked: Vec<LinkEntry>,
}

/// Result of any named operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationReport {
    Built(BuildReport),
    Cleaned(RemoveOutcome),
    Published(PublishReport),
    Linked(Vec<LinkEntry>),
    /// `None` for the links when nothing was installed
    Uninstalled {
        links: Option<UnlinkReport>,
        installed: RemoveOutcome,
    },
    Installed(InstallReport),
    Status(StatusReport),
}

/// Orchestrator over the lifecycle stages.
pub struct LifecycleService {
    distribution: Arc<DistributionService>,
    publish: Arc<PublishService>,
    link: Arc<LinkService>,
}

impl LifecycleService {
    /// Create a new lifecycle service.
    pub fn new(
        distribution: Arc<DistributionService>,
        publish: Arc<PublishService>,
        link: Arc<LinkService>,
    ) -> Self {
        Self {
            distribution,
            publish,
            link,
        }
    }

    /// Run an operation given by name.
    ///
    /// The name must be in `Operation::ALL`; anything else, including an
    /// empty string, fails with `UnknownOperation` before any side effect.
    pub fn run_named(&self, name: &str) -> ApplicationResult<OperationReport> {
        let op: Operation = name.parse()?;
        self.run(op)
    }

    /// Run a single named operation.
    #[instrument(skip(self))]
    pub fn run(&self, op: Operation) -> ApplicationResult<OperationReport> {
        debug!("run: {}", op);
        match op {
            Operation::Build => self.distribution.build().map(OperationReport::Built),
            Operation::Clean => self.distribution.clean().map(OperationReport::Cleaned),
            // Conservative: never clobber an existing installation
            Operation::Copy => self.publish.publish(false).map(OperationReport::Published),
            Operation::Link => self.link.link().map(OperationReport::Linked),
            Operation::Unlink | Operation::Uninstall => {
                let (links, installed) = self.uninstall()?;
                Ok(OperationReport::Uninstalled { links, installed })
            }
            Operation::Install => self.install().map(OperationReport::Installed),
            Operation::Status => self.link.status().map(OperationReport::Status),
        }
    }

    /// clean -> build -> publish (overwrite) -> link, aborting on first failure.
    pub fn install(&self) -> ApplicationResult<InstallReport> {
        let cleaned = self.distribution.clean()?;
        let built = self.distribution.build()?;
        // Aggressive: a stale installation is replaced, its links are not
        // touched and make `link` fail with DestinationConflict
        let published = self.publish.publish(true)?;
        let linked = self.link.link()?;
        info!(
            "install: {} commands linked into {}",
            linked.len(),
            published.installed_dir.display()
        );
        Ok(InstallReport {
            cleaned,
            built,
            published,
            linked,
        })
    }

    /// unlink -> remove installed directory.
    ///
    /// The installed directory is only removed once every link was verified.
    pub fn uninstall(&self) -> ApplicationResult<(Option<UnlinkReport>, RemoveOutcome)> {
        let links = self.link.unlink()?;
        let installed = self.publish.remove_installed()?;
        info!("uninstall: {:?}", installed);
        Ok((links, installed))
    }
}
