//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{
    DistributionService, LifecycleService, LinkService, PublishService,
};
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    pub distribution: Arc<DistributionService>,
    pub publish: Arc<PublishService>,
    pub link: Arc<LinkService>,
    pub lifecycle: LifecycleService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);

        let distribution = Arc::new(DistributionService::new(fs.clone(), settings.clone()));
        let publish = Arc::new(PublishService::new(fs.clone(), settings.clone()));
        let link = Arc::new(LinkService::new(fs.clone(), settings.clone()));
        let lifecycle = LifecycleService::new(
            distribution.clone(),
            publish.clone(),
            link.clone(),
        );

        Self {
            settings,
            fs,
            distribution,
            publish,
            link,
            lifecycle,
        }
    }
}
