//! Tests for PublishService (conservative and overwriting publish)

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use cmdkit::application::services::{DistributionService, PublishService};
use cmdkit::application::ApplicationError;
use cmdkit::config::Settings;
use cmdkit::domain::{DomainError, RemoveOutcome};
use cmdkit::infrastructure::traits::RealFileSystem;

fn test_settings(root: &Path) -> Settings {
    Settings {
        source_dir: root.join("src/bin"),
        dist_dir: root.join("dist"),
        installed_dir: root.join("share/cmdkit"),
        path_dir: root.join("pathbin"),
        command_subdir: "bin".into(),
    }
}

/// Helper to create and build a source set
fn setup_built(temp: &TempDir, commands: &[&str]) -> (Arc<Settings>, PublishService) {
    let settings = Arc::new(test_settings(temp.path()));
    fs::create_dir_all(&settings.source_dir).unwrap();
    for name in commands {
        fs::write(settings.source_dir.join(name), format!("# {name}\n")).unwrap();
    }
    let fs_impl = Arc::new(RealFileSystem);
    DistributionService::new(fs_impl.clone(), settings.clone())
        .build()
        .unwrap();
    let service = PublishService::new(fs_impl, settings.clone());
    (settings, service)
}

// ============================================================
// publish() tests
// ============================================================

#[rstest]
#[case(false)]
#[case(true)]
fn given_built_dist_when_publish_then_installed_is_copy(#[case] overwrite_existing: bool) {
    // Arrange
    let temp = TempDir::new().unwrap();
    let (settings, service) = setup_built(&temp, &["foo.ext", "bar.ext"]);

    // Act
    let report = service.publish(overwrite_existing).unwrap();

    // Assert
    assert_eq!(report.installed_dir, settings.installed_dir);
    assert!(!report.replaced);
    let installed = settings.installed_commands_dir();
    let mut names: Vec<String> = fs::read_dir(&installed)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["bar.ext", "foo.ext"]);
    assert_eq!(
        fs::read(installed.join("foo.ext")).unwrap(),
        fs::read(settings.dist_commands_dir().join("foo.ext")).unwrap()
    );
}

#[test]
fn given_missing_dist_when_publish_then_source_missing() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let settings = Arc::new(test_settings(temp.path()));
    let service = PublishService::new(Arc::new(RealFileSystem), settings.clone());

    // Act
    let result = service.publish(true);

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::SourceMissing(_)))
    ));
    assert!(!settings.installed_dir.exists());
}

#[test]
fn given_existing_install_when_conservative_publish_then_already_installed() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let (settings, service) = setup_built(&temp, &["foo.ext"]);
    service.publish(false).unwrap();
    let marker = settings.installed_dir.join("marker");
    fs::write(&marker, "keep").unwrap();

    // Act
    let result = service.publish(false);

    // Assert
    match result {
        Err(ApplicationError::Domain(DomainError::AlreadyInstalled(path))) => {
            assert_eq!(path, settings.installed_dir)
        }
        other => panic!("expected AlreadyInstalled, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(&marker).unwrap(), "keep");
}

#[test]
fn given_existing_install_when_overwriting_publish_then_replaced() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let (settings, service) = setup_built(&temp, &["foo.ext"]);
    service.publish(false).unwrap();
    let stale = settings.installed_commands_dir().join("stale.ext");
    fs::write(&stale, "old").unwrap();

    // Act
    let report = service.publish(true).unwrap();

    // Assert
    assert!(report.replaced);
    assert!(!stale.exists());
    assert!(settings.installed_commands_dir().join("foo.ext").exists());
}

// ============================================================
// remove_installed() tests
// ============================================================

#[test]
fn given_installed_when_remove_installed_then_removed_then_nothing_to_do() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let (settings, service) = setup_built(&temp, &["foo.ext"]);
    service.publish(false).unwrap();

    // Act & Assert
    assert_eq!(
        service.remove_installed().unwrap(),
        RemoveOutcome::Removed(settings.installed_dir.clone())
    );
    assert!(!settings.installed_dir.exists());
    assert_eq!(
        service.remove_installed().unwrap(),
        RemoveOutcome::NothingToDo
    );
}
