//! Tests for LifecycleService: install/uninstall sequencing and dispatch

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rstest::rstest;
use tempfile::TempDir;

use cmdkit::application::services::OperationReport;
use cmdkit::application::ApplicationError;
use cmdkit::config::Settings;
use cmdkit::domain::{DomainError, Operation, RemoveOutcome};
use cmdkit::infrastructure::di::ServiceContainer;
use cmdkit::util::testing;

fn test_settings(root: &Path) -> Settings {
    Settings {
        source_dir: root.join("src/bin"),
        dist_dir: root.join("dist"),
        installed_dir: root.join("share/cmdkit"),
        path_dir: root.join("pathbin"),
        command_subdir: "bin".into(),
    }
}

/// Helper to create a source set and an empty path directory
fn setup(temp: &TempDir, commands: &[&str]) -> ServiceContainer {
    testing::init_test_setup();
    let root = fs::canonicalize(temp.path()).unwrap();
    let settings = test_settings(&root);
    fs::create_dir_all(&settings.source_dir).unwrap();
    fs::create_dir_all(&settings.path_dir).unwrap();
    for name in commands {
        fs::write(settings.source_dir.join(name), format!("# {name}\n")).unwrap();
    }
    ServiceContainer::new(settings)
}

/// Names and symlink targets in a directory, for before/after comparison
fn snapshot(dir: &Path) -> BTreeSet<(String, Option<PathBuf>)> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| {
            let e = e.unwrap();
            let target = fs::read_link(e.path()).ok();
            (e.file_name().to_string_lossy().into_owned(), target)
        })
        .collect()
}

fn dir_names(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

// ============================================================
// install / uninstall
// ============================================================

#[test]
fn given_foo_and_bar_when_install_then_linked_and_uninstall_removes_all() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let container = setup(&temp, &["foo.ext", "bar.ext"]);
    let settings = container.settings.clone();

    // Act
    let report = container.lifecycle.install().unwrap();

    // Assert: links point into the installed directory
    assert_eq!(report.cleaned, RemoveOutcome::NothingToDo);
    assert_eq!(report.linked.len(), 2);
    let installed = settings.installed_commands_dir();
    assert_eq!(
        fs::read_link(settings.path_dir.join("foo")).unwrap(),
        installed.join("foo.ext")
    );
    assert_eq!(
        fs::read_link(settings.path_dir.join("bar")).unwrap(),
        installed.join("bar.ext")
    );
    assert_eq!(
        dir_names(&installed),
        BTreeSet::from(["foo.ext".to_string(), "bar.ext".to_string()])
    );

    // Act
    let (links, outcome) = container.lifecycle.uninstall().unwrap();

    // Assert
    assert_eq!(links.unwrap().removed.len(), 2);
    assert_eq!(outcome, RemoveOutcome::Removed(settings.installed_dir.clone()));
    assert!(!settings.path_dir.join("foo").is_symlink());
    assert!(!settings.path_dir.join("bar").is_symlink());
    assert!(!settings.installed_dir.exists());
}

#[test]
fn given_foreign_entries_when_uninstall_install_uninstall_then_state_restored() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let container = setup(&temp, &["foo.ext", "bar.sh", "baz"]);
    let settings = container.settings.clone();
    fs::write(settings.path_dir.join("unrelated"), "keep").unwrap();
    let before = snapshot(&settings.path_dir);

    // Act
    container.lifecycle.uninstall().unwrap();
    container.lifecycle.install().unwrap();
    container.lifecycle.uninstall().unwrap();

    // Assert
    assert_eq!(snapshot(&settings.path_dir), before);
    assert!(!settings.installed_dir.exists());
    assert_eq!(
        fs::read_to_string(settings.path_dir.join("unrelated")).unwrap(),
        "keep"
    );
}

#[test]
fn given_install_when_links_listed_then_bijective_with_stripped_names() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let container = setup(&temp, &["a.py", "b.sh", "c.tar.gz", "plain"]);

    // Act
    container.lifecycle.install().unwrap();

    // Assert
    let names = dir_names(&container.settings.path_dir);
    let expected: BTreeSet<String> = ["a", "b", "c.tar", "plain"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(names, expected);
}

#[test]
fn given_stale_dist_when_install_then_cleaned_and_rebuilt() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let container = setup(&temp, &["foo.ext"]);
    let stale = container.settings.dist_commands_dir().join("stale.ext");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "old").unwrap();

    // Act
    let report = container.lifecycle.install().unwrap();

    // Assert
    assert_eq!(
        report.cleaned,
        RemoveOutcome::Removed(container.settings.dist_dir.clone())
    );
    assert!(!stale.exists());
    assert!(!container.settings.path_dir.join("stale").exists());
}

#[test]
fn given_previous_install_without_uninstall_when_install_then_link_conflict() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let container = setup(&temp, &["foo.ext"]);
    container.lifecycle.install().unwrap();

    // Act
    let result = container.lifecycle.install();

    // Assert: publish replaced the installation, link refuses existing links
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::DestinationConflict { .. }))
    ));
    assert!(container.settings.installed_commands_dir().join("foo.ext").exists());

    // uninstall is the recovery path
    container.lifecycle.uninstall().unwrap();
    container.lifecycle.install().unwrap();
}

#[test]
fn given_missing_source_when_install_then_aborts_before_publish() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let container = setup(&temp, &[]);
    fs::remove_dir_all(&container.settings.source_dir).unwrap();

    // Act
    let result = container.lifecycle.install();

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::SourceMissing(_)))
    ));
    assert!(!container.settings.installed_dir.exists());
}

#[test]
fn given_foreign_file_when_install_then_conflict_and_earlier_stages_stay() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let container = setup(&temp, &["foo.ext"]);
    fs::write(container.settings.path_dir.join("foo"), "user owned").unwrap();

    // Act
    let result = container.lifecycle.install();

    // Assert: not transactional
    assert!(result.is_err());
    assert!(container.settings.dist_dir.exists());
    assert!(container.settings.installed_dir.exists());
    assert_eq!(
        fs::read_to_string(container.settings.path_dir.join("foo")).unwrap(),
        "user owned"
    );
}

#[test]
fn given_foreign_symlink_when_uninstall_then_installed_dir_kept() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let container = setup(&temp, &["foo.ext"]);
    container.lifecycle.install().unwrap();
    let link = container.settings.path_dir.join("foo");
    fs::remove_file(&link).unwrap();
    #[cfg(unix)]
    std::os::unix::fs::symlink("/usr/bin/env", &link).unwrap();
    #[cfg(windows)]
    std::os::windows::fs::symlink_file("C:\\Windows\\notepad.exe", &link).unwrap();

    // Act
    let result = container.lifecycle.uninstall();

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::TargetMismatch { .. }))
    ));
    assert!(link.is_symlink());
    assert!(container.settings.installed_dir.exists());
}

// ============================================================
// run() / run_named() dispatch
// ============================================================

#[test]
fn given_step_by_step_operations_when_run_then_same_as_install() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let container = setup(&temp, &["foo.ext"]);

    // Act
    for op in ["build", "copy", "link"] {
        container.lifecycle.run_named(op).unwrap();
    }

    // Assert
    assert!(container.settings.path_dir.join("foo").is_symlink());
    let report = container.lifecycle.run(Operation::Copy);
    assert!(matches!(
        report,
        Err(ApplicationError::Domain(DomainError::AlreadyInstalled(_)))
    ));
}

#[rstest]
#[case("")]
#[case("deploy")]
#[case("INSTALL")]
fn given_unknown_name_when_run_named_then_unknown_operation_and_no_effect(#[case] name: &str) {
    // Arrange
    let temp = TempDir::new().unwrap();
    let container = setup(&temp, &["foo.ext"]);

    // Act
    let result = container.lifecycle.run_named(name);

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::UnknownOperation(_)))
    ));
    assert!(!container.settings.dist_dir.exists());
}

#[test]
fn given_nothing_installed_when_run_unlink_then_nothing_to_do() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let container = setup(&temp, &["foo.ext"]);

    // Act
    let report = container.lifecycle.run(Operation::Unlink).unwrap();

    // Assert
    assert_eq!(
        report,
        OperationReport::Uninstalled {
            links: None,
            installed: RemoveOutcome::NothingToDo,
        }
    );
}

#[test]
fn given_clean_twice_when_run_then_idempotent() {
    let temp = TempDir::new().unwrap();
    let container = setup(&temp, &["foo.ext"]);
    container.lifecycle.run(Operation::Build).unwrap();

    assert!(matches!(
        container.lifecycle.run(Operation::Clean).unwrap(),
        OperationReport::Cleaned(RemoveOutcome::Removed(_))
    ));
    assert_eq!(
        container.lifecycle.run(Operation::Clean).unwrap(),
        OperationReport::Cleaned(RemoveOutcome::NothingToDo)
    );
}
