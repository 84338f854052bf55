//! Full runs against a small multi-module project.

use pomalign_lib::capture::CAPTURE_ARTIFACT_ID;
use pomalign_lib::config::Config;
use pomalign_lib::manager::{self, ManagerError, RunStatus};
use pomalign_lib::report::SUMMARY_FILE;

use super::common::{CORE_POM, Fixture, dependency_version};

#[test]
fn normalize_run_rewrites_batch() {
  let fixture = Fixture::standard();
  let outcome = fixture.run(&fixture.config());

  assert_eq!(outcome.status(), RunStatus::Success);
  assert_eq!(outcome.projects, 2);
  assert_eq!(outcome.changed.len(), 2);
  // Children are written before their parents.
  assert!(outcome.changed[0].ends_with("core/pom.xml"));

  let root = fixture.read_model("project/pom.xml");
  assert_eq!(root.version.as_deref(), Some("1.0-rebuild-1"));
  assert!(root.base.repositories.is_none());
  let managed = root.base.managed_dependencies();
  assert_eq!(managed.len(), 1);
  assert_eq!(managed[0].artifact_id, "platform-bom");
  assert_eq!(managed[0].version.as_deref(), Some("3.0"));
  assert!(managed[0].is_import());

  let core = fixture.read_model("project/core/pom.xml");
  assert_eq!(core.parent.as_ref().unwrap().version, "1.0-rebuild-1");
  assert_eq!(dependency_version(&core.base.dependencies, "lib-a"), None);
  assert_eq!(dependency_version(&core.base.dependencies, "lib-b"), None);
  assert!(core.base.dependency_management.is_none());
}

#[test]
fn second_run_changes_nothing() {
  let fixture = Fixture::standard();
  let config = fixture.config();
  fixture.run(&config);
  let before = std::fs::read_to_string(fixture.path("project/core/pom.xml")).unwrap();

  let outcome = fixture.run(&config);
  assert!(outcome.changed.is_empty());
  assert_eq!(
    std::fs::read_to_string(fixture.path("project/core/pom.xml")).unwrap(),
    before
  );
}

#[test]
fn strict_run_pins_mapped_versions() {
  let fixture = Fixture::standard();
  let config = Config {
    strict: true,
    ..fixture.config()
  };
  let outcome = fixture.run(&config);
  assert_eq!(outcome.status(), RunStatus::Success);

  let root = fixture.read_model("project/pom.xml");
  assert_eq!(dependency_version(root.base.managed_dependencies(), "lib-a"), Some("1.5"));
  assert_eq!(dependency_version(root.base.managed_dependencies(), "platform-bom"), Some("3.0"));

  let core = fixture.read_model("project/core/pom.xml");
  assert_eq!(dependency_version(&core.base.dependencies, "lib-b"), Some("2.1"));
}

#[test]
fn missing_versions_produce_capture() {
  let fixture = Fixture::standard();
  fixture.write(
    "project/core/pom.xml",
    &CORE_POM.replace(
      "</dependencies>",
      "  <dependency>\n      <groupId>org.unknown</groupId>\n      <artifactId>mystery</artifactId>\n      \
       <version>0.9</version>\n      <type>test-jar</type>\n      <classifier>tests</classifier>\n      \
       <scope>test</scope>\n      <optional>true</optional>\n      <exclusions>\n        <exclusion>\n          \
       <groupId>junit</groupId>\n          <artifactId>junit</artifactId>\n        </exclusion>\n      \
       </exclusions>\n    </dependency>\n  </dependencies>",
    ),
  );
  let config = Config {
    capture: true,
    ..fixture.config()
  };
  let outcome = fixture.run(&config);

  assert_eq!(outcome.status(), RunStatus::CaptureWritten);
  assert_eq!(outcome.status().exit_code(), 2);
  let capture_path = outcome.capture_pom.clone().unwrap();
  assert_eq!(capture_path, fixture.path("workspace/capture.pom"));

  let capture = fixture.read_model("workspace/capture.pom");
  assert_eq!(capture.artifact_id, CAPTURE_ARTIFACT_ID);
  let managed = capture.base.managed_dependencies();
  assert_eq!(managed.len(), 1);
  assert_eq!(managed[0].artifact_id, "mystery");
  assert_eq!(managed[0].version.as_deref(), Some("0.9"));
  assert_eq!(managed[0].type_.as_deref(), Some("test-jar"));
  assert_eq!(managed[0].classifier.as_deref(), Some("tests"));
  assert_eq!(managed[0].optional.as_deref(), Some("true"));
  assert_eq!(managed[0].exclusions.len(), 1);
  assert_eq!(managed[0].exclusions[0].artifact_id, "junit");
  assert_eq!(managed[0].scope, None);

  // Unresolved dependencies keep their version.
  let core = fixture.read_model("project/core/pom.xml");
  assert_eq!(dependency_version(&core.base.dependencies, "mystery"), Some("0.9"));
}

#[test]
fn reports_are_written_to_workspace() {
  let fixture = Fixture::standard();
  fixture.run(&fixture.config());

  let reports = fixture.path("workspace/reports");
  assert!(reports.join("missing-versions.txt").exists());
  assert!(reports.join("activity-log.txt").exists());
  let summary: serde_json::Value =
    serde_json::from_str(&std::fs::read_to_string(reports.join(SUMMARY_FILE)).unwrap()).unwrap();
  assert_eq!(summary["status"], "success");
  assert_eq!(summary["projects"], 2);
  assert_eq!(summary["modders"][0], "version-suffix");

  let activity = std::fs::read_to_string(reports.join("activity-log.txt")).unwrap();
  assert!(activity.contains("version: 1.0 -> 1.0-rebuild-1"));
}

#[test]
fn preserve_files_backs_up_originals() {
  let fixture = Fixture::standard();
  let config = Config {
    preserve_files: true,
    ..fixture.config()
  };
  fixture.run(&config);

  let backup = std::fs::read_to_string(fixture.path("workspace/backups/core/pom.xml")).unwrap();
  assert_eq!(backup, CORE_POM);
  assert!(fixture.path("workspace/backups/pom.xml").exists());
}

#[test]
fn relocate_output_uses_repository_layout() {
  let fixture = Fixture::standard();
  let config = Config {
    relocate_output: Some(fixture.path("out")),
    ..fixture.config()
  };
  let outcome = fixture.run(&config);
  assert_eq!(outcome.written.len(), 2);

  assert!(
    fixture
      .path("out/org/app/app-parent/1.0-rebuild-1/app-parent-1.0-rebuild-1.pom")
      .exists()
  );
  assert!(fixture.path("out/org/app/core/1.0-rebuild-1/core-1.0-rebuild-1.pom").exists());
  assert!(!fixture.path("project/pom.xml").exists());
  assert!(!fixture.path("project/core").exists());
  assert!(fixture.path("project").exists());
}

#[test]
fn bad_pom_is_recorded_and_others_are_written() {
  let fixture = Fixture::standard();
  fixture.write(
    "project/broken/pom.xml",
    "<project><groupId>org.app</groupId><version>1</version></project>",
  );
  let outcome = fixture.run(&fixture.config());

  assert_eq!(outcome.status(), RunStatus::Failed);
  assert_eq!(outcome.status().exit_code(), 1);
  assert_eq!(outcome.errors().len(), 1);
  assert!(outcome.errors()[0].pom().ends_with("broken/pom.xml"));
  assert_eq!(outcome.projects, 2);
  assert_eq!(
    fixture.read_model("project/pom.xml").version.as_deref(),
    Some("1.0-rebuild-1")
  );
}

#[test]
fn unreadable_bom_is_fatal() {
  let fixture = Fixture::standard();
  let config = Config {
    boms: vec![fixture.path("governance/missing.pom")],
    ..fixture.config()
  };
  let result = manager::run(&config.to_options().unwrap(), &config.to_inputs().unwrap());
  assert!(matches!(result, Err(ManagerError::Bom { .. })));
  // Nothing was touched.
  assert!(
    std::fs::read_to_string(fixture.path("project/pom.xml"))
      .unwrap()
      .contains("<version>1.0</version>")
  );
}

#[test]
fn single_file_target() {
  let fixture = Fixture::standard();
  let config = Config {
    target: Some(fixture.path("project/core/pom.xml")),
    ..fixture.config()
  };
  let outcome = fixture.run(&config);
  assert_eq!(outcome.projects, 1);

  // The parent is not in the batch, so the BOM import lands here.
  let core = fixture.read_model("project/core/pom.xml");
  assert!(core.base.managed_dependencies().iter().any(|d| d.is_import()));
}
