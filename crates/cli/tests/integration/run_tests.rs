//! End-to-end runs through the binary.

use predicates::prelude::*;

use pomalign_lib::pom;

use super::common::TestEnv;

#[test]
fn run_aligns_and_reports() {
  let env = TestEnv::new();

  env
    .pomalign_cmd()
    .arg("--suffix=-rebuild-1")
    .assert()
    .code(0)
    .stdout(predicate::str::contains("Processed 1 POM(s)"))
    .stdout(predicate::str::contains("Alignment complete"));

  let model = pom::read_pom(&env.path("project/pom.xml")).unwrap();
  assert_eq!(model.version.as_deref(), Some("1.0-rebuild-1"));
  assert_eq!(model.base.dependencies[0].version, None);
  assert!(env.path("workspace/reports/summary.json").exists());
}

#[test]
fn strict_flag_pins_versions() {
  let env = TestEnv::new();
  env.pomalign_cmd().arg("--strict").assert().code(0);

  let model = pom::read_pom(&env.path("project/pom.xml")).unwrap();
  assert_eq!(model.base.dependencies[0].version.as_deref(), Some("1.5"));
}

#[test]
fn capture_exits_with_two() {
  let env = TestEnv::new();
  env.write_file(
    "project/pom.xml",
    &super::common::APP_POM.replace("org.lib</groupId>", "org.unknown</groupId>"),
  );

  env
    .pomalign_cmd()
    .arg("--capture-pom")
    .arg(env.path("capture.pom"))
    .assert()
    .code(2)
    .stderr(predicate::str::contains("capture POM written"));

  assert!(env.read_file("capture.pom").contains("pomalign-missing-capture"));
}

#[test]
fn broken_pom_exits_with_one() {
  let env = TestEnv::new();
  env.write_file("project/broken/pom.xml", "<project><groupId>g</groupId></project>");

  env
    .pomalign_cmd()
    .assert()
    .code(1)
    .stderr(predicate::str::contains("could not be processed"));

  // The healthy POM is still aligned.
  let model = pom::read_pom(&env.path("project/pom.xml")).unwrap();
  assert_eq!(model.base.dependencies[0].version, None);
}

#[test]
fn json_output_is_the_summary() {
  let env = TestEnv::new();
  let output = env.pomalign_cmd().args(["--output", "json"]).output().unwrap();
  assert!(output.status.success());

  let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(summary["status"], "success");
  assert_eq!(summary["projects"], 1);
  assert_eq!(summary["modifications"], 1);
}

#[test]
fn config_file_drives_the_run() {
  let env = TestEnv::new();
  env.write_file(
    "pomalign.toml",
    r#"
target = "project"
boms = ["governance/platform-bom.pom"]
workspace = "ws"
modifications = ["property"]

[property-mappings]
"lib.version" = "9.9"
"#,
  );
  env.write_file(
    "project/pom.xml",
    &super::common::APP_POM.replace(
      "<dependencies>",
      "<properties>\n    <lib.version>1.0</lib.version>\n  </properties>\n  <dependencies>",
    ),
  );

  assert_cmd::cargo::cargo_bin_cmd!("pomalign")
    .arg("-C")
    .arg(env.path("pomalign.toml"))
    .assert()
    .code(0);

  let model = pom::read_pom(&env.path("project/pom.xml")).unwrap();
  assert_eq!(model.base.properties.get("lib.version"), Some("9.9"));
  // Only the property modder ran.
  assert_eq!(model.base.dependencies[0].version.as_deref(), Some("1.0"));
  assert!(env.path("ws/reports/summary.json").exists());
}

#[test]
fn relocate_flag_moves_dependency() {
  let env = TestEnv::new();
  env
    .pomalign_cmd()
    .args(["--strict", "-R", "org.lib:lib-a=org.newlib:lib-a:2.0"])
    .assert()
    .code(0);

  let model = pom::read_pom(&env.path("project/pom.xml")).unwrap();
  let dep = &model.base.dependencies[0];
  assert_eq!(dep.group_id, "org.newlib");
  assert_eq!(dep.version.as_deref(), Some("2.0"));
  assert!(
    env
      .read_file("workspace/reports/relocations.txt")
      .contains("org.lib:lib-a -> org.newlib:lib-a:2.0")
  );
}
