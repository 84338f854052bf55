//! Runs with a toolchain descriptor.

use pomalign_lib::config::Config;
use pomalign_lib::manager::RunStatus;

use super::common::Fixture;

const TOOLCHAIN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <modelVersion>4.0.0</modelVersion>
  <groupId>org.toolchain</groupId>
  <artifactId>toolchain</artifactId>
  <version>5</version>
  <packaging>pom</packaging>
  <build>
    <pluginManagement>
      <plugins>
        <plugin>
          <groupId>org.apache.maven.plugins</groupId>
          <artifactId>maven-compiler-plugin</artifactId>
          <version>3.11.0</version>
        </plugin>
      </plugins>
    </pluginManagement>
    <plugins>
      <plugin>
        <groupId>org.apache.maven.plugins</groupId>
        <artifactId>maven-enforcer-plugin</artifactId>
        <version>3.4.1</version>
      </plugin>
    </plugins>
  </build>
</project>
"#;

const PLUGINS: &str = r#"
  <build>
    <plugins>
      <plugin>
        <groupId>org.apache.maven.plugins</groupId>
        <artifactId>maven-compiler-plugin</artifactId>
        <version>3.1</version>
      </plugin>
      <plugin>
        <groupId>org.codehaus.mojo</groupId>
        <artifactId>exotic-maven-plugin</artifactId>
        <version>1.0</version>
      </plugin>
    </plugins>
  </build>
</project>
"#;

fn fixture() -> Fixture {
  let fixture = Fixture::standard();
  fixture.write("governance/toolchain.pom", TOOLCHAIN);
  fixture
}

fn config(fixture: &Fixture) -> Config {
  Config {
    toolchain: Some(fixture.path("governance/toolchain.pom")),
    capture: true,
    ..fixture.config()
  }
}

#[test]
fn root_is_parented_to_toolchain() {
  let fixture = fixture();
  fixture.run(&config(&fixture));

  let root = fixture.read_model("project/pom.xml");
  let parent = root.parent.unwrap();
  assert_eq!(parent.group_id, "org.toolchain");
  assert_eq!(parent.version, "5");
  assert_eq!(root.group_id.as_deref(), Some("org.app"));
  assert_eq!(root.version.as_deref(), Some("1.0-rebuild-1"));

  // Modules in the batch keep their own parent.
  let core = fixture.read_model("project/core/pom.xml");
  assert_eq!(core.parent.unwrap().artifact_id, "app-parent");
}

#[test]
fn managed_plugin_versions_are_stripped_and_unmanaged_captured() {
  let fixture = fixture();
  let core = std::fs::read_to_string(fixture.path("project/core/pom.xml")).unwrap();
  fixture.write("project/core/pom.xml", &core.replace("</project>\n", PLUGINS));

  let outcome = fixture.run(&config(&fixture));
  assert_eq!(outcome.status(), RunStatus::CaptureWritten);

  let core = fixture.read_model("project/core/pom.xml");
  let plugins = &core.base.build.as_ref().unwrap().plugins;
  assert_eq!(plugins[0].artifact_id, "maven-compiler-plugin");
  assert_eq!(plugins[0].version, None);
  assert_eq!(plugins[1].version.as_deref(), Some("1.0"));

  let capture = fixture.read_model("workspace/capture.pom");
  let managed = &capture.base.build.unwrap().plugin_management.unwrap().plugins;
  assert_eq!(managed.len(), 1);
  assert_eq!(managed[0].artifact_id, "exotic-maven-plugin");
}

#[test]
fn foreign_parent_is_forced_to_toolchain() {
  let fixture = fixture();
  fixture.write(
    "solo/pom.xml",
    r#"<project>
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>com.other</groupId>
    <artifactId>corp-parent</artifactId>
    <version>7</version>
  </parent>
  <groupId>org.solo</groupId>
  <artifactId>solo</artifactId>
  <version>2.0</version>
</project>
"#,
  );
  let config = Config {
    target: Some(fixture.path("solo/pom.xml")),
    modifications: vec!["+force-parent-realignment".into()],
    ..config(&fixture)
  };
  let outcome = fixture.run(&config);
  assert_eq!(outcome.changed.len(), 1);

  let solo = fixture.read_model("solo/pom.xml");
  let parent = solo.parent.unwrap();
  assert_eq!((parent.group_id.as_str(), parent.version.as_str()), ("org.toolchain", "5"));
  assert_eq!(solo.group_id.as_deref(), Some("org.solo"));
  assert_eq!(solo.version.as_deref(), Some("2.0-rebuild-1"));
}
