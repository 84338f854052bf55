//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub const BOM: &str = r#"<project>
  <modelVersion>4.0.0</modelVersion>
  <groupId>org.platform</groupId>
  <artifactId>platform-bom</artifactId>
  <version>3.0</version>
  <packaging>pom</packaging>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>org.lib</groupId>
        <artifactId>lib-a</artifactId>
        <version>1.5</version>
      </dependency>
    </dependencies>
  </dependencyManagement>
</project>
"#;

pub const APP_POM: &str = r#"<project>
  <modelVersion>4.0.0</modelVersion>
  <groupId>org.app</groupId>
  <artifactId>app</artifactId>
  <version>1.0</version>
  <dependencies>
    <dependency>
      <groupId>org.lib</groupId>
      <artifactId>lib-a</artifactId>
      <version>1.0</version>
    </dependency>
  </dependencies>
</project>
"#;

/// Isolated test environment.
///
/// Holds a project under `project/`, a BOM under `governance/` and a
/// workspace under `workspace/`.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file("project/pom.xml", APP_POM);
    env.write_file("governance/platform-bom.pom", BOM);
    env
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.path(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.path(relative_path)).unwrap()
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  /// Command with target, BOM and workspace set.
  pub fn pomalign_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("pomalign");
    cmd
      .arg(self.path("project"))
      .arg("-b")
      .arg(self.path("governance/platform-bom.pom"))
      .arg("-W")
      .arg(self.path("workspace"));
    cmd
  }
}
