//! Shared fixtures for library integration tests.

use std::path::PathBuf;

use pomalign_lib::config::Config;
use pomalign_lib::manager::{self, RunOutcome};
use pomalign_lib::pom::{self, Model};
use tempfile::TempDir;

pub const BOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <modelVersion>4.0.0</modelVersion>
  <groupId>org.platform</groupId>
  <artifactId>platform-bom</artifactId>
  <version>3.0</version>
  <packaging>pom</packaging>
  <properties>
    <lib.version>2.1</lib.version>
  </properties>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>org.lib</groupId>
        <artifactId>lib-a</artifactId>
        <version>1.5</version>
      </dependency>
      <dependency>
        <groupId>org.lib</groupId>
        <artifactId>lib-b</artifactId>
        <version>${lib.version}</version>
      </dependency>
    </dependencies>
  </dependencyManagement>
</project>
"#;

pub const ROOT_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <modelVersion>4.0.0</modelVersion>
  <groupId>org.app</groupId>
  <artifactId>app-parent</artifactId>
  <version>1.0</version>
  <packaging>pom</packaging>
  <modules>
    <module>core</module>
  </modules>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>org.lib</groupId>
        <artifactId>lib-a</artifactId>
        <version>1.0</version>
      </dependency>
    </dependencies>
  </dependencyManagement>
  <repositories>
    <repository>
      <id>legacy</id>
      <url>http://repo.example.org/legacy</url>
    </repository>
  </repositories>
</project>
"#;

pub const CORE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>org.app</groupId>
    <artifactId>app-parent</artifactId>
    <version>1.0</version>
  </parent>
  <artifactId>core</artifactId>
  <dependencies>
    <dependency>
      <groupId>org.lib</groupId>
      <artifactId>lib-a</artifactId>
    </dependency>
    <dependency>
      <groupId>org.lib</groupId>
      <artifactId>lib-b</artifactId>
      <version>2.0</version>
    </dependency>
  </dependencies>
</project>
"#;

/// A temporary project tree with a BOM outside the target directory.
pub struct Fixture {
  pub temp: TempDir,
}

impl Fixture {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Root POM, one `core` module and the platform BOM.
  pub fn standard() -> Self {
    let fixture = Self::new();
    fixture.write("project/pom.xml", ROOT_POM);
    fixture.write("project/core/pom.xml", CORE_POM);
    fixture.write("governance/platform-bom.pom", BOM);
    fixture
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.temp.path().join(relative)
  }

  pub fn write(&self, relative: &str, content: &str) {
    let path = self.path(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
  }

  pub fn read_model(&self, relative: &str) -> Model {
    pom::read_pom(&self.path(relative)).unwrap()
  }

  /// Config targeting `project/` with the platform BOM and a version suffix.
  pub fn config(&self) -> Config {
    Config {
      target: Some(self.path("project")),
      boms: vec![self.path("governance/platform-bom.pom")],
      version_suffix: Some("-rebuild-1".into()),
      workspace: Some(self.path("workspace")),
      ..Default::default()
    }
  }

  pub fn run(&self, config: &Config) -> RunOutcome {
    let options = config.to_options().unwrap();
    let inputs = config.to_inputs().unwrap();
    manager::run(&options, &inputs).unwrap()
  }
}

pub fn dependency_version<'a>(deps: &'a [pom::Dependency], artifact: &str) -> Option<&'a str> {
  deps
    .iter()
    .find(|d| d.artifact_id == artifact)
    .unwrap_or_else(|| panic!("no dependency {}", artifact))
    .version
    .as_deref()
}
