//! Move test dependencies of selected modules into an inactive profile.

use tracing::info;

use crate::pom::{Dependency, Profile, XmlNode};
use crate::project::Project;
use crate::session::Session;

/// Profile that receives the moved test dependencies.
pub const TEST_DEPENDENCIES_PROFILE: &str = "_testDependencies";

/// Property set to skip tests; the profile activates when it is `false`.
pub const SKIP_TESTS_PROPERTY: &str = "maven.test.skip";

pub fn apply(project: &mut Project, session: &mut Session) -> bool {
  let key = project.versionless_key();
  if !session.options.removed_tests.iter().any(|w| w.matches(&key)) {
    return false;
  }

  let pom = project.pom().to_path_buf();
  let model = project.model_mut();
  let managed_test_scope: Vec<_> = model
    .base
    .managed_dependencies()
    .iter()
    .filter(|d| d.scope.as_deref() == Some("test"))
    .map(Dependency::versionless)
    .collect();

  let (moved, kept): (Vec<Dependency>, Vec<Dependency>) =
    std::mem::take(&mut model.base.dependencies)
      .into_iter()
      .partition(|d| match d.scope.as_deref() {
        Some(scope) => scope == "test",
        None => managed_test_scope.contains(&d.versionless()),
      });
  model.base.dependencies = kept;

  let mut changed = false;
  if !moved.is_empty() {
    for dep in &moved {
      info!(pom = %pom.display(), dependency = %dep.versionless(), "moving test dependency");
      session
        .changes
        .log(&pom, format!("test dependency {} moved to profile {}", dep.versionless(), TEST_DEPENDENCIES_PROFILE));
    }
    if model.profile_mut(TEST_DEPENDENCIES_PROFILE).is_none() {
      model.profiles.push(test_profile());
    }
    if let Some(profile) = model.profile_mut(TEST_DEPENDENCIES_PROFILE) {
      profile.base.dependencies.extend(moved);
    }
    changed = true;
  }

  if model.base.properties.get(SKIP_TESTS_PROPERTY) != Some("true") {
    model.base.properties.set(SKIP_TESTS_PROPERTY, "true");
    session.changes.log(&pom, format!("{} set to true", SKIP_TESTS_PROPERTY));
    changed = true;
  }
  changed
}

fn test_profile() -> Profile {
  let property = XmlNode::new("property")
    .with_child(XmlNode::leaf("name", SKIP_TESTS_PROPERTY))
    .with_child(XmlNode::leaf("value", "false"));
  Profile {
    id: Some(TEST_DEPENDENCIES_PROFILE.to_string()),
    activation: Some(XmlNode::new("activation").with_child(property)),
    ..Default::default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::coord::WildcardKey;
  use crate::modders::testutil::project;
  use crate::session::SessionOptions;

  fn session(pattern: &str) -> Session {
    Session::new(SessionOptions {
      removed_tests: vec![pattern.parse::<WildcardKey>().unwrap()],
      ..Default::default()
    })
  }

  const MODULE: &str = "<project><groupId>org.app</groupId><artifactId>core</artifactId><version>1</version>\
    <dependencyManagement><dependencies>\
    <dependency><groupId>org.test</groupId><artifactId>mock</artifactId><version>2</version><scope>test</scope></dependency>\
    </dependencies></dependencyManagement><dependencies>\
    <dependency><groupId>junit</groupId><artifactId>junit</artifactId><scope>test</scope></dependency>\
    <dependency><groupId>org.test</groupId><artifactId>mock</artifactId></dependency>\
    <dependency><groupId>org.lib</groupId><artifactId>lib</artifactId></dependency>\
    </dependencies></project>";

  #[test]
  fn moves_test_dependencies_into_inactive_profile() {
    let mut session = session("org.app:.*");
    let mut p = project("pom.xml", MODULE);
    assert!(apply(&mut p, &mut session));

    assert_eq!(p.dependencies().len(), 1);
    assert_eq!(p.dependencies()[0].artifact_id, "lib");

    let profile = &p.model().profiles[0];
    assert_eq!(profile.id.as_deref(), Some(TEST_DEPENDENCIES_PROFILE));
    assert_eq!(profile.base.dependencies.len(), 2);
    let activation = profile.activation.as_ref().unwrap().child("property").unwrap();
    assert_eq!(activation.child_text("name"), Some(SKIP_TESTS_PROPERTY));
    assert_eq!(activation.child_text("value"), Some("false"));
    assert_eq!(p.property(SKIP_TESTS_PROPERTY), Some("true"));
  }

  #[test]
  fn second_pass_is_a_noop() {
    let mut session = session("org.app:core");
    let mut p = project("pom.xml", MODULE);
    apply(&mut p, &mut session);
    let snapshot = p.model().clone();
    assert!(!apply(&mut p, &mut session));
    assert_eq!(p.model(), &snapshot);
  }

  #[test]
  fn unmatched_project_is_untouched() {
    let mut session = session("org.other:.*");
    let mut p = project("pom.xml", MODULE);
    assert!(!apply(&mut p, &mut session));
    assert!(p.model().profiles.is_empty());
  }
}
