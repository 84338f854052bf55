//! `${...}` expression interpolation against a project's coordinate and properties.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::pom::{Dependency, Properties};

use super::Project;

static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid expression regex"));

/// Resolves expressions from a snapshot of a project's values.
///
/// The snapshot is owned, so an interpolator can be used while the project it
/// came from is being mutated.
#[derive(Debug, Clone, Default)]
pub struct Interpolator {
  values: BTreeMap<String, String>,
}

impl Interpolator {
  pub fn for_project(project: &Project) -> Self {
    let mut values = BTreeMap::new();
    let key = project.key();
    for prefix in ["project", "pom"] {
      values.insert(format!("{prefix}.groupId"), key.group_id.clone());
      values.insert(format!("{prefix}.artifactId"), key.artifact_id.clone());
      values.insert(format!("{prefix}.version"), key.version.clone());
    }
    if let Some(parent) = project.parent() {
      for prefix in ["project.parent", "pom.parent", "parent"] {
        values.insert(format!("{prefix}.groupId"), parent.group_id.clone());
        values.insert(format!("{prefix}.artifactId"), parent.artifact_id.clone());
        values.insert(format!("{prefix}.version"), parent.version.clone());
      }
    }
    for (k, v) in project.model().base.properties.iter() {
      values.entry(k.to_string()).or_insert_with(|| v.to_string());
    }
    Self { values }
  }

  pub fn from_properties(properties: &Properties) -> Self {
    Self {
      values: properties.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    }
  }

  pub fn lookup(&self, name: &str) -> Option<&str> {
    self.values.get(name).map(String::as_str)
  }

  /// Substitute every resolvable expression, expanding values recursively.
  ///
  /// Unresolvable expressions are left in place, as is any expression met
  /// again while its own value is being expanded (`<v>1.${v}</v>` yields
  /// `1.${v}`).
  pub fn interpolate(&self, input: &str) -> String {
    self.expand(input, &mut Vec::new())
  }

  fn expand<'a>(&'a self, input: &str, expanding: &mut Vec<&'a str>) -> String {
    EXPRESSION
      .replace_all(input, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match self.values.get_key_value(name) {
          Some((key, value)) if !expanding.contains(&key.as_str()) => {
            expanding.push(key.as_str());
            let expanded = self.expand(value, expanding);
            expanding.pop();
            expanded
          }
          _ => caps[0].to_string(),
        }
      })
      .into_owned()
  }

  /// Interpolate the coordinate fields of a dependency in place.
  pub fn interpolate_dependency(&self, dep: &mut Dependency) {
    dep.group_id = self.interpolate(&dep.group_id);
    dep.artifact_id = self.interpolate(&dep.artifact_id);
    if let Some(version) = &dep.version {
      dep.version = Some(self.interpolate(version));
    }
    for ex in &mut dep.exclusions {
      ex.group_id = self.interpolate(&ex.group_id);
      ex.artifact_id = self.interpolate(&ex.artifact_id);
    }
  }
}

/// True when the whole value is a single `${...}` expression.
pub fn is_expression(value: &str) -> bool {
  let value = value.trim();
  value.starts_with("${") && value.ends_with('}')
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pom;

  fn project() -> Project {
    let model = pom::parse_str(
      "<project><parent><groupId>org.parent</groupId><artifactId>p</artifactId><version>3</version></parent>\
       <artifactId>app</artifactId><version>1.0</version>\
       <properties><a>${b}</a><b>value-b</b><loop>${loop}</loop></properties></project>",
    )
    .unwrap();
    Project::new("pom.xml", model).unwrap()
  }

  #[test]
  fn resolves_project_coordinates() {
    let interp = project().interpolator();
    assert_eq!(interp.interpolate("${project.groupId}:${project.version}"), "org.parent:1.0");
    assert_eq!(interp.interpolate("${project.parent.version}"), "3");
  }

  #[test]
  fn resolves_properties_transitively() {
    assert_eq!(project().interpolator().interpolate("x-${a}"), "x-value-b");
  }

  #[test]
  fn leaves_unknown_and_self_references() {
    let interp = project().interpolator();
    assert_eq!(interp.interpolate("${missing}"), "${missing}");
    assert_eq!(interp.interpolate("${loop}"), "${loop}");
  }

  #[test]
  fn self_growing_property_terminates() {
    let model = pom::parse_str(
      "<project><groupId>g</groupId><artifactId>app</artifactId><version>1.0</version>\
       <properties><v>1.${v}</v><x>${y}</x><y>-${x}-</y></properties></project>",
    )
    .unwrap();
    let interp = Project::new("pom.xml", model).unwrap().interpolator();

    assert_eq!(interp.interpolate("${v}"), "1.${v}");
    assert_eq!(interp.interpolate("${x}"), "-${x}-");
  }

  #[test]
  fn expression_detection() {
    assert!(is_expression("${revision}"));
    assert!(!is_expression("1.0-${qualifier}"));
  }
}
