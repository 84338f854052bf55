//! Replace property values that have a configured mapping.

use tracing::info;

use crate::project::Project;
use crate::session::Session;

pub fn apply(project: &mut Project, session: &mut Session) -> bool {
  if session.managed.mappings.is_empty() {
    return false;
  }
  let pom = project.pom().to_path_buf();
  let mut changed = false;

  for section in project.model_mut().sections_mut() {
    let updates: Vec<(String, String)> = section
      .properties
      .iter()
      .filter_map(|(key, value)| {
        let mapped = session.managed.mappings.get(key)?;
        (mapped != value).then(|| (key.to_string(), mapped))
      })
      .collect();

    for (key, value) in updates {
      let old = section.properties.set(&key, &value);
      info!(pom = %pom.display(), property = %key, to = %value, "replacing property");
      session.changes.log(
        &pom,
        format!("property {}: {} -> {}", key, old.as_deref().unwrap_or(""), value),
      );
      changed = true;
    }
  }
  changed
}
