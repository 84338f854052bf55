//! Conversion between the generic element tree and the typed [`Model`].

use super::PomError;
use super::model::{
  Build, Dependency, DependencyManagement, Exclusion, Extension, Model, ModelBase, Parent, Plugin, PluginManagement,
  Profile, Properties, ReportPlugin, Reporting,
};
use super::xml::XmlNode;

const PROJECT_ORDER: &[&str] = &[
  "modelVersion",
  "parent",
  "groupId",
  "artifactId",
  "version",
  "packaging",
  "name",
  "description",
  "url",
  "inceptionYear",
  "organization",
  "licenses",
  "developers",
  "contributors",
  "mailingLists",
  "prerequisites",
  "modules",
  "scm",
  "issueManagement",
  "ciManagement",
  "distributionManagement",
  "properties",
  "dependencyManagement",
  "dependencies",
  "repositories",
  "pluginRepositories",
  "build",
  "reporting",
  "profiles",
];

const PROFILE_ORDER: &[&str] = &[
  "id",
  "activation",
  "build",
  "modules",
  "distributionManagement",
  "properties",
  "dependencyManagement",
  "dependencies",
  "repositories",
  "pluginRepositories",
  "reporting",
];

const BUILD_ORDER: &[&str] = &[
  "sourceDirectory",
  "scriptSourceDirectory",
  "testSourceDirectory",
  "outputDirectory",
  "testOutputDirectory",
  "extensions",
  "defaultGoal",
  "resources",
  "testResources",
  "directory",
  "finalName",
  "filters",
  "pluginManagement",
  "plugins",
];

const PLUGIN_ORDER: &[&str] = &[
  "groupId",
  "artifactId",
  "version",
  "extensions",
  "executions",
  "dependencies",
  "goals",
  "inherited",
  "configuration",
];

const DEPENDENCY_ORDER: &[&str] = &[
  "groupId",
  "artifactId",
  "version",
  "type",
  "classifier",
  "scope",
  "systemPath",
  "exclusions",
  "optional",
];

/// Stable-sort children into schema order. Unknown elements go last.
fn order_children(children: &mut [XmlNode], order: &[&str]) {
  children.sort_by_key(|node| order.iter().position(|n| *n == node.name).unwrap_or(order.len()));
}

fn text(node: &XmlNode) -> String {
  node.text.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn opt_text(node: &XmlNode) -> Option<String> {
  Some(text(node)).filter(|t| !t.is_empty())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

pub fn model_from_node(root: XmlNode) -> Result<Model, PomError> {
  if root.name != "project" {
    return Err(PomError::NotAProject(root.name));
  }

  let mut model = Model {
    attributes: root.attributes,
    ..Default::default()
  };
  let mut artifact_id = None;

  for node in root.children {
    match node.name.as_str() {
      "modelVersion" => model.model_version = opt_text(&node),
      "parent" => model.parent = Some(parent_from_node(&node)?),
      "groupId" => model.group_id = opt_text(&node),
      "artifactId" => artifact_id = opt_text(&node),
      "version" => model.version = opt_text(&node),
      "packaging" => model.packaging = opt_text(&node),
      "profiles" => {
        for profile in node.children.into_iter().filter(|c| c.name == "profile") {
          model.profiles.push(profile_from_node(profile));
        }
      }
      _ => {
        if let Some(unused) = absorb_base(&mut model.base, node) {
          model.extra.push(unused);
        }
      }
    }
  }

  model.artifact_id = artifact_id.ok_or(PomError::MissingElement("artifactId"))?;
  Ok(model)
}

fn parent_from_node(node: &XmlNode) -> Result<Parent, PomError> {
  let field = |name: &'static str| {
    node
      .child(name)
      .and_then(opt_text)
      .ok_or(PomError::MissingElement(name))
  };
  Ok(Parent {
    group_id: field("groupId")?,
    artifact_id: field("artifactId")?,
    version: field("version")?,
    relative_path: node.child("relativePath").map(text),
  })
}

fn profile_from_node(node: XmlNode) -> Profile {
  let mut profile = Profile::default();
  for child in node.children {
    match child.name.as_str() {
      "id" => profile.id = opt_text(&child),
      "activation" => profile.activation = Some(child),
      _ => {
        if let Some(unused) = absorb_base(&mut profile.base, child) {
          profile.extra.push(unused);
        }
      }
    }
  }
  profile
}

/// Consume a node belonging to [`ModelBase`], or hand it back.
fn absorb_base(base: &mut ModelBase, node: XmlNode) -> Option<XmlNode> {
  match node.name.as_str() {
    "properties" => {
      base.properties = node.children.iter().map(|c| (c.name.clone(), text(c))).collect::<Properties>();
    }
    "dependencies" => base.dependencies = dependencies_from_node(&node),
    "dependencyManagement" => {
      base.dependency_management = Some(DependencyManagement {
        dependencies: node.child("dependencies").map(dependencies_from_node).unwrap_or_default(),
      });
    }
    "repositories" => base.repositories = Some(node),
    "pluginRepositories" => base.plugin_repositories = Some(node),
    "build" => base.build = Some(build_from_node(node)),
    "reporting" => base.reporting = Some(reporting_from_node(node)),
    _ => return Some(node),
  }
  None
}

fn dependencies_from_node(node: &XmlNode) -> Vec<Dependency> {
  node
    .children
    .iter()
    .filter(|c| c.name == "dependency")
    .map(dependency_from_node)
    .collect()
}

fn dependency_from_node(node: &XmlNode) -> Dependency {
  let mut dep = Dependency::default();
  for child in &node.children {
    match child.name.as_str() {
      "groupId" => dep.group_id = text(child),
      "artifactId" => dep.artifact_id = text(child),
      "version" => dep.version = opt_text(child),
      "type" => dep.type_ = opt_text(child),
      "classifier" => dep.classifier = opt_text(child),
      "scope" => dep.scope = opt_text(child),
      "optional" => dep.optional = opt_text(child),
      "exclusions" => {
        dep.exclusions = child
          .children
          .iter()
          .map(|ex| Exclusion {
            group_id: ex.child("groupId").map(text).unwrap_or_default(),
            artifact_id: ex.child("artifactId").map(text).unwrap_or_default(),
          })
          .collect();
      }
      _ => dep.extra.push(child.clone()),
    }
  }
  dep
}

fn build_from_node(node: XmlNode) -> Build {
  let mut build = Build::default();
  for child in node.children {
    match child.name.as_str() {
      "plugins" => build.plugins = plugins_from_node(child),
      "pluginManagement" => {
        let plugins = child
          .children
          .into_iter()
          .find(|c| c.name == "plugins")
          .map(plugins_from_node)
          .unwrap_or_default();
        build.plugin_management = Some(PluginManagement { plugins });
      }
      "extensions" => {
        build.extensions = child
          .children
          .iter()
          .map(|ext| Extension {
            group_id: ext.child("groupId").map(text).unwrap_or_default(),
            artifact_id: ext.child("artifactId").map(text).unwrap_or_default(),
            version: ext.child("version").and_then(opt_text),
          })
          .collect();
      }
      _ => build.extra.push(child),
    }
  }
  build
}

fn plugins_from_node(node: XmlNode) -> Vec<Plugin> {
  node
    .children
    .into_iter()
    .filter(|c| c.name == "plugin")
    .map(|plugin_node| {
      let mut plugin = Plugin::default();
      for child in plugin_node.children {
        match child.name.as_str() {
          "groupId" => plugin.group_id = opt_text(&child),
          "artifactId" => plugin.artifact_id = text(&child),
          "version" => plugin.version = opt_text(&child),
          "dependencies" => plugin.dependencies = dependencies_from_node(&child),
          "executions" => plugin.executions = Some(child),
          "configuration" => plugin.configuration = Some(child),
          _ => plugin.extra.push(child),
        }
      }
      plugin
    })
    .collect()
}

fn reporting_from_node(node: XmlNode) -> Reporting {
  let mut reporting = Reporting::default();
  for child in node.children {
    if child.name != "plugins" {
      reporting.extra.push(child);
      continue;
    }
    for plugin_node in child.children.into_iter().filter(|c| c.name == "plugin") {
      let mut plugin = ReportPlugin::default();
      for field in plugin_node.children {
        match field.name.as_str() {
          "groupId" => plugin.group_id = opt_text(&field),
          "artifactId" => plugin.artifact_id = text(&field),
          "version" => plugin.version = opt_text(&field),
          _ => plugin.extra.push(field),
        }
      }
      reporting.plugins.push(plugin);
    }
  }
  reporting
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

pub fn model_to_node(model: &Model) -> XmlNode {
  let mut root = XmlNode::new("project");
  root.attributes = model.attributes.clone();

  root.push_leaf("modelVersion", model.model_version.as_deref());
  if let Some(parent) = &model.parent {
    let mut node = XmlNode::new("parent");
    node.push_leaf("groupId", Some(&parent.group_id));
    node.push_leaf("artifactId", Some(&parent.artifact_id));
    node.push_leaf("version", Some(&parent.version));
    node.push_leaf("relativePath", parent.relative_path.as_deref());
    root.children.push(node);
  }
  root.push_leaf("groupId", model.group_id.as_deref());
  root.push_leaf("artifactId", Some(&model.artifact_id));
  root.push_leaf("version", model.version.as_deref());
  root.push_leaf("packaging", model.packaging.as_deref());

  base_to_nodes(&model.base, &mut root.children);
  root.children.extend(model.extra.iter().cloned());

  if !model.profiles.is_empty() {
    let mut profiles = XmlNode::new("profiles");
    for profile in &model.profiles {
      let mut node = XmlNode::new("profile");
      node.push_leaf("id", profile.id.as_deref());
      if let Some(activation) = &profile.activation {
        node.children.push(activation.clone());
      }
      base_to_nodes(&profile.base, &mut node.children);
      node.children.extend(profile.extra.iter().cloned());
      order_children(&mut node.children, PROFILE_ORDER);
      profiles.children.push(node);
    }
    root.children.push(profiles);
  }

  order_children(&mut root.children, PROJECT_ORDER);
  root
}

fn base_to_nodes(base: &ModelBase, out: &mut Vec<XmlNode>) {
  if !base.properties.is_empty() {
    let mut props = XmlNode::new("properties");
    for (key, value) in base.properties.iter() {
      props.children.push(XmlNode::leaf(key, value));
    }
    out.push(props);
  }
  if let Some(dm) = &base.dependency_management {
    out.push(XmlNode::new("dependencyManagement").with_child(dependencies_to_node(&dm.dependencies)));
  }
  if !base.dependencies.is_empty() {
    out.push(dependencies_to_node(&base.dependencies));
  }
  if let Some(repos) = &base.repositories {
    out.push(repos.clone());
  }
  if let Some(repos) = &base.plugin_repositories {
    out.push(repos.clone());
  }
  if let Some(build) = &base.build {
    out.push(build_to_node(build));
  }
  if let Some(reporting) = &base.reporting {
    out.push(reporting_to_node(reporting));
  }
}

fn dependencies_to_node(deps: &[Dependency]) -> XmlNode {
  let mut node = XmlNode::new("dependencies");
  node.children = deps.iter().map(dependency_to_node).collect();
  node
}

fn dependency_to_node(dep: &Dependency) -> XmlNode {
  let mut node = XmlNode::new("dependency");
  node.push_leaf("groupId", Some(&dep.group_id));
  node.push_leaf("artifactId", Some(&dep.artifact_id));
  node.push_leaf("version", dep.version.as_deref());
  node.push_leaf("type", dep.type_.as_deref());
  node.push_leaf("classifier", dep.classifier.as_deref());
  node.push_leaf("scope", dep.scope.as_deref());
  node.push_leaf("optional", dep.optional.as_deref());
  if !dep.exclusions.is_empty() {
    let mut exclusions = XmlNode::new("exclusions");
    for ex in &dep.exclusions {
      exclusions.children.push(
        XmlNode::new("exclusion")
          .with_child(XmlNode::leaf("groupId", &ex.group_id))
          .with_child(XmlNode::leaf("artifactId", &ex.artifact_id)),
      );
    }
    node.children.push(exclusions);
  }
  node.children.extend(dep.extra.iter().cloned());
  order_children(&mut node.children, DEPENDENCY_ORDER);
  node
}

fn build_to_node(build: &Build) -> XmlNode {
  let mut node = XmlNode::new("build");
  node.children.extend(build.extra.iter().cloned());
  if !build.extensions.is_empty() {
    let mut extensions = XmlNode::new("extensions");
    for ext in &build.extensions {
      let mut ext_node = XmlNode::new("extension");
      ext_node.push_leaf("groupId", Some(&ext.group_id));
      ext_node.push_leaf("artifactId", Some(&ext.artifact_id));
      ext_node.push_leaf("version", ext.version.as_deref());
      extensions.children.push(ext_node);
    }
    node.children.push(extensions);
  }
  if let Some(pm) = &build.plugin_management {
    node
      .children
      .push(XmlNode::new("pluginManagement").with_child(plugins_to_node(&pm.plugins)));
  }
  if !build.plugins.is_empty() {
    node.children.push(plugins_to_node(&build.plugins));
  }
  order_children(&mut node.children, BUILD_ORDER);
  node
}

fn plugins_to_node(plugins: &[Plugin]) -> XmlNode {
  let mut node = XmlNode::new("plugins");
  for plugin in plugins {
    let mut plugin_node = XmlNode::new("plugin");
    plugin_node.push_leaf("groupId", plugin.group_id.as_deref());
    plugin_node.push_leaf("artifactId", Some(&plugin.artifact_id));
    plugin_node.push_leaf("version", plugin.version.as_deref());
    if let Some(executions) = &plugin.executions {
      plugin_node.children.push(executions.clone());
    }
    if !plugin.dependencies.is_empty() {
      plugin_node.children.push(dependencies_to_node(&plugin.dependencies));
    }
    if let Some(configuration) = &plugin.configuration {
      plugin_node.children.push(configuration.clone());
    }
    plugin_node.children.extend(plugin.extra.iter().cloned());
    order_children(&mut plugin_node.children, PLUGIN_ORDER);
    node.children.push(plugin_node);
  }
  node
}

fn reporting_to_node(reporting: &Reporting) -> XmlNode {
  let mut node = XmlNode::new("reporting");
  node.children.extend(reporting.extra.iter().cloned());
  if !reporting.plugins.is_empty() {
    let mut plugins = XmlNode::new("plugins");
    for plugin in &reporting.plugins {
      let mut plugin_node = XmlNode::new("plugin");
      plugin_node.push_leaf("groupId", plugin.group_id.as_deref());
      plugin_node.push_leaf("artifactId", Some(&plugin.artifact_id));
      plugin_node.push_leaf("version", plugin.version.as_deref());
      plugin_node.children.extend(plugin.extra.iter().cloned());
      plugins.children.push(plugin_node);
    }
    node.children.push(plugins);
  }
  node
}
