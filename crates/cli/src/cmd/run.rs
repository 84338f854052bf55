//! Implementation of the default `pomalign` command.
//!
//! Merges the configuration file with command-line flags, runs the pipeline
//! and prints a summary. The exit code reflects the run status.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::debug;

use pomalign_lib::config::{Config, parse_mapping};
use pomalign_lib::manager::{self, RunOutcome, RunStatus};

use crate::Cli;
use crate::output::{
  format_duration, print_error, print_info, print_json, print_stat, print_success, print_warning, symbols,
};

/// Run the pipeline and return the process exit code.
pub fn cmd_run(cli: &Cli) -> Result<u8> {
  let config = build_config(cli)?;
  let options = config.to_options().context("Invalid configuration")?;
  let inputs = config.to_inputs().context("Invalid configuration")?;
  debug!(modders = ?options.modders, target = %inputs.target.display(), "starting run");

  let started = Instant::now();
  let outcome = manager::run(&options, &inputs).context("Run failed")?;

  if cli.output.is_json() {
    print_json(&outcome.summary())?;
  } else {
    print_outcome(&outcome, cli.verbose);
    print_stat("Reports", &options.reports_dir.display().to_string());
    print_stat("Elapsed", &format_duration(started.elapsed()));
  }

  Ok(outcome.status().exit_code())
}

/// Load the config file, if any, and apply flag overrides on top.
///
/// Scalar flags replace the file's value. List flags replace the file's
/// list, except relocations and property mappings, which add to it.
pub fn build_config(cli: &Cli) -> Result<Config> {
  let mut config = match &cli.config {
    Some(path) => Config::load(path).with_context(|| format!("Failed to load config {}", path.display()))?,
    None => Config::default(),
  };

  override_opt(&mut config.target, &cli.target);
  override_opt(&mut config.toolchain, &cli.toolchain);
  override_opt(&mut config.version_suffix, &cli.suffix);
  override_opt(&mut config.version_modifier, &cli.version_modifier);
  override_opt(&mut config.workspace, &cli.workspace);
  override_opt(&mut config.reports, &cli.reports);
  override_opt(&mut config.capture_pom, &cli.capture_pom);
  override_opt(&mut config.pom_exclude, &cli.pom_exclude);
  override_opt(&mut config.relocate_output, &cli.relocate_output);

  override_list(&mut config.boms, &cli.boms);
  override_list(&mut config.modifications, &cli.modifications);
  override_list(&mut config.removed_plugins, &cli.remove_plugins);
  override_list(&mut config.removed_tests, &cli.remove_tests);
  override_list(&mut config.extensions_whitelist, &cli.extensions_whitelist);
  override_list(&mut config.pom_patterns, &cli.pom_patterns);

  config.strict |= cli.strict;
  config.preserve_files |= cli.preserve;
  config.relocations.extend(cli.relocations.iter().cloned());
  for entry in &cli.property_mappings {
    let (key, value) = parse_mapping(entry)?;
    config.property_mappings.insert(key, value);
  }

  Ok(config)
}

fn override_opt<T: Clone>(slot: &mut Option<T>, flag: &Option<T>) {
  if let Some(value) = flag {
    *slot = Some(value.clone());
  }
}

fn override_list<T: Clone>(slot: &mut Vec<T>, flag: &[T]) {
  if !flag.is_empty() {
    *slot = flag.to_vec();
  }
}

fn print_outcome(outcome: &RunOutcome, verbose: bool) {
  let summary = outcome.summary();
  print_info(&format!("Processed {} POM(s)", summary.projects));
  print_stat("Changed", &summary.changed.len().to_string());
  print_stat("Written", &summary.written.len().to_string());
  print_stat("Missing dependency versions", &summary.missing_dependencies.to_string());
  print_stat("Missing parents", &summary.missing_parents.to_string());
  print_stat("Unmanaged plugins", &summary.unmanaged_plugins.to_string());
  print_stat("Relocations", &summary.relocations.to_string());

  if verbose && !summary.written.is_empty() {
    println!();
    println!("Written:");
    for path in &summary.written {
      println!("  {} {}", symbols::MODIFY, path.display());
    }
  }

  for error in outcome.errors() {
    print_error(&error.to_string());
  }

  match outcome.status() {
    RunStatus::Success => print_success("Alignment complete"),
    RunStatus::CaptureWritten => {
      if let Some(path) = &outcome.capture_pom {
        print_warning(&format!(
          "Governance data incomplete; capture POM written to {}",
          path.display()
        ));
      }
    }
    RunStatus::Failed => print_error(&format!("{} POM(s) could not be processed", outcome.errors().len())),
  }
}
