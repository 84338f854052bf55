//! `pomalign --list-modders`: print the modder catalog in precedence order.

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use pomalign_lib::modders::ModderKind;

use crate::output::{OutputFormat, print_json};

#[derive(Serialize)]
struct ModderEntry {
  name: &'static str,
  description: &'static str,
  standard: bool,
  implies: Vec<&'static str>,
}

pub fn cmd_list_modders(output: OutputFormat) -> Result<()> {
  let entries: Vec<ModderEntry> = ModderKind::ALL
    .into_iter()
    .map(|kind| ModderEntry {
      name: kind.name(),
      description: kind.description(),
      standard: ModderKind::STANDARD.contains(&kind),
      implies: kind.implied().iter().map(|k| k.name()).collect(),
    })
    .collect();

  if output.is_json() {
    return print_json(&entries);
  }

  let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
  for entry in &entries {
    let marker = if entry.standard { "*" } else { " " };
    println!(
      "{} {:<width$}  {}",
      marker.if_supports_color(Stream::Stdout, |s| s.green()),
      entry.name,
      entry.description,
    );
    if !entry.implies.is_empty() {
      println!("  {:<width$}  (also enables {})", "", entry.implies.join(", "));
    }
  }
  println!();
  println!("* part of the standard set");
  Ok(())
}
