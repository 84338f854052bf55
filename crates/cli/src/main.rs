mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::output::{OutputFormat, print_error};

/// pomalign - align Maven POMs with a platform BOM and toolchain
#[derive(Parser, Debug, Default)]
#[command(name = "pomalign")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
  /// POM file or directory to process (overrides `target` in the config file)
  pub target: Option<PathBuf>,

  /// TOML configuration file; flags override its values
  #[arg(short = 'C', long)]
  pub config: Option<PathBuf>,

  /// BOM to align against; repeat for several, the first listed wins
  #[arg(short, long = "bom")]
  pub boms: Vec<PathBuf>,

  /// Toolchain descriptor managing parent and plugin versions
  #[arg(short, long)]
  pub toolchain: Option<PathBuf>,

  /// Suffix appended to project versions
  #[arg(short, long, allow_hyphen_values = true)]
  pub suffix: Option<String>,

  /// Version rewrite as `pattern:replacement`
  #[arg(long)]
  pub version_modifier: Option<String>,

  /// Write mapped versions in place instead of deferring to the imported BOMs
  #[arg(long)]
  pub strict: bool,

  /// Modders to run: a list replaces the standard set, `+name` adds to it
  #[arg(short, long)]
  pub modifications: Vec<String>,

  /// Plugins (`groupId:artifactId`) to remove
  #[arg(short, long = "remove-plugins")]
  pub remove_plugins: Vec<String>,

  /// Modules (`groupId:artifactId`, each part a regex) whose test dependencies are disabled
  #[arg(long)]
  pub remove_tests: Vec<String>,

  /// Build extensions (`groupId:artifactId`) to keep
  #[arg(long)]
  pub extensions_whitelist: Vec<String>,

  /// Relocation `g:a=g:a:v`; repeatable
  #[arg(short = 'R', long = "relocate")]
  pub relocations: Vec<String>,

  /// Property mapping `key=value`; repeatable
  #[arg(short = 'P', long = "property-mapping")]
  pub property_mappings: Vec<String>,

  /// Workspace directory for backups, reports and the capture POM
  #[arg(short = 'W', long)]
  pub workspace: Option<PathBuf>,

  /// Reports directory (default: <workspace>/reports)
  #[arg(short = 'Z', long)]
  pub reports: Option<PathBuf>,

  /// Write a descriptor of missing versions and unmanaged plugins to this path
  #[arg(long)]
  pub capture_pom: Option<PathBuf>,

  /// Glob selecting POMs under the target; repeatable
  #[arg(short = 'p', long = "pom-pattern")]
  pub pom_patterns: Vec<String>,

  /// Glob excluding POMs under the target
  #[arg(long)]
  pub pom_exclude: Option<String>,

  /// Back up originals to <workspace>/backups before rewriting
  #[arg(long)]
  pub preserve: bool,

  /// Write changed POMs into a repository layout under this directory
  #[arg(short = 'O', long)]
  pub relocate_output: Option<PathBuf>,

  /// List the available modders and exit
  #[arg(long)]
  pub list_modders: bool,

  /// Output format
  #[arg(short, long, value_enum, default_value_t)]
  pub output: OutputFormat,

  /// Enable verbose output
  #[arg(short, long)]
  pub verbose: bool,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = if cli.list_modders {
    cmd::cmd_list_modders(cli.output).map(|()| 0)
  } else {
    cmd::cmd_run(&cli)
  };

  match result {
    Ok(code) => ExitCode::from(code),
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
