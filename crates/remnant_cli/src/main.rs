use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use remnant_core::core_api::{Engine, Session};
use remnant_core::world::Mode;
use remnant_render::{
    WorldTextOptions, render_inspect_json, render_inspect_text, render_materials_json,
    render_materials_text, render_prisms_json, render_prisms_text, render_replace_text,
    render_segments_json, render_segments_text, render_world_json, render_world_text,
};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "remnant_se=info,remnant_core=warn";
const VERBOSE_FILTER: &str = "remnant_se=debug,remnant_core=debug";

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Log decode and edit details to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the events and possible rewards of a world save.
    Analyze {
        #[arg(value_name = "SAVE.sav")]
        path: PathBuf,
        /// Read adventure mode instead of the campaign.
        #[arg(long, short = 'a')]
        adventure: bool,
        #[arg(long)]
        json: bool,
        /// Leave out item rewards.
        #[arg(long = "no-items")]
        no_items: bool,
    },
    /// List prism segments in use and every valid segment name.
    Segments {
        #[arg(value_name = "SAVE.sav")]
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Replace every prism slot holding one segment with another.
    ReplaceSegment {
        #[arg(value_name = "SAVE.sav")]
        path: PathBuf,
        from: String,
        to: String,
        /// Where to write the edited save; defaults to the input.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Print material quantities from a profile save.
    Materials {
        #[arg(value_name = "SAVE.sav")]
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print prism levels, seeds and segments.
    Prisms {
        #[arg(value_name = "SAVE.sav")]
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List the keys under a path in the decoded document.
    Inspect {
        #[arg(value_name = "SAVE.sav")]
        path: PathBuf,
        /// Path address such as `objects[0].ProfileData.objects[0]`.
        #[arg(long, value_name = "PATH", default_value = "")]
        at: String,
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Analyze {
            path,
            adventure,
            json,
            no_items,
        } => {
            let mode = if adventure {
                Mode::Adventure
            } else {
                Mode::Campaign
            };
            info!("analyzing {mode} from {}", path.display());
            let session = open(&path);
            let events = session.analyze(mode, !no_items).unwrap_or_else(|e| {
                eprintln!("Error analyzing save: {e}");
                process::exit(1);
            });
            if events.is_empty() {
                warn!("no events found for {mode}");
                return;
            }
            info!("found {} events", events.len());
            if json {
                print_json(&render_world_json(&events));
            } else {
                let options = WorldTextOptions {
                    show_items: !no_items,
                };
                println!("{}", render_world_text(&events, options));
            }
        }
        Command::Segments { path, json } => {
            let listing = open(&path).segments();
            if json {
                print_json(&render_segments_json(&listing));
            } else {
                print!("{}", render_segments_text(&listing));
            }
        }
        Command::ReplaceSegment {
            path,
            from,
            to,
            output,
        } => {
            let mut session = open(&path);
            let outcome = session.replace_segment(&from, &to).unwrap_or_else(|e| {
                eprintln!("Error replacing segment: {e}");
                process::exit(1);
            });
            let target = output.unwrap_or_else(|| path.clone());
            if let Ok(ranges) = session.changed_ranges() {
                debug!(count = ranges.len(), "changed byte ranges: {ranges:?}");
            }
            let backup = session.save_to(&target).unwrap_or_else(|e| {
                eprintln!("Error writing {}: {e}", target.display());
                process::exit(1);
            });
            if let Some(backup) = backup {
                info!("backed up previous save to {}", backup.display());
            }
            print!("{}", render_replace_text(&outcome));
            println!("Wrote edited save to {}", target.display());
        }
        Command::Materials { path, json } => {
            let materials = open(&path).materials();
            if json {
                print_json(&render_materials_json(&materials));
            } else {
                print!("{}", render_materials_text(&materials));
            }
        }
        Command::Prisms { path, json } => {
            let prisms = open(&path).prisms();
            if json {
                print_json(&render_prisms_json(&prisms));
            } else {
                print!("{}", render_prisms_text(&prisms));
            }
        }
        Command::Inspect { path, at, json } => {
            let listing = open(&path).inspect(&at).unwrap_or_else(|e| {
                eprintln!("Error inspecting `{at}`: {e}");
                process::exit(1);
            });
            if json {
                print_json(&render_inspect_json(&listing));
            } else {
                print!("{}", render_inspect_text(&listing));
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open(path: &Path) -> Session {
    Engine::new().open_path(path).unwrap_or_else(|e| {
        eprintln!("Error reading save file: {}", path.display());
        eprintln!("  {e}");
        process::exit(1);
    })
}

fn print_json(value: &JsonValue) {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error rendering JSON output: {e}");
        process::exit(1);
    });
    println!("{rendered}");
}
