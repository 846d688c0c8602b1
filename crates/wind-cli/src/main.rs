use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use wind_config::project::MAX_STOP_DELAY_MS;

mod commands;
mod config;

/// Play and stop a system sound through the WinD native module.
///
/// With no subcommand, loads ./winD.dll, plays
/// "C:\Windows\Media\Windows Background.wav" for half a second and stops it.
///
/// EXAMPLES:
///     wind                              Play the default sound
///     wind play --sound chord.wav       Play another file
///     wind play --delay-ms 2000         Let it play for two seconds
///     wind write "Hello" --cursor-persist
///     wind render                       Draw the WinD banner
///
/// CONFIGURATION:
///     wind.toml in the working directory (or any parent) overrides the
///     defaults; flags override wind.toml.
#[derive(Parser)]
#[command(name = "wind")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose logging (equivalent to RUST_LOG=debug)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a sound, wait, then stop it
    ///
    /// EXAMPLES:
    ///     wind play
    ///     wind play --library bin/winD.dll --sound ding.wav
    #[command(visible_alias = "p")]
    Play {
        /// Path to the native module
        #[arg(long, short = 'l')]
        library: Option<PathBuf>,
        /// Sound file handed to play_audio
        #[arg(long, short = 's')]
        sound: Option<PathBuf>,
        /// Milliseconds between play_audio and stop_audio (at most 60000)
        #[arg(
            long,
            short = 'd',
            value_parser = clap::value_parser!(u64).range(..=MAX_STOP_DELAY_MS)
        )]
        delay_ms: Option<u64>,
    },

    /// Write text (ANSI escapes allowed) through write_text
    ///
    /// EXAMPLES:
    ///     wind write "plain text"
    ///     wind write "$(printf '\033[31mred\033[0m')" --cursor-persist
    #[command(visible_alias = "w")]
    Write {
        /// Text to write
        text: String,
        /// Path to the native module
        #[arg(long, short = 'l')]
        library: Option<PathBuf>,
        /// Leave the cursor where the text ends
        #[arg(long, overrides_with = "no_cursor_persist")]
        cursor_persist: bool,
        /// Restore the cursor after writing, even if wind.toml says otherwise
        #[arg(long, overrides_with = "cursor_persist")]
        no_cursor_persist: bool,
    },

    /// Draw a frame of console cells through render_frame
    ///
    /// Each LINE is drawn on its own row, starting 3 rows down and 4 columns
    /// in. With no LINEs, draws the WinD banner.
    ///
    /// EXAMPLES:
    ///     wind render
    ///     wind render "hello" "world" --rows 8 --cols 20 --x 0 --y 0
    #[command(visible_alias = "r")]
    Render {
        /// Text rows to draw
        lines: Vec<String>,
        /// Path to the native module
        #[arg(long, short = 'l')]
        library: Option<PathBuf>,
        /// Frame height in cells
        #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(i16).range(1..))]
        rows: i16,
        /// Frame width in cells
        #[arg(long, default_value_t = 40, value_parser = clap::value_parser!(i16).range(1..))]
        cols: i16,
        /// Screen column of the frame's left edge
        #[arg(long, default_value_t = 95, allow_negative_numbers = true)]
        x: i16,
        /// Screen row of the frame's top edge
        #[arg(long, default_value_t = 30, allow_negative_numbers = true)]
        y: i16,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let project_config = config::load_project_config()?;

    match cli.command.unwrap_or(Commands::Play {
        library: None,
        sound: None,
        delay_ms: None,
    }) {
        Commands::Play {
            library,
            sound,
            delay_ms,
        } => {
            let flags = config::PlayFlags {
                library,
                sound,
                delay_ms,
            };
            commands::play::run(config::session_options(&project_config, flags))
        }
        Commands::Write {
            text,
            library,
            cursor_persist,
            no_cursor_persist,
        } => {
            let cursor_persist = match (cursor_persist, no_cursor_persist) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let flags = config::WriteFlags {
                library,
                cursor_persist,
            };
            let (library_path, cursor_persist) = config::write_options(&project_config, flags);
            commands::write::run(&library_path, &text, cursor_persist)
        }
        Commands::Render {
            lines,
            library,
            rows,
            cols,
            x,
            y,
        } => {
            let library_path = config::library_path(&project_config, library);
            let placement = commands::render::Placement { rows, cols, x, y };
            commands::render::run(&library_path, placement, &lines)
        }
    }
}
