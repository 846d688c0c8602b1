//! Render command - draw lines of text into a console frame via render_frame

use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use wind_runtime::console::color::{
    BACKGROUND_BLUE, BACKGROUND_YELLOW, FOREGROUND_RED, FOREGROUND_WHITE,
};
use wind_runtime::console::{self, Frame};
use wind_runtime::{CharInfo, DynamicLoader};

/// Drawn when no lines are given
pub const BANNER: [&str; 6] = [
    "██     ██ ██ ███    ██ ██████  ",
    "██     ██ ██ ████   ██ ██   ██ ",
    "██     ██ ██ ██ ██  ██ ██   ██ ",
    "██  █  ██ ██ ██  ██ ██ ██   ██ ",
    "██ ███ ██ ██ ██   ████ ██   ██ ",
    " ███ ███  ██ ██    ███ ██████  ",
];

/// Row of the frame the first line lands on
pub const TEXT_ROW: i16 = 3;
/// Column of the frame each line starts at
pub const TEXT_COL: i16 = 4;

const BACKGROUND: u16 = BACKGROUND_BLUE | FOREGROUND_WHITE;
const TEXT: u16 = BACKGROUND_YELLOW | FOREGROUND_RED;

/// Where the frame goes and how big it is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub rows: i16,
    pub cols: i16,
    pub x: i16,
    pub y: i16,
}

/// Blue frame with `lines` overlaid from (`TEXT_ROW`, `TEXT_COL`)
pub fn build_frame(rows: i16, cols: i16, lines: &[String]) -> Result<Frame> {
    let mut frame = Frame::new(rows, cols, CharInfo::new(u16::from(b' '), BACKGROUND))?;

    let banner: Vec<String>;
    let lines = if lines.is_empty() {
        banner = BANNER.iter().map(|line| line.to_string()).collect();
        banner.as_slice()
    } else {
        lines
    };

    for (row, line) in (TEXT_ROW..frame.rows()).zip(lines) {
        frame.put_str(row, TEXT_COL, line, TEXT);
    }
    Ok(frame)
}

pub fn run(library_path: &Path, placement: Placement, lines: &[String]) -> Result<()> {
    let frame = build_frame(placement.rows, placement.cols, lines)?;

    let loader = DynamicLoader::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    console::render_frame(
        &loader,
        library_path,
        &frame,
        placement.x,
        placement.y,
        &mut out,
    )
    .with_context(|| format!("Rendering through {} failed", library_path.display()))
}
