//! Console output through the module's `write_text` and `render_frame`
//!
//! - `write_text(WCHAR* buffer, DWORD len, CHAR cursor_persist) -> int`
//!   renders UTF-16 text, ANSI escape sequences included. C ABI.
//! - `render_frame(CHAR_INFO* buffer, DWORD len, SHORT rows, SHORT cols,
//!   SHORT x, SHORT y) -> int` blits a rows × cols grid of cells with its
//!   top-left corner at screen position (x, y). System ABI; returns -1 on
//!   failure.
//!
//! Both are one-shot: load the module, make one call, release it.

use crate::ffi::{
    Abi, CArg, CallError, CallFailure, CharInfo, EncodingError, ExternFunction, ExternType,
    LibraryHandle, LoadError, NativeLoader, ReleaseError, ResolveError, WideString,
};
use log::{debug, error};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

/// Exported name of the text entry point
pub const WRITE_SYMBOL: &str = "write_text";
/// Exported name of the frame entry point
pub const RENDER_SYMBOL: &str = "render_frame";

/// Win32 console character attributes
pub mod color {
    pub const FOREGROUND_BLUE: u16 = 0x0001;
    pub const FOREGROUND_GREEN: u16 = 0x0002;
    pub const FOREGROUND_CYAN: u16 = 0x0003;
    pub const FOREGROUND_RED: u16 = 0x0004;
    pub const FOREGROUND_YELLOW: u16 = 0x0006;
    pub const FOREGROUND_WHITE: u16 = 0x000F;

    pub const BACKGROUND_BLUE: u16 = 0x0010;
    pub const BACKGROUND_GREEN: u16 = 0x0020;
    pub const BACKGROUND_RED: u16 = 0x0040;
    pub const BACKGROUND_MAGENTA: u16 = 0x0050;
    pub const BACKGROUND_YELLOW: u16 = 0x0060;
    pub const BACKGROUND_WHITE: u16 = 0x0070;
}

/// Console operation errors
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error(transparent)]
    Failure(#[from] CallFailure),

    #[error(transparent)]
    Release(#[from] ReleaseError),

    #[error("Failed to write status: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid frame size {rows}x{cols}: rows and columns must be positive")]
    InvalidFrame { rows: i16, cols: i16 },
}

impl ConsoleError {
    /// The nonzero result that ended the operation, if that is what ended it
    pub fn call_failure(&self) -> Option<&CallFailure> {
        match self {
            ConsoleError::Failure(failure) => Some(failure),
            _ => None,
        }
    }
}

const REPLACEMENT_UNIT: u16 = 0xFFFD;

/// A rows × cols grid of console cells, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    rows: i16,
    cols: i16,
    cells: Vec<CharInfo>,
}

impl Frame {
    /// A frame with every cell set to `fill`
    pub fn new(rows: i16, cols: i16, fill: CharInfo) -> Result<Self, ConsoleError> {
        if rows <= 0 || cols <= 0 {
            return Err(ConsoleError::InvalidFrame { rows, cols });
        }
        let len = rows as usize * cols as usize;
        Ok(Self {
            rows,
            cols,
            cells: vec![fill; len],
        })
    }

    pub fn rows(&self) -> i16 {
        self.rows
    }

    pub fn cols(&self) -> i16 {
        self.cols
    }

    pub fn cells(&self) -> &[CharInfo] {
        &self.cells
    }

    pub fn get(&self, row: i16, col: i16) -> Option<CharInfo> {
        self.index(i32::from(row), i32::from(col))
            .map(|idx| self.cells[idx])
    }

    /// Overlay `text` starting at (`row`, `col`), one cell per character
    ///
    /// Cells falling outside the frame are dropped. Characters outside the
    /// Basic Multilingual Plane become U+FFFD.
    pub fn put_str(&mut self, row: i16, col: i16, text: &str, attributes: u16) {
        let row = i32::from(row);
        for (col, ch) in (i32::from(col)..).zip(text.chars()) {
            if let Some(idx) = self.index(row, col) {
                let mut units = [0u16; 2];
                let unit = match ch.encode_utf16(&mut units) {
                    [single] => *single,
                    _ => REPLACEMENT_UNIT,
                };
                self.cells[idx] = CharInfo::new(unit, attributes);
            }
        }
    }

    fn index(&self, row: i32, col: i32) -> Option<usize> {
        let in_bounds = (0..i32::from(self.rows)).contains(&row)
            && (0..i32::from(self.cols)).contains(&col);
        in_bounds.then(|| row as usize * self.cols as usize + col as usize)
    }
}

/// Load the module at `library_path`, write `text` once, release the module
///
/// A nonzero result is reported to `out` as `write_text failed`.
pub fn write_text<L: NativeLoader, W: Write>(
    loader: &L,
    library_path: &Path,
    text: &str,
    cursor_persist: bool,
    out: &mut W,
) -> Result<(), ConsoleError> {
    run_once(loader, library_path, WRITE_SYMBOL, out, |handle| {
        invoke_write(handle, text, cursor_persist)
    })
}

/// Load the module at `library_path`, draw `frame` once at screen
/// position (`x`, `y`), release the module
///
/// A nonzero result is reported to `out` as `render_frame failed`.
pub fn render_frame<L: NativeLoader, W: Write>(
    loader: &L,
    library_path: &Path,
    frame: &Frame,
    x: i16,
    y: i16,
    out: &mut W,
) -> Result<(), ConsoleError> {
    run_once(loader, library_path, RENDER_SYMBOL, out, |handle| {
        invoke_render(handle, frame, x, y)
    })
}

fn run_once<'l, L, W, F>(
    loader: &'l L,
    library_path: &Path,
    procedure: &str,
    out: &mut W,
    invoke: F,
) -> Result<(), ConsoleError>
where
    L: NativeLoader,
    W: Write,
    F: FnOnce(&LibraryHandle<'l, L>) -> Result<(), ConsoleError>,
{
    let handle = LibraryHandle::open(loader, library_path)?;

    if let Err(e) = invoke(&handle) {
        error!("{} failed: {}", procedure, e);
        if let Some(failure) = e.call_failure() {
            writeln!(out, "{}", failure)?;
        }
        return Err(e);
    }

    handle.close()?;
    Ok(())
}

fn invoke_write<L: NativeLoader>(
    handle: &LibraryHandle<'_, L>,
    text: &str,
    cursor_persist: bool,
) -> Result<(), ConsoleError> {
    // SAFETY: documented WinD export, `int __cdecl write_text(WCHAR*, DWORD, CHAR)`.
    let write = unsafe {
        ExternFunction::new(
            handle.resolve(WRITE_SYMBOL)?,
            vec![ExternType::WideStr, ExternType::DWord, ExternType::Char],
            ExternType::Int,
            Abi::C,
        )
    };

    let buffer = WideString::encode(text)?;
    let len = buffer.len_dword()?;
    debug!("writing {} UTF-16 units", len);

    let args = [
        CArg::WideStr(&buffer),
        CArg::DWord(len),
        CArg::Char(i8::from(cursor_persist)),
    ];
    // SAFETY: `buffer` is borrowed for the whole call.
    unsafe { write.call(&args)? }.check(WRITE_SYMBOL)?;
    Ok(())
}

fn invoke_render<L: NativeLoader>(
    handle: &LibraryHandle<'_, L>,
    frame: &Frame,
    x: i16,
    y: i16,
) -> Result<(), ConsoleError> {
    // SAFETY: documented WinD export,
    // `int render_frame(CHAR_INFO*, DWORD, SHORT, SHORT, SHORT, SHORT)`.
    let render = unsafe {
        ExternFunction::new(
            handle.resolve(RENDER_SYMBOL)?,
            vec![
                ExternType::CharInfoBuf,
                ExternType::DWord,
                ExternType::Short,
                ExternType::Short,
                ExternType::Short,
                ExternType::Short,
            ],
            ExternType::Int,
            Abi::System,
        )
    };

    let len = u32::try_from(frame.cells().len()).map_err(|_| ConsoleError::InvalidFrame {
        rows: frame.rows(),
        cols: frame.cols(),
    })?;
    debug!(
        "rendering {}x{} frame at ({}, {})",
        frame.rows(),
        frame.cols(),
        x,
        y
    );

    let args = [
        CArg::CharInfoBuf(frame.cells()),
        CArg::DWord(len),
        CArg::Short(frame.rows()),
        CArg::Short(frame.cols()),
        CArg::Short(x),
        CArg::Short(y),
    ];
    // SAFETY: `frame` holds exactly `len` cells and is borrowed for the whole call.
    unsafe { render.call(&args)? }.check(RENDER_SYMBOL)?;
    Ok(())
}
