//! Shared test fixtures: an in-process stand-in for the WinD module
//!
//! `RecordingLoader` serves Rust `extern` functions as "exported" procedures
//! and records every load/resolve/release. The procedures log into a
//! thread-local journal so parallel tests stay isolated.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::os::raw::c_int;
use std::path::{Path, PathBuf};
use wind_runtime::{CharInfo, LoadError, NativeLoader, ReleaseError, ResolveError};

/// Reason reported by a loader built with [`RecordingLoader::failing_release`]
pub const RELEASE_FAILURE: &str = "module busy";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Load(PathBuf),
    Resolve(String),
    Release(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Play(String),
    Stop,
    Write {
        text: String,
        len: u32,
        cursor_persist: i8,
    },
    Render {
        cells: Vec<CharInfo>,
        len: u32,
        rows: i16,
        cols: i16,
        x: i16,
        y: i16,
    },
}

thread_local! {
    static CALLS: RefCell<Vec<Call>> = const { RefCell::new(Vec::new()) };
}

pub fn take_calls() -> Vec<Call> {
    CALLS.with(|calls| std::mem::take(&mut *calls.borrow_mut()))
}

fn record(call: Call) {
    CALLS.with(|calls| calls.borrow_mut().push(call));
}

unsafe fn read_wide(ptr: *const u16) -> String {
    let mut len = 0;
    while *ptr.add(len) != 0 {
        len += 1;
    }
    String::from_utf16_lossy(std::slice::from_raw_parts(ptr, len))
}

pub extern "system" fn play_ok(path: *const u16) -> c_int {
    record(Call::Play(unsafe { read_wide(path) }));
    0
}

pub extern "system" fn play_fails(path: *const u16) -> c_int {
    record(Call::Play(unsafe { read_wide(path) }));
    5
}

pub extern "system" fn stop_ok() -> c_int {
    record(Call::Stop);
    0
}

pub extern "system" fn stop_fails() -> c_int {
    record(Call::Stop);
    -1
}

pub extern "C" fn write_ok(text: *const u16, len: u32, cursor_persist: i8) -> c_int {
    let units = unsafe { std::slice::from_raw_parts(text, len as usize) };
    record(Call::Write {
        text: String::from_utf16_lossy(units),
        len,
        cursor_persist,
    });
    0
}

pub extern "C" fn write_fails(text: *const u16, len: u32, cursor_persist: i8) -> c_int {
    write_ok(text, len, cursor_persist);
    1
}

pub extern "system" fn render_ok(
    cells: *const CharInfo,
    len: u32,
    rows: i16,
    cols: i16,
    x: i16,
    y: i16,
) -> c_int {
    let cells = unsafe { std::slice::from_raw_parts(cells, len as usize) };
    record(Call::Render {
        cells: cells.to_vec(),
        len,
        rows,
        cols,
        x,
        y,
    });
    0
}

pub extern "system" fn render_fails(
    cells: *const CharInfo,
    len: u32,
    rows: i16,
    cols: i16,
    x: i16,
    y: i16,
) -> c_int {
    render_ok(cells, len, rows, cols, x, y);
    -1
}

/// Fake loader with a configurable export table
#[derive(Default)]
pub struct RecordingLoader {
    exports: HashMap<&'static str, *const ()>,
    missing_library: bool,
    failing_release: bool,
    next_id: RefCell<u32>,
    events: RefCell<Vec<Event>>,
}

impl RecordingLoader {
    /// Module exporting working `play_audio` and `stop_audio`
    pub fn wind() -> Self {
        Self::default()
            .export("play_audio", play_ok as *const ())
            .export("stop_audio", stop_ok as *const ())
    }

    /// Module whose file cannot be found
    pub fn missing() -> Self {
        Self {
            missing_library: true,
            ..Self::default()
        }
    }

    /// Loader whose `release` is recorded but reports an OS failure
    pub fn failing_release(mut self) -> Self {
        self.failing_release = true;
        self
    }

    pub fn export(mut self, name: &'static str, ptr: *const ()) -> Self {
        self.exports.insert(name, ptr);
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.exports.remove(name);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn release_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Release(_)))
            .count()
    }

    pub fn load_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Load(_)))
            .count()
    }
}

impl NativeLoader for RecordingLoader {
    type Module = u32;

    fn load(&self, path: &Path) -> Result<u32, LoadError> {
        if self.missing_library {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }
        self.events.borrow_mut().push(Event::Load(path.to_path_buf()));
        let mut next_id = self.next_id.borrow_mut();
        *next_id += 1;
        Ok(*next_id)
    }

    fn resolve(&self, _module: &u32, name: &str) -> Result<*const (), ResolveError> {
        self.events
            .borrow_mut()
            .push(Event::Resolve(name.to_string()));
        self.exports
            .get(name)
            .copied()
            .ok_or_else(|| ResolveError::NotFound {
                library: PathBuf::from("winD.dll"),
                symbol: name.to_string(),
            })
    }

    fn release(&self, module: u32) -> Result<(), ReleaseError> {
        self.events.borrow_mut().push(Event::Release(module));
        if self.failing_release {
            return Err(ReleaseError {
                path: PathBuf::from("winD.dll"),
                reason: RELEASE_FAILURE.to_string(),
            });
        }
        Ok(())
    }
}
