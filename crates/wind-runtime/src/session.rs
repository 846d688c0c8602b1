//! Play/stop session controller
//!
//! One [`Session`] runs the full protocol against the WinD module once:
//!
//! ```text
//! Idle → Loaded → Resolved → Playing → Stopped → Released
//!   └───────┴─────────┴──────────┴─────────┴──→ Failed
//! ```
//!
//! The library handle is released exactly once before [`Session::run`]
//! returns, whichever state the session reached. Nothing is retried.

use crate::ffi::{
    Abi, CArg, CallError, CallFailure, EncodingError, ExternFunction, ExternType, LibraryHandle,
    LoadError, NativeLoader, ReleaseError, ResolveError, WideString,
};
use log::{debug, error};
use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Exported name of the play entry point
pub const PLAY_SYMBOL: &str = "play_audio";
/// Exported name of the stop entry point
pub const STOP_SYMBOL: &str = "stop_audio";

/// Module loaded when no path is configured
pub const DEFAULT_LIBRARY: &str = "winD.dll";
/// Sound played when no file is configured
pub const DEFAULT_SOUND_FILE: &str = r"C:\Windows\Media\Windows Background.wav";
/// Wait between play and stop
pub const DEFAULT_STOP_DELAY: Duration = Duration::from_millis(500);

pub const PLAYING_MESSAGE: &str = "Playing sound...";
pub const STOPPED_MESSAGE: &str = "Sound stopped";

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
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

    #[error("Session already ran (state: {0:?})")]
    AlreadyRun(SessionState),
}

impl SessionError {
    /// The nonzero result that ended the session, if that is what ended it
    pub fn call_failure(&self) -> Option<&CallFailure> {
        match self {
            SessionError::Failure(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Loaded,
    Resolved,
    Playing,
    Stopped,
    Released,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Released | SessionState::Failed)
    }
}

/// What a session plays and how long it waits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Native module to load
    pub library_path: PathBuf,
    /// Sound file handed to `play_audio`
    pub sound_file: PathBuf,
    /// Fixed wait between `play_audio` and `stop_audio`
    pub stop_delay: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            library_path: PathBuf::from(DEFAULT_LIBRARY),
            sound_file: PathBuf::from(DEFAULT_SOUND_FILE),
            stop_delay: DEFAULT_STOP_DELAY,
        }
    }
}

/// One-shot play/stop session over a [`NativeLoader`]
pub struct Session<'l, L: NativeLoader> {
    loader: &'l L,
    options: SessionOptions,
    state: SessionState,
    history: Vec<SessionState>,
}

impl<'l, L: NativeLoader> Session<'l, L> {
    pub fn new(loader: &'l L, options: SessionOptions) -> Self {
        Self {
            loader,
            options,
            state: SessionState::Idle,
            history: vec![SessionState::Idle],
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Run the protocol, writing status lines to `out`
    ///
    /// Ends in `Released` on success and `Failed` otherwise. A nonzero result
    /// code is reported to `out` as `<procedure> failed` before returning.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyRun(self.state));
        }

        match self.drive(out) {
            Ok(()) => {
                self.transition(SessionState::Released);
                Ok(())
            }
            Err(e) => {
                self.transition(SessionState::Failed);
                error!("session failed: {}", e);
                if let Some(failure) = e.call_failure() {
                    error!("{} returned {}", failure.procedure, failure.code);
                    writeln!(out, "{}", failure)?;
                }
                Err(e)
            }
        }
    }

    fn drive<W: Write>(&mut self, out: &mut W) -> Result<(), SessionError> {
        let handle = LibraryHandle::open(self.loader, &self.options.library_path)?;
        self.transition(SessionState::Loaded);
        self.play_then_stop(&handle, out)?;
        handle.close()?;
        Ok(())
    }

    fn play_then_stop<W: Write>(
        &mut self,
        handle: &LibraryHandle<'l, L>,
        out: &mut W,
    ) -> Result<(), SessionError> {
        // SAFETY: both signatures are the documented WinD exports.
        let (play, stop) = unsafe {
            (
                ExternFunction::new(
                    handle.resolve(PLAY_SYMBOL)?,
                    vec![ExternType::WideStr],
                    ExternType::Int,
                    Abi::System,
                ),
                ExternFunction::new(
                    handle.resolve(STOP_SYMBOL)?,
                    vec![],
                    ExternType::Int,
                    Abi::System,
                ),
            )
        };
        self.transition(SessionState::Resolved);

        let sound_file = WideString::from_path(&self.options.sound_file)?;
        debug!("playing {}", self.options.sound_file.display());
        // SAFETY: `sound_file` is borrowed for the whole call.
        unsafe { play.call(&[CArg::WideStr(&sound_file)])? }.check(PLAY_SYMBOL)?;
        writeln!(out, "{}", PLAYING_MESSAGE)?;
        self.transition(SessionState::Playing);

        thread::sleep(self.options.stop_delay);

        // SAFETY: see above.
        unsafe { stop.call(&[])? }.check(STOP_SYMBOL)?;
        writeln!(out, "{}", STOPPED_MESSAGE)?;
        self.transition(SessionState::Stopped);
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        debug!("session {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
    }
}
