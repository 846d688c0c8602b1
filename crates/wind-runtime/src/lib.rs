//! WinD runtime
//!
//! Drives the WinD native module through its exported entry points:
//! - `play_audio` / `stop_audio` via the [`Session`] state machine
//! - `write_text` and `render_frame` via [`console`]
//!
//! Everything that touches foreign code lives in [`ffi`]. The rest of the
//! crate only sequences calls through the [`NativeLoader`] capability, so it
//! can be exercised against any loader implementation.
//!
//! # Example
//!
//! ```no_run
//! use wind_runtime::{DynamicLoader, Session, SessionOptions};
//!
//! let loader = DynamicLoader::new();
//! let mut session = Session::new(&loader, SessionOptions::default());
//! session.run(&mut std::io::stdout()).unwrap();
//! ```

pub mod console;
pub mod ffi;
pub mod session;

pub use console::{ConsoleError, Frame};
pub use ffi::{
    Abi, CallError, CallFailure, CharInfo, DynamicLoader, EncodingError, ExternFunction,
    ExternType, LibraryHandle, LoadError, NativeLoader, ProcedureAddress, ReleaseError,
    ResolveError, ResultCode, WideString,
};
pub use session::{Session, SessionError, SessionOptions, SessionState};
