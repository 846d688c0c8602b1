//! Dynamic library loading for FFI
//!
//! [`NativeLoader`] is the loader capability: open a module, look up an
//! exported procedure, release the module. [`DynamicLoader`] implements it on
//! top of `libloading`; callers hold modules through [`LibraryHandle`], which
//! releases them exactly once when it goes out of scope.

use libloading::{Library, Symbol};
use log::{debug, warn};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Library loading errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Library file does not exist
    #[error("Library not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The OS loader rejected the file (not a module, wrong architecture, denied)
    #[error("Failed to load library '{}': {reason}", .path.display())]
    LoadFailed { path: PathBuf, reason: String },
}

/// Symbol lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Symbol absent from the module's export table
    #[error("Symbol '{symbol}' not found in library '{}'", .library.display())]
    NotFound { library: PathBuf, symbol: String },

    /// The handle no longer owns a module
    #[error("Cannot resolve '{symbol}': library handle already released")]
    Released { symbol: String },
}

/// Failure reported by the OS while unmapping a module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to release library '{}': {reason}", .path.display())]
pub struct ReleaseError {
    pub path: PathBuf,
    pub reason: String,
}

/// Loader capability: `{load, resolve, release}`
///
/// Implementations own no modules themselves; every module returned by
/// [`NativeLoader::load`] is handed back through [`NativeLoader::release`]
/// exactly once by the [`LibraryHandle`] that wraps it.
pub trait NativeLoader {
    /// An open module
    type Module;

    /// Open the module at `path`
    fn load(&self, path: &Path) -> Result<Self::Module, LoadError>;

    /// Look up the exported procedure `name` (case-sensitive)
    ///
    /// The returned address is only meaningful while `module` is open.
    fn resolve(&self, module: &Self::Module, name: &str) -> Result<*const (), ResolveError>;

    /// Close `module`, returning its resources to the OS
    fn release(&self, module: Self::Module) -> Result<(), ReleaseError>;
}

/// Address of an exported procedure
///
/// Borrows the [`LibraryHandle`] it came from, so it cannot outlive the
/// module. Carries no ownership.
#[derive(Debug, Clone, Copy)]
pub struct ProcedureAddress<'h> {
    ptr: *const (),
    name: &'h str,
    _handle: PhantomData<&'h ()>,
}

impl<'h> ProcedureAddress<'h> {
    /// Wrap a raw address
    ///
    /// # Safety
    ///
    /// `ptr` must point to a function that stays mapped for `'h`.
    pub unsafe fn from_raw(ptr: *const (), name: &'h str) -> Self {
        Self {
            ptr,
            name,
            _handle: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *const () {
        self.ptr
    }

    /// Exported name this address was resolved from
    pub fn name(&self) -> &'h str {
        self.name
    }
}

/// Scoped ownership of one open module
///
/// Released on [`LibraryHandle::close`] or, failing that, on drop. Either way
/// the loader sees exactly one `release` per successful `load`.
pub struct LibraryHandle<'l, L: NativeLoader> {
    loader: &'l L,
    module: Option<L::Module>,
    path: PathBuf,
}

impl<'l, L: NativeLoader> LibraryHandle<'l, L> {
    /// Load `path` through `loader`
    pub fn open(loader: &'l L, path: &Path) -> Result<Self, LoadError> {
        let module = loader.load(path)?;
        debug!("loaded native module {}", path.display());
        Ok(Self {
            loader,
            module: Some(module),
            path: path.to_path_buf(),
        })
    }

    /// Resolve an exported procedure
    pub fn resolve<'h>(&'h self, name: &'h str) -> Result<ProcedureAddress<'h>, ResolveError> {
        let module = self.module.as_ref().ok_or_else(|| ResolveError::Released {
            symbol: name.to_string(),
        })?;
        let ptr = self.loader.resolve(module, name)?;
        debug!("resolved '{}' in {}", name, self.path.display());
        // SAFETY: the address borrows `self`, which keeps the module mapped.
        Ok(unsafe { ProcedureAddress::from_raw(ptr, name) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the module now and report any OS failure
    pub fn close(mut self) -> Result<(), ReleaseError> {
        match self.module.take() {
            Some(module) => {
                let result = self.loader.release(module);
                debug!("released native module {}", self.path.display());
                result
            }
            None => Ok(()),
        }
    }
}

impl<L: NativeLoader> Drop for LibraryHandle<'_, L> {
    fn drop(&mut self) {
        if let Some(module) = self.module.take() {
            match self.loader.release(module) {
                Ok(()) => debug!("released native module {}", self.path.display()),
                Err(e) => warn!("{}", e),
            }
        }
    }
}

/// `libloading`-backed loader
///
/// Relative paths resolve against the working directory only; the platform
/// library search path is never consulted.
///
/// # Safety
///
/// Loading a dynamic library runs its initialisation code in this process.
/// The module must be trusted.
#[derive(Debug, Default, Clone)]
pub struct DynamicLoader {
    base_dir: Option<PathBuf>,
}

impl DynamicLoader {
    /// Create a loader resolving relative paths against the working directory
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    /// Create a loader resolving relative paths against `dir`
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    /// Absolute location of `path`
    fn resolve_library_path(&self, path: &Path) -> Result<PathBuf, LoadError> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let base = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|e| LoadError::LoadFailed {
                path: path.to_path_buf(),
                reason: format!("cannot determine working directory: {}", e),
            })?,
        };
        Ok(base.join(path))
    }
}

impl NativeLoader for DynamicLoader {
    type Module = (PathBuf, Library);

    fn load(&self, path: &Path) -> Result<Self::Module, LoadError> {
        let full_path = self.resolve_library_path(path)?;
        if !full_path.exists() {
            return Err(LoadError::NotFound(full_path));
        }

        // SAFETY: see the type-level contract; the module is trusted.
        let library = unsafe { Library::new(&full_path) }.map_err(|e| LoadError::LoadFailed {
            path: full_path.clone(),
            reason: e.to_string(),
        })?;
        Ok((full_path, library))
    }

    fn resolve(&self, module: &Self::Module, name: &str) -> Result<*const (), ResolveError> {
        let (path, library) = module;
        let not_found = || ResolveError::NotFound {
            library: path.clone(),
            symbol: name.to_string(),
        };

        // SAFETY: the symbol is read as a bare address and never dereferenced here.
        let symbol: Symbol<*const ()> =
            unsafe { library.get(name.as_bytes()) }.map_err(|_| not_found())?;
        let ptr = *symbol;
        if ptr.is_null() {
            return Err(not_found());
        }
        Ok(ptr)
    }

    fn release(&self, module: Self::Module) -> Result<(), ReleaseError> {
        let (path, library) = module;
        library.close().map_err(|e| ReleaseError {
            path,
            reason: e.to_string(),
        })
    }
}
