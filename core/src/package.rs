//! Package references and the host loader boundary
//!
//! The core never performs I/O itself. A package form compiles to a call of a
//! loader function looked up in scope; the host binds loaders with
//! [`bind_loader`]. [`FsPackageLoader`] is the filesystem-backed loader used by
//! the command-line host.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{Failure, Result};
use crate::scope::{Scope, CURRENT};
use crate::value::{Function, Value};

/// File extension of source packages.
pub const EXTENSION: &str = "rel";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PackageKind {
    /// `//name` or `//dotted.name`
    Std,
    /// `//./path`
    Local,
    /// `//host.name/path` or `//https://host.name`
    Remote,
    /// `//` alone
    Context,
}

impl PackageKind {
    /// Name the loader for this kind is bound under.
    pub fn binding(self) -> &'static str {
        match self {
            PackageKind::Std => "//.",
            PackageKind::Local => "//./",
            PackageKind::Remote => "//",
            PackageKind::Context => CURRENT,
        }
    }
}

/// Resolves package references on behalf of the evaluator.
pub trait PackageLoader: Send + Sync {
    fn load(&self, kind: PackageKind, reference: &str) -> Result<Value, String>;
}

/// Binds a loader function for every loadable package kind.
pub fn bind_loader(scope: &Scope, loader: Arc<dyn PackageLoader>) -> Scope {
    let kinds = [PackageKind::Std, PackageKind::Local, PackageKind::Remote];
    scope.bind_all(kinds.map(|kind| {
        let loader = loader.clone();
        let load = Function::native(kind.binding(), move |arg| {
            let reference = arg
                .as_str()
                .ok_or_else(|| Failure::type_mismatch(kind.binding(), "string", &arg))?;
            debug!(?kind, reference, "loading package");
            loader.load(kind, reference).map_err(|message| Failure::Load {
                reference: reference.to_string(),
                message,
            })
        });
        (kind.binding(), Value::Function(load))
    }))
}

/// Value of a package form: the loader bound for `kind`, or the current
/// element for the context form.
pub(crate) fn resolve(kind: PackageKind, scope: &Scope) -> Result<Value> {
    scope
        .lookup(kind.binding())
        .cloned()
        .ok_or_else(|| Failure::UnboundName(kind.binding().to_string()))
}

/* ===================== Filesystem Loader ===================== */

/// Loads `.rel` source packages from disk.
///
/// Standard packages are looked up by name in each directory of the package
/// path in order, `a.b` naming `a/b.rel`. Local references are file paths. Remote packages are refused.
///
/// A file that imports itself, directly or through other packages, fails with
/// an import cycle instead of recursing.
#[derive(Clone, Debug, Default)]
pub struct FsPackageLoader {
    package_path: Vec<PathBuf>,
    // files currently being evaluated, shared by every clone
    in_flight: Arc<Mutex<HashSet<PathBuf>>>,
}

/// Removes a file from the in-flight set when its evaluation ends.
struct InFlight<'a> {
    files: &'a Mutex<HashSet<PathBuf>>,
    path: PathBuf,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut files) = self.files.lock() {
            files.remove(&self.path);
        }
    }
}

impl FsPackageLoader {
    pub fn new(package_path: Vec<PathBuf>) -> Self {
        Self {
            package_path,
            in_flight: Arc::default(),
        }
    }

    /// Root scope with this loader bound.
    pub fn scope(&self) -> Scope {
        bind_loader(&Scope::new(), Arc::new(self.clone()))
    }

    fn find_std(&self, name: &str) -> Option<PathBuf> {
        self.package_path
            .iter()
            .map(|dir| dir.join(format!("{}.{EXTENSION}", name.replace('.', "/"))))
            .find(|path| path.is_file())
    }

    /// Compiles and evaluates a source file, resolving its own local imports
    /// relative to its directory.
    pub fn load_file(&self, path: &Path) -> Result<Value, String> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let _guard = self.enter(path)?;
        let source_dir = path
            .parent()
            .map(|dir| dir.to_string_lossy().into_owned())
            .unwrap_or_default();
        let expr = crate::syntax::parse_source(&source, &source_dir)
            .map_err(|e| format!("{}: {e}", path.display()))?;
        expr.eval(&self.scope())
            .map_err(|e| format!("{}: {e}", path.display()))
    }

    fn enter(&self, path: &Path) -> Result<InFlight<'_>, String> {
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let mut files = self
            .in_flight
            .lock()
            .map_err(|_| "package loader state poisoned".to_string())?;
        if !files.insert(path.clone()) {
            debug!(path = %path.display(), "import cycle");
            return Err("import cycle".to_string());
        }
        Ok(InFlight {
            files: &self.in_flight,
            path,
        })
    }
}

impl PackageLoader for FsPackageLoader {
    fn load(&self, kind: PackageKind, reference: &str) -> Result<Value, String> {
        match kind {
            PackageKind::Std => {
                let path = self
                    .find_std(reference)
                    .ok_or_else(|| format!("no package {reference:?} in package path"))?;
                self.load_file(&path)
            }
            PackageKind::Local => {
                let mut path = PathBuf::from(reference);
                if path.extension().is_none() {
                    path.set_extension(EXTENSION);
                }
                self.load_file(&path)
            }
            PackageKind::Remote => Err("remote packages are not supported".to_string()),
            PackageKind::Context => Err("the context form is not loadable".to_string()),
        }
    }
}
