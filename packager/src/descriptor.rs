//! Source descriptors: where a chaincode's code and metadata live.
//!
//! The layout convention is decided once, when the descriptor is built,
//! and carried as a closed variant so collection never re-queries the
//! toolchain.

use crate::error::{PackagerError, Result};
use crate::module_info::ModuleQuery;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;

/// Name of the metadata directory inside a chaincode source tree.
pub const METADATA_DIR: &str = "META-INF";

/// The source-layout convention a chaincode follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLayout {
    /// Legacy flat workspace: code lives at `<workspace>/src/<path>`.
    Workspace {
        /// Root of the workspace containing the `src` tree.
        workspace_root: Utf8PathBuf,
    },
    /// Self-contained module carrying its own manifest and lock file.
    Module {
        /// Declared module path from the manifest; may be empty.
        module_path: String,
    },
}

/// Describes a chaincode to be packaged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Import-style identifier of the chaincode.
    pub path: String,
    /// Root directory walked for code files.
    pub source_dir: Utf8PathBuf,
    /// Root directory holding deployment metadata, if any.
    pub metadata_dir: Option<Utf8PathBuf>,
    /// Layout convention and its resolution data.
    pub layout: SourceLayout,
}

impl SourceDescriptor {
    /// Describes a legacy workspace chaincode.
    ///
    /// The source root is `<workspace_root>/src/<path>` and metadata is
    /// looked for in its `META-INF` directory.
    #[must_use]
    pub fn workspace(workspace_root: &Utf8Path, path: &str) -> Self {
        let source_dir = workspace_root.join("src").join(path);
        Self {
            path: path.to_owned(),
            metadata_dir: Some(source_dir.join(METADATA_DIR)),
            source_dir,
            layout: SourceLayout::Workspace {
                workspace_root: workspace_root.to_owned(),
            },
        }
    }

    /// Returns `true` for module-convention sources.
    #[must_use]
    pub const fn uses_module_convention(&self) -> bool {
        matches!(self.layout, SourceLayout::Module { .. })
    }
}

/// Builds a descriptor for `path`, dispatching on module ownership.
///
/// A module-owned path is packaged from its module root with metadata
/// taken from the package directory. Anything else is resolved inside the
/// legacy workspace, which is `workspace_override` when given or the
/// toolchain's configured workspace otherwise.
///
/// # Errors
///
/// Returns [`PackagerError::InvalidPath`] for an empty path and
/// [`PackagerError::Resolution`] if the toolchain query fails.
pub fn describe_code(
    query: &dyn ModuleQuery,
    workspace_override: Option<&Utf8Path>,
    path: &str,
) -> Result<SourceDescriptor> {
    if path.is_empty() {
        return Err(PackagerError::invalid_path(
            path,
            "cannot collect files from an empty chaincode path",
        ));
    }

    if let Some(info) = query.module_info(Utf8Path::new(path))? {
        debug!(
            "describing {path} as module {} rooted at {}",
            info.import_path, info.module_root
        );
        return Ok(SourceDescriptor {
            path: info.import_path.clone(),
            source_dir: info.module_root.clone(),
            metadata_dir: Some(info.dir.join(METADATA_DIR)),
            layout: SourceLayout::Module {
                module_path: info.module_path,
            },
        });
    }

    let workspace_root = match workspace_override {
        Some(root) => root.to_owned(),
        None => query.workspace_root()?,
    };
    debug!("describing {path} inside workspace {workspace_root}");
    Ok(SourceDescriptor::workspace(&workspace_root, path))
}
