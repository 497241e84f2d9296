//! Deployment payload assembly.

use crate::archive::build_package;
use crate::descriptor::{SourceLayout, describe_code};
use crate::error::Result;
use crate::module_info::ModuleQuery;
use crate::path::validate_path;
use crate::source::{add_dependencies, find_source, into_entries};
use camino::Utf8Path;
use log::debug;

/// Packages the chaincode addressed by `identifier` into a code package.
///
/// Validates the identifier, resolves it into a source descriptor,
/// collects its files, and serializes them. Workspace chaincode also has
/// its imports resolved and the files of its non-standard dependencies
/// added. A failure at any stage is returned unchanged and no partial
/// package is produced.
///
/// # Errors
///
/// Returns whichever [`crate::error::PackagerError`] the failing stage
/// produced.
pub fn get_deployment_payload(
    query: &dyn ModuleQuery,
    workspace_override: Option<&Utf8Path>,
    identifier: &str,
) -> Result<Vec<u8>> {
    validate_path(identifier)?;
    let descriptor = describe_code(query, workspace_override, identifier)?;
    let mut sources = find_source(&descriptor)?;
    if let SourceLayout::Workspace { workspace_root } = &descriptor.layout {
        let packages = query.workspace_dependencies(workspace_root, &descriptor.path)?;
        add_dependencies(&descriptor.path, &packages, &mut sources)?;
    }
    let entries = into_entries(sources);
    let package = build_package(&entries)?;
    debug!("packaged {identifier} as {}", descriptor.path);
    Ok(package)
}
