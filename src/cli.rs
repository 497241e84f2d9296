//! CLI argument definitions for `ccpack`.
//!
//! Kept apart from the entrypoint so the binary stays focused on
//! orchestration.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Package, validate, and prepare container builds for Go chaincode.
#[derive(Parser, Debug)]
#[command(name = "ccpack")]
#[command(version, about)]
#[command(after_help = concat!(
    "CONFIGURATION:\n",
    "  Settings are read from the --config file when given and may be\n",
    "  overridden by CORE_CHAINCODE_BUILDER, CORE_CHAINCODE_GOLANG_RUNTIME,\n",
    "  CORE_CHAINCODE_GOLANG_DYNAMICLINK, and CORE_CHAINCODE_GOLANG_WORKSPACE.\n\n",
    "EXAMPLES:\n",
    "  Package a chaincode from the Go workspace:\n",
    "    $ ccpack package github.com/acme/chaincodes/noop -o noop.tar.gz\n\n",
    "  Check a package received from a peer:\n",
    "    $ ccpack validate noop.tar.gz\n\n",
    "  Print the build script for a chaincode:\n",
    "    $ ccpack build-script github.com/acme/chaincodes/noop",
))]
pub struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Package a chaincode into a gzip-compressed tar archive.
    Package(PackageArgs),

    /// Check a code package against the packaging policy.
    Validate {
        /// Package file to check.
        #[arg(value_name = "FILE")]
        package: Utf8PathBuf,
    },

    /// Print the canonical form of a chaincode path.
    Normalize {
        /// Chaincode path to normalize.
        #[arg(value_name = "PATH")]
        identifier: String,
    },

    /// Print the container build script for a chaincode.
    BuildScript {
        /// Chaincode path the script compiles.
        #[arg(value_name = "PATH")]
        identifier: String,

        /// Print the builder image on the first line.
        #[arg(long)]
        with_image: bool,
    },

    /// Print the runtime image directive.
    Dockerfile,
}

/// Arguments for the package command.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct PackageArgs {
    /// Chaincode path to package.
    #[arg(value_name = "PATH")]
    pub identifier: String,

    /// Write the package to FILE instead of standard output.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<Utf8PathBuf>,
}
