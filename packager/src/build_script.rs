//! Container build instructions for packaged chaincode.
//!
//! The build script runs inside the builder container with the package
//! unpacked at [`INPUT_DIR`]. It picks one of three build modes from what
//! it finds there and always writes the binary to [`OUTPUT_BINARY`]. The
//! script text is consumed verbatim by the container build invoker.

/// Directory the package is unpacked into inside the builder container.
pub const INPUT_DIR: &str = "/chaincode/input";

/// Location of the compiled chaincode inside the builder container.
pub const OUTPUT_BINARY: &str = "/chaincode/output/chaincode";

/// Archive the builder emits the binary in.
pub const BINARY_ARCHIVE: &str = "binpackage.tar";

/// Directory the binary is installed to in the runtime image.
pub const RUNTIME_BIN_DIR: &str = "/usr/local/bin";

/// Linker options for a statically linked binary.
pub const STATIC_LDFLAGS_OPTS: &str = r#"-ldflags "-linkmode external -extldflags '-static'""#;

/// Linker options for a dynamically linked binary.
pub const DYNAMIC_LDFLAGS_OPTS: &str = r#"-ldflags "-linkmode external""#;

/// How the chaincode binary is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkMode {
    /// External linker, statically linked output.
    #[default]
    Static,
    /// External linker, dynamically linked output.
    Dynamic,
}

impl LinkMode {
    /// Maps the dynamic-link configuration flag to a link mode.
    #[must_use]
    pub const fn from_dynamic_flag(dynamic_link: bool) -> Self {
        if dynamic_link { Self::Dynamic } else { Self::Static }
    }

    /// The linker options passed to every build branch.
    #[must_use]
    pub const fn ldflags(self) -> &'static str {
        match self {
            Self::Static => STATIC_LDFLAGS_OPTS,
            Self::Dynamic => DYNAMIC_LDFLAGS_OPTS,
        }
    }
}

/// Image and script handed to the container build invoker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Builder image the script runs in.
    pub image: String,
    /// Shell script compiling the package.
    pub script: String,
}

/// Generates the shell script that compiles `identifier`.
///
/// The script builds in vendored module mode when both a manifest and a
/// vendor directory are present, in proxy-backed module mode when only
/// the manifest is present, and in legacy workspace mode otherwise.
///
/// # Examples
///
/// ```
/// use ccpack_packager::build_script::{LinkMode, generate_build_script};
///
/// let script = generate_build_script("the-path", LinkMode::Static);
/// assert!(script.contains("-mod=vendor"));
/// assert!(script.trim_end().ends_with("echo Done!"));
/// ```
#[must_use]
pub fn generate_build_script(identifier: &str, link: LinkMode) -> String {
    let ldflags = link.ldflags();
    format!(
        r#"
set -e
if [ -f "{INPUT_DIR}/src/go.mod" ] && [ -d "{INPUT_DIR}/src/vendor" ]; then
    cd {INPUT_DIR}/src
    GO111MODULE=on go build -v -mod=vendor {ldflags} -o {OUTPUT_BINARY} {identifier}
elif [ -f "{INPUT_DIR}/src/go.mod" ]; then
    cd {INPUT_DIR}/src
    GO111MODULE=on GOPROXY=https://proxy.golang.org go build -v -mod=readonly {ldflags} -o {OUTPUT_BINARY} {identifier}
else
    GOPATH={INPUT_DIR}:$GOPATH go build -v {ldflags} -o {OUTPUT_BINARY} {identifier}
fi
echo Done!
"#
    )
}

/// Generates the runtime image directive.
///
/// Only the first line depends on `runtime_image`.
#[must_use]
pub fn generate_dockerfile(runtime_image: &str) -> String {
    format!("FROM {runtime_image}\nADD {BINARY_ARCHIVE} {RUNTIME_BIN_DIR}")
}
