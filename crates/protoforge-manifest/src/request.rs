/// Input to a package-manifest generator: everything needed to emit a
/// module descriptor and its companion files, independent of the proto
/// compilation itself.
#[derive(Clone, Debug)]
pub struct ManifestRequest {
    pub module: String,
    pub version: String,
    pub include_rpc: bool,
    /// Runtime dependency coordinates already expressed in whatever form the
    /// generator's ecosystem expects elsewhere in the pipeline (e.g.
    /// `group:artifact:version` strings for Maven); generators normalize
    /// names but do not invent missing coordinates.
    pub dependencies: Vec<String>,
}
