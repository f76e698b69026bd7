use crate::syntax::NodeId;

/// Failures that abort the migration of one module.
///
/// These are distinct from diagnostics warnings: a warning means the input used
/// an idiom the engine does not recognise, while `EditTargetUnreachable` and
/// `InvalidEdit` mean an edit script was built against the wrong tree.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("parse error at line {line}: {message}")]
    Parse { line: u32, message: String },

    #[error("{operation}: edit target {target} is not reachable from the module root")]
    EditTargetUnreachable {
        operation: &'static str,
        target: NodeId,
    },

    #[error("{operation}: field `{field}` of {target}'s parent cannot take this edit")]
    InvalidEdit {
        operation: &'static str,
        target: NodeId,
        field: &'static str,
    },

    #[error("malformed route table: {0}")]
    MalformedRoute(String),
}
