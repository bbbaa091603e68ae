use facet::Facet;

/// Errors that can occur while distilling changes between two versions.
#[derive(Facet, Debug, PartialEq, Eq)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum DistillError {
    /// cannot distill a {left} against a {right}
    IncompatibleRoots { left: String, right: String },

    /// body of {declaration} has {nodes} nodes, more than the limit of {limit}
    BodyTooLarge {
        declaration: String,
        nodes: usize,
        limit: usize,
    },

    /// bodies of {declaration} have different root labels {left} and {right}
    IncompatibleBodies {
        declaration: String,
        left: String,
        right: String,
    },
}
