use rb_tree::InvariantViolation;

/// Caller mistakes. The graph is left untouched when one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConnectivityError {
    #[error("self-loops are not allowed")]
    SelfLoop,
    #[error("the graph was built without an augmentation combiner")]
    NotAugmented,
    #[error("the graph cannot hold more than {max} vertices")]
    TooManyVertices { max: usize },
}

/// Inconsistency found by [`crate::DynamicConnectivity::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Tree(#[from] InvariantViolation),
    #[error("tour of {visits} visits covers {vertices} vertices")]
    TourSize { visits: usize, vertices: usize },
    #[error("tree at level {level} holds {vertices} vertices")]
    LevelSize { vertices: usize, level: usize },
    #[error("representation {depth} levels below the top is below level 0")]
    LevelDepth { depth: usize },
    #[error("level links between vertex representations are broken")]
    LevelLink,
    #[error("canonical visit does not match its vertex")]
    CanonicalVisit,
    #[error("adjacency lists disagree with the edge map")]
    EdgeList,
    #[error("tour edge chain does not reach the top level")]
    TourChain,
    #[error("non-forest edge joins two different trees at its level")]
    GraphEdgeSpansTrees,
    #[error("edge count is {stored} but {actual} edges are recorded")]
    EdgeCount { stored: usize, actual: usize },
}
