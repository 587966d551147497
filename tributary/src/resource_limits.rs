/// Resource limits for parsing and normalization
///
/// These limits protect against runaway inputs (deeply nested text, reductions
/// that do not terminate) while being generous enough for real queries.
#[derive(Debug, Clone)]
pub struct ResourceLimits {
    /// Maximum size of expression source text in bytes
    /// Real usage: ~1KB, Limit: 1MB
    pub max_source_bytes: usize,

    /// Maximum expression nesting depth, checked while parsing and reducing
    /// Real usage: ~20 levels, Limit: 256
    pub max_expression_depth: usize,

    /// Maximum number of beta-reduction steps for a single normalization
    /// Real usage: a few per bind, Limit: 10_000
    pub max_reduction_steps: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_source_bytes: 1024 * 1024, // 1 MB
            max_expression_depth: 256,
            max_reduction_steps: 10_000,
        }
    }
}

impl ResourceLimits {
    /// Create a new ResourceLimits with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_expression_depth(mut self, depth: usize) -> Self {
        self.max_expression_depth = depth;
        self
    }

    pub fn with_max_reduction_steps(mut self, steps: usize) -> Self {
        self.max_reduction_steps = steps;
        self
    }
}
