/// Configuration for the expression and declaration parser.
///
/// The configuration travels with the input span, so every parser
/// function can consult it without an extra argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Accept the LaTeX dialect: `\frac{a}{b}`, `\cdot`, `\left(`/`\right)`,
    /// brace groups and backslash-prefixed names such as `\rho`.
    pub latex: bool,
}

impl Config {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self { latex: true }
    }

    /// Creates a configuration that only accepts the plain dialect.
    #[must_use]
    pub const fn plain() -> Self {
        Self { latex: false }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
