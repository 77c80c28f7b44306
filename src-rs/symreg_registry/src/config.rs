/// Configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Populate the sample data of synthesized implementations by calling
    /// them with their default arguments.
    pub sample_data: bool,
    /// The parser configuration used for every declaration string.
    pub parser: symreg_expr::Config,
}

impl Config {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sample_data: true,
            parser: symreg_expr::Config::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
