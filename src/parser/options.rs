//! TOC parsing options.

use std::str::FromStr;

/// Default width of a tab character when measuring indentation.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Options for turning TOC text into a bookmark tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocOptions {
    /// Indentation width of a tab character
    pub tab_width: usize,

    /// How nesting depth is inferred
    pub strategy: DepthStrategy,
}

impl TocOptions {
    /// Create new TOC options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tab width (a width of 0 is treated as 1).
    pub fn with_tab_width(mut self, width: usize) -> Self {
        self.tab_width = width.max(1);
        self
    }

    /// Set the depth strategy.
    pub fn with_strategy(mut self, strategy: DepthStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Treat every line as a top-level bookmark.
    pub fn flat(mut self) -> Self {
        self.strategy = DepthStrategy::Flat;
        self
    }
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            tab_width: DEFAULT_TAB_WIDTH,
            strategy: DepthStrategy::Auto,
        }
    }
}

/// How the nesting depth of each line is inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthStrategy {
    /// Indentation if any line is indented, else numbering, else flat
    #[default]
    Auto,
    /// Leading whitespace width
    Indent,
    /// Hierarchical numbering tokens (`1`, `1.1`, `1.1.1`) and chapter markers
    Numbering,
    /// Every line at depth 0
    Flat,
}

impl FromStr for DepthStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "indent" => Ok(Self::Indent),
            "numbering" => Ok(Self::Numbering),
            "flat" => Ok(Self::Flat),
            other => Err(format!("unknown depth strategy: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toc_options_builder() {
        let options = TocOptions::new()
            .with_tab_width(8)
            .with_strategy(DepthStrategy::Numbering);

        assert_eq!(options.tab_width, 8);
        assert_eq!(options.strategy, DepthStrategy::Numbering);
        assert_eq!(TocOptions::new().with_tab_width(0).tab_width, 1);
    }

    #[test]
    fn test_default_options() {
        let options = TocOptions::default();
        assert_eq!(options.tab_width, DEFAULT_TAB_WIDTH);
        assert_eq!(options.strategy, DepthStrategy::Auto);
        assert_eq!(TocOptions::new().flat().strategy, DepthStrategy::Flat);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Indent".parse::<DepthStrategy>(), Ok(DepthStrategy::Indent));
        assert_eq!(" flat ".parse::<DepthStrategy>(), Ok(DepthStrategy::Flat));
        assert!("tree".parse::<DepthStrategy>().is_err());
    }
}
