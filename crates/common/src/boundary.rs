use tortuga_config::{ConfigSource, keys};

/// Module-path prefix that bounds which declarations are registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Boundary(Option<String>);

impl Boundary {
    /// Everything is in scope.
    pub fn unbounded() -> Self {
        Self(None)
    }

    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let root = root.trim().trim_end_matches("::");
        if root.is_empty() {
            Self(None)
        } else {
            Self(Some(root.to_string()))
        }
    }

    /// From `scan.root`.
    pub fn from_config(config: &dyn ConfigSource) -> Self {
        config
            .get(keys::SCAN_ROOT)
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn root(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// `module` equals the root or lives beneath it.
    pub fn contains(&self, module: &str) -> bool {
        let Some(root) = &self.0 else {
            return true;
        };
        module == root
            || module
                .strip_prefix(root.as_str())
                .is_some_and(|rest| rest.starts_with("::"))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, tortuga_config::Settings};

    #[rstest]
    #[case("tortuga::commands", true)]
    #[case("tortuga::commands::ping", true)]
    #[case("tortuga::commandsx", false)]
    #[case("tortuga", false)]
    #[case("other::commands", false)]
    fn prefix_matches_whole_segments(#[case] module: &str, #[case] expected: bool) {
        assert_eq!(Boundary::new("tortuga::commands").contains(module), expected);
    }

    #[test]
    fn empty_root_is_unbounded() {
        assert_eq!(Boundary::new("  "), Boundary::unbounded());
        assert!(Boundary::unbounded().contains("anything::at::all"));
    }

    #[test]
    fn reads_scan_root() {
        let settings = Settings::from_pairs([("scan.root", "tortuga::tasks::")]);
        let boundary = Boundary::from_config(&settings);
        assert_eq!(boundary.root(), Some("tortuga::tasks"));
        assert!(Boundary::from_config(&Settings::new()).root().is_none());
    }
}
