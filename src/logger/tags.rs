/// Log tags, one per component

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Cache,
    Bgplgd,
    Gobgp,
    Registry,
}

impl LogTag {
    /// `log` target for this tag
    pub fn target(&self) -> &'static str {
        match self {
            LogTag::System => "lg_sources::system",
            LogTag::Config => "lg_sources::config",
            LogTag::Cache => "lg_sources::cache",
            LogTag::Bgplgd => "lg_sources::bgplgd",
            LogTag::Gobgp => "lg_sources::gobgp",
            LogTag::Registry => "lg_sources::registry",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Cache => "CACHE",
            LogTag::Bgplgd => "BGPLGD",
            LogTag::Gobgp => "GOBGP",
            LogTag::Registry => "REGISTRY",
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
