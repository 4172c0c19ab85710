//! CLI value enums and their conversions to configuration types.

use clap::ValueEnum;

use crate::config::BackendKind;

/// Storage backend for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendArg {
    /// SQLite database under `.threadkeep/`
    #[default]
    Sqlite,
    /// In-memory storage, discarded on exit
    Memory,
}

impl std::fmt::Display for BackendArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Sqlite => BackendKind::Sqlite,
            BackendArg::Memory => BackendKind::Memory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_arg_conversion() {
        assert_eq!(BackendKind::from(BackendArg::Sqlite), BackendKind::Sqlite);
        assert_eq!(BackendKind::from(BackendArg::Memory), BackendKind::Memory);
        assert_eq!(BackendArg::default().to_string(), "sqlite");
    }
}
