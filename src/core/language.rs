//! Source language detection by file extension.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Languages whose files count as source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Rust,
    Python,
    TypeScript,
    JavaScript,
    Java,
    Kotlin,
    C,
    Cpp,
    CSharp,
    Ruby,
    Php,
    Swift,
    Scala,
    Bash,
}

impl Language {
    /// Detect language from file path based on extension.
    pub fn detect(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?;
        Self::from_extension(extension)
    }

    /// Get language from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "go" => Some(Self::Go),
            "rs" => Some(Self::Rust),
            "py" | "pyi" => Some(Self::Python),
            "ts" | "tsx" | "mts" | "cts" => Some(Self::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "java" => Some(Self::Java),
            "kt" | "kts" => Some(Self::Kotlin),
            "c" | "h" => Some(Self::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" => Some(Self::Cpp),
            "cs" => Some(Self::CSharp),
            "rb" | "rake" => Some(Self::Ruby),
            "php" => Some(Self::Php),
            "swift" => Some(Self::Swift),
            "scala" | "sc" => Some(Self::Scala),
            "sh" | "bash" => Some(Self::Bash),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(Language::detect("main.go"), Some(Language::Go));
        assert_eq!(Language::detect("src/lib.rs"), Some(Language::Rust));
        assert_eq!(Language::detect("pkg/m.py"), Some(Language::Python));
        assert_eq!(Language::detect("app.tsx"), Some(Language::TypeScript));
        assert_eq!(Language::detect("Main.java"), Some(Language::Java));
        assert_eq!(Language::detect("file.hh"), Some(Language::Cpp));
        assert_eq!(Language::detect("README.md"), None);
        assert_eq!(Language::detect("Makefile"), None);
    }

    #[test]
    fn test_from_extension_case_insensitive() {
        assert_eq!(Language::from_extension("PY"), Some(Language::Python));
        assert_eq!(Language::from_extension("png"), None);
    }
}
