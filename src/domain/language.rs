//! Static file-extension to language lookup.

/// Infer a display language from a filename's extension.
///
/// Pure lookup table; unknown extensions (and filenames without one) map
/// to `"text"`.
pub fn infer_language(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "java" => "java",
        "kt" => "kotlin",
        "json" => "json",
        "js" => "javascript",
        "ts" => "typescript",
        "html" => "html",
        "xml" => "xml",
        "css" => "css",
        "m" | "h-m" => "objective-c",
        "c" | "h-c" => "c",
        "mm" | "cc" | "cpp" => "c++",
        "swift" => "swift",
        "rs" => "rust",
        "py" => "python",
        "rb" => "ruby",
        "go" => "go",
        "sh" => "shell",
        "md" => "markdown",
        "yml" | "yaml" => "yaml",
        "toml" => "toml",
        _ => "text",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(infer_language("Main.java"), "java");
        assert_eq!(infer_language("app.kt"), "kotlin");
        assert_eq!(infer_language("index.js"), "javascript");
        assert_eq!(infer_language("lib.rs"), "rust");
        assert_eq!(infer_language("view.mm"), "c++");
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert_eq!(infer_language("README.MD"), "markdown");
        assert_eq!(infer_language("Main.JAVA"), "java");
    }

    #[test]
    fn test_only_last_extension_counts() {
        assert_eq!(infer_language("archive.tar.json"), "json");
    }

    #[test]
    fn test_unknown_and_missing_extensions_fall_back_to_text() {
        assert_eq!(infer_language("notes.xyz"), "text");
        assert_eq!(infer_language("Makefile"), "text");
        assert_eq!(infer_language(""), "text");
    }
}
