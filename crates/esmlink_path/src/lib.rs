//! esmlink_path: Module specifier normalization.
//!
//! Turns the specifier written in an import or re-export statement
//! (`'./chapter7_1_1.js'`) into the module id the loader knows the module by
//! (`chapter7/chapter7_1_1`). Module ids are slash-separated, rootless and
//! extensionless.

/// File extensions a specifier may carry. They are stripped when forming a
/// module id, so `./a.js` and `./a.ts` name the same module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Ts,
    Tsx,
    Dts,
    Js,
    Jsx,
    Mjs,
    Mts,
    Cjs,
    Cts,
}

impl Extension {
    /// Get the string representation of this extension (including the dot).
    pub fn as_str(&self) -> &'static str {
        match self {
            Extension::Ts => ".ts",
            Extension::Tsx => ".tsx",
            Extension::Dts => ".d.ts",
            Extension::Js => ".js",
            Extension::Jsx => ".jsx",
            Extension::Mjs => ".mjs",
            Extension::Mts => ".mts",
            Extension::Cjs => ".cjs",
            Extension::Cts => ".cts",
        }
    }

    /// Try to determine the extension from a path string.
    pub fn from_path(path: &str) -> Option<Extension> {
        let lower = path.to_lowercase();
        // .d.ts must be checked before .ts
        if lower.ends_with(".d.ts") {
            Some(Extension::Dts)
        } else if lower.ends_with(".ts") {
            Some(Extension::Ts)
        } else if lower.ends_with(".tsx") {
            Some(Extension::Tsx)
        } else if lower.ends_with(".js") {
            Some(Extension::Js)
        } else if lower.ends_with(".jsx") {
            Some(Extension::Jsx)
        } else if lower.ends_with(".mjs") {
            Some(Extension::Mjs)
        } else if lower.ends_with(".mts") {
            Some(Extension::Mts)
        } else if lower.ends_with(".cjs") {
            Some(Extension::Cjs)
        } else if lower.ends_with(".cts") {
            Some(Extension::Cts)
        } else {
            None
        }
    }
}

/// Convert backslashes to forward slashes.
pub fn normalize_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Normalize a path: forward slashes only, `.` segments dropped, `..`
/// segments folded into their parent. Returns `None` when `..` climbs above
/// the root of the path.
pub fn normalize_path(path: &str) -> Option<String> {
    let path = normalize_slashes(path);
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    Some(if rooted { format!("/{}", joined) } else { joined })
}

/// Combine two path segments.
pub fn combine_paths(base: &str, relative: &str) -> String {
    if is_rooted(relative) || base.is_empty() {
        return relative.to_string();
    }
    format!("{}{}", ensure_trailing_directory_separator(base), relative)
}

/// Check if a path is rooted (absolute).
pub fn is_rooted(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('\\')
}

/// Get the directory part of a path (everything up to and including the last `/`).
pub fn get_directory_path(path: &str) -> String {
    let normalized = normalize_slashes(path);
    if let Some(last_slash) = normalized.rfind('/') {
        normalized[..=last_slash].to_string()
    } else {
        String::new()
    }
}

/// Remove a known extension from a path.
pub fn remove_extension(path: &str) -> String {
    match Extension::from_path(path) {
        Some(ext) => path[..path.len() - ext.as_str().len()].to_string(),
        None => path.to_string(),
    }
}

/// Ensure a path ends with a directory separator.
pub fn ensure_trailing_directory_separator(path: &str) -> String {
    if path.ends_with('/') || path.ends_with('\\') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

/// Whether a specifier is relative to the importing module (`./x`, `../x`).
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Resolve `specifier`, as written inside module `containing`, to a module id.
///
/// Relative specifiers are resolved against the directory of `containing`;
/// bare specifiers are taken as module ids directly. Returns `None` if the
/// specifier is empty or climbs above the root.
pub fn module_id_for_specifier(containing: &str, specifier: &str) -> Option<String> {
    if specifier.is_empty() {
        return None;
    }
    let joined = if is_relative_specifier(specifier) {
        combine_paths(&get_directory_path(containing), specifier)
    } else {
        specifier.to_string()
    };
    let normalized = normalize_path(&remove_extension(&joined))?;
    let id = normalized.trim_start_matches('/').to_string();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_path() {
        assert_eq!(Extension::from_path("foo.ts"), Some(Extension::Ts));
        assert_eq!(Extension::from_path("foo.d.ts"), Some(Extension::Dts));
        assert_eq!(Extension::from_path("foo.js"), Some(Extension::Js));
        assert_eq!(Extension::from_path("foo.txt"), None);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("a\\b\\c").as_deref(), Some("a/b/c"));
        assert_eq!(normalize_path("a/./b/../c").as_deref(), Some("a/c"));
        assert_eq!(normalize_path("/a//b").as_deref(), Some("/a/b"));
        assert_eq!(normalize_path("../a"), None);
    }

    #[test]
    fn test_remove_extension() {
        assert_eq!(remove_extension("foo.ts"), "foo");
        assert_eq!(remove_extension("foo.d.ts"), "foo");
        assert_eq!(remove_extension("foo/bar.js"), "foo/bar");
        assert_eq!(remove_extension("foo/bar"), "foo/bar");
    }

    #[test]
    fn test_combine_paths() {
        assert_eq!(combine_paths("a/b", "c.ts"), "a/b/c.ts");
        assert_eq!(combine_paths("a/b/", "c.ts"), "a/b/c.ts");
        assert_eq!(combine_paths("", "c.ts"), "c.ts");
        assert_eq!(combine_paths("a", "/b/c.ts"), "/b/c.ts");
    }

    #[test]
    fn test_relative_specifier_resolution() {
        assert_eq!(
            module_id_for_specifier("chapter7/index", "./chapter7_1_1.js").as_deref(),
            Some("chapter7/chapter7_1_1")
        );
        assert_eq!(
            module_id_for_specifier("chapter7/index", "../chapter6.ts").as_deref(),
            Some("chapter6")
        );
        assert_eq!(module_id_for_specifier("index", "../outside.js"), None);
    }

    #[test]
    fn test_bare_specifier_resolution() {
        assert_eq!(module_id_for_specifier("chapter7/index", "lib/util").as_deref(), Some("lib/util"));
        assert_eq!(module_id_for_specifier("chapter7/index", ""), None);
    }
}
