//! The package manifest parser (spec §4.4, component C4).
//!
//! A permissive state machine recognizing `module X`, `go Y`, and
//! standalone/block `require (...)`/`replace (...)` statements. Mirrors the
//! Go module file grammar, which is what spec.md's manifest fields
//! (`module`, `go`, `require`, `replace`) describe; this is the same
//! tolerant hand-rolled line-parser style the teacher uses for
//! `pnpm-workspace.yaml` in `resolver/workspace.rs::parse_pnpm_workspace_yaml`.

use std::path::Path;

use crate::error::{Error, Result};

/// The canonical manifest file name, matching the Go module convention.
pub const MANIFEST_FILE_NAME: &str = "go.mod";

/// A `replace` rule: `original[@original_version] => replacement[@replacement_version]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// The import path being replaced.
    pub original: String,
    /// Version constraint on the original, if given.
    pub original_version: Option<String>,
    /// Replacement target: a filesystem path (starts with `.` or `/`) or a
    /// fresh import path to resolve.
    pub replacement: String,
    /// Version of the replacement, if given (meaningless for filesystem
    /// replacements).
    pub replacement_version: Option<String>,
}

impl Replacement {
    /// `true` if `replacement` is a filesystem path rather than an import
    /// path (spec §4.5: "leading `.` or `/` means filesystem").
    pub fn is_filesystem(&self) -> bool {
        self.replacement.starts_with('.') || self.replacement.starts_with('/')
    }
}

/// The parsed contents of a manifest file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestInfo {
    /// Declared module import path.
    pub module_path: String,
    /// Source-language version (e.g. `"v1.21"` — always "v"-prefixed; see
    /// [`normalize_version`]).
    pub language_version: String,
    /// Direct dependency requirements, `import_path -> version`, in
    /// declaration order preserved as insertion order would be in a
    /// `Vec`; stored as pairs to keep rendering deterministic.
    pub requires: Vec<(String, String)>,
    /// Replacement rules, in declaration order.
    pub replacements: Vec<Replacement>,
}

impl ManifestInfo {
    /// Look up a required dependency's version by import path.
    pub fn require_version(&self, import_path: &str) -> Option<&str> {
        self.requires
            .iter()
            .find(|(p, _)| p == import_path)
            .map(|(_, v)| v.as_str())
    }

    /// Find a replacement whose `original` matches `import_path`, scoped to
    /// this (the consuming) module's own manifest — spec §4.5 step 4
    /// "Replacement lookups are scoped to the consuming module".
    pub fn replacement_for(&self, import_path: &str) -> Option<&Replacement> {
        self.replacements.iter().find(|r| r.original == import_path)
    }
}

/// Normalize a bare numeric version by prepending `"v"` if missing
/// (spec §4.3 step 7).
pub fn normalize_version(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with('v') {
        raw.to_owned()
    } else {
        format!("v{raw}")
    }
}

/// Strip a trailing `//` line comment and surrounding whitespace/quotes.
fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => line[..idx].trim(),
        None => line.trim(),
    }
}

fn unquote(s: &str) -> String {
    s.trim().trim_matches('"').to_owned()
}

/// Parse `content` as a manifest. Tolerant of blank lines and comments;
/// fails only if no `module` declaration is ever found, since every other
/// field is optional.
pub fn parse_manifest(content: &str) -> Result<ManifestInfo> {
    let mut info = ManifestInfo::default();
    let mut in_require_block = false;
    let mut in_replace_block = false;

    for raw_line in content.lines() {
        let line = strip_comment(raw_line);
        if line.is_empty() {
            continue;
        }

        if in_require_block {
            if line == ")" {
                in_require_block = false;
                continue;
            }
            if let Some((path, version)) = parse_require_entry(line) {
                info.requires.push((path, version));
            }
            continue;
        }

        if in_replace_block {
            if line == ")" {
                in_replace_block = false;
                continue;
            }
            if let Some(rep) = parse_replace_entry(line) {
                info.replacements.push(rep);
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("module ") {
            info.module_path = unquote(rest);
        } else if let Some(rest) = line.strip_prefix("go ") {
            info.language_version = normalize_version(rest.trim());
        } else if line == "require (" {
            in_require_block = true;
        } else if let Some(rest) = line.strip_prefix("require ") {
            if let Some((path, version)) = parse_require_entry(rest) {
                info.requires.push((path, version));
            }
        } else if line == "replace (" {
            in_replace_block = true;
        } else if let Some(rest) = line.strip_prefix("replace ") {
            if let Some(rep) = parse_replace_entry(rest) {
                info.replacements.push(rep);
            }
        }
        // Unrecognized lines (e.g. `exclude`, `retract`) are ignored —
        // the parser is deliberately permissive (spec §4.4).
    }

    if info.module_path.is_empty() {
        return Err(Error::ManifestMalformed {
            path: Path::new(MANIFEST_FILE_NAME).to_path_buf(),
            reason: "no `module` declaration found".into(),
        });
    }

    Ok(info)
}

fn parse_require_entry(line: &str) -> Option<(String, String)> {
    let line = strip_comment(line);
    let mut parts = line.split_whitespace();
    let path = parts.next()?.to_owned();
    let version = parts.next().map(normalize_version).unwrap_or_default();
    Some((path, version))
}

fn parse_replace_entry(line: &str) -> Option<Replacement> {
    let line = strip_comment(line);
    let (lhs, rhs) = line.split_once("=>")?;
    let (original, original_version) = split_path_version(lhs.trim());
    let (replacement, replacement_version) = split_path_version(rhs.trim());
    Some(Replacement {
        original,
        original_version,
        replacement,
        replacement_version,
    })
}

fn split_path_version(s: &str) -> (String, Option<String>) {
    let mut parts = s.split_whitespace();
    let path = parts.next().unwrap_or_default().to_owned();
    let version = parts.next().map(normalize_version);
    (path, version)
}

/// Render a [`ManifestInfo`] back to manifest text. Always uses block form
/// for `require`/`replace` when there is more than one entry of either, and
/// never emits comments — the inverse of [`parse_manifest`] for the
/// "no comments" subset spec.md's round-trip law (§8) covers.
pub fn render_manifest(info: &ManifestInfo) -> String {
    let mut out = String::new();
    out.push_str(&format!("module {}\n\n", info.module_path));
    if !info.language_version.is_empty() {
        let bare = info.language_version.trim_start_matches('v');
        out.push_str(&format!("go {bare}\n\n"));
    }

    if info.requires.len() == 1 {
        let (p, v) = &info.requires[0];
        out.push_str(&format!("require {p} {v}\n\n"));
    } else if !info.requires.is_empty() {
        out.push_str("require (\n");
        for (p, v) in &info.requires {
            out.push_str(&format!("\t{p} {v}\n"));
        }
        out.push_str(")\n\n");
    }

    if info.replacements.len() == 1 {
        out.push_str(&render_replace_line(&info.replacements[0]));
        out.push('\n');
    } else if !info.replacements.is_empty() {
        out.push_str("replace (\n");
        for rep in &info.replacements {
            out.push('\t');
            out.push_str(&render_replace_line(rep));
            out.push('\n');
        }
        out.push_str(")\n");
    }

    out
}

fn render_replace_line(rep: &Replacement) -> String {
    let mut lhs = rep.original.clone();
    if let Some(v) = &rep.original_version {
        lhs.push(' ');
        lhs.push_str(v);
    }
    let mut rhs = rep.replacement.clone();
    if let Some(v) = &rep.replacement_version {
        rhs.push(' ');
        rhs.push_str(v);
    }
    format!("replace {lhs} => {rhs}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standalone_and_block_forms() {
        let content = r#"
module example.com/foo

go 1.21

require example.com/bar v1.2.3

require (
    example.com/baz v0.1.0
    example.com/qux v2.0.0 // indirect
)

replace example.com/bar => ../local-bar

replace (
    example.com/baz => example.com/baz-fork v9.9.9
)
"#;
        let info = parse_manifest(content).unwrap();
        assert_eq!(info.module_path, "example.com/foo");
        assert_eq!(info.language_version, "v1.21");
        assert_eq!(info.require_version("example.com/bar"), Some("v1.2.3"));
        assert_eq!(info.require_version("example.com/qux"), Some("v2.0.0"));
        assert_eq!(info.replacements.len(), 2);
        assert!(info.replacement_for("example.com/bar").unwrap().is_filesystem());
        assert!(!info.replacement_for("example.com/baz").unwrap().is_filesystem());
    }

    #[test]
    fn missing_module_declaration_is_malformed() {
        let err = parse_manifest("go 1.21\n").unwrap_err();
        assert!(matches!(err, Error::ManifestMalformed { .. }));
    }

    #[test]
    fn numeric_version_gets_v_prefix() {
        assert_eq!(normalize_version("1.21"), "v1.21");
        assert_eq!(normalize_version("v1.21"), "v1.21");
    }

    #[test]
    fn render_then_parse_round_trips_without_comments() {
        let info = ManifestInfo {
            module_path: "example.com/foo".into(),
            language_version: "v1.21".into(),
            requires: vec![
                ("example.com/bar".into(), "v1.2.3".into()),
                ("example.com/baz".into(), "v0.1.0".into()),
            ],
            replacements: vec![Replacement {
                original: "example.com/bar".into(),
                original_version: None,
                replacement: "../local-bar".into(),
                replacement_version: None,
            }],
        };
        let rendered = render_manifest(&info);
        let reparsed = parse_manifest(&rendered).unwrap();
        assert_eq!(reparsed, info);
    }
}
