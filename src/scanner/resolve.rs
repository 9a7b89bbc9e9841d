//! Import path resolution against the set of known repository paths

use std::collections::HashSet;

use crate::analyzer::modules::is_external;
use crate::lang::Lang;

/// Resolve `source`, imported from the file at `importer`, to a known path.
///
/// External sources never resolve. A leading `/` is taken relative to the
/// repository root, anything else relative to the importer's directory.
/// Candidates are tried in order: exact, `.ext`, `.json`, `/index.ext`,
/// where `ext` is the importer's own default extension.
pub fn resolve_import(
    known: &HashSet<String>,
    importer: &str,
    importer_lang: Lang,
    source: &str,
) -> Option<String> {
    if is_external(source) {
        return None;
    }

    let base = if let Some(absolute) = source.strip_prefix('/') {
        join_segments("", absolute)?
    } else {
        let dir = importer.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        join_segments(dir, source)?
    };
    if base.is_empty() {
        return None;
    }

    let ext = importer_lang.default_extension();
    candidates(&base, ext)
        .into_iter()
        .find(|candidate| known.contains(candidate))
}

fn candidates(base: &str, ext: &str) -> [String; 4] {
    [
        base.to_string(),
        format!("{}.{}", base, ext),
        format!("{}.json", base),
        format!("{}/index.{}", base, ext),
    ]
}

/// Join `/`-separated `relative` onto `dir`, folding `.` and `..`.
/// Returns `None` when the result would climb above the repository root.
fn join_segments(dir: &str, relative: &str) -> Option<String> {
    let mut parts: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}
