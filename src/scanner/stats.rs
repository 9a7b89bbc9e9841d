//! Scan accumulator

use std::collections::BTreeMap;

use serde::Serialize;

use crate::storage::ScanTotals;

/// Running counts for one scan, sealed onto the scan row at the end
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub lines_scanned: usize,
    pub functions_found: usize,
    pub error_count: usize,
    /// Files skipped by an incremental scan because their fingerprint matched
    pub unchanged: usize,
    languages: BTreeMap<String, LanguageTally>,
    most_complex: Option<(String, u32)>,
    least_complex: Option<(String, u32)>,
}

#[derive(Debug, Clone, Copy, Default)]
struct LanguageTally {
    files: usize,
    lines: usize,
}

/// Share of the repository's lines held by one file type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageShare {
    pub name: String,
    pub file_count: usize,
    pub total_lines: usize,
    pub percentage: f64,
}

impl ScanStats {
    /// Record a file that was analyzed and written
    pub fn record_file(&mut self, path: &str, language: &str, lines: usize, functions: usize, complexity: u32) {
        self.count(language, lines);
        self.functions_found += functions;

        if functions > 0 {
            if self.most_complex.as_ref().map_or(true, |(_, c)| complexity > *c) {
                self.most_complex = Some((path.to_string(), complexity));
            }
            if self.least_complex.as_ref().map_or(true, |(_, c)| complexity < *c) {
                self.least_complex = Some((path.to_string(), complexity));
            }
        }
    }

    /// Record a file whose stored row was kept as is
    pub fn record_unchanged(&mut self, language: &str, lines: usize) {
        self.count(language, lines);
        self.unchanged += 1;
    }

    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    fn count(&mut self, language: &str, lines: usize) {
        self.files_scanned += 1;
        self.lines_scanned += lines;
        let tally = self.languages.entry(language.to_string()).or_default();
        tally.files += 1;
        tally.lines += lines;
    }

    pub fn totals(&self) -> ScanTotals {
        ScanTotals {
            files_scanned: self.files_scanned,
            lines_scanned: self.lines_scanned,
            functions_found: self.functions_found,
            error_count: self.error_count,
        }
    }

    /// Per-language shares, largest first; percentages are rounded to two
    /// decimals and are all zero for a repository without lines
    pub fn language_shares(&self) -> Vec<LanguageShare> {
        let total = self.lines_scanned;
        let mut shares: Vec<LanguageShare> = self
            .languages
            .iter()
            .map(|(name, tally)| LanguageShare {
                name: name.clone(),
                file_count: tally.files,
                total_lines: tally.lines,
                percentage: percentage(tally.lines, total),
            })
            .collect();
        shares.sort_by(|a, b| b.total_lines.cmp(&a.total_lines).then_with(|| a.name.cmp(&b.name)));
        shares
    }

    /// Most complex analyzed file with at least one function
    pub fn most_complex(&self) -> Option<(&str, u32)> {
        self.most_complex.as_ref().map(|(p, c)| (p.as_str(), *c))
    }

    /// Least complex analyzed file with at least one function
    pub fn least_complex(&self) -> Option<(&str, u32)> {
        self.least_complex.as_ref().map(|(p, c)| (p.as_str(), *c))
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 10_000.0 / total as f64).round() / 100.0
}
