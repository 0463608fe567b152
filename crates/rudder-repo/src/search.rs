//! Chart search over cached repository indexes
//!
//! Every indexed chart is described by one line of `\v`-separated fields:
//!
//! ```text
//! name \v repo/name \v description \v keywords
//! ```
//!
//! A hit is scored by the field it falls in (0 for the name, 1 for the
//! qualified name, ...), so lower scores are better matches.

use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use rudder_core::ListChartRequest;

use crate::config::RepositoryFile;
use crate::error::Result;
use crate::home::RepoHome;
use crate::index::{ChartVersion, IndexFile};

/// Hits scoring at or above this are not considered matches
pub const SEARCH_MAX_SCORE: usize = 25;

const SEP: char = '\u{000B}';
const VERSION_SEP: &str = "$$";

/// One search hit
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResult {
    /// Qualified name, `repo/chart`
    pub name: String,
    pub score: usize,
    pub chart: ChartVersion,
}

/// Search index built from one or more repository indexes
#[derive(Debug, Default)]
pub struct SearchIndex {
    lines: BTreeMap<String, String>,
    charts: BTreeMap<String, ChartVersion>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index one repository; `all_versions` indexes every version instead of
    /// only the newest
    pub fn add_repo(&mut self, repo: &str, index: &IndexFile, all_versions: bool) {
        for (name, versions) in &index.entries {
            let Some(newest) = versions.first() else {
                continue;
            };
            let qualified = format!("{}/{}", repo, name);

            if !all_versions {
                self.lines.insert(qualified.clone(), index_line(repo, newest));
                self.charts.insert(qualified, newest.clone());
                continue;
            }

            for version in versions {
                let key = format!("{}{}{}", qualified, VERSION_SEP, version.version);
                self.lines.insert(key.clone(), index_line(repo, version));
                self.charts.insert(key, version.clone());
            }
        }
    }

    /// Every indexed chart, unscored
    pub fn all(&self) -> Vec<SearchResult> {
        self.charts
            .iter()
            .map(|(key, chart)| SearchResult {
                name: strip_version(key),
                score: 0,
                chart: chart.clone(),
            })
            .collect()
    }

    /// Search by case-insensitive substring or by regular expression
    pub fn search(&self, term: &str, threshold: usize, regexp: bool) -> std::result::Result<Vec<SearchResult>, regex::Error> {
        if regexp {
            self.search_regexp(term, threshold)
        } else {
            Ok(self.search_literal(term, threshold))
        }
    }

    fn search_literal(&self, term: &str, threshold: usize) -> Vec<SearchResult> {
        let term = term.to_lowercase();
        self.collect(threshold, |line| {
            // Offsets are only valid in the lowercased line
            let line = line.to_lowercase();
            line.find(&term).map(|position| score(position, &line))
        })
    }

    fn search_regexp(&self, pattern: &str, threshold: usize) -> std::result::Result<Vec<SearchResult>, regex::Error> {
        let matcher = Regex::new(pattern)?;
        Ok(self.collect(threshold, |line| {
            matcher.find(line).map(|m| score(m.start(), line))
        }))
    }

    /// Keep every line `score_line` scores below `threshold`
    fn collect(&self, threshold: usize, score_line: impl Fn(&str) -> Option<usize>) -> Vec<SearchResult> {
        self.lines
            .iter()
            .filter_map(|(key, line)| {
                let score = score_line(line)?;
                (score < threshold).then(|| SearchResult {
                    name: strip_version(key),
                    score,
                    chart: self.charts[key].clone(),
                })
            })
            .collect()
    }
}

fn index_line(repo: &str, chart: &ChartVersion) -> String {
    format!(
        "{name}{SEP}{repo}/{name}{SEP}{desc}{SEP}{keywords}",
        name = chart.name,
        desc = chart.description.as_deref().unwrap_or_default(),
        keywords = chart.keywords.join(" "),
    )
}

fn strip_version(key: &str) -> String {
    key.split(VERSION_SEP).next().unwrap_or(key).to_string()
}

/// Index of the field containing byte offset `position`
fn score(position: usize, line: &str) -> usize {
    line.char_indices()
        .filter(|(i, c)| *c == SEP && *i < position)
        .count()
}

/// Order results best match first, then by name, then newest version first
pub fn sort_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        a.score
            .cmp(&b.score)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| newer_first(&a.chart.version, &b.chart.version))
    });
}

fn newer_first(a: &str, b: &str) -> Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(va), Ok(vb)) => vb.cmp(&va),
        _ => b.cmp(a),
    }
}

/// Build a search index from every configured repository's cached index
///
/// Repositories whose cache is missing or corrupt are skipped.
pub fn build_index(home: &RepoHome, all_versions: bool) -> Result<SearchIndex> {
    let repositories = RepositoryFile::load(&home.repository_file())?;
    let mut search = SearchIndex::new();

    for repo in &repositories.repositories {
        match IndexFile::load(&home.index_for(repo)) {
            Ok(index) => search.add_repo(&repo.name, &index, all_versions),
            Err(e) => {
                tracing::warn!(repo = %repo.name, error = %e, "repository index is corrupt or missing, skipping");
            }
        }
    }

    Ok(search)
}

/// Search the configured repositories for charts
///
/// An invalid regular expression yields no results rather than an error.
pub fn list_charts(home: &RepoHome, request: &ListChartRequest) -> Result<Vec<SearchResult>> {
    tracing::info!(filter = %request.filter, regexp = request.regexp, "listing charts");
    let index = build_index(home, request.versions)?;

    let mut results = if request.filter.is_empty() {
        index.all()
    } else {
        match index.search(&request.filter, SEARCH_MAX_SCORE, request.regexp) {
            Ok(results) => results,
            Err(e) => {
                tracing::debug!(filter = %request.filter, error = %e, "invalid search expression");
                return Ok(Vec::new());
            }
        }
    };

    sort_score(&mut results);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryEntry;
    use tempfile::TempDir;

    const STABLE: &str = r#"
apiVersion: v1
entries:
  nginx:
    - name: nginx
      version: 1.2.0
      description: Web server and reverse proxy
      keywords: [http]
      urls: [nginx-1.2.0.tgz]
    - name: nginx
      version: 1.1.0
      description: Web server and reverse proxy
      urls: [nginx-1.1.0.tgz]
  mariadb:
    - name: mariadb
      version: 2.0.0
      description: Fork of mysql
      keywords: [database, sql]
      urls: [mariadb-2.0.0.tgz]
  mysql:
    - name: mysql
      version: 0.3.0
      description: Relational database
      urls: [mysql-0.3.0.tgz]
"#;

    fn index() -> SearchIndex {
        let mut search = SearchIndex::new();
        search.add_repo("stable", &IndexFile::from_yaml(STABLE).unwrap(), false);
        search
    }

    #[test]
    fn test_all_returns_newest_versions() {
        let all = index().all();
        assert_eq!(all.len(), 3);
        let nginx = all.iter().find(|r| r.name == "stable/nginx").unwrap();
        assert_eq!(nginx.chart.version, "1.2.0");
    }

    #[test]
    fn test_all_versions() {
        let mut search = SearchIndex::new();
        search.add_repo("stable", &IndexFile::from_yaml(STABLE).unwrap(), true);
        let nginx: Vec<_> = search.all().into_iter().filter(|r| r.name == "stable/nginx").collect();
        assert_eq!(nginx.len(), 2);
    }

    #[test]
    fn test_literal_scores_by_field() {
        let mut results = index().search("mysql", SEARCH_MAX_SCORE, false).unwrap();
        sort_score(&mut results);

        // name match beats description match
        assert_eq!(results[0].name, "stable/mysql");
        assert_eq!(results[0].score, 0);
        assert_eq!(results[1].name, "stable/mariadb");
        assert_eq!(results[1].score, 2);
    }

    #[test]
    fn test_literal_is_case_insensitive() {
        let results = index().search("NGINX", SEARCH_MAX_SCORE, false).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_threshold_drops_weak_matches() {
        // description hit scores 2, keyword hit scores 3
        assert!(index().search("database", 2, false).unwrap().is_empty());
        let results = index().search("database", 3, false).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "stable/mysql");
        assert_eq!(index().search("database", 4, false).unwrap().len(), 2);
    }

    #[test]
    fn test_literal_score_with_shrinking_lowercase() {
        // KELVIN SIGN is three bytes but lowercases to a one-byte `k`
        let yaml = "apiVersion: v1\nentries:\n  thermo:\n    - name: thermo\n      version: 1.0.0\n      description: \"\u{212A}\u{212A}\u{212A}\u{212A} scale\"\n      keywords: [needle]\n";
        let mut search = SearchIndex::new();
        search.add_repo("stable", &IndexFile::from_yaml(yaml).unwrap(), false);

        let results = search.search("needle", SEARCH_MAX_SCORE, false).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 3);

        let results = search.search("\u{212A}\u{212A}", SEARCH_MAX_SCORE, false).unwrap();
        assert_eq!(results[0].score, 2);
    }

    #[test]
    fn test_regexp() {
        let results = index().search("^m.*db", SEARCH_MAX_SCORE, true).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "stable/mariadb");
        assert!(index().search("(unclosed", SEARCH_MAX_SCORE, true).is_err());
    }

    #[test]
    fn test_sort_newest_version_first_on_ties() {
        let mut search = SearchIndex::new();
        search.add_repo("stable", &IndexFile::from_yaml(STABLE).unwrap(), true);
        let mut results = search.search("nginx", SEARCH_MAX_SCORE, false).unwrap();
        sort_score(&mut results);
        let versions: Vec<_> = results.iter().map(|r| r.chart.version.as_str()).collect();
        assert_eq!(versions, vec!["1.2.0", "1.1.0"]);
    }

    fn home_with_stable() -> (TempDir, RepoHome) {
        let temp = TempDir::new().unwrap();
        let home = RepoHome::new(temp.path());
        let mut file = RepositoryFile::default();
        file.update(RepositoryEntry::new("stable", "https://charts.example.com"));
        file.update(RepositoryEntry::new("broken", "https://broken.example.com"));
        file.save(&home.repository_file()).unwrap();
        std::fs::create_dir_all(home.cache()).unwrap();
        std::fs::write(home.cache_index("stable"), STABLE).unwrap();
        std::fs::write(home.cache_index("broken"), "entries: [").unwrap();
        (temp, home)
    }

    #[test]
    fn test_list_charts_skips_corrupt_caches() {
        let (_temp, home) = home_with_stable();
        let results = list_charts(&home, &ListChartRequest::default()).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.name.starts_with("stable/")));
    }

    #[test]
    fn test_list_charts_invalid_regexp_is_empty() {
        let (_temp, home) = home_with_stable();
        let request = ListChartRequest {
            filter: "[".to_string(),
            regexp: true,
            ..Default::default()
        };
        assert!(list_charts(&home, &request).unwrap().is_empty());
    }
}
