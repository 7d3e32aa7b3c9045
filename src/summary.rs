//! Summary synthesis.
//!
//! Turns an [`IndexDocument`] into one markdown overview: the links grouped
//! into categories, a short "how to use" block, and a full reference list
//! pointing at the downloaded files. Rendering does no I/O; only the
//! generation timestamp depends on the clock, and callers pass it in.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::config::{Config, SummaryConfig};
use crate::download::{self, REFERENCE_EXTENSION};
use crate::error::{Error, Result};
use crate::http::Fetcher;
use crate::index::{self, truncate_chars};
use crate::models::{IndexDocument, Link};
use crate::output;
use crate::sanitize::sanitize_filename;

/// Longest description shown in the reference list, in characters.
pub const MAX_LISTED_DESCRIPTION_CHARS: usize = 120;

/// Summary categories, declared in priority order: a link belongs to the
/// first category whose keywords appear in its description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    GettingStarted,
    Configuration,
    Reference,
    Guides,
    CoreConcepts,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::GettingStarted,
        Category::Configuration,
        Category::Reference,
        Category::Guides,
        Category::CoreConcepts,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Category::GettingStarted => "Getting Started",
            Category::Configuration => "Configuration",
            Category::Reference => "Reference",
            Category::Guides => "Guides",
            Category::CoreConcepts => "Core Concepts",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::GettingStarted => &["setup", "install", "start", "quickstart", "introduction"],
            Category::Configuration => &["config", "setting", "option", "environment"],
            Category::Reference => &["api", "reference", "cli", "command"],
            Category::Guides => &["example", "tutorial", "guide", "how to", "recipe"],
            // Catch-all.
            Category::CoreConcepts => &[],
        }
    }
}

/// Assign `link` to exactly one category.
pub fn categorize(link: &Link) -> Category {
    let haystack = link.description.to_lowercase();
    Category::ALL
        .into_iter()
        .find(|c| c.keywords().iter().any(|k| haystack.contains(k)))
        .unwrap_or(Category::CoreConcepts)
}

/// Links grouped by category, categories in priority order, members in
/// source order. Empty categories are omitted.
pub fn group_links(links: &[Link]) -> Vec<(Category, Vec<&Link>)> {
    let assigned: Vec<Category> = links.iter().map(categorize).collect();
    Category::ALL
        .into_iter()
        .filter_map(|category| {
            let members: Vec<&Link> = links
                .iter()
                .zip(&assigned)
                .filter(|(_, c)| **c == category)
                .map(|(link, _)| link)
                .collect();
            (!members.is_empty()).then_some((category, members))
        })
        .collect()
}

/// Render the summary document.
///
/// `references_dir` is the path of the reference files relative to the
/// summary. When `downloaded` is given, links whose file is not in it are
/// listed as not downloaded.
pub fn render_summary(
    doc: &IndexDocument,
    downloaded: Option<&HashSet<String>>,
    references_dir: &str,
    max_category_items: usize,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    let title = &doc.title;

    out.push_str("---\n");
    out.push_str(&format!("name: {}\n", sanitize_filename(&doc.derived_name)));
    out.push_str(&format!(
        "description: {}\n",
        download::quote(&format!(
            "Reference documentation for {}, indexed from {}",
            title, doc.source_url
        ))
    ));
    out.push_str("---\n\n");

    out.push_str(&format!("# {}\n\n", title));
    out.push_str(&format!(
        "> {} documents indexed from <{}> (fetched {}, generated {}).\n\n",
        doc.links.len(),
        doc.source_url,
        doc.fetched_at.to_rfc3339(),
        generated_at.to_rfc3339()
    ));

    out.push_str("## Overview\n\n");
    for (category, members) in group_links(&doc.links) {
        let mut names: Vec<&str> = members
            .iter()
            .take(max_category_items)
            .map(|l| l.name.as_str())
            .collect();
        let more = members.len().saturating_sub(max_category_items);
        let more_label = format!("+{} more", more);
        if more > 0 {
            names.push(&more_label);
        }
        out.push_str(&format!(
            "- **{}** ({}): {}\n",
            category.title(),
            members.len(),
            names.join(", ")
        ));
    }
    out.push('\n');

    out.push_str("## How to Use\n\n");
    out.push_str(&format!(
        "This summary indexes the {} documentation. Open the reference files \
         listed below for full details, or ask questions such as:\n\n",
        title
    ));
    for template in [
        "How do I get started with {}?",
        "How do I configure {}?",
        "What does the {} API reference say about this?",
        "Show me an example of using {}.",
    ] {
        out.push_str(&format!("- \"{}\"\n", template.replace("{}", title)));
    }
    out.push('\n');

    out.push_str("## Reference\n\n");
    let file_names = download::reference_file_names(&doc.links);
    for (link, file_name) in doc.links.iter().zip(file_names) {
        let location = match file_name {
            Ok(f) if downloaded.map_or(true, |set| set.contains(&f)) => {
                format!("`{}`", join_relative(references_dir, &f))
            }
            _ => "not downloaded".to_string(),
        };
        out.push_str(&format!(
            "- **{}** ({}): {}\n",
            link.name,
            location,
            listed_description(&link.description)
        ));
    }

    out
}

fn listed_description(description: &str) -> String {
    let flat = description.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > MAX_LISTED_DESCRIPTION_CHARS {
        format!("{}...", truncate_chars(&flat, MAX_LISTED_DESCRIPTION_CHARS - 3))
    } else {
        flat
    }
}

fn join_relative(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

/// Where the summary for `doc` goes: `dest` itself when it names a `.md`
/// file, otherwise `<dest>/<skillName>-summary.md`.
pub fn summary_path(doc: &IndexDocument, dest: &Path) -> PathBuf {
    if dest.extension().is_some_and(|ext| ext == REFERENCE_EXTENSION) {
        dest.to_path_buf()
    } else {
        dest.join(format!("{}-summary.md", sanitize_filename(&doc.derived_name)))
    }
}

/// Render and write the summary, returning the written path.
pub async fn write_summary(
    doc: &IndexDocument,
    dest: &Path,
    downloaded: Option<&HashSet<String>>,
    references_dir: &str,
    config: &SummaryConfig,
) -> Result<PathBuf> {
    let path = summary_path(doc, dest);
    let contents = render_summary(
        doc,
        downloaded,
        references_dir,
        config.max_category_items,
        Utc::now(),
    );
    output::write_file(&path, contents.as_bytes()).await?;
    Ok(path)
}

/// Names of the reference files present in `dir`.
pub async fn scan_references(dir: &Path) -> Result<HashSet<String>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| Error::invalid_input(dir, e))?;
    let mut names = HashSet::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::invalid_input(dir, e))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == REFERENCE_EXTENSION) {
            if let Some(name) = path.file_name() {
                names.insert(name.to_string_lossy().to_string());
            }
        }
    }
    Ok(names)
}

/// `target` as a forward-slash path relative to `base`. Both are resolved
/// against the working directory first, so the result is correct wherever
/// the two directories sit.
fn relative_dir(target: &Path, base: &Path) -> Result<String> {
    let target = resolved_components(target)?;
    let base = resolved_components(base)?;
    let common = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();

    let parts: Vec<String> = std::iter::repeat("..".to_string())
        .take(base.len() - common)
        .chain(
            target[common..]
                .iter()
                .map(|c| c.to_string_lossy().to_string()),
        )
        .collect();
    if parts.is_empty() {
        Ok(".".to_string())
    } else {
        Ok(parts.join("/"))
    }
}

/// Absolute components of `path` with `.` dropped and `..` applied.
fn resolved_components(path: &Path) -> Result<Vec<OsString>> {
    let abs = std::path::absolute(path).map_err(|e| Error::invalid_input(path, e))?;
    let mut anchors = 0;
    let mut out: Vec<OsString> = Vec::new();
    for component in abs.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                anchors += 1;
                out.push(component.as_os_str().to_os_string());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if out.len() > anchors {
                    out.pop();
                }
            }
            Component::Normal(name) => out.push(name.to_os_string()),
        }
    }
    Ok(out)
}

#[derive(Serialize)]
struct SummaryResult<'a> {
    summary: String,
    title: &'a str,
    #[serde(rename = "skillName")]
    skill_name: &'a str,
    links: usize,
    categories: Vec<CategoryCount>,
}

#[derive(Serialize)]
struct CategoryCount {
    category: Category,
    count: usize,
}

/// CLI entry point for `llmstxt summarize`.
///
/// `references` optionally points at a download directory; its contents
/// decide which links are listed with a file path.
pub async fn run_summarize(
    config: &Config,
    input: &str,
    dest: &Path,
    references: Option<&Path>,
) -> Result<()> {
    let out_dir = if dest.extension().is_some_and(|ext| ext == REFERENCE_EXTENSION) {
        dest.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    } else {
        dest
    };
    output::ensure_writable_dir(out_dir).await?;

    let downloaded = match references {
        Some(dir) => Some(scan_references(dir).await?),
        None => None,
    };
    let references_dir = match references {
        Some(dir) => relative_dir(dir, out_dir)?,
        None => config.summary.references_dir.clone(),
    };

    let fetcher = Fetcher::new(&config.http)?;
    let doc = index::load_index(&fetcher, input).await?;

    let path = write_summary(
        &doc,
        dest,
        downloaded.as_ref(),
        &references_dir,
        &config.summary,
    )
    .await?;

    output::print_json(&summary_result(&doc, &path))?;
    eprintln!("Wrote summary for '{}' to {}", doc.title, path.display());
    Ok(())
}

fn summary_result<'a>(doc: &'a IndexDocument, path: &Path) -> SummaryResult<'a> {
    SummaryResult {
        summary: path.display().to_string(),
        title: &doc.title,
        skill_name: &doc.derived_name,
        links: doc.links.len(),
        categories: group_links(&doc.links)
            .into_iter()
            .map(|(category, members)| CategoryCount {
                category,
                count: members.len(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(name: &str, description: &str) -> Link {
        Link {
            name: name.to_string(),
            url: format!("https://example.com/{}.md", name),
            description: description.to_string(),
        }
    }

    fn doc(links: Vec<Link>) -> IndexDocument {
        IndexDocument {
            title: "My Docs".to_string(),
            derived_name: "my-docs".to_string(),
            links,
            source_url: "https://example.com/llms.txt".to_string(),
            fetched_at: ts(),
        }
    }

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-16T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn categories_follow_priority() {
        assert_eq!(categorize(&link("a", "How to INSTALL")), Category::GettingStarted);
        // "setup" outranks "config".
        assert_eq!(
            categorize(&link("b", "Setup and configuration")),
            Category::GettingStarted
        );
        assert_eq!(categorize(&link("c", "Settings file")), Category::Configuration);
        assert_eq!(categorize(&link("d", "REST API")), Category::Reference);
        assert_eq!(categorize(&link("e", "A worked example")), Category::Guides);
        assert_eq!(categorize(&link("f", "Ownership model")), Category::CoreConcepts);
    }

    #[test]
    fn every_link_in_exactly_one_group() {
        let links = vec![
            link("install", "Install it"),
            link("ownership", "Ownership and borrowing"),
            link("api", "API reference"),
            link("tutorial", "Step-by-step tutorial"),
            link("env", "Environment variables"),
            link("traits", "Traits"),
        ];
        let groups = group_links(&links);
        let total: usize = groups.iter().map(|(_, m)| m.len()).sum();
        assert_eq!(total, links.len());

        let mut seen = HashSet::new();
        for (_, members) in &groups {
            for m in members {
                assert!(seen.insert(m.name.clone()), "{} counted twice", m.name);
            }
        }

        let core = groups
            .iter()
            .find(|(c, _)| *c == Category::CoreConcepts)
            .unwrap();
        let names: Vec<&str> = core.1.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["ownership", "traits"]);
    }

    #[test]
    fn groups_in_priority_order() {
        let links = vec![link("x", "plain"), link("y", "setup")];
        let order: Vec<Category> = group_links(&links).into_iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec![Category::GettingStarted, Category::CoreConcepts]);
    }

    #[test]
    fn overview_truncates_long_categories() {
        let links: Vec<Link> = (0..8).map(|i| link(&format!("g{}", i), "guide")).collect();
        let out = render_summary(&doc(links), None, "references", 5, ts());
        assert!(out.contains("- **Guides** (8): g0, g1, g2, g3, g4, +3 more\n"));
    }

    #[test]
    fn render_is_pure_given_timestamp() {
        let d = doc(vec![link("start", "How to begin"), link("api", "API Reference")]);
        let a = render_summary(&d, None, "references", 5, ts());
        let b = render_summary(&d, None, "references", 5, ts());
        assert_eq!(a, b);

        assert!(a.starts_with("---\nname: my-docs\n"));
        assert!(a.contains("# My Docs\n"));
        assert!(a.contains("\"How do I configure My Docs?\""));
        assert!(a.contains("- **start** (`references/start.md`): How to begin\n"));
        assert!(a.contains("- **api** (`references/api.md`): API Reference\n"));
    }

    #[test]
    fn missing_downloads_are_marked() {
        let d = doc(vec![link("start", "Start"), link("api", "API")]);
        let downloaded: HashSet<String> = ["start.md".to_string()].into_iter().collect();
        let out = render_summary(&d, Some(&downloaded), ".", 5, ts());
        assert!(out.contains("- **start** (`start.md`): Start\n"));
        assert!(out.contains("- **api** (not downloaded): API\n"));
    }

    #[test]
    fn long_descriptions_shortened_in_listing() {
        let listed = listed_description(&"word ".repeat(100));
        assert_eq!(listed.chars().count(), MAX_LISTED_DESCRIPTION_CHARS);
        assert!(listed.ends_with("..."));
        assert_eq!(listed_description("a\n  b"), "a b");
    }

    #[test]
    fn summary_path_rules() {
        let d = doc(vec![link("a", "a")]);
        assert_eq!(
            summary_path(&d, Path::new("out")),
            PathBuf::from("out/my-docs-summary.md")
        );
        assert_eq!(
            summary_path(&d, Path::new("out/SUMMARY.md")),
            PathBuf::from("out/SUMMARY.md")
        );

        let mut escaping = doc(vec![link("a", "a")]);
        escaping.derived_name = "../../escaped".to_string();
        assert_eq!(
            summary_path(&escaping, Path::new("out")),
            PathBuf::from("out/escaped-summary.md")
        );
        let rendered = render_summary(&escaping, None, "references", 5, ts());
        assert!(rendered.starts_with("---\nname: escaped\n"));
    }

    #[test]
    fn relative_reference_dir() {
        let rel = |target: &str, base: &str| {
            relative_dir(Path::new(target), Path::new(base)).unwrap()
        };
        assert_eq!(rel("out/references", "out"), "references");
        assert_eq!(rel("refs", "out"), "../refs");
        assert_eq!(rel("../refs", "out"), "../../refs");
        assert_eq!(rel("out", "out"), ".");
        assert_eq!(rel("out/./x/../references", "out"), "references");
        assert_eq!(rel("/a/b/refs", "/a/c/d"), "../../b/refs");
    }

    #[tokio::test]
    async fn scan_and_write() {
        let tmp = tempfile::TempDir::new().unwrap();
        let refs = tmp.path().join("references");
        std::fs::create_dir_all(&refs).unwrap();
        std::fs::write(refs.join("start.md"), "x").unwrap();
        std::fs::write(refs.join("notes.txt"), "x").unwrap();

        let found = scan_references(&refs).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains("start.md"));

        let d = doc(vec![link("start", "Start"), link("api", "API")]);
        let path = write_summary(
            &d,
            tmp.path(),
            Some(&found),
            "references",
            &SummaryConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(path, tmp.path().join("my-docs-summary.md"));
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("(not downloaded)"));
    }
}
