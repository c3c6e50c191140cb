use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::model::ChapterNumber;
use crate::normalize::normalize;
use crate::page_lines::PageLine;
use crate::source::{DocumentSource, OutlineNode};

const TOC_SCAN_PAGE_LIMIT: u32 = 20;

const TOC_PAGE_MARKERS: [&str; 3] = ["table of contents", "contents", "index"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChapterSourceKind {
    Bookmarks,
    TextSearch,
}

impl ChapterSourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChapterSourceKind::Bookmarks => "bookmarks",
            ChapterSourceKind::TextSearch => "text-search",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterCandidate {
    pub number: ChapterNumber,
    pub title: String,
    pub starting_page: Option<u32>,
}

pub struct OutlineExtractor {
    bookmark_numbered: Regex,
    bookmark_appendix: Regex,
    toc_numbered: Regex,
    toc_introduction: Regex,
    toc_appendix: Regex,
    toc_generic: Regex,
}

impl OutlineExtractor {
    pub fn new() -> Result<Self> {
        let bookmark_numbered =
            Regex::new(r"^(\d+)\s+(.+)$").context("failed to compile bookmark numbering regex")?;
        let bookmark_appendix = Regex::new(r"(?i)^appendix\s+([a-z])\b")
            .context("failed to compile bookmark appendix regex")?;
        let toc_numbered = Regex::new(r"^(\d{1,3})\.?\s+(.+?)\s+(\d{1,4})$")
            .context("failed to compile TOC numbered line regex")?;
        let toc_introduction = Regex::new(r"(?i)^introduction\b\s*:?\s*(.*?)\s*(\d{1,4})$")
            .context("failed to compile TOC introduction line regex")?;
        let toc_appendix = Regex::new(r"(?i)^appendix\s+([a-z])\b\s*[.:]?\s*(.*?)\s*(\d{1,4})$")
            .context("failed to compile TOC appendix line regex")?;
        let toc_generic = Regex::new(r"^(.+?)\s+(\d{1,4})$")
            .context("failed to compile TOC generic line regex")?;

        Ok(Self {
            bookmark_numbered,
            bookmark_appendix,
            toc_numbered,
            toc_introduction,
            toc_appendix,
            toc_generic,
        })
    }

    pub fn candidates_from_bookmarks(
        &self,
        document: &dyn DocumentSource,
        nodes: &[OutlineNode],
    ) -> Vec<ChapterCandidate> {
        let mut candidates = Vec::<ChapterCandidate>::new();
        self.walk_bookmarks(document, nodes, &mut candidates);
        candidates
    }

    fn walk_bookmarks(
        &self,
        document: &dyn DocumentSource,
        nodes: &[OutlineNode],
        candidates: &mut Vec<ChapterCandidate>,
    ) {
        for node in nodes {
            let title = normalize(&node.title);
            if title.to_lowercase() != "contents" && !title.is_empty() {
                let (number, title) = self.classify_bookmark_title(&title);
                let starting_page = match &node.destination {
                    Some(destination) => match document.resolve_destination(destination) {
                        Ok(page) => Some(page),
                        Err(error) => {
                            warn!(
                                title = %title,
                                error = %error,
                                "failed to resolve outline destination"
                            );
                            None
                        }
                    },
                    None => None,
                };
                candidates.push(ChapterCandidate {
                    number,
                    title,
                    starting_page,
                });
            }

            self.walk_bookmarks(document, &node.children, candidates);
        }
    }

    fn classify_bookmark_title(&self, title: &str) -> (ChapterNumber, String) {
        if let Some(captures) = self.bookmark_numbered.captures(title) {
            let value = captures
                .get(1)
                .and_then(|group| group.as_str().parse::<u32>().ok());
            let rest = captures
                .get(2)
                .map(|group| group.as_str().trim())
                .unwrap_or_default();
            if let Some(value) = value {
                if !rest.is_empty() {
                    return (ChapterNumber::Numbered(value), rest.to_string());
                }
            }
        }

        if title.to_lowercase().contains("introduction") {
            return (ChapterNumber::Numbered(0), title.to_string());
        }

        if let Some(captures) = self.bookmark_appendix.captures(title) {
            if let Some(letter) = captures.get(1) {
                let label = format!("Appendix {}", letter.as_str().to_ascii_uppercase());
                return (ChapterNumber::Labeled(label), title.to_string());
            }
        }

        (ChapterNumber::Unnumbered, title.to_string())
    }

    pub fn candidates_from_text(&self, pages: &[(u32, Vec<PageLine>)]) -> Vec<ChapterCandidate> {
        let mut candidates = Vec::<ChapterCandidate>::new();

        for (page_number, lines) in pages {
            if *page_number > TOC_SCAN_PAGE_LIMIT {
                break;
            }
            if !is_toc_page(lines) {
                continue;
            }

            debug!(page = page_number, "parsing table-of-contents page");
            for line in lines {
                if let Some(candidate) = self.parse_toc_line(&line.text) {
                    candidates.push(candidate);
                }
            }
        }

        candidates
    }

    fn parse_toc_line(&self, line: &str) -> Option<ChapterCandidate> {
        let lowered = normalize(line).to_lowercase();
        if matches!(lowered.as_str(), "contents" | "page" | "chapter") {
            return None;
        }

        if let Some(captures) = self.toc_numbered.captures(line) {
            let value = captures.get(1)?.as_str().parse::<u32>().ok()?;
            let title = clean_toc_title(captures.get(2)?.as_str());
            let page = captures.get(3)?.as_str().parse::<u32>().ok()?;
            if title.is_empty() {
                return None;
            }
            return Some(ChapterCandidate {
                number: ChapterNumber::Numbered(value),
                title,
                starting_page: Some(page),
            });
        }

        if let Some(captures) = self.toc_introduction.captures(line) {
            let rest = clean_toc_title(captures.get(1)?.as_str());
            let page = captures.get(2)?.as_str().parse::<u32>().ok()?;
            let title = if rest.is_empty() {
                "Introduction".to_string()
            } else {
                format!("Introduction: {rest}")
            };
            return Some(ChapterCandidate {
                number: ChapterNumber::Numbered(0),
                title,
                starting_page: Some(page),
            });
        }

        if let Some(captures) = self.toc_appendix.captures(line) {
            let letter = captures.get(1)?.as_str().to_ascii_uppercase();
            let rest = clean_toc_title(captures.get(2)?.as_str());
            let page = captures.get(3)?.as_str().parse::<u32>().ok()?;
            let label = format!("Appendix {letter}");
            let title = if rest.is_empty() { label.clone() } else { rest };
            return Some(ChapterCandidate {
                number: ChapterNumber::Labeled(label),
                title,
                starting_page: Some(page),
            });
        }

        if let Some(captures) = self.toc_generic.captures(line) {
            let title = clean_toc_title(captures.get(1)?.as_str());
            let page = captures.get(2)?.as_str().parse::<u32>().ok()?;
            if title.is_empty() {
                return None;
            }
            return Some(ChapterCandidate {
                number: ChapterNumber::Unnumbered,
                title,
                starting_page: Some(page),
            });
        }

        None
    }
}

fn is_toc_page(lines: &[PageLine]) -> bool {
    let joined = lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    TOC_PAGE_MARKERS
        .iter()
        .any(|marker| joined.contains(marker))
}

fn clean_toc_title(raw: &str) -> String {
    normalize(raw)
        .trim_end_matches(['.', '\u{00B7}', '\u{2026}', ' '])
        .to_string()
}
