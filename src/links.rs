use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use regex::Regex;

use crate::model::{BoundingBox, Chapter, Confidence, LinkMethod, LinkRef};

const COORDINATE_TOLERANCE: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LinkResolution {
    pub target_chunk_id: u32,
    pub method: LinkMethod,
    pub confidence: Confidence,
}

#[derive(Debug, Clone)]
struct ChunkRecord {
    id: u32,
    text: String,
    coordinates: Option<BoundingBox>,
}

pub struct LinkResolver {
    chunks_by_page: BTreeMap<u32, Vec<ChunkRecord>>,
    bare_marker: Regex,
    leading_number: Regex,
    page_list: Regex,
}

impl LinkResolver {
    pub fn new(chapters: &[Chapter]) -> Result<Self> {
        let bare_marker =
            Regex::new(r"^\d+$").context("failed to compile bare footnote marker regex")?;
        let leading_number =
            Regex::new(r"^\d+\b").context("failed to compile leading number regex")?;
        let page_list = Regex::new(r"(\d{1,4})(?:\s*[\u{2013}\u{2014}-]\s*(\d{1,4}))?")
            .context("failed to compile embedded page list regex")?;

        let mut chunks_by_page = BTreeMap::<u32, Vec<ChunkRecord>>::new();
        for chapter in chapters {
            for chunk in &chapter.chunks {
                chunks_by_page
                    .entry(chunk.page_number)
                    .or_default()
                    .push(ChunkRecord {
                        id: chunk.id,
                        text: chunk.text.clone(),
                        coordinates: chunk.coordinates,
                    });
            }
        }

        Ok(Self {
            chunks_by_page,
            bare_marker,
            leading_number,
            page_list,
        })
    }

    pub fn resolve(&self, link: &LinkRef) -> Option<LinkResolution> {
        let destination_chunks = self.chunks_by_page.get(&link.destination_page)?;
        if destination_chunks.is_empty() {
            return None;
        }

        let trimmed = link.text.trim();
        if self.bare_marker.is_match(trimmed) {
            if let Some(record) = destination_chunks
                .iter()
                .find(|record| starts_with_marker(&record.text, trimmed))
            {
                return Some(LinkResolution {
                    target_chunk_id: record.id,
                    method: LinkMethod::FootnoteDirect,
                    confidence: Confidence::High,
                });
            }
        } else {
            let embedded = self.embedded_pages(trimmed);
            if !embedded.is_empty() && !embedded.contains(&link.destination_page) {
                for page in &embedded {
                    let Some(records) = self.chunks_by_page.get(page) else {
                        continue;
                    };
                    if let Some(record) = records
                        .iter()
                        .find(|record| self.leading_number.is_match(&record.text))
                    {
                        return Some(LinkResolution {
                            target_chunk_id: record.id,
                            method: LinkMethod::TextCorrected,
                            confidence: Confidence::Medium,
                        });
                    }
                }
            }
        }

        if let Some(point) = link.destination_coordinates {
            if let Some(record) = destination_chunks.iter().find(|record| {
                record
                    .coordinates
                    .is_some_and(|bounds| bounds.contains(point, COORDINATE_TOLERANCE))
            }) {
                return Some(LinkResolution {
                    target_chunk_id: record.id,
                    method: LinkMethod::Coordinates,
                    confidence: Confidence::High,
                });
            }
        }

        destination_chunks.first().map(|record| LinkResolution {
            target_chunk_id: record.id,
            method: LinkMethod::PageFallback,
            confidence: Confidence::VeryLow,
        })
    }

    fn embedded_pages(&self, text: &str) -> BTreeSet<u32> {
        let mut pages = BTreeSet::<u32>::new();

        for captures in self.page_list.captures_iter(text) {
            let Some(start_group) = captures.get(1) else {
                continue;
            };
            let Ok(start) = start_group.as_str().parse::<u32>() else {
                continue;
            };

            match captures.get(2) {
                Some(end_group) => {
                    expand_range(start_group.as_str(), start, end_group.as_str(), &mut pages);
                }
                None => {
                    pages.insert(start);
                }
            }
        }

        pages
    }
}

fn starts_with_marker(text: &str, marker: &str) -> bool {
    text.strip_prefix(marker)
        .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

fn expand_range(start_text: &str, start: u32, end_text: &str, pages: &mut BTreeSet<u32>) {
    let end = if end_text.len() < start_text.len() {
        let prefix = &start_text[..start_text.len() - end_text.len()];
        format!("{prefix}{end_text}").parse::<u32>().ok()
    } else {
        end_text.parse::<u32>().ok()
    };

    match end {
        Some(end) if end >= start => {
            for page in start..=end {
                pages.insert(page);
            }
        }
        _ => {
            pages.insert(start);
        }
    }
}
