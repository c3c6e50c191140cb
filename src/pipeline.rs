use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chapters::{ChapterDetector, ChapterDraft};
use crate::chunker;
use crate::config::BookConfig;
use crate::images::{self, CorrelationTier};
use crate::links::LinkResolver;
use crate::model::{Chapter, LinkMethod, ResolvedLink};
use crate::normalize::fuzzy_title_match;
use crate::outline::{ChapterCandidate, ChapterSourceKind, OutlineExtractor};
use crate::page_lines::{self, PageLine};
use crate::source::{DocumentSource, ImageSource};

/// Counters and warnings gathered across one resolution run.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveStats {
    pub page_count: u32,
    pub line_count: usize,
    pub candidate_count: usize,
    pub chapter_count: usize,
    pub chunk_count: u32,
    pub front_matter_lines_skipped: usize,
    pub pinned_start_pages: usize,
    pub interpolated_start_pages: usize,
    pub image_tier: CorrelationTier,
    pub images_expected: usize,
    pub images_extracted: usize,
    pub image_placeholders: usize,
    pub links_total: usize,
    pub footnote_direct_links: usize,
    pub text_corrected_links: usize,
    pub coordinate_links: usize,
    pub page_fallback_links: usize,
    pub unresolved_links: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedBook {
    pub chapters: Vec<Chapter>,
    pub source: ChapterSourceKind,
    pub stats: ResolveStats,
}

/// Resolves a paginated document into ordered chapters with page-bounded
/// chunks, attached images, and resolved cross-references.
pub fn resolve_book(
    document: &impl DocumentSource,
    image_source: &impl ImageSource,
    config: &BookConfig,
) -> Result<ResolvedBook> {
    let mut warnings = Vec::<String>::new();

    let page_count = document.page_count().context("failed to read page count")?;
    if page_count == 0 {
        bail!("document reports zero pages");
    }
    info!(pages = page_count, "resolving book structure");

    let mut lines = Vec::<String>::new();
    let mut pages = Vec::<(u32, Vec<PageLine>)>::new();
    let mut run_count = 0usize;
    for page_number in 1..=page_count {
        let runs = document
            .page_text(page_number)
            .with_context(|| format!("failed to read text runs for page {page_number}"))?;
        run_count += runs.len();
        let page_lines = page_lines::group_runs_into_lines(&runs);
        for line in &page_lines {
            lines.push(line.text.clone());
        }
        pages.push((page_number, page_lines));
    }
    if run_count == 0 {
        bail!("document contains no text runs on any page");
    }

    let extractor = OutlineExtractor::new()?;
    let outline = match document.outline() {
        Ok(outline) => outline,
        Err(error) => {
            warn!(error = %error, "outline unavailable, falling back to text search");
            warnings.push(format!("outline unavailable: {error}"));
            Vec::new()
        }
    };
    let (source, candidates) = if outline.is_empty() {
        (
            ChapterSourceKind::TextSearch,
            extractor.candidates_from_text(&pages),
        )
    } else {
        (
            ChapterSourceKind::Bookmarks,
            extractor.candidates_from_bookmarks(document, &outline),
        )
    };
    debug!(
        source = source.as_str(),
        candidates = candidates.len(),
        "collected chapter candidates"
    );

    let detector = ChapterDetector::new(config)?;
    let detection = detector.detect(&lines);
    if detection.used_fallback {
        warnings.push("no chapter boundaries matched, emitting a single chapter".to_string());
    }

    let detected = match image_source.detect_images() {
        Ok(detected) => detected,
        Err(error) => {
            warn!(error = %error, "image detection failed");
            warnings.push(format!("image detection failed: {error}"));
            Vec::new()
        }
    };
    let assets = match image_source.extract_images() {
        Ok(assets) => Some(assets),
        Err(error) => {
            warn!(error = %error, "image extraction failed, using placeholders");
            warnings.push(format!("image extraction failed: {error}"));
            None
        }
    };
    let correlation = images::correlate(&detected, assets.as_deref());
    warnings.extend(correlation.warnings.iter().cloned());

    let front_matter_lines_skipped = detection.front_matter_lines_skipped;
    let mut pinned_start_pages = 0usize;
    let mut interpolated_start_pages = 0usize;

    let mut chapters = if detection.used_fallback {
        let mut drafts = detection.chapters;
        let draft = drafts.remove(0);
        let mut chunks = Vec::new();
        for (page_number, page_lines) in &pages {
            chunks.extend(chunker::chunk_page_lines(
                *page_number,
                page_lines,
                config.words_per_chunk,
            ));
        }
        let mut chapter = Chapter {
            number: draft.number,
            title: draft.title,
            start_page: 1,
            end_page: page_count,
            word_count: draft.word_count,
            text: draft.text,
            chunks,
            images: Vec::new(),
        };
        chunker::backfill_page_range(&mut chapter);
        vec![chapter]
    } else {
        let pins = pin_start_pages(&detection.chapters, &candidates, page_count);
        pinned_start_pages = pins.iter().filter(|pin| pin.is_some()).count();
        interpolated_start_pages = detection.chapters.len() - pinned_start_pages;

        let mut starts = interpolate_start_pages(&detection.chapters, &pins, page_count);
        let mut previous = 0u32;
        for start in &mut starts {
            if *start <= previous {
                *start = previous.saturating_add(1).min(page_count);
            }
            if *start > page_count {
                *start = page_count;
            }
            previous = *start;
        }

        let mut chapters = Vec::with_capacity(detection.chapters.len());
        for (index, draft) in detection.chapters.into_iter().enumerate() {
            let start_page = starts[index];
            let end_page = if index + 1 < starts.len() {
                starts[index + 1].saturating_sub(1).max(start_page)
            } else {
                page_count.max(start_page)
            };
            let texts = chunker::derive_chunks(&draft.text, config.words_per_chunk);
            let chunks = chunker::paginate_chunks(&texts, start_page, end_page);
            chapters.push(Chapter {
                number: draft.number,
                title: draft.title,
                start_page,
                end_page,
                word_count: draft.word_count,
                text: draft.text,
                chunks,
                images: Vec::new(),
            });
        }
        chapters
    };

    chunker::attach_images(&mut chapters, &correlation.by_page);

    let chunk_count = chunker::assign_global_ids(&mut chapters);

    let records = match document.link_records() {
        Ok(records) => records,
        Err(error) => {
            warn!(error = %error, "link records unavailable");
            warnings.push(format!("link records unavailable: {error}"));
            Vec::new()
        }
    };
    let resolver = LinkResolver::new(&chapters)?;
    let links_total = records.len();
    let mut footnote_direct_links = 0usize;
    let mut text_corrected_links = 0usize;
    let mut coordinate_links = 0usize;
    let mut page_fallback_links = 0usize;
    let mut unresolved_links = 0usize;
    for record in &records {
        match resolver.resolve(record) {
            Some(resolution) => {
                match resolution.method {
                    LinkMethod::FootnoteDirect => footnote_direct_links += 1,
                    LinkMethod::TextCorrected => text_corrected_links += 1,
                    LinkMethod::Coordinates => coordinate_links += 1,
                    LinkMethod::PageFallback => page_fallback_links += 1,
                }
                let resolved = ResolvedLink {
                    text: record.text.clone(),
                    destination_page: record.destination_page,
                    target_chunk_id: resolution.target_chunk_id,
                    method: resolution.method,
                    confidence: resolution.confidence,
                };
                if !chunker::attach_link(&mut chapters, record.page_number, resolved) {
                    debug!(
                        page = record.page_number,
                        "no chunk on the link's source page"
                    );
                }
            }
            None => {
                unresolved_links += 1;
                debug!(
                    page = record.destination_page,
                    text = %record.text,
                    "link destination page has no chunks"
                );
            }
        }
    }
    if unresolved_links > 0 {
        warnings.push(format!(
            "{unresolved_links} links had no chunk on their destination page"
        ));
    }

    let stats = ResolveStats {
        page_count,
        line_count: lines.len(),
        candidate_count: candidates.len(),
        chapter_count: chapters.len(),
        chunk_count,
        front_matter_lines_skipped,
        pinned_start_pages,
        interpolated_start_pages,
        image_tier: correlation.tier,
        images_expected: correlation.expected,
        images_extracted: correlation.extracted,
        image_placeholders: correlation.placeholders,
        links_total,
        footnote_direct_links,
        text_corrected_links,
        coordinate_links,
        page_fallback_links,
        unresolved_links,
        warnings,
    };

    info!(
        chapters = stats.chapter_count,
        chunks = stats.chunk_count,
        source = source.as_str(),
        image_tier = correlation.tier.as_str(),
        "book resolution complete"
    );

    Ok(ResolvedBook {
        chapters,
        source,
        stats,
    })
}

fn pin_start_pages(
    drafts: &[ChapterDraft],
    candidates: &[ChapterCandidate],
    page_count: u32,
) -> Vec<Option<u32>> {
    let mut pins = vec![None; drafts.len()];
    let mut cursor = 0usize;
    let mut last_pinned = 0u32;

    for (index, draft) in drafts.iter().enumerate() {
        for (candidate_index, candidate) in candidates.iter().enumerate().skip(cursor) {
            let Some(page) = candidate.starting_page else {
                continue;
            };
            if page == 0 || page > page_count || page <= last_pinned {
                continue;
            }
            if fuzzy_title_match(&draft.title, &candidate.title)
                || fuzzy_title_match(&candidate.title, &draft.title)
            {
                pins[index] = Some(page);
                last_pinned = page;
                cursor = candidate_index + 1;
                break;
            }
        }
    }

    pins
}

fn interpolate_start_pages(
    drafts: &[ChapterDraft],
    pins: &[Option<u32>],
    page_count: u32,
) -> Vec<u32> {
    let count = drafts.len();
    let mut starts: Vec<u32> = pins.iter().map(|pin| pin.unwrap_or(0)).collect();

    let mut previous_anchor: Option<usize> = None;
    for index in 0..=count {
        let right_page = if index == count {
            page_count + 1
        } else {
            match pins[index] {
                Some(page) => page,
                None => continue,
            }
        };

        let run_start = previous_anchor.map(|anchor| anchor + 1).unwrap_or(0);
        if run_start < index {
            let left_page = previous_anchor
                .and_then(|anchor| pins[anchor])
                .unwrap_or(1);
            let base_words = previous_anchor
                .map(|anchor| drafts[anchor].word_count as u64)
                .unwrap_or(0);
            let span = u64::from(right_page.saturating_sub(left_page));
            let total_words = base_words
                + drafts[run_start..index]
                    .iter()
                    .map(|draft| draft.word_count as u64)
                    .sum::<u64>();
            let shared_slots = (index - run_start) as u64 + u64::from(previous_anchor.is_some());

            let mut cumulative = base_words;
            for (offset, position) in (run_start..index).enumerate() {
                let advance = if total_words == 0 {
                    let slot = offset as u64 + u64::from(previous_anchor.is_some());
                    span * slot / shared_slots.max(1)
                } else {
                    span * cumulative / total_words
                };
                starts[position] = left_page.saturating_add(advance as u32).min(page_count);
                cumulative += drafts[position].word_count as u64;
            }
        }

        if index < count {
            previous_anchor = Some(index);
        }
    }

    starts
}
