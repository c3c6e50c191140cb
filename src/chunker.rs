use std::collections::BTreeMap;

use crate::model::{BoundingBox, Chapter, Chunk, ChunkKind, ImageRef, ResolvedLink};
use crate::normalize::word_count;
use crate::page_lines::PageLine;

pub fn derive_chunks(text: &str, words_per_chunk: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    words
        .chunks(words_per_chunk.max(1))
        .map(|window| window.join(" "))
        .collect()
}

pub fn paginate_chunks(texts: &[String], start_page: u32, end_page: u32) -> Vec<Chunk> {
    if texts.is_empty() {
        return Vec::new();
    }

    let range_len = end_page.saturating_sub(start_page) as usize + 1;
    let chunks_per_page = texts.len().div_ceil(range_len).max(1);

    texts
        .iter()
        .enumerate()
        .map(|(local_index, text)| {
            let page_index = (local_index / chunks_per_page).min(range_len - 1);
            Chunk {
                id: 0,
                index: 0,
                page_number: start_page + page_index as u32,
                kind: ChunkKind::Text,
                text: text.clone(),
                coordinates: None,
                links: Vec::new(),
            }
        })
        .collect()
}

pub fn chunk_page_lines(
    page_number: u32,
    lines: &[PageLine],
    words_per_chunk: usize,
) -> Vec<Chunk> {
    let budget = words_per_chunk.max(1);
    let mut chunks = Vec::<Chunk>::new();
    let mut pending = Vec::<&PageLine>::new();
    let mut pending_words = 0usize;

    for line in lines {
        pending_words += word_count(&line.text);
        pending.push(line);
        if pending_words >= budget {
            chunks.push(finalize_line_chunk(page_number, &pending));
            pending.clear();
            pending_words = 0;
        }
    }
    if !pending.is_empty() {
        chunks.push(finalize_line_chunk(page_number, &pending));
    }

    chunks
}

fn finalize_line_chunk(page_number: u32, lines: &[&PageLine]) -> Chunk {
    let text = lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let x = lines
        .iter()
        .map(|line| line.x_min)
        .fold(f64::INFINITY, f64::min);
    let x_end = lines
        .iter()
        .map(|line| line.x_max)
        .fold(f64::NEG_INFINITY, f64::max);
    let y = lines.iter().map(|line| line.y).fold(f64::INFINITY, f64::min);
    let y_top = lines
        .iter()
        .map(|line| line.y)
        .fold(f64::NEG_INFINITY, f64::max);

    Chunk {
        id: 0,
        index: 0,
        page_number,
        kind: ChunkKind::Text,
        text,
        coordinates: Some(BoundingBox {
            x,
            y,
            width: (x_end - x).max(0.0),
            height: (y_top - y).max(0.0),
        }),
        links: Vec::new(),
    }
}

pub fn backfill_page_range(chapter: &mut Chapter) {
    let min = chapter.chunks.iter().map(|chunk| chunk.page_number).min();
    let max = chapter.chunks.iter().map(|chunk| chunk.page_number).max();

    match (min, max) {
        (Some(start), Some(end)) => {
            chapter.start_page = start;
            chapter.end_page = end;
        }
        _ => {
            if chapter.start_page == 0 {
                chapter.start_page = 1;
            }
            if chapter.end_page < chapter.start_page {
                chapter.end_page = chapter.start_page;
            }
        }
    }
}

pub fn assign_global_ids(chapters: &mut [Chapter]) -> u32 {
    let mut next_id = 1u32;
    for chapter in chapters.iter_mut() {
        for chunk in chapter.chunks.iter_mut() {
            chunk.id = next_id;
            chunk.index = next_id;
            next_id += 1;
        }
    }
    next_id - 1
}

/// Attaches recorded page images to the chapters covering them, in order.
/// A page already claimed by an earlier chapter is skipped, so every image
/// lands in exactly one chapter.
pub fn attach_images(chapters: &mut [Chapter], by_page: &BTreeMap<u32, Vec<ImageRef>>) {
    let mut next_unclaimed = 1u32;
    for chapter in chapters.iter_mut() {
        let first_page = chapter.start_page.max(next_unclaimed);
        for page in first_page..=chapter.end_page {
            if let Some(records) = by_page.get(&page) {
                chapter.images.extend(records.iter().cloned());
            }
        }
        next_unclaimed = next_unclaimed.max(chapter.end_page.saturating_add(1));
    }
}

/// Attaches a resolved link to the first chunk sitting on the link's source
/// page. Returns false when no chunk carries that page.
pub fn attach_link(chapters: &mut [Chapter], page_number: u32, link: ResolvedLink) -> bool {
    for chapter in chapters.iter_mut() {
        for chunk in chapter.chunks.iter_mut() {
            if chunk.page_number == page_number {
                chunk.links.push(link);
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChapterNumber;
    use proptest::prelude::*;

    fn chapter_with_chunks(chunks: Vec<Chunk>) -> Chapter {
        Chapter {
            number: ChapterNumber::Numbered(1),
            title: "Test".to_string(),
            start_page: 0,
            end_page: 0,
            word_count: 0,
            text: String::new(),
            chunks,
            images: Vec::new(),
        }
    }

    fn bare_chunk(page_number: u32, kind: ChunkKind) -> Chunk {
        Chunk {
            id: 0,
            index: 0,
            page_number,
            kind,
            text: String::new(),
            coordinates: None,
            links: Vec::new(),
        }
    }

    #[test]
    fn derive_chunks_splits_on_the_word_budget() {
        let text = "one two three four five six seven";
        let chunks = derive_chunks(text, 3);

        assert_eq!(chunks, vec!["one two three", "four five six", "seven"]);
    }

    #[test]
    fn derive_chunks_guards_a_zero_budget() {
        assert_eq!(derive_chunks("a b", 0), vec!["a", "b"]);
        assert!(derive_chunks("   ", 3).is_empty());
    }

    #[test]
    fn paginated_pages_are_monotone_and_stay_in_range() {
        let texts: Vec<String> = (0..10).map(|value| format!("chunk {value}")).collect();
        let chunks = paginate_chunks(&texts, 4, 6);

        let pages: Vec<u32> = chunks.iter().map(|chunk| chunk.page_number).collect();
        assert_eq!(pages, vec![4, 4, 4, 4, 5, 5, 5, 5, 6, 6]);
    }

    #[test]
    fn paginate_clamps_when_chunks_outnumber_the_plan() {
        let texts: Vec<String> = (0..5).map(|value| format!("chunk {value}")).collect();
        let chunks = paginate_chunks(&texts, 10, 11);

        let pages: Vec<u32> = chunks.iter().map(|chunk| chunk.page_number).collect();
        assert_eq!(pages, vec![10, 10, 10, 11, 11]);
        assert!(pages.iter().all(|page| (10..=11).contains(page)));
    }

    #[test]
    fn paginate_handles_more_pages_than_chunks() {
        let texts: Vec<String> = (0..2).map(|value| format!("chunk {value}")).collect();
        let chunks = paginate_chunks(&texts, 1, 5);

        let pages: Vec<u32> = chunks.iter().map(|chunk| chunk.page_number).collect();
        assert_eq!(pages, vec![1, 2]);
    }

    #[test]
    fn page_line_chunks_carry_exact_pages_and_bounds() {
        let lines = vec![
            PageLine {
                text: "first line of prose".to_string(),
                y: 700.0,
                x_min: 72.0,
                x_max: 300.0,
            },
            PageLine {
                text: "second line of prose".to_string(),
                y: 688.0,
                x_min: 72.0,
                x_max: 310.0,
            },
        ];

        let chunks = chunk_page_lines(9, &lines, 6);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page_number, 9);
        assert_eq!(
            chunks[0].text,
            "first line of prose second line of prose"
        );
        let bounds = chunks[0].coordinates.expect("bounds");
        assert_eq!(bounds.x, 72.0);
        assert_eq!(bounds.y, 688.0);
        assert_eq!(bounds.width, 238.0);
        assert_eq!(bounds.height, 12.0);
    }

    #[test]
    fn page_line_chunks_split_when_the_budget_fills() {
        let lines: Vec<PageLine> = (0..4)
            .map(|index| PageLine {
                text: "five words sit right here".to_string(),
                y: 700.0 - index as f64 * 12.0,
                x_min: 72.0,
                x_max: 280.0,
            })
            .collect();

        let chunks = chunk_page_lines(3, &lines, 10);

        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|chunk| chunk.page_number == 3));
    }

    #[test]
    fn backfill_uses_chunk_pages_when_present() {
        let mut chapter = chapter_with_chunks(vec![
            bare_chunk(7, ChunkKind::Text),
            bare_chunk(9, ChunkKind::Image),
            bare_chunk(8, ChunkKind::Text),
        ]);

        backfill_page_range(&mut chapter);

        assert_eq!(chapter.start_page, 7);
        assert_eq!(chapter.end_page, 9);
    }

    #[test]
    fn backfill_defaults_an_unknown_range_to_page_one() {
        let mut chapter = chapter_with_chunks(Vec::new());
        backfill_page_range(&mut chapter);

        assert_eq!(chapter.start_page, 1);
        assert_eq!(chapter.end_page, 1);
    }

    #[test]
    fn backfill_keeps_a_known_range_without_chunks() {
        let mut chapter = chapter_with_chunks(Vec::new());
        chapter.start_page = 5;
        chapter.end_page = 9;
        backfill_page_range(&mut chapter);

        assert_eq!(chapter.start_page, 5);
        assert_eq!(chapter.end_page, 9);
    }

    #[test]
    fn global_ids_are_contiguous_across_chapters() {
        let mut chapters = vec![
            chapter_with_chunks(vec![bare_chunk(1, ChunkKind::Text), bare_chunk(1, ChunkKind::Text)]),
            chapter_with_chunks(vec![bare_chunk(2, ChunkKind::Text)]),
        ];

        let total = assign_global_ids(&mut chapters);

        assert_eq!(total, 3);
        let ids: Vec<u32> = chapters
            .iter()
            .flat_map(|chapter| chapter.chunks.iter().map(|chunk| chunk.id))
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(chapters
            .iter()
            .flat_map(|chapter| chapter.chunks.iter())
            .all(|chunk| chunk.id == chunk.index));
    }

    #[test]
    fn images_attach_only_inside_the_chapter_range() {
        let mut by_page = BTreeMap::new();
        for page in [4u32, 5, 9] {
            by_page.insert(
                page,
                vec![ImageRef {
                    page_number: page,
                    image_name: format!("page-{page:03}-image-1"),
                    image_alt: format!("Figure 1 (Page {page})"),
                    extracted: true,
                    placeholder: false,
                    asset_index: Some(0),
                }],
            );
        }

        let mut chapters = vec![chapter_with_chunks(Vec::new())];
        chapters[0].start_page = 4;
        chapters[0].end_page = 6;
        attach_images(&mut chapters, &by_page);

        let pages: Vec<u32> = chapters[0]
            .images
            .iter()
            .map(|image| image.page_number)
            .collect();
        assert_eq!(pages, vec![4, 5]);
    }

    #[test]
    fn shared_pages_attach_to_the_first_covering_chapter() {
        let mut by_page = BTreeMap::new();
        by_page.insert(
            1u32,
            vec![ImageRef {
                page_number: 1,
                image_name: "page-001-image-1".to_string(),
                image_alt: "Figure 1 (Page 1)".to_string(),
                extracted: true,
                placeholder: false,
                asset_index: Some(0),
            }],
        );

        let mut chapters = vec![
            chapter_with_chunks(Vec::new()),
            chapter_with_chunks(Vec::new()),
        ];
        chapters[0].start_page = 1;
        chapters[0].end_page = 1;
        chapters[1].start_page = 1;
        chapters[1].end_page = 5;
        attach_images(&mut chapters, &by_page);

        assert_eq!(chapters[0].images.len(), 1);
        assert!(chapters[1].images.is_empty());
    }

    #[test]
    fn links_attach_to_the_first_chunk_on_their_source_page() {
        let mut chapters = vec![chapter_with_chunks(vec![
            bare_chunk(7, ChunkKind::Text),
            bare_chunk(7, ChunkKind::Text),
        ])];
        let link = ResolvedLink {
            text: "3".to_string(),
            destination_page: 42,
            target_chunk_id: 9,
            method: crate::model::LinkMethod::FootnoteDirect,
            confidence: crate::model::Confidence::High,
        };

        assert!(attach_link(&mut chapters, 7, link.clone()));
        assert!(!attach_link(&mut chapters, 8, link));

        assert_eq!(chapters[0].chunks[0].links.len(), 1);
        assert!(chapters[0].chunks[1].links.is_empty());
    }

    proptest! {
        #[test]
        fn paginated_pages_never_leave_the_range(
            total in 1usize..60,
            start in 1u32..50,
            span in 0u32..12,
        ) {
            let texts: Vec<String> = (0..total).map(|value| format!("chunk {value}")).collect();
            let end = start + span;
            let chunks = paginate_chunks(&texts, start, end);

            prop_assert_eq!(chunks.len(), total);
            let mut previous = start;
            for chunk in &chunks {
                prop_assert!((start..=end).contains(&chunk.page_number));
                prop_assert!(chunk.page_number >= previous);
                previous = chunk.page_number;
            }
        }

        #[test]
        fn global_ids_form_a_contiguous_sequence(counts in proptest::collection::vec(0usize..6, 1..8)) {
            let mut chapters: Vec<Chapter> = counts
                .iter()
                .map(|count| {
                    chapter_with_chunks((0..*count).map(|_| bare_chunk(1, ChunkKind::Text)).collect())
                })
                .collect();

            let total = assign_global_ids(&mut chapters);

            let ids: Vec<u32> = chapters
                .iter()
                .flat_map(|chapter| chapter.chunks.iter().map(|chunk| chunk.id))
                .collect();
            prop_assert_eq!(total as usize, ids.len());
            for (offset, id) in ids.iter().enumerate() {
                prop_assert_eq!(*id, offset as u32 + 1);
            }
        }
    }
}
