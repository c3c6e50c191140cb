use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::config::{BookConfig, ChapterRules};
use crate::model::ChapterNumber;
use crate::normalize::{clean_line, fuzzy_title_match, normalize, word_count};

#[derive(Debug, Clone)]
pub struct ChapterDraft {
    pub number: ChapterNumber,
    pub title: String,
    pub text: String,
    pub word_count: usize,
}

#[derive(Debug, Clone)]
pub struct ChapterDetection {
    pub chapters: Vec<ChapterDraft>,
    pub front_matter_lines_skipped: usize,
    pub used_fallback: bool,
}

pub struct ChapterDetector {
    rules: ChapterRules,
    start_chapter: Option<String>,
    skip_front_matter: bool,
    chapter_start_number: u32,
    fallback_title: String,
    encoded_chapter: Regex,
    encoded_numbered: Regex,
}

struct ActiveChapter {
    number: ChapterNumber,
    title: String,
    lines: Vec<String>,
}

impl ActiveChapter {
    fn finalize(self) -> ChapterDraft {
        let text = self.lines.join("\n");
        let word_count = word_count(&text);
        ChapterDraft {
            number: self.number,
            title: self.title,
            text,
            word_count,
        }
    }
}

impl ChapterDetector {
    pub fn new(config: &BookConfig) -> Result<Self> {
        let rules = config.compile()?;
        let encoded_chapter = Regex::new(
            r"(?i)^chapter\s+(\d{1,3}|one|two|three|four|five|six|seven|eight|nine|ten)\b\s*[-:.]?\s*(.*)$",
        )
        .context("failed to compile encoded chapter heading regex")?;
        let encoded_numbered = Regex::new(r"^(\d{1,3})\.\s+(.+)$")
            .context("failed to compile encoded numbered heading regex")?;

        Ok(Self {
            rules,
            start_chapter: config.start_chapter.clone(),
            skip_front_matter: config.skip_front_matter,
            chapter_start_number: config.chapter_start_number,
            fallback_title: config
                .title
                .clone()
                .unwrap_or_else(|| "Full Text".to_string()),
            encoded_chapter,
            encoded_numbered,
        })
    }

    pub fn detect(&self, lines: &[String]) -> ChapterDetection {
        let mut skipped = 0usize;
        let mut body: &[String] = lines;

        if self.skip_front_matter {
            if let Some(start_title) = &self.start_chapter {
                match lines
                    .iter()
                    .position(|line| fuzzy_title_match(line, start_title))
                {
                    Some(position) => {
                        skipped = position;
                        body = &lines[position..];
                    }
                    None => {
                        debug!(
                            start_chapter = %start_title,
                            "start chapter not found, keeping front matter"
                        );
                    }
                }
            }
        }

        let mut chapters = Vec::<ChapterDraft>::new();
        let mut preamble = Vec::<String>::new();
        let mut active: Option<ActiveChapter> = None;
        let mut next_number = self.chapter_start_number;

        for line in body {
            let cleaned = clean_line(line);
            if !cleaned.is_empty() && self.rules.is_boundary(&cleaned) {
                if let Some(previous) = active.take() {
                    chapters.push(previous.finalize());
                } else if !preamble.is_empty() {
                    chapters.push(front_matter_draft(std::mem::take(&mut preamble)));
                }

                let (number, title) = self.chapter_identity(&cleaned, &mut next_number);
                active = Some(ActiveChapter {
                    number,
                    title,
                    lines: vec![line.clone()],
                });
            } else if let Some(current) = active.as_mut() {
                current.lines.push(line.clone());
            } else {
                preamble.push(line.clone());
            }
        }

        if let Some(last) = active.take() {
            chapters.push(last.finalize());
        }

        if chapters.is_empty() {
            let text = preamble.join("\n");
            let word_count = word_count(&text);
            return ChapterDetection {
                chapters: vec![ChapterDraft {
                    number: ChapterNumber::Unnumbered,
                    title: self.fallback_title.clone(),
                    text,
                    word_count,
                }],
                front_matter_lines_skipped: skipped,
                used_fallback: true,
            };
        }

        ChapterDetection {
            chapters,
            front_matter_lines_skipped: skipped,
            used_fallback: false,
        }
    }

    fn chapter_identity(&self, heading: &str, next_number: &mut u32) -> (ChapterNumber, String) {
        if let Some(captures) = self.encoded_chapter.captures(heading) {
            let raw_value = captures
                .get(1)
                .map(|group| group.as_str())
                .unwrap_or_default();
            let value = raw_value
                .parse::<u32>()
                .ok()
                .or_else(|| spelled_number(raw_value));
            if let Some(value) = value {
                *next_number = value.saturating_add(1);
                let rest = captures
                    .get(2)
                    .map(|group| normalize(group.as_str()))
                    .unwrap_or_default();
                let title = if rest.is_empty() {
                    heading.to_string()
                } else {
                    rest
                };
                return (ChapterNumber::Numbered(value), title);
            }
        }

        if let Some(captures) = self.encoded_numbered.captures(heading) {
            let value = captures
                .get(1)
                .and_then(|group| group.as_str().parse::<u32>().ok());
            let rest = captures
                .get(2)
                .map(|group| normalize(group.as_str()))
                .unwrap_or_default();
            if let Some(value) = value {
                if !rest.is_empty() {
                    *next_number = value.saturating_add(1);
                    return (ChapterNumber::Numbered(value), rest);
                }
            }
        }

        let value = *next_number;
        *next_number = value.saturating_add(1);
        let title = normalize(heading);
        let title = if title.is_empty() {
            heading.to_string()
        } else {
            title
        };
        (ChapterNumber::Numbered(value), title)
    }
}

fn front_matter_draft(lines: Vec<String>) -> ChapterDraft {
    let text = lines.join("\n");
    let word_count = word_count(&text);
    ChapterDraft {
        number: ChapterNumber::Unnumbered,
        title: "Front Matter".to_string(),
        text,
        word_count,
    }
}

fn spelled_number(word: &str) -> Option<u32> {
    match word.to_lowercase().as_str() {
        "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        "ten" => Some(10),
        _ => None,
    }
}
