use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    pub title: Option<String>,
    pub author: Option<String>,
    pub start_chapter: Option<String>,
    pub chapter_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub skip_front_matter: bool,
    pub chapter_start_number: u32,
    pub words_per_chunk: usize,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            title: None,
            author: None,
            start_chapter: None,
            chapter_patterns: default_chapter_patterns(),
            exclude_patterns: Vec::new(),
            skip_front_matter: true,
            chapter_start_number: 1,
            words_per_chunk: 150,
        }
    }
}

impl BookConfig {
    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("failed to parse book config JSON")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read book config {}", path.display()))?;
        Self::from_json_str(&contents)
    }

    pub fn compile(&self) -> Result<ChapterRules> {
        let chapter_patterns = compile_patterns(&self.chapter_patterns, "chapter")?;
        let exclude_patterns = compile_patterns(&self.exclude_patterns, "exclude")?;
        Ok(ChapterRules {
            chapter_patterns,
            exclude_patterns,
        })
    }
}

#[derive(Debug)]
pub struct ChapterRules {
    chapter_patterns: Vec<Regex>,
    exclude_patterns: Vec<Regex>,
}

impl ChapterRules {
    pub fn is_boundary(&self, line: &str) -> bool {
        self.chapter_patterns
            .iter()
            .any(|pattern| pattern.is_match(line))
            && !self
                .exclude_patterns
                .iter()
                .any(|pattern| pattern.is_match(line))
    }
}

fn compile_patterns(patterns: &[String], kind: &str) -> Result<Vec<Regex>> {
    let mut compiled = Vec::<Regex>::new();
    for pattern in patterns {
        let regex = Regex::new(pattern)
            .with_context(|| format!("failed to compile {kind} pattern `{pattern}`"))?;
        compiled.push(regex);
    }
    Ok(compiled)
}

fn default_chapter_patterns() -> Vec<String> {
    vec![
        r"^[A-Z][A-Z0-9 ,'\-:\.!\?]{2,58}$".to_string(),
        r"(?i)^chapter\s+(\d{1,3}|one|two|three|four|five|six|seven|eight|nine|ten)\b".to_string(),
        r"^\d{1,3}\.\s+.+$".to_string(),
        r"(?i)^(introduction|conclusion|epilogue|prologue|preface|foreword|afterword)\b".to_string(),
    ]
}
