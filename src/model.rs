use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChapterNumber {
    Numbered(u32),
    Labeled(String),
    Unnumbered,
}

impl ChapterNumber {
    pub fn as_label(&self) -> Option<String> {
        match self {
            ChapterNumber::Numbered(value) => Some(value.to_string()),
            ChapterNumber::Labeled(value) => Some(value.clone()),
            ChapterNumber::Unnumbered => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: Point, tolerance: f64) -> bool {
        point.x >= self.x - tolerance
            && point.x <= self.x + self.width + tolerance
            && point.y >= self.y - tolerance
            && point.y <= self.y + self.height + tolerance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Text,
    Image,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: u32,
    pub index: u32,
    pub page_number: u32,
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    pub text: String,
    pub coordinates: Option<BoundingBox>,
    pub links: Vec<ResolvedLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRef {
    pub page_number: u32,
    pub image_name: String,
    pub image_alt: String,
    pub extracted: bool,
    pub placeholder: bool,
    pub asset_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRef {
    pub page_number: u32,
    pub text: String,
    pub destination_page: u32,
    pub destination_coordinates: Option<Point>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLink {
    pub text: String,
    pub destination_page: u32,
    pub target_chunk_id: u32,
    pub method: LinkMethod,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkMethod {
    FootnoteDirect,
    TextCorrected,
    Coordinates,
    PageFallback,
}

impl LinkMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkMethod::FootnoteDirect => "footnote-direct",
            LinkMethod::TextCorrected => "text-corrected",
            LinkMethod::Coordinates => "coordinates",
            LinkMethod::PageFallback => "page-fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Confidence {
    VeryLow,
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::VeryLow => "very-low",
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub number: ChapterNumber,
    pub title: String,
    pub start_page: u32,
    pub end_page: u32,
    pub word_count: usize,
    pub text: String,
    pub chunks: Vec<Chunk>,
    pub images: Vec<ImageRef>,
}
