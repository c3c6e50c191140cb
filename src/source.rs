use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::model::LinkRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTextRun {
    pub text: String,
    pub page_number: u32,
    pub x: f64,
    pub y: f64,
    pub font_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineNode {
    pub title: String,
    pub destination: Option<Destination>,
    pub children: Vec<OutlineNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImageCount {
    pub page_number: u32,
    pub image_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub source_name: String,
}

/// Page-indexed access to the raw primitives of one document.
pub trait DocumentSource {
    fn page_count(&self) -> Result<u32>;

    fn page_text(&self, page_number: u32) -> Result<Vec<RawTextRun>>;

    /// An empty vector means the document carries no outline.
    fn outline(&self) -> Result<Vec<OutlineNode>>;

    fn resolve_destination(&self, destination: &Destination) -> Result<u32>;

    fn link_records(&self) -> Result<Vec<LinkRef>>;
}

/// Access to the document's embedded image stream.
pub trait ImageSource {
    fn detect_images(&self) -> Result<Vec<PageImageCount>>;

    fn extract_images(&self) -> Result<Vec<ImageAsset>>;
}
