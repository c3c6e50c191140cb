//! # quire
//!
//! Resolves the logical structure of a paginated book from raw, page-indexed
//! primitives: ordered chapters, page-bounded content chunks, images attached
//! to the pages they appear on, and cross-references resolved to a concrete
//! target chunk.
//!
//! ## Features
//!
//! - Chapter discovery from outline bookmarks, with a table-of-contents text
//!   search fallback
//! - Configurable boundary detection over the flat text stream, with
//!   front-matter skipping and fuzzy title confirmation
//! - Page-aware chunking with stable, document-order chunk ids
//! - Three-tier correlation of detected image slots against extracted assets
//! - Footnote/index link resolution through a prioritized heuristic chain,
//!   every result tagged with a confidence tier
//!
//! ## Quick Start
//!
//! Implement the two collaborator traits over your page-extraction layer,
//! then hand them to [`resolve_book`]:
//!
//! ```no_run
//! use anyhow::Result;
//! use quire::{BookConfig, LinkRef, resolve_book};
//! use quire::source::{
//!     Destination, DocumentSource, ImageAsset, ImageSource, OutlineNode, PageImageCount,
//!     RawTextRun,
//! };
//!
//! struct Extracted;
//!
//! impl DocumentSource for Extracted {
//!     fn page_count(&self) -> Result<u32> { Ok(312) }
//!     fn page_text(&self, _page_number: u32) -> Result<Vec<RawTextRun>> { Ok(Vec::new()) }
//!     fn outline(&self) -> Result<Vec<OutlineNode>> { Ok(Vec::new()) }
//!     fn resolve_destination(&self, _destination: &Destination) -> Result<u32> { Ok(1) }
//!     fn link_records(&self) -> Result<Vec<LinkRef>> { Ok(Vec::new()) }
//! }
//!
//! impl ImageSource for Extracted {
//!     fn detect_images(&self) -> Result<Vec<PageImageCount>> { Ok(Vec::new()) }
//!     fn extract_images(&self) -> Result<Vec<ImageAsset>> { Ok(Vec::new()) }
//! }
//!
//! let book = resolve_book(&Extracted, &Extracted, &BookConfig::default())?;
//! for chapter in &book.chapters {
//!     println!("{} ({}-{})", chapter.title, chapter.start_page, chapter.end_page);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod chapters;
pub mod chunker;
pub mod config;
pub mod images;
pub mod links;
pub mod model;
pub mod normalize;
pub mod outline;
pub mod page_lines;
pub mod pipeline;
pub mod source;

pub use chapters::{ChapterDetection, ChapterDetector, ChapterDraft};
pub use config::{BookConfig, ChapterRules};
pub use images::{CorrelationTier, ImageCorrelation};
pub use links::{LinkResolution, LinkResolver};
pub use model::{
    BoundingBox, Chapter, ChapterNumber, Chunk, ChunkKind, Confidence, ImageRef, LinkMethod,
    LinkRef, Point, ResolvedLink,
};
pub use normalize::normalize;
pub use outline::{ChapterCandidate, ChapterSourceKind, OutlineExtractor};
pub use page_lines::PageLine;
pub use pipeline::{ResolveStats, ResolvedBook, resolve_book};
pub use source::{
    Destination, DocumentSource, ImageAsset, ImageSource, OutlineNode, PageImageCount, RawTextRun,
};
