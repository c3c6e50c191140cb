use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use quire::model::LinkRef;
use quire::source::{
    Destination, DocumentSource, ImageAsset, ImageSource, OutlineNode, PageImageCount, RawTextRun,
};

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_test_writer()
        .try_init()
        .ok();
}

/// In-memory stand-in for the page-extraction layer.
pub struct FixtureBook {
    pub pages: Vec<Vec<RawTextRun>>,
    pub outline: Vec<OutlineNode>,
    pub links: Vec<LinkRef>,
    pub detected: Vec<PageImageCount>,
    pub assets: Option<Vec<ImageAsset>>,
}

impl DocumentSource for FixtureBook {
    fn page_count(&self) -> Result<u32> {
        Ok(self.pages.len() as u32)
    }

    fn page_text(&self, page_number: u32) -> Result<Vec<RawTextRun>> {
        self.pages
            .get(page_number as usize - 1)
            .cloned()
            .ok_or_else(|| anyhow!("no page {page_number}"))
    }

    fn outline(&self) -> Result<Vec<OutlineNode>> {
        Ok(self.outline.clone())
    }

    fn resolve_destination(&self, destination: &Destination) -> Result<u32> {
        destination
            .name
            .strip_prefix("page-")
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| anyhow!("unknown destination {}", destination.name))
    }

    fn link_records(&self) -> Result<Vec<LinkRef>> {
        Ok(self.links.clone())
    }
}

impl ImageSource for FixtureBook {
    fn detect_images(&self) -> Result<Vec<PageImageCount>> {
        Ok(self.detected.clone())
    }

    fn extract_images(&self) -> Result<Vec<ImageAsset>> {
        match &self.assets {
            Some(assets) => Ok(assets.clone()),
            None => Err(anyhow!("image extraction failed")),
        }
    }
}

pub fn page(page_number: u32, lines: &[&str]) -> Vec<RawTextRun> {
    page_from(page_number, 720.0, lines)
}

fn page_from(page_number: u32, top: f64, lines: &[&str]) -> Vec<RawTextRun> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| RawTextRun {
            text: (*line).to_string(),
            page_number,
            x: 72.0,
            y: top - (index as f64) * 18.0,
            font_id: None,
        })
        .collect()
}

pub fn bookmark(title: &str, page_number: u32) -> OutlineNode {
    OutlineNode {
        title: title.to_string(),
        destination: Some(Destination {
            name: format!("page-{page_number}"),
        }),
        children: Vec::new(),
    }
}

/// A twelve-page book with three body chapters, a contents page, and two
/// embedded images. The first chapter heading arrives as two text runs in
/// reversed x order so line assembly is exercised end to end.
pub fn standard_book() -> FixtureBook {
    let mut fourth = page_from(
        4,
        690.0,
        &[
            "The road out of town ran past the salt flats and kept going north.",
            "Nobody used it much after the mill closed.",
        ],
    );
    fourth.push(RawTextRun {
        text: "ROAD".to_string(),
        page_number: 4,
        x: 180.0,
        y: 720.0,
        font_id: None,
    });
    fourth.push(RawTextRun {
        text: "THE LONG".to_string(),
        page_number: 4,
        x: 72.0,
        y: 719.5,
        font_id: None,
    });

    let pages = vec![
        page(1, &["NORTH AND SOUTH", "a novel of the northern coast"]),
        page(
            2,
            &[
                "CONTENTS",
                "1. The Long Road 4",
                "2. A Quiet Harbor 8",
                "Appendix A 11",
            ],
        ),
        page(3, &["for the lighthouse keepers"]),
        fourth,
        page(
            5,
            &[
                "Morning fog sat on the flats until ten most days.",
                "Gulls worked the shoreline in pairs.",
            ],
        ),
        page(
            6,
            &[
                "We counted the mile markers out loud as children.",
                "The paint had worn off most of them.",
            ],
        ),
        page(7, &["By the seventh marker the road turned inland."]),
        page(
            8,
            &[
                "A QUIET HARBOR",
                "Boats came in before dark, every season, without being told.",
                "The harbormaster kept a ledger of names.",
            ],
        ),
        page(
            9,
            &[
                "Half the entries were smudged beyond reading.",
                "Nobody minded much.",
            ],
        ),
        page(10, &["Winter made the water flat and grey."]),
        page(
            11,
            &[
                "APPENDIX A",
                "Tide tables for the harbor, copied by hand.",
                "Spring tides ran higher after storms.",
            ],
        ),
        page(
            12,
            &[
                "3 Return to the harbor notes for the smudged ledger entries.",
                "4 The mill closed in the dry year.",
            ],
        ),
    ];

    let outline = vec![
        bookmark("Contents", 2),
        bookmark("1 The Long Road", 4),
        bookmark("2 A Quiet Harbor", 8),
        bookmark("Appendix A", 11),
    ];

    FixtureBook {
        pages,
        outline,
        links: Vec::new(),
        detected: vec![
            PageImageCount {
                page_number: 5,
                image_count: 1,
            },
            PageImageCount {
                page_number: 9,
                image_count: 1,
            },
        ],
        assets: Some(vec![
            ImageAsset {
                source_name: "Im0".to_string(),
            },
            ImageAsset {
                source_name: "Im1".to_string(),
            },
        ]),
    }
}
