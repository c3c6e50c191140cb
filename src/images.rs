use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::model::ImageRef;
use crate::source::{ImageAsset, PageImageCount};

/// How detected page slots were matched against extracted assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorrelationTier {
    Exact,
    Proportional,
    DetectionOnly,
}

impl CorrelationTier {
    pub fn as_str(self) -> &'static str {
        match self {
            CorrelationTier::Exact => "exact",
            CorrelationTier::Proportional => "proportional",
            CorrelationTier::DetectionOnly => "detection-only",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageCorrelation {
    pub by_page: BTreeMap<u32, Vec<ImageRef>>,
    pub tier: CorrelationTier,
    pub expected: usize,
    pub extracted: usize,
    pub placeholders: usize,
    pub warnings: Vec<String>,
}

/// Matches per-page detection counts against the assets that were actually
/// extracted, walking pages in ascending order and assets in extraction order.
pub fn correlate(detected: &[PageImageCount], assets: Option<&[ImageAsset]>) -> ImageCorrelation {
    let mut counts = BTreeMap::<u32, usize>::new();
    for entry in detected {
        if entry.image_count > 0 {
            *counts.entry(entry.page_number).or_default() += entry.image_count;
        }
    }
    let expected: usize = counts.values().sum();

    let tier = match assets {
        None => CorrelationTier::DetectionOnly,
        Some(assets) if assets.len() == expected => CorrelationTier::Exact,
        Some(_) => CorrelationTier::Proportional,
    };

    let mut warnings = Vec::<String>::new();
    if tier == CorrelationTier::Proportional {
        let available = assets.map(<[ImageAsset]>::len).unwrap_or(0);
        warn!(
            detected = expected,
            extracted = available,
            "image asset count does not match detection"
        );
        warnings.push(format!(
            "detected {expected} images but extracted {available} assets"
        ));
    }

    let available = assets.map(<[ImageAsset]>::len).unwrap_or(0);
    let mut by_page = BTreeMap::<u32, Vec<ImageRef>>::new();
    let mut ordinal = 0usize;
    let mut next_asset = 0usize;

    for (&page_number, &count) in &counts {
        let refs = by_page.entry(page_number).or_default();
        for local in 1..=count {
            ordinal += 1;
            let extracted = assets.is_some() && next_asset < available;
            let asset_index = if extracted {
                let index = next_asset;
                next_asset += 1;
                Some(index)
            } else {
                None
            };
            let image_alt = if assets.is_some() {
                format!("Figure {ordinal} (Page {page_number})")
            } else {
                format!("Figure {ordinal} (Page {page_number}) [not extracted]")
            };
            refs.push(ImageRef {
                page_number,
                image_name: format!("page-{page_number:03}-image-{local}"),
                image_alt,
                extracted,
                placeholder: !extracted,
                asset_index,
            });
        }
    }

    ImageCorrelation {
        by_page,
        tier,
        expected,
        extracted: next_asset,
        placeholders: expected - next_asset,
        warnings,
    }
}
