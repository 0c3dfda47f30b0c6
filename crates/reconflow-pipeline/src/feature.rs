//! Feature stage: image loading, feature extraction, matching

use crate::stage::{StageContext, StageError, Step, StepChain};
use crate::toolchain::ToolCall;

/// The three feature steps, in order
pub struct FeatureStage;

impl FeatureStage {
    pub fn chain() -> StepChain {
        StepChain::new()
            .step(LoadImages)
            .step(ExtractFeatures)
            .step(MatchFeatures)
    }
}

/// Register the image set and calibration, preparing the matches directory
pub struct LoadImages;

impl Step for LoadImages {
    fn name(&self) -> &'static str {
        "load_images"
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let matches_dir = ctx.layout.matches_dir();
        ctx.ensure_dir(&matches_dir)?;

        ctx.invoke(ToolCall::ListImages {
            images_dir: ctx.layout.images_dir().to_path_buf(),
            calibration: ctx.config.calibration.clone(),
            output_dir: matches_dir,
        })
    }
}

pub struct ExtractFeatures;

impl Step for ExtractFeatures {
    fn name(&self) -> &'static str {
        "extract_features"
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let listing = ctx.layout.image_listing_path();
        ctx.require("image listing", &listing)?;

        ctx.invoke(ToolCall::ComputeFeatures {
            listing,
            output_dir: ctx.layout.matches_dir(),
            method: ctx.config.describer,
        })
    }
}

pub struct MatchFeatures;

impl Step for MatchFeatures {
    fn name(&self) -> &'static str {
        "match_features"
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let listing = ctx.layout.image_listing_path();
        ctx.require("image listing", &listing)?;

        ctx.invoke(ToolCall::ComputeMatches {
            listing,
            output_dir: ctx.layout.matches_dir(),
        })
    }
}
