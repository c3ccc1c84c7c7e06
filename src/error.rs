//! Error type shared by every generation stage.

use thiserror::Error;

use crate::procgen::zoning::DensityTier;

/// Reasons a generation pass can abort.
///
/// Placement failures (a footprint that does not fit, or exhausted sampling
/// attempts) are not errors: the affected building is skipped and the pass
/// carries on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("grid must have at least one row and one column (got {rows}x{cols})")]
    EmptyGrid { rows: usize, cols: usize },

    #[error("{name} = {value} is outside the supported range {min}..={max}")]
    ParameterOutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("invalid {what} range for the {tier:?} tier: {start}..{end}")]
    EmptyRange {
        tier: DensityTier,
        what: &'static str,
        start: u32,
        end: u32,
    },

    #[error("no module palette configured for the {0:?} tier")]
    MissingPalette(DensityTier),

    #[error("{tier:?} palette wall modules disagree on depth ({expected} vs {found})")]
    InconsistentModuleDepth {
        tier: DensityTier,
        expected: f32,
        found: f32,
    },

    #[error("{tier:?} palette wall depth {depth} does not match the placement module width {module_width}")]
    ModuleWidthMismatch {
        tier: DensityTier,
        depth: f32,
        module_width: f32,
    },

    #[error("generation was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, GenerationError>;
