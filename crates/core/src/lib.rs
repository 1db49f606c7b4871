mod annotator;
mod caption;
mod config;
mod geometry;
mod limiter;
mod normalize;
mod summary;
mod template;
mod walker;

pub use annotator::{
    AnnotateError, AnnotationRequest, Annotator, DryRun, ImageMagick, DEFAULT_CONVERT_BIN,
};
pub use caption::{compose, french_month, resolve, CaptionDate, DateParseError};
pub use config::{app_paths, load_config_from, save_config_to, AppConfig, AppPaths};
pub use geometry::{compute_offset, AnnotationGeometry, BOTTOM_BAND_HEIGHT_PX};
pub use limiter::{Limiter, Permit};
pub use normalize::normalize_caption;
pub use summary::RunSummary;
pub use template::{CaptionFormat, FormatError, FormatPart, DEFAULT_CAPTION_FORMAT};
pub use walker::{
    extension_matches, list_dir, run, validate_dest, AnnotationTask, DirectoryEntry, RunOptions,
    DEFAULT_BOTTOM_MARGIN, DEFAULT_DEST, DEFAULT_EXTENSIONS, DEFAULT_FONT, DEFAULT_MAX_WORKERS,
    DEFAULT_TEXT_SIZE,
};
