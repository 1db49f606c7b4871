use crate::geometry::AnnotationGeometry;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_CONVERT_BIN: &str = "convert";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRequest {
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
    pub font: String,
    pub point_size: i32,
    pub geometry: AnnotationGeometry,
    pub caption: String,
}

impl AnnotationRequest {
    /// Arguments for ImageMagick `convert`, in the order existing scripts rely on.
    pub fn convert_args(&self) -> Vec<OsString> {
        vec![
            self.source_path.clone().into_os_string(),
            "-font".into(),
            self.font.clone().into(),
            "-pointsize".into(),
            self.point_size.to_string().into(),
            "-fill".into(),
            "black".into(),
            "-gravity".into(),
            "south".into(),
            "-annotate".into(),
            self.geometry.to_string().into(),
            self.caption.clone().into(),
            self.dest_path.clone().into_os_string(),
        ]
    }
}

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} failed ({status}): {output}")]
    Failed {
        program: String,
        status: String,
        output: String,
    },
}

pub trait Annotator: Send + Sync {
    fn annotate(&self, request: &AnnotationRequest) -> Result<(), AnnotateError>;
}

#[derive(Debug, Clone)]
pub struct ImageMagick {
    program: PathBuf,
}

impl ImageMagick {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for ImageMagick {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERT_BIN)
    }
}

impl Annotator for ImageMagick {
    fn annotate(&self, request: &AnnotationRequest) -> Result<(), AnnotateError> {
        let program = self.program.display().to_string();
        let args = request.convert_args();
        debug!(program = %program, ?args, "invoking renderer");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| AnnotateError::Spawn {
                program: program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(AnnotateError::Failed {
            program,
            status: output.status.to_string(),
            output: combined.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DryRun;

impl Annotator for DryRun {
    fn annotate(&self, request: &AnnotationRequest) -> Result<(), AnnotateError> {
        info!(
            "dry-run: {} -> {} \"{}\" at {}",
            request.source_path.display(),
            request.dest_path.display(),
            request.caption,
            request.geometry
        );
        Ok(())
    }
}
