use crate::annotator::{AnnotationRequest, Annotator};
use crate::caption::{compose, CaptionDate};
use crate::geometry::AnnotationGeometry;
use crate::limiter::{Limiter, Permit};
use crate::normalize::normalize_caption;
use crate::summary::{RunSummary, Summary};
use crate::template::CaptionFormat;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_DEST: &str = "ready";
pub const DEFAULT_EXTENSIONS: &str = ".jpg";
pub const DEFAULT_TEXT_SIZE: i32 = 100;
pub const DEFAULT_BOTTOM_MARGIN: i32 = 30;
pub const DEFAULT_FONT: &str = "Arial";
pub const DEFAULT_MAX_WORKERS: usize = 10;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub src: PathBuf,
    /// Destination directory, relative to every scanned directory.
    pub dest: PathBuf,
    pub extensions: String,
    pub location: Option<String>,
    pub format: CaptionFormat,
    pub text_size: i32,
    pub bottom_margin: i32,
    pub font: String,
    pub parallel: bool,
    pub max_workers: usize,
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            src: PathBuf::from("."),
            dest: PathBuf::from(DEFAULT_DEST),
            extensions: DEFAULT_EXTENSIONS.to_string(),
            location: None,
            format: CaptionFormat::default(),
            text_size: DEFAULT_TEXT_SIZE,
            bottom_margin: DEFAULT_BOTTOM_MARGIN,
            font: DEFAULT_FONT.to_string(),
            parallel: false,
            max_workers: DEFAULT_MAX_WORKERS,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationTask {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub file_name: String,
    pub location: Option<String>,
    pub date: CaptionDate,
}

impl AnnotationTask {
    pub fn request(&self, options: &RunOptions) -> AnnotationRequest {
        let caption = compose(&self.date, self.location.as_deref(), &options.format);
        AnnotationRequest {
            source_path: self.source_dir.join(&self.file_name),
            dest_path: self.dest_dir.join(&self.file_name),
            font: options.font.clone(),
            point_size: options.text_size,
            geometry: AnnotationGeometry::compute(options.text_size, options.bottom_margin),
            caption: normalize_caption(&caption),
        }
    }
}

// Only an unreadable source or an uncreatable top-level destination is fatal.
pub fn run(options: &RunOptions, annotator: &dyn Annotator) -> Result<RunSummary> {
    validate_dest(&options.dest)?;
    let entries = list_dir(&options.src)
        .with_context(|| format!("cannot read source directory: {}", options.src.display()))?;

    let dest_root = options.src.join(&options.dest);
    if !options.dry_run {
        fs::create_dir_all(&dest_root).with_context(|| {
            format!(
                "cannot create destination directory: {}",
                dest_root.display()
            )
        })?;
    }

    info!(
        "{} entries to process in {}",
        entries.len(),
        options.src.display()
    );

    let engine = Engine::new(options, annotator);
    let location = options.location.as_deref();

    if options.parallel {
        let workers = engine.limiter.capacity().unwrap_or(DEFAULT_MAX_WORKERS);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("pola-caption-{index}"))
            .build()
            .context("cannot start the annotation worker pool")?;
        pool.in_place_scope(|scope| {
            engine.walk(
                &options.src,
                entries,
                location,
                DestState::Ready,
                &Dispatch::Pool(scope),
            );
        });
    } else {
        engine.walk(
            &options.src,
            entries,
            location,
            DestState::Ready,
            &Dispatch::Inline,
        );
    }

    let summary = engine.summary.snapshot();
    debug!(peak = engine.limiter.peak(), "all annotation tasks finished");
    Ok(summary)
}

// The destination is matched by name while walking, so it must be one plain component.
pub fn validate_dest(dest: &Path) -> Result<()> {
    let mut components = dest.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => bail!(
            "destination must be a single directory name, got: {}",
            dest.display()
        ),
    }
}

pub fn list_dir(dir: &Path) -> Result<Vec<DirectoryEntry>> {
    let mut out = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("cannot read directory: {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("cannot read entry in: {}", dir.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("cannot stat: {}", entry.path().display()))?;
        out.push(DirectoryEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
            is_dir: file_type.is_dir(),
        });
    }
    Ok(out)
}

// Substring containment, not set membership: ".jp" matches a ".jpg" filter.
pub fn extension_matches(file_name: &str, filter: &str) -> bool {
    file_extension(file_name).is_some_and(|ext| filter.contains(&ext))
}

fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

enum Dispatch<'a, 'scope> {
    Inline,
    Pool(&'a rayon::Scope<'scope>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DestState {
    Ready,
    Pending,
    Failed,
}

struct Engine<'a> {
    options: &'a RunOptions,
    annotator: &'a dyn Annotator,
    limiter: Limiter,
    summary: Summary,
}

impl<'a> Engine<'a> {
    fn new(options: &'a RunOptions, annotator: &'a dyn Annotator) -> Self {
        let limiter = if options.parallel {
            Limiter::bounded(options.max_workers)
        } else {
            Limiter::pass_through()
        };
        Self {
            options,
            annotator,
            limiter,
            summary: Summary::default(),
        }
    }

    fn walk<'s>(
        &'s self,
        dir: &Path,
        entries: Vec<DirectoryEntry>,
        location: Option<&str>,
        mut dest: DestState,
        dispatch: &Dispatch<'_, 's>,
    ) {
        self.summary.directory_scanned();
        let dest_dir = dir.join(&self.options.dest);

        for entry in entries {
            if entry.is_dir {
                if self.is_destination(&entry) {
                    debug!("skipping destination directory {}", entry.path.display());
                    continue;
                }
                match list_dir(&entry.path) {
                    Ok(children) => {
                        let nested = if self.options.dry_run {
                            DestState::Ready
                        } else {
                            DestState::Pending
                        };
                        self.walk(&entry.path, children, Some(&entry.name), nested, dispatch);
                    }
                    Err(err) => {
                        warn!("skipping subtree {}: {err:#}", entry.path.display());
                        self.summary.subtree_skipped();
                    }
                }
                continue;
            }

            self.summary.file_seen();
            if !extension_matches(&entry.name, &self.options.extensions) {
                info!(
                    "{} excluded, invalid extension {:?} (expected within {:?})",
                    entry.name,
                    file_extension(&entry.name).unwrap_or_default(),
                    self.options.extensions
                );
                self.summary.extension_skipped();
                continue;
            }

            info!("processing image: {}", entry.path.display());
            let date = match CaptionDate::from_file_name(&entry.name) {
                Ok(date) => date,
                Err(err) => {
                    warn!("invalid date for file {}: {err}", entry.name);
                    self.summary.date_skipped();
                    continue;
                }
            };

            if !self.ensure_dest(&dest_dir, &mut dest) {
                continue;
            }

            let task = AnnotationTask {
                source_dir: dir.to_path_buf(),
                dest_dir: dest_dir.clone(),
                file_name: entry.name,
                location: location.map(str::to_string),
                date,
            };
            self.dispatch(task, dispatch);
        }
    }

    fn dispatch<'s>(&'s self, task: AnnotationTask, dispatch: &Dispatch<'_, 's>) {
        let permit = self.limiter.acquire();
        match dispatch {
            Dispatch::Inline => self.execute(task, permit),
            Dispatch::Pool(scope) => scope.spawn(move |_| self.execute(task, permit)),
        }
    }

    fn execute(&self, task: AnnotationTask, _permit: Permit<'_>) {
        let request = task.request(self.options);
        debug!(
            geometry = %request.geometry,
            caption = %request.caption,
            "annotating {}",
            request.source_path.display()
        );
        match self.annotator.annotate(&request) {
            Ok(()) => self.summary.annotated(),
            Err(err) => {
                warn!(
                    "annotation failed for {}: {err}",
                    request.source_path.display()
                );
                self.summary.failed();
            }
        }
    }

    fn ensure_dest(&self, dest_dir: &Path, state: &mut DestState) -> bool {
        match *state {
            DestState::Ready => true,
            DestState::Failed => false,
            DestState::Pending => match fs::create_dir_all(dest_dir) {
                Ok(()) => {
                    *state = DestState::Ready;
                    true
                }
                Err(err) => {
                    warn!(
                        "cannot create destination {}, skipping its files: {err}",
                        dest_dir.display()
                    );
                    self.summary.subtree_skipped();
                    *state = DestState::Failed;
                    false
                }
            },
        }
    }

    fn is_destination(&self, entry: &DirectoryEntry) -> bool {
        let dest_name = self.options.dest.file_name();
        dest_name.is_some() && entry.path.file_name() == dest_name
    }
}
