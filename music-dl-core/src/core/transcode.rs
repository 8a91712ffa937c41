use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::core::process;
use crate::core::progress::{self, Activity, DownloadTag, MonotonicProgress, ProgressFn};
use crate::core::sweeper;
use crate::core::workspace::Workspace;
use crate::error::{CoreError, Result};
use crate::fs_paths;
use crate::models::media::{AudioJob, VideoJob};
use crate::models::settings::AppSettings;

/// Extensions yt-dlp may leave in the workspace for an audio job.
pub const RAW_MEDIA_EXTENSIONS: &[&str] = &["webm", "m4a", "mp3", "opus", "aac", "wav", "flac"];

pub const AUDIO_CODEC: &str = "libmp3lame";
pub const DEFAULT_VIDEO_FORMAT: &str =
    "bestvideo[height<=1080][ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

const WORKSPACE_SUFFIX: &str = "audiowork";
const RAW_TEMPLATE: &str = "temp_%(id)s.%(ext)s";
const ENCODING_PROGRESS: f64 = 99.0;

static RESOLUTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s(\d{3,5})x(\d{3,5})\s").unwrap());

/// Tool locations and sweep roots, resolved once before any job runs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub ytdlp: PathBuf,
    pub ffmpeg: PathBuf,
    pub sweep_dirs: Vec<PathBuf>,
}

impl PipelineConfig {
    pub fn from_settings(settings: &AppSettings, cwd: &Path) -> Self {
        let sweep_dirs = if settings.download.global_sweep_dirs.is_empty() {
            vec![cwd.to_path_buf()]
        } else {
            settings
                .download
                .global_sweep_dirs
                .iter()
                .map(|d| if d.is_absolute() { d.clone() } else { cwd.join(d) })
                .collect()
        };

        Self {
            ytdlp: fs_paths::resolve_ytdlp(settings.tools.ytdlp.as_deref(), cwd),
            ffmpeg: fs_paths::resolve_ffmpeg(settings.tools.ffmpeg.as_deref()),
            sweep_dirs,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCandidate {
    pub path: PathBuf,
    pub size: u64,
}

/// Maps a user quality string to ffmpeg's `-q:a` value (0 best .. 9 worst).
/// Anything that is not a single step in that range falls back to `0`.
pub fn quality_arg(quality: &str) -> String {
    match quality.trim().parse::<u8>() {
        Ok(q) if q <= 9 => q.to_string(),
        _ => "0".to_string(),
    }
}

pub fn scan_raw_candidates(dir: &Path) -> std::io::Result<Vec<RawCandidate>> {
    let mut candidates = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_raw = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .is_some_and(|e| RAW_MEDIA_EXTENSIONS.contains(&e.as_str()));
        if !is_raw {
            continue;
        }

        let meta = entry.metadata()?;
        if meta.is_file() {
            candidates.push(RawCandidate {
                path,
                size: meta.len(),
            });
        }
    }

    Ok(candidates)
}

/// Largest file wins; on a tie the first one listed is kept.
pub fn select_largest(candidates: &[RawCandidate]) -> Option<&RawCandidate> {
    candidates.iter().fold(None, |best: Option<&RawCandidate>, c| match best {
        Some(b) if b.size >= c.size => Some(b),
        _ => Some(c),
    })
}

/// Finds the format id for a label such as `1080p` in `yt-dlp -F` output.
/// Lines are scanned bottom-up, so the last (usually best) mp4 entry wins.
pub fn resolve_format_id(listing: &str, resolution: &str) -> Option<String> {
    let height = resolution.trim().trim_end_matches(['p', 'P']);
    if height.is_empty() {
        return None;
    }

    listing
        .lines()
        .rev()
        .find(|line| line.contains(height) && line.contains("mp4"))
        .and_then(|line| line.split_whitespace().next())
        .map(str::to_string)
}

pub fn available_resolutions(listing: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for caps in RESOLUTION_RE.captures_iter(listing) {
        let label = format!("{}p", &caps[2]);
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels
}

pub fn video_format_selector(format_id: &str) -> String {
    format!("{}+bestaudio[ext=m4a]/best", format_id)
}

/// Runs on every exit path of a job: drops the workspace, then sweeps the
/// final directory and the global roots.
struct CleanupGuard {
    workspace: Option<Workspace>,
    final_path: PathBuf,
    final_dir: PathBuf,
    final_stem: String,
    keep_ext: &'static str,
    sweep_dirs: Vec<PathBuf>,
}

impl CleanupGuard {
    fn new(
        workspace: Option<Workspace>,
        final_path: &Path,
        keep_ext: &'static str,
        sweep_dirs: Vec<PathBuf>,
    ) -> Self {
        Self {
            workspace,
            final_path: final_path.to_path_buf(),
            final_dir: final_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
            final_stem: final_path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
            keep_ext,
            sweep_dirs,
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        drop(self.workspace.take());
        let local = sweeper::sweep_local(&self.final_dir, &self.final_stem, &[self.keep_ext]);
        let global = sweeper::sweep_global(&self.sweep_dirs, Some(&self.final_path));
        if local + global > 0 {
            tracing::debug!("cleanup removed {} local and {} global leftovers", local, global);
        }
    }
}

fn absolute_output(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let output = std::path::absolute(path)?;
    let dir = output
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| std::io::Error::other(format!("{} has no parent directory", output.display())))?;
    Ok((output, dir))
}

fn push_cookies(args: &mut Vec<String>, cookies: Option<&Path>) {
    if let Some(path) = cookies {
        args.push("--cookies".to_string());
        args.push(path.to_string_lossy().to_string());
    }
}

pub struct Transcoder {
    config: PipelineConfig,
}

impl Transcoder {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Downloads the best audio stream for `job` and encodes it to mp3 at
    /// exactly `job.output_path`.
    ///
    /// Download progress fills 0..50, encoding reports 99 while ffmpeg is
    /// busy and 100 once it exits cleanly. The workspace and any leftovers
    /// are cleaned up whether or not the job succeeds.
    pub async fn download_audio(
        &self,
        job: &AudioJob,
        on_progress: Option<&ProgressFn<'_>>,
    ) -> Result<PathBuf> {
        let (output, final_dir) = absolute_output(&job.output_path)?;
        tokio::fs::create_dir_all(&final_dir).await?;

        let workspace = Workspace::create_for(&output, WORKSPACE_SUFFIX)?;
        let workspace_dir = workspace.path().to_path_buf();
        let raw_template = workspace.join(RAW_TEMPLATE);
        let _cleanup = CleanupGuard::new(Some(workspace), &output, ".mp3", self.config.sweep_dirs.clone());

        tracing::info!("downloading audio {} -> {}", job.source_url, output.display());
        let gate = MonotonicProgress::new(on_progress);

        let mut ytdlp_args = vec![
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "--no-cache-dir".to_string(),
            "--rm-cache-dir".to_string(),
            "-o".to_string(),
            raw_template.to_string_lossy().to_string(),
            "--paths".to_string(),
            format!("ALL:{}", workspace_dir.display()),
        ];
        push_cookies(&mut ytdlp_args, job.cookies.as_deref());
        ytdlp_args.push(job.source_url.clone());

        process::run(
            &self.config.ytdlp,
            &ytdlp_args,
            None,
            Arc::new(DownloadTag),
            &|p| gate.report(progress::download_phase(p)),
        )
        .await?;

        let candidates = scan_raw_candidates(&workspace_dir)?;
        let raw = select_largest(&candidates).ok_or_else(|| CoreError::NoRawMediaFound {
            workspace: workspace_dir.clone(),
        })?;
        tracing::debug!(
            "selected {} ({} bytes) out of {} candidates",
            raw.path.display(),
            raw.size,
            candidates.len()
        );

        let ffmpeg_args = vec![
            "-y".to_string(),
            "-i".to_string(),
            raw.path.to_string_lossy().to_string(),
            "-vn".to_string(),
            "-acodec".to_string(),
            AUDIO_CODEC.to_string(),
            "-q:a".to_string(),
            quality_arg(&job.quality),
            output.to_string_lossy().to_string(),
        ];

        let encoded = process::run_to_exit(
            &self.config.ffmpeg,
            &ffmpeg_args,
            None,
            Arc::new(Activity(ENCODING_PROGRESS)),
            &|p| gate.report(p),
        )
        .await?;

        if !encoded.status.success() {
            tracing::warn!("encoder failed for {}: {}", output.display(), encoded.stderr);
            return Err(CoreError::EncodeFailure {
                code: encoded.status.code(),
            });
        }

        gate.report(100.0);
        tracing::info!("finished {}", output.display());
        Ok(output)
    }

    /// Downloads a merged mp4 straight to `job.output_path`. A resolution
    /// label is resolved against the formats yt-dlp lists for the URL.
    pub async fn download_video(
        &self,
        job: &VideoJob,
        on_progress: Option<&ProgressFn<'_>>,
    ) -> Result<PathBuf> {
        let (output, final_dir) = absolute_output(&job.output_path)?;
        tokio::fs::create_dir_all(&final_dir).await?;

        let mut sweep_dirs = vec![final_dir.clone()];
        sweep_dirs.extend(self.config.sweep_dirs.iter().cloned());
        let _cleanup = CleanupGuard::new(None, &output, ".mp4", sweep_dirs);

        let gate = MonotonicProgress::new(on_progress);
        gate.report(0.0);

        let selector = match job.resolution.as_deref() {
            Some(resolution) => {
                let listing = self.list_formats(&job.source_url, job.cookies.as_deref()).await?;
                match resolve_format_id(&listing, resolution) {
                    Some(id) => video_format_selector(&id),
                    None => {
                        return Err(CoreError::ResolutionUnavailable {
                            requested: resolution.to_string(),
                            available: available_resolutions(&listing),
                        })
                    }
                }
            }
            None => DEFAULT_VIDEO_FORMAT.to_string(),
        };

        tracing::info!("downloading video {} -> {} [{}]", job.source_url, output.display(), selector);

        let mut args = Vec::new();
        push_cookies(&mut args, job.cookies.as_deref());
        args.extend([
            "-f".to_string(),
            selector,
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "-o".to_string(),
            output.to_string_lossy().to_string(),
            job.source_url.clone(),
        ]);

        process::run(&self.config.ytdlp, &args, None, Arc::new(DownloadTag), &|p| gate.report(p)).await?;

        gate.report(100.0);
        tracing::info!("finished {}", output.display());
        Ok(output)
    }

    pub async fn list_formats(&self, url: &str, cookies: Option<&Path>) -> Result<String> {
        let mut args = Vec::new();
        push_cookies(&mut args, cookies);
        args.extend(["-F".to_string(), url.to_string()]);
        process::capture(&self.config.ytdlp, &args).await
    }
}
