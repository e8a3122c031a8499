use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;

use clipfinder_core::alignment::domain::clip_boundaries::ClipBoundaries;
use clipfinder_core::alignment::domain::keyword::Keyword;
use clipfinder_core::alignment::domain::keyword_extractor::KeywordExtractor;
use clipfinder_core::alignment::domain::match_result::MatchResult;
use clipfinder_core::alignment::infrastructure::stopword_keyword_extractor::StopwordKeywordExtractor;
use clipfinder_core::media::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use clipfinder_core::media::infrastructure::ffmpeg_segment_extractor::FfmpegSegmentExtractor;
use clipfinder_core::pipeline::clip_request::{ClipRequest, ErrorStatus};
use clipfinder_core::pipeline::find_clip_use_case::FindClipUseCase;
use clipfinder_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use clipfinder_core::shared::config::AlignmentConfig;
use clipfinder_core::shared::constants::{
    VIDEO_EXTENSIONS, WHISPER_MODEL_NAME, WHISPER_MODEL_URL,
};
use clipfinder_core::shared::error::{AlignError, CollaboratorError};
use clipfinder_core::shared::model_resolver;
use clipfinder_core::transcript::domain::transcriber::Transcriber;
use clipfinder_core::transcript::infrastructure::json_transcriber::JsonTranscriber;
use clipfinder_core::transcript::infrastructure::whisper_transcriber::WhisperTranscriber;

/// Find the moment in a video where a query is talked about, and cut a clip there.
#[derive(Parser)]
#[command(name = "clipfinder")]
struct Cli {
    /// Input video file.
    video: PathBuf,

    /// What to look for, e.g. "where Elon talks about grit".
    query: String,

    /// Use these keywords (comma-separated, highest priority first) instead
    /// of extracting them from the query.
    #[arg(long, value_delimiter = ',')]
    keywords: Option<Vec<String>>,

    /// Read transcripts from <DIR>/<video stem>.json instead of running Whisper.
    #[arg(long, value_name = "DIR")]
    transcript: Option<PathBuf>,

    /// Whisper model file (downloaded to the cache if omitted).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Directory clips are written to.
    #[arg(long, default_value = "clips")]
    output: PathBuf,

    /// Desired clip length in seconds.
    #[arg(long, default_value = "60")]
    target_length: f64,

    /// Shortest acceptable clip in seconds.
    #[arg(long, default_value = "1")]
    min_length: f64,

    /// Print the boundaries without cutting the clip.
    #[arg(long)]
    dry_run: bool,
}

/// Keywords given on the command line, ranked in the order given.
struct ListedKeywords(Vec<String>);

impl KeywordExtractor for ListedKeywords {
    fn extract(&self, _query: &str) -> Result<Vec<Keyword>, CollaboratorError> {
        Ok(Keyword::ranked(&self.0))
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(exit_code(e.as_ref()));
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let (target_length, min_length) = validate(&cli)?;

    let config = AlignmentConfig::default()
        .with_target_length(target_length)
        .with_min_clip_length(min_length);

    let use_case = FindClipUseCase::new(
        build_extractor(&cli),
        build_transcriber(&cli)?,
        Box::new(FfmpegSegmentExtractor::new(&cli.output)),
        &config,
    )
    .with_logger(Box::new(StdoutPipelineLogger::new()));

    let request = ClipRequest::new(cli.query.as_str(), cli.video.to_string_lossy());

    if cli.dry_run {
        let (boundaries, matched) = use_case.align(&request)?;
        print_match(&boundaries, &matched);
    } else {
        let response = use_case.execute(&request)?;
        print_match(&response.boundaries, &response.matched);
        println!("{}", response.clip.display());
    }

    use_case.summary();
    Ok(())
}

fn build_extractor(cli: &Cli) -> Box<dyn KeywordExtractor> {
    match &cli.keywords {
        Some(keywords) => Box::new(ListedKeywords(keywords.clone())),
        None => Box::new(StopwordKeywordExtractor::new()),
    }
}

fn build_transcriber(cli: &Cli) -> Result<Box<dyn Transcriber>, Box<dyn std::error::Error>> {
    if let Some(dir) = &cli.transcript {
        log::info!("Reading transcripts from {}", dir.display());
        return Ok(Box::new(JsonTranscriber::new(dir)));
    }

    let model_path = match &cli.model {
        Some(path) => path.clone(),
        None => {
            log::info!("Resolving model: {WHISPER_MODEL_NAME}");
            let path = model_resolver::resolve(
                WHISPER_MODEL_NAME,
                WHISPER_MODEL_URL,
                None,
                Some(Box::new(download_progress)),
            )?;
            eprintln!();
            path
        }
    };

    let transcriber = WhisperTranscriber::new(&model_path, Box::new(FfmpegAudioReader))
        .map_err(|e| e.to_string())?;
    Ok(Box::new(transcriber))
}

/// Checks the arguments and returns `(target_length, min_length)`.
///
/// Failures are [`AlignError::InvalidInput`] so they exit like any other bad input.
fn validate(cli: &Cli) -> Result<(Duration, Duration), AlignError> {
    let needs_media = cli.transcript.is_none() || !cli.dry_run;
    if needs_media && !cli.video.exists() {
        return Err(AlignError::InvalidInput(format!(
            "input file not found: {}",
            cli.video.display()
        )));
    }
    if needs_media && !is_video(&cli.video) {
        log::warn!(
            "{} does not have a known video extension ({})",
            cli.video.display(),
            VIDEO_EXTENSIONS.join(", ")
        );
    }

    let target_length = seconds_arg("target length", cli.target_length)?;
    if target_length.is_zero() {
        return Err(AlignError::InvalidInput(format!(
            "target length must be positive, got {}",
            cli.target_length
        )));
    }
    let min_length = seconds_arg("minimum length", cli.min_length)?;
    if min_length > target_length {
        return Err(AlignError::InvalidInput(format!(
            "minimum length ({}s) exceeds target length ({}s)",
            cli.min_length, cli.target_length
        )));
    }
    Ok((target_length, min_length))
}

fn seconds_arg(name: &str, value: f64) -> Result<Duration, AlignError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        AlignError::InvalidInput(format!(
            "{name} must be a non-negative number of seconds, got {value}"
        ))
    })
}

fn print_match(boundaries: &ClipBoundaries, matched: &MatchResult) {
    println!(
        "{:.2}s - {:.2}s  (keyword {:?} at {:.2}s, {:?} match)",
        boundaries.start().as_secs_f64(),
        boundaries.end().as_secs_f64(),
        matched.keyword.text(),
        matched.offset.as_secs_f64(),
        matched.pass
    );
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// 2 = bad input, 3 = nothing found, 4 = upstream failure, 1 = anything else.
fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    match err.downcast_ref::<AlignError>().map(ErrorStatus::from) {
        Some(ErrorStatus::BadInput) => 2,
        Some(ErrorStatus::NotFound) => 3,
        Some(ErrorStatus::UpstreamFailure) => 4,
        None => 1,
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading speech model... {pct}%");
    } else {
        eprint!("\rDownloading speech model... {downloaded} bytes");
    }
}
