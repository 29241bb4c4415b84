use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use log::{debug, info};

use crate::app_config::Config;
use crate::clip_cache::{ClipStore, FsClipStore};
use crate::codec::write_wav;
use crate::errors::AppError;
use crate::fetcher::{ClipFetcher, FetchStats, plan_clips};
use crate::file_utils::FileManager;
use crate::merger::merge_cues;
use crate::mixer::mix_timeline;
use crate::providers::SpeechProvider;
use crate::providers::elevenlabs::ElevenLabs;
use crate::speaker::VoiceTable;
use crate::subtitle_processor::SubtitleScript;
use crate::timeline::{RenderedClip, Timeline};

// @module: Application controller for script rendering

/// What a completed render produced
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    // @field: Final WAV file
    pub output_path: PathBuf,
    // @field: Number of merged clips on the timeline
    pub clips: usize,
    // @field: Cached versus freshly synthesized clips
    pub stats: FetchStats,
    // @field: Channels in the output file
    pub channels: usize,
    // @field: Length of the output file
    pub duration: Duration,
}

/// Main application controller for rendering subtitle scripts to audio
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Show a progress bar while synthesizing
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self {
            config,
            show_progress: false,
        })
    }

    /// Enable the fetch progress bar
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Render a script with the configured synthesis service, caching clips
    /// beside the script and printing the clip report to stdout
    pub async fn run(&self, script_path: &Path, threshold_override: Option<i64>) -> Result<RenderOutcome> {
        if !FileManager::file_exists(script_path) {
            return Err(anyhow!("Subtitle file does not exist: {:?}", script_path));
        }

        let script = SubtitleScript::open(script_path)
            .with_context(|| format!("Failed to read subtitle file {:?}", script_path))?;

        let provider_config = &self.config.provider;
        let provider = ElevenLabs::new(
            provider_config.api_key.clone(),
            provider_config.endpoint.clone(),
            provider_config.model_id.clone(),
            provider_config.timeout_secs,
        );
        let store = FsClipStore::new(script.root_dir());
        debug!("Caching clips in {}", store.root().display());

        let threshold_ms = self.config.merge_threshold_ms(threshold_override);
        let output_path = FileManager::generate_output_path(script_path, Local::now(), "wav");

        let mut stdout = std::io::stdout().lock();
        let outcome = self
            .render(&script, &provider, &store, threshold_ms, &output_path, &mut stdout)
            .await
            .context("Failed to render subtitle script")?;
        Ok(outcome)
    }

    /// Run the pipeline on a parsed script: merge, resolve voices, fetch
    /// missing clips, place them, gate on overlaps, mix and write.
    ///
    /// Nothing is written to `output_path` unless every step succeeds.
    pub async fn render<P, S, W>(
        &self,
        script: &SubtitleScript,
        provider: &P,
        store: &S,
        threshold_ms: i64,
        output_path: &Path,
        report: &mut W,
    ) -> Result<RenderOutcome, AppError>
    where
        P: SpeechProvider + ?Sized,
        S: ClipStore + ?Sized,
        W: Write,
    {
        let start_time = Instant::now();

        if threshold_ms > 0 {
            info!("Using merge threshold: {}ms", threshold_ms);
        } else {
            info!("No merge threshold set, not merging lines");
        }
        let merged = merge_cues(&script.cues, threshold_ms);
        debug!("{} cues merged into {} clips", script.cues.len(), merged.len());

        let table = VoiceTable::from_config(&self.config);
        debug!("Voice table has {} channel(s)", table.channel_count());
        let mut pending = plan_clips(merged, &table, store, provider.clip_extension())?;

        let stats = ClipFetcher::new(provider, store)
            .with_progress(self.show_progress)
            .fetch_missing(&mut pending)
            .await?;
        info!(
            "{} clips ready ({} cached, {} synthesized)",
            pending.len(),
            stats.cached,
            stats.synthesized
        );

        let rendered = pending
            .into_iter()
            .map(|clip| RenderedClip::probe(clip, store))
            .collect::<Result<Vec<_>, _>>()?;

        let timeline = Timeline::assemble(rendered);
        timeline.write_report(report)?;
        timeline.check().map_err(AppError::Overlap)?;

        let mix = mix_timeline(&timeline, store)?;
        write_wav(output_path, &mix)?;

        info!(
            "Final audio track written to {} ({} channel(s), {:.1}s) in {:.1}s",
            output_path.display(),
            mix.channels(),
            mix.duration().as_secs_f64(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(RenderOutcome {
            output_path: output_path.to_path_buf(),
            clips: timeline.entries.len(),
            stats,
            channels: mix.channels(),
            duration: mix.duration(),
        })
    }
}
