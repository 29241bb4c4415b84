/*!
 * Clip planning and fetching.
 *
 * Each merged cue is paired with its voice and clip identity. Cues whose clip
 * is not in the store are synthesized one by one, in script order, so each
 * request can reference the request ids of its already rendered neighbours.
 */

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use crate::clip_cache::{ClipIdentity, ClipStore};
use crate::errors::{AppError, ConfigError};
use crate::merger::MergedCue;
use crate::providers::{SpeechProvider, SpeechRequest};
use crate::speaker::{VoiceConfig, VoiceTable};

/// Neighbours considered on each side for continuity hints
pub const HINT_WINDOW: usize = 3;

/// A merged cue with its voice and clip identity, before probing
#[derive(Debug, Clone)]
pub struct PendingClip {
    pub cue: MergedCue,
    pub voice: VoiceConfig,
    pub identity: ClipIdentity,
}

impl PendingClip {
    /// Identity used in error messages
    fn speaker_label(&self) -> String {
        self.cue.speaker.clone().unwrap_or_else(|| self.voice.name.clone())
    }
}

/// Resolve voices and identities for every merged cue and pick up cached clips
pub fn plan_clips<S: ClipStore + ?Sized>(
    cues: Vec<MergedCue>,
    table: &VoiceTable,
    store: &S,
    extension: &str,
) -> Result<Vec<PendingClip>, AppError> {
    let mut planned = Vec::with_capacity(cues.len());

    for cue in cues {
        let voice = table.resolve(cue.speaker.as_deref());
        let mut identity = ClipIdentity::derive(&voice, &cue.text, extension);
        if let Some(stored) = store.lookup(&identity)? {
            identity.resolve(stored);
        }
        planned.push(PendingClip { cue, voice, identity });
    }

    Ok(planned)
}

/// Request ids of rendered neighbours around one clip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinuityHints {
    /// Nearest first
    pub previous_request_ids: Vec<String>,
    /// Nearest first
    pub next_request_ids: Vec<String>,
    /// Text of the first following clip without a request id
    pub next_text: Option<String>,
}

impl ContinuityHints {
    /// Look up to [`HINT_WINDOW`] clips either side of `index`. A neighbour
    /// without a request id ends the window on its side; on the following
    /// side its text becomes the lookahead hint.
    pub fn around(clips: &[PendingClip], index: usize) -> Self {
        let mut hints = ContinuityHints::default();

        for clip in clips[index.saturating_sub(HINT_WINDOW)..index].iter().rev() {
            match &clip.identity.request_id {
                Some(id) => hints.previous_request_ids.push(id.clone()),
                None => break,
            }
        }

        let end = (index + 1 + HINT_WINDOW).min(clips.len());
        for clip in clips.iter().take(end).skip(index + 1) {
            match &clip.identity.request_id {
                Some(id) => hints.next_request_ids.push(id.clone()),
                None => {
                    hints.next_text = Some(clip.cue.text.clone());
                    break;
                }
            }
        }

        hints
    }
}

/// Outcome of a fetch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub cached: usize,
    pub synthesized: usize,
}

/// Renders missing clips through a provider into a store
pub struct ClipFetcher<'a, P: SpeechProvider + ?Sized, S: ClipStore + ?Sized> {
    provider: &'a P,
    store: &'a S,
    show_progress: bool,
}

impl<'a, P: SpeechProvider + ?Sized, S: ClipStore + ?Sized> ClipFetcher<'a, P, S> {
    pub fn new(provider: &'a P, store: &'a S) -> Self {
        Self {
            provider,
            store,
            show_progress: false,
        }
    }

    /// Show a progress bar while synthesizing
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Synthesize every clip that has no request id yet, in order. Repeated
    /// lines are synthesized once.
    ///
    /// Any failure aborts the pass; clips stored before the failure stay in
    /// the store and are reused by the next run.
    pub async fn fetch_missing(&self, clips: &mut [PendingClip]) -> Result<FetchStats, AppError> {
        // Unconfigured voices are reported before any request is made
        if let Some(clip) = clips.iter().find(|c| !c.voice.is_configured()) {
            return Err(ConfigError::MissingModel {
                identity: clip.speaker_label(),
            }
            .into());
        }

        let missing = clips.iter().filter(|c| !c.identity.is_rendered()).count();
        let mut stats = FetchStats {
            cached: clips.len() - missing,
            synthesized: 0,
        };
        if missing == 0 {
            info!("All {} clips already rendered", clips.len());
            return Ok(stats);
        }

        let progress_bar = self.progress_bar(missing as u64);

        for index in 0..clips.len() {
            if clips[index].identity.is_rendered() {
                let clip = &clips[index];
                debug!("Already spoke (as {}) \"{}\"", clip.voice.name, clip.cue.text);
                continue;
            }

            let hints = ContinuityHints::around(clips, index);
            let clip = &clips[index];
            debug!(
                "Hints for #{}: previous {:?}, next {:?}, next text {:?}",
                clip.cue.index + 1,
                hints.previous_request_ids,
                hints.next_request_ids,
                hints.next_text
            );

            info!("Speaking (as {}) \"{}\"", clip.voice.name, clip.cue.text);
            let request = SpeechRequest {
                text: clip.cue.text.clone(),
                voice_model: clip.voice.model.clone(),
                speed: clip.voice.speed,
                speaker_boost: true,
                previous_request_ids: hints.previous_request_ids,
                next_request_ids: hints.next_request_ids,
                next_text: hints.next_text,
            };

            let response = match self.provider.synthesize(request).await {
                Ok(response) => response,
                Err(e) => {
                    if let Some(pb) = &progress_bar {
                        pb.abandon_with_message("synthesis failed");
                    }
                    return Err(e.into());
                }
            };

            let stored = self
                .store
                .store(&clip.identity, &response.request_id, &response.audio)?;
            info!("Wrote {}", stored.path.display());

            // Later lines with the same voice and text reuse this clip
            let stem = clips[index].identity.stem().to_string();
            for later in clips[index + 1..]
                .iter_mut()
                .filter(|c| !c.identity.is_rendered() && c.identity.stem() == stem)
            {
                debug!("Reusing {} for #{}", stored.path.display(), later.cue.index + 1);
                later.identity.resolve(stored.clone());
                stats.cached += 1;
                if let Some(pb) = &progress_bar {
                    pb.inc(1);
                }
            }

            clips[index].identity.resolve(stored);
            stats.synthesized += 1;
            if let Some(pb) = &progress_bar {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("done");
        }

        Ok(stats)
    }

    fn progress_bar(&self, len: u64) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let progress_bar = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} clips ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        Some(progress_bar)
    }
}
