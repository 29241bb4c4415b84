/*!
 * Content-addressed clip identities and the stores that hold rendered clips.
 *
 * A clip file is named `<fingerprint>-<voice>-<slug>.<request id>.<ext>`.
 * The fingerprint covers the voice model, the speech rate and the text, so an
 * unchanged line always maps back to the same file and is not synthesized
 * again. The request id returned by the synthesis service is kept in the
 * filename so later runs can pass it on as a continuity hint.
 */

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::file_utils::FileManager;
use crate::speaker::VoiceConfig;

/// Digest bytes kept in the fingerprint (8 hex characters)
pub const FINGERPRINT_BYTES: usize = 4;

/// Maximum slug length in characters
pub const SLUG_MAX_CHARS: usize = 50;

// @const: Characters unsafe in filenames, plus control characters
static UNSAFE_CHARS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[,.!?'<>:"/\\|?*\x00-\x1F]"#).unwrap()
});

/// Fingerprint over voice model, speech rate and text, as fixed-width upper-case hex
pub fn fingerprint(voice: &VoiceConfig, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(voice.model.as_bytes());
    hasher.update(format!("{:.6}", voice.speed).as_bytes());
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();

    digest[..FINGERPRINT_BYTES]
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect()
}

/// Filename-safe rendering of a line of text
pub fn slugify(text: &str) -> String {
    let cleaned = UNSAFE_CHARS_REGEX.replace_all(text, "");
    let lowered = cleaned.to_lowercase().trim().replace(' ', "_");
    lowered.chars().take(SLUG_MAX_CHARS).collect()
}

/// Where a clip lives, or will live once its request id is known
#[derive(Debug, Clone, PartialEq)]
pub struct ClipIdentity {
    /// `<fingerprint>-<voice>-<slug>`
    stem: String,

    /// Container extension without the dot
    extension: String,

    /// Concrete location once rendered
    pub path: Option<PathBuf>,

    /// Synthesis request id once rendered
    pub request_id: Option<String>,
}

impl ClipIdentity {
    /// Derive the identity of `text` spoken by `voice`
    pub fn derive(voice: &VoiceConfig, text: &str, extension: &str) -> Self {
        let voice_name = UNSAFE_CHARS_REGEX.replace_all(&voice.name, "").replace(' ', "_");
        Self {
            stem: format!("{}-{}-{}", fingerprint(voice, text), voice_name, slugify(text)),
            extension: extension.trim_start_matches('.').to_string(),
            path: None,
            request_id: None,
        }
    }

    pub fn fingerprint(&self) -> &str {
        self.stem.split('-').next().unwrap_or_default()
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Filename for a given request id
    pub fn file_name(&self, request_id: &str) -> String {
        format!("{}.{}.{}", self.stem, request_id, self.extension)
    }

    /// Filename pattern with `*` in the request id position
    pub fn glob(&self) -> String {
        self.file_name("*")
    }

    /// Recover the request id from a filename produced by [`Self::file_name`]
    pub fn request_id_from(&self, file_name: &str) -> Option<String> {
        let rest = file_name.strip_prefix(self.stem.as_str())?.strip_prefix('.')?;
        let id = rest
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;
        if id.is_empty() || id.contains(['.', '/', '\\']) {
            return None;
        }
        Some(id.to_string())
    }

    /// Whether a rendered clip is known
    pub fn is_rendered(&self) -> bool {
        self.path.is_some() && self.request_id.is_some()
    }

    /// Record where the rendered clip lives
    pub fn resolve(&mut self, clip: StoredClip) {
        self.path = Some(clip.path);
        self.request_id = Some(clip.request_id);
    }
}

/// A clip present in a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredClip {
    pub path: PathBuf,
    pub request_id: String,
}

/// Content-addressed clip storage
pub trait ClipStore: Send + Sync {
    /// Find a previously stored clip for this identity
    fn lookup(&self, identity: &ClipIdentity) -> io::Result<Option<StoredClip>>;

    /// Store clip bytes under the identity and request id
    fn store(&self, identity: &ClipIdentity, request_id: &str, bytes: &[u8]) -> io::Result<StoredClip>;

    /// Read a stored clip back
    fn load(&self, path: &Path) -> io::Result<Vec<u8>>;
}

fn check_request_id(request_id: &str) -> io::Result<()> {
    if request_id.is_empty() || request_id.contains(['.', '/', '\\', '*']) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("request id '{}' cannot be used in a filename", request_id),
        ));
    }
    Ok(())
}

/// Clips stored as files in one directory, normally next to the script
#[derive(Debug, Clone)]
pub struct FsClipStore {
    root: PathBuf,
}

impl FsClipStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ClipStore for FsClipStore {
    fn lookup(&self, identity: &ClipIdentity) -> io::Result<Option<StoredClip>> {
        if !self.root.is_dir() {
            return Ok(None);
        }

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if let Some(request_id) = identity.request_id_from(&name) {
                debug!("Found cached clip {} for {}", name, identity.glob());
                return Ok(Some(StoredClip {
                    path: entry.path().to_path_buf(),
                    request_id,
                }));
            }
        }

        Ok(None)
    }

    fn store(&self, identity: &ClipIdentity, request_id: &str, bytes: &[u8]) -> io::Result<StoredClip> {
        check_request_id(request_id)?;
        let path = self.root.join(identity.file_name(request_id));
        FileManager::write_atomic(&path, bytes)?;
        Ok(StoredClip {
            path,
            request_id: request_id.to_string(),
        })
    }

    fn load(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

/// In-memory store, keyed by filename
#[derive(Debug, Default)]
pub struct MemoryClipStore {
    clips: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryClipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored clips
    pub fn len(&self) -> usize {
        self.clips.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.read().is_empty()
    }
}

impl ClipStore for MemoryClipStore {
    fn lookup(&self, identity: &ClipIdentity) -> io::Result<Option<StoredClip>> {
        let clips = self.clips.read();
        Ok(clips.keys().find_map(|name| {
            identity.request_id_from(name).map(|request_id| StoredClip {
                path: PathBuf::from(name),
                request_id,
            })
        }))
    }

    fn store(&self, identity: &ClipIdentity, request_id: &str, bytes: &[u8]) -> io::Result<StoredClip> {
        check_request_id(request_id)?;
        let name = identity.file_name(request_id);
        self.clips.write().insert(name.clone(), bytes.to_vec());
        Ok(StoredClip {
            path: PathBuf::from(name),
            request_id: request_id.to_string(),
        })
    }

    fn load(&self, path: &Path) -> io::Result<Vec<u8>> {
        let name = path.to_string_lossy();
        self.clips
            .read()
            .get(name.as_ref())
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no clip named {}", name)))
    }
}
