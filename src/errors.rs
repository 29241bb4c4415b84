/*!
 * Error types for the subvoice application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;

use thiserror::Error;

use crate::timeline::OverlapReport;

/// Errors raised while loading or validating the voice configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file {path}: {message}")]
    Unreadable {
        /// Path of the config file
        path: PathBuf,
        /// Underlying reason
        message: String,
    },

    /// The configuration file is not valid JSON for this schema
    #[error("Failed to parse config file {path}: {message}")]
    Malformed {
        /// Path of the config file
        path: PathBuf,
        /// Parser message, including line and column
        message: String,
    },

    /// A field holds a value the pipeline cannot work with
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A cue resolved to a voice that has no synthesis model
    #[error("Voice '{identity}' has no model configured")]
    MissingModel {
        /// Speaker identity as written in the subtitle script
        identity: String,
    },
}

/// Errors that can occur while reading subtitle scripts
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The script could not be read from disk
    #[error("Failed to read subtitle file {path}: {message}")]
    Unreadable {
        /// Path of the script
        path: PathBuf,
        /// Underlying reason
        message: String,
    },

    /// The file extension does not name a supported format
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),

    /// A cue could not be parsed
    #[error("Invalid subtitle at line {line}: {message}")]
    Invalid {
        /// 1-based line number in the source
        line: usize,
        /// What was wrong
        message: String,
    },

    /// The script contains no usable cues
    #[error("No subtitle cues found")]
    Empty,
}

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors raised while decoding clips or encoding the final mix
#[derive(Error, Debug)]
pub enum CodecError {
    /// The clip could not be opened
    #[error("Failed to open audio file {path}: {message}")]
    Open {
        /// Clip path
        path: PathBuf,
        /// Underlying reason
        message: String,
    },

    /// The clip container or stream is corrupt or unsupported
    #[error("Failed to decode audio file {path}: {message}")]
    Decode {
        /// Clip path
        path: PathBuf,
        /// Decoder message
        message: String,
    },

    /// The clip decoded to no audio
    #[error("Audio file {path} contains no audio")]
    Empty {
        /// Clip path
        path: PathBuf,
    },

    /// The clip is not at the mixing sample rate
    #[error("Audio file {path} has sample rate {found} Hz, expected {expected} Hz")]
    SampleRate {
        /// Clip path
        path: PathBuf,
        /// Rate found in the clip
        found: u32,
        /// Rate the mixer runs at
        expected: u32,
    },

    /// Writing the output container failed
    #[error("Failed to write audio file {path}: {message}")]
    Encode {
        /// Output path
        path: PathBuf,
        /// Encoder message
        message: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Configuration problem
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from subtitle parsing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from the synthesis provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the audio codec
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Same-voice clips overlap on the timeline; the operator must fix the script
    #[error("{} overlapping clip(s) detected", .0.overlaps.len())]
    Overlap(OverlapReport),
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
