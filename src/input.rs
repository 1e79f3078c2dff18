//! Where the detection worker reads frames from.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Token the worker recognises as "use the default camera".
pub const WEBCAM_TOKEN: &str = "Webcam";

/// Frame source for a detection job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputSource {
    /// The default camera.
    #[default]
    Webcam,
    /// A recorded video file.
    VideoFile(PathBuf),
}

impl InputSource {
    /// Resolve the operator's choice of a video file.
    ///
    /// Choosing a video without ending up with a path (e.g. a cancelled file
    /// picker or a blank field) falls back to [`InputSource::Webcam`].
    pub fn video(picked: Option<PathBuf>) -> Self {
        match picked {
            Some(path) if !path.as_os_str().is_empty() => Self::VideoFile(path),
            _ => {
                warn!("no video file selected, reverting to webcam");
                Self::Webcam
            }
        }
    }

    /// Whether the worker can be started from this source.
    pub fn is_usable(&self) -> bool {
        match self {
            Self::Webcam => true,
            Self::VideoFile(path) => !path.as_os_str().is_empty(),
        }
    }

    /// The video path, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Webcam => None,
            Self::VideoFile(path) => Some(path),
        }
    }

    /// Positional argument passed to the worker. Video paths are passed
    /// byte for byte, including non-UTF-8 names.
    pub fn token(&self) -> OsString {
        match self {
            Self::Webcam => OsString::from(WEBCAM_TOKEN),
            Self::VideoFile(path) => path.as_os_str().to_owned(),
        }
    }
}
