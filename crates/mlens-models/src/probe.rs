//! Probe result model.
//!
//! Mirrors the JSON written by `ffprobe -print_format json -show_format
//! -show_streams`. Every field is optional; derived values treat anything
//! missing or unparsable as absent.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::utils::round2;

/// Container-level section of a probe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatSection {
    #[serde(default)]
    pub format_name: Option<String>,
    /// Duration in seconds, as a decimal string
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl FormatSection {
    /// Parsed duration in seconds.
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration
            .as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite())
    }

    fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn creation_time(&self) -> Option<&str> {
        self.tag("creation_time")
    }

    pub fn encoder(&self) -> Option<&str> {
        self.tag("encoder")
    }

    /// Whether the container subsection has anything to show.
    pub fn has_details(&self) -> bool {
        self.duration_secs().is_some() || !self.tags.is_empty()
    }
}

/// One stream record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub codec_name: Option<String>,
    #[serde(default)]
    pub codec_long_name: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// `"num/den"`
    #[serde(default)]
    pub avg_frame_rate: Option<String>,
    /// Bits per second, as a decimal string
    #[serde(default)]
    pub bit_rate: Option<String>,
    /// Hz, as a decimal string
    #[serde(default)]
    pub sample_rate: Option<String>,
    #[serde(default)]
    pub channels: Option<u32>,
    #[serde(default)]
    pub channel_layout: Option<String>,
}

impl StreamInfo {
    pub fn is_type(&self, codec_type: &str) -> bool {
        self.codec_type.as_deref() == Some(codec_type)
    }

    /// Width and height, when both are known and non-zero.
    pub fn resolution(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }

    /// Average frame rate rounded to two decimals.
    ///
    /// A zero denominator yields `0.0`; `"0/0"` or garbage yields `None`.
    pub fn framerate(&self) -> Option<f64> {
        let raw = self.avg_frame_rate.as_deref()?.trim();
        if raw == "0/0" {
            return None;
        }
        parse_frame_rate(raw)
    }

    /// Bitrate in kilobits per second, rounded half to even.
    pub fn bitrate_kbps(&self) -> Option<u64> {
        let bits = self.bit_rate.as_deref()?.trim().parse::<u64>().ok()?;
        Some((bits as f64 / 1000.0).round_ties_even() as u64)
    }

    pub fn sample_rate(&self) -> Option<&str> {
        self.sample_rate.as_deref().filter(|s| !s.is_empty())
    }

    pub fn channels(&self) -> Option<u32> {
        self.channels.filter(|c| *c > 0)
    }

    pub fn codec_long_name(&self) -> Option<&str> {
        self.codec_long_name.as_deref().filter(|s| !s.is_empty())
    }
}

/// Parse `"num/den"` into a rounded frame rate.
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let (num, den) = raw.split_once('/')?;
    let num: i64 = num.trim().parse().ok()?;
    let den: i64 = den.trim().parse().ok()?;
    if den == 0 {
        return Some(0.0);
    }
    Some(round2(num as f64 / den as f64))
}

/// Parsed output of a successful probe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    #[serde(default)]
    pub format: Option<FormatSection>,
    #[serde(default)]
    pub streams: Vec<StreamInfo>,
}

impl ProbeResult {
    /// First stream of the given type in document order.
    pub fn first_stream(&self, codec_type: &str) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.is_type(codec_type))
    }

    pub fn video_stream(&self) -> Option<&StreamInfo> {
        self.first_stream("video")
    }

    pub fn audio_stream(&self) -> Option<&StreamInfo> {
        self.first_stream("audio")
    }
}

/// Result of running the probe tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Found(ProbeResult),
    /// Tool missing, failed, or produced unusable output
    Unavailable,
}

impl ProbeOutcome {
    pub fn found(&self) -> Option<&ProbeResult> {
        match self {
            ProbeOutcome::Found(result) => Some(result),
            ProbeOutcome::Unavailable => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ProbeOutcome::Found(_))
    }
}
