//! Inspection report rendering.
//!
//! The report is HTML-flavoured text: `<b>` and `<code>` markup around
//! escaped values. Sections appear in a fixed order and are omitted when
//! there is nothing to show.

use mlens_models::{
    format_decimal, format_mmss, format_size, ExifMap, FormatSection, MediaDescriptor,
    ProbeOutcome, StreamInfo,
};

const NOT_AVAILABLE: &str = "N/A";

/// Escape text for interpolation into HTML markup.
pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn code(value: &str) -> String {
    format!("<code>{}</code>", escape_html(value))
}

/// Build the full report for an inspected file.
pub fn build_report(media: &MediaDescriptor, probe: &ProbeOutcome, exif: &ExifMap) -> String {
    let mut lines = vec!["<b>File Information:</b>".to_string()];
    lines.push(format!("<b>  - Name:</b> {}", code(&media.name)));
    lines.push(format!("<b>  - Extension:</b> {}", code(&media.extension)));
    lines.push(format!("<b>  - MIME Type:</b> {}", code(&media.mime_type)));
    lines.push(format!("<b>  - Size:</b> {}", code(&format_size(media.size))));

    if let Some(result) = probe.found() {
        lines.push("\n<b>Technical Details:</b>".to_string());

        if let Some(format) = result.format.as_ref().filter(|f| f.has_details()) {
            push_format_section(&mut lines, format);
        }
        if let Some(video) = result.video_stream() {
            push_video_section(&mut lines, video);
        }
        if let Some(audio) = result.audio_stream() {
            push_audio_section(&mut lines, audio);
        }
    }

    if !exif.is_empty() {
        lines.push("\n<b>EXIF Data (from Image):</b>".to_string());
        for (tag, value) in exif.reportable() {
            lines.push(format!("<b>  - {}:</b> {}", escape_html(tag), code(value)));
        }
    }

    lines.join("\n")
}

fn push_format_section(lines: &mut Vec<String>, format: &FormatSection) {
    lines.push("<b>  Format / Container:</b>".to_string());
    if let Some(duration) = format.duration_secs() {
        lines.push(format!("    - Duration: {}", code(&format_mmss(duration))));
    }
    if let Some(created) = format.creation_time() {
        lines.push(format!("    - Creation Time: {}", code(created)));
    }
    if let Some(encoder) = format.encoder() {
        lines.push(format!("    - Encoder/Software: {}", code(encoder)));
    }
}

fn codec_line(stream: &StreamInfo) -> Option<String> {
    let long_name = stream.codec_long_name()?;
    let name = stream.codec_name.as_deref().unwrap_or(NOT_AVAILABLE);
    Some(format!("    - Codec: {} ({})", code(long_name), code(name)))
}

fn bitrate_line(stream: &StreamInfo) -> Option<String> {
    stream
        .bitrate_kbps()
        .map(|kbps| format!("    - Bitrate: {}", code(&format!("{kbps} kb/s"))))
}

fn push_video_section(lines: &mut Vec<String>, video: &StreamInfo) {
    lines.push("<b>  Media Stream:</b>".to_string());
    if let Some((width, height)) = video.resolution() {
        lines.push(format!("    - Resolution: {}", code(&format!("{width}x{height}"))));
    }
    lines.extend(codec_line(video));
    if let Some(fps) = video.framerate() {
        lines.push(format!(
            "    - Framerate: {}",
            code(&format!("{} FPS", format_decimal(fps)))
        ));
    }
    lines.extend(bitrate_line(video));
}

fn push_audio_section(lines: &mut Vec<String>, audio: &StreamInfo) {
    lines.push("<b>  Audio Stream:</b>".to_string());
    lines.extend(codec_line(audio));
    if let Some(rate) = audio.sample_rate() {
        lines.push(format!("    - Sample Rate: {}", code(&format!("{rate} Hz"))));
    }
    if let Some(channels) = audio.channels() {
        let layout = audio
            .channel_layout
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(NOT_AVAILABLE);
        lines.push(format!(
            "    - Channels: {} ({})",
            code(&channels.to_string()),
            escape_html(layout)
        ));
    }
    lines.extend(bitrate_line(audio));
}
