// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants
//!
//! Defaults for every stream setting live here so the resolver and the
//! builder never carry magic values of their own.

/// Environment variable names read by the configuration resolver
pub mod env {
    pub const STREAM_URL: &str = "AV_STREAM_URL";
    pub const STREAM_KEY: &str = "AV_STREAM_KEY";
    pub const DISABLE_AUDIO: &str = "AV_DISABLE_AUDIO";
    pub const AUDIO_SAMPLE_RATE: &str = "AV_AUDIO_SAMPLING_RATE";
    pub const AUDIO_SOURCE: &str = "AV_AUDIO_SRC";
    pub const AUDIO_BITRATE: &str = "AV_AUDIO_BITRATE";
    pub const VIDEO_SOURCE: &str = "AV_VIDEO_SOURCE";
    pub const VIDEO_WIDTH: &str = "AV_VIDEO_WIDTH";
    pub const VIDEO_HEIGHT: &str = "AV_VIDEO_HEIGHT";
    pub const VIDEO_FRAMERATE: &str = "AV_VIDEO_FRAMERATE";
    pub const H264_ENCODER: &str = "AV_H264_ENCODER";
    pub const H264_ENCODER_PARAMS: &str = "AV_H264_ENCODER_PARAMS";
    pub const H264_PARSER_PARAMS: &str = "AV_H264_PARSER_PARAMS";

    /// Every variable the resolver understands, in documentation order
    pub const ALL: [&str; 13] = [
        STREAM_URL,
        STREAM_KEY,
        DISABLE_AUDIO,
        AUDIO_SAMPLE_RATE,
        AUDIO_SOURCE,
        AUDIO_BITRATE,
        VIDEO_SOURCE,
        VIDEO_WIDTH,
        VIDEO_HEIGHT,
        VIDEO_FRAMERATE,
        H264_ENCODER,
        H264_ENCODER_PARAMS,
        H264_PARSER_PARAMS,
    ];
}

/// Device probe locations
pub mod devices {
    /// Generic V4L2 capture node checked at startup
    pub const DEFAULT_V4L2_DEVICE: &str = "/dev/video0";
    /// ALSA device registry
    pub const ASOUND_DEVICES: &str = "/proc/asound/devices";
    /// Format enumeration command used when the V4L2 ioctl path fails
    pub const V4L2_CTL: &str = "v4l2-ctl";
    /// FourCC advertised by webcams with on-board H.264 compression
    pub const H264_FOURCC: &str = "H264";
    /// Marker in the ALSA registry for capture-capable devices
    pub const CAPTURE_MARKER: &str = "capture";
}

/// Stream defaults applied when neither the environment nor the device
/// profile supplies a value
pub mod defaults {
    pub const STREAM_URL: &str = "rtmp://localhost/live";
    pub const STREAM_KEY: &str = "";
    pub const AUDIO_SOURCE: &str = "alsasrc device=hw:1";
    /// AAC bitrate in bits per second
    pub const AUDIO_BITRATE: u32 = 128_000;
    /// Sample rate used with generic V4L2 webcams
    pub const AUDIO_SAMPLE_RATE: u32 = 16_000;
    /// Sample rate assumed for ALSA capture next to a camera module
    pub const NATIVE_AUDIO_SAMPLE_RATE: u32 = 44_100;
    pub const V4L2_VIDEO_SOURCE: &str = "v4l2src";
    pub const NATIVE_VIDEO_SOURCE: &str = "rpicamsrc keyframe-interval=2 hflip=true vflip=true";
    pub const VIDEO_WIDTH: u32 = 1280;
    pub const VIDEO_HEIGHT: u32 = 720;
    pub const VIDEO_FRAMERATE: u32 = 30;
    pub const H264_ENCODER: &str = "omxh264enc";
}

/// GStreamer element factories and caps used by the pipeline builder
pub mod elements {
    pub const H264_PROFILE: &str = "high";
    pub const H264_CAPS: &str = "video/x-h264";
    pub const H264_PARSER: &str = "h264parse";
    pub const RAW_AUDIO_CAPS: &str = "audio/x-raw";
    pub const RAW_AUDIO_FORMAT: &str = "S16LE";
    pub const RAW_AUDIO_ENDIANNESS: &str = "1234";
    pub const RAW_AUDIO_DEPTH: &str = "16";
    pub const AAC_ENCODER: &str = "voaacenc";
    pub const AAC_PARSER: &str = "aacparse";
    pub const AAC_CAPS: &str = "audio/mpeg";
    pub const QUEUE: &str = "queue";
    pub const MUXER: &str = "flvmux";
    pub const SINK: &str = "rtmpsink";
    /// librtmp handshake options appended to the sink location
    pub const RTMP_FLASH_VERSION: &str = "FME/3.0%20(compatible;%20FMSc%201.0)";

    /// Hardware H.264 encoders known to work with `video/x-h264` caps,
    /// in preference order
    pub const HARDWARE_H264_ENCODERS: [&str; 4] =
        ["omxh264enc", "v4l2h264enc", "vaapih264enc", "nvh264enc"];
}

/// Process exit codes
pub mod exit {
    pub const SUCCESS: u8 = 0;
    pub const CONFIG: u8 = 2;
    pub const GRAPH_CONSTRUCTION: u8 = 3;
    pub const RUNTIME: u8 = 4;
    pub const SUPERVISION: u8 = 5;
    pub const INTERRUPTED: u8 = 130;
}

/// Timing used by the GStreamer runtime
pub mod timing {
    /// Upper bound when waiting for the pipeline to settle in `Null`
    pub const NULL_STATE_TIMEOUT_SECS: u64 = 2;
    /// How long to look for the bus error behind a refused PLAYING transition
    pub const PLAY_ERROR_TIMEOUT_MS: u64 = 100;
}

/// Bus message structure name posted by the signal handler
pub const INTERRUPT_MESSAGE: &str = "camstream-interrupt";

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
