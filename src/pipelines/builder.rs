// SPDX-License-Identifier: MPL-2.0

//! Pipeline construction from a resolved [`StreamConfig`]
//!
//! ```text
//! video: source ─▶ [hw encoder] ─▶ h264 caps ─▶ h264parse ─┐
//!                                                          ├─▶ flvmux ─▶ queue ─▶ rtmpsink
//! audio: source ─▶ raw caps ─▶ queue ─▶ aac enc ─▶ aacparse ─▶ aac caps ─▶ queue ─┘
//! ```
//!
//! Stage order inside each branch follows the data dependencies and is
//! never changed.

use super::graph::{Branch, ElementDescriptor, PipelineGraph, Stage, StageKind, parse_properties};
use crate::config::StreamConfig;
use crate::constants::elements;

/// Stage names, unique within a graph
pub mod names {
    pub const VIDEO_SOURCE: &str = "video_src";
    pub const VIDEO_ENCODER: &str = "video_enc";
    pub const VIDEO_CAPS: &str = "video_caps";
    pub const VIDEO_PARSER: &str = "video_parse";
    pub const AUDIO_SOURCE: &str = "audio_src";
    pub const AUDIO_RAW_CAPS: &str = "audio_raw_caps";
    pub const AUDIO_QUEUE: &str = "audio_queue";
    pub const AUDIO_ENCODER: &str = "audio_enc";
    pub const AUDIO_PARSER: &str = "audio_parse";
    pub const AUDIO_AAC_CAPS: &str = "audio_aac_caps";
    pub const AUDIO_MUX_QUEUE: &str = "audio_mux_queue";
    pub const MUXER: &str = "mux";
    pub const OUTPUT_QUEUE: &str = "output_queue";
    pub const SINK: &str = "rtmp_sink";
}

/// Build the pipeline graph for a stream configuration
pub fn build(config: &StreamConfig) -> PipelineGraph {
    let mut graph = PipelineGraph::new();

    if config.audio_enabled {
        for stage in audio_branch(config) {
            graph.push(Branch::Audio, stage);
        }
    }
    for stage in video_branch(config) {
        graph.push(Branch::Video, stage);
    }
    for stage in output_chain(config) {
        graph.push(Branch::Output, stage);
    }

    graph
}

fn video_branch(config: &StreamConfig) -> Vec<Stage> {
    let (source, _) = ElementDescriptor::parse(&config.video_source);
    let mut stages = vec![Stage::from_descriptor(
        names::VIDEO_SOURCE,
        StageKind::Source,
        &source,
    )];

    if config.use_hardware_encoder {
        let (params, _) = parse_properties(&config.encoder_params);
        stages.push(
            Stage::factory(names::VIDEO_ENCODER, StageKind::Encoder, &config.h264_encoder)
                .with_params(&params),
        );
    }

    stages.push(
        Stage::caps(names::VIDEO_CAPS, elements::H264_CAPS)
            .with("profile", elements::H264_PROFILE)
            .with("width", config.video_width)
            .with("height", config.video_height)
            .with("framerate", format!("{}/1", config.video_framerate)),
    );

    let (params, _) = parse_properties(&config.parser_params);
    stages.push(
        Stage::factory(names::VIDEO_PARSER, StageKind::Parser, elements::H264_PARSER)
            .with_params(&params),
    );

    stages
}

fn audio_branch(config: &StreamConfig) -> Vec<Stage> {
    let (source, _) = ElementDescriptor::parse(&config.audio_source);
    vec![
        Stage::from_descriptor(names::AUDIO_SOURCE, StageKind::Source, &source),
        Stage::caps(names::AUDIO_RAW_CAPS, elements::RAW_AUDIO_CAPS)
            .with("format", elements::RAW_AUDIO_FORMAT)
            .with("endianness", elements::RAW_AUDIO_ENDIANNESS)
            .with("signed", true)
            .with("width", elements::RAW_AUDIO_DEPTH)
            .with("depth", elements::RAW_AUDIO_DEPTH)
            .with("rate", config.audio_sample_rate),
        Stage::factory(names::AUDIO_QUEUE, StageKind::Filter, elements::QUEUE),
        Stage::factory(names::AUDIO_ENCODER, StageKind::Encoder, elements::AAC_ENCODER)
            .with("bitrate", config.audio_bitrate),
        Stage::factory(names::AUDIO_PARSER, StageKind::Parser, elements::AAC_PARSER),
        Stage::caps(names::AUDIO_AAC_CAPS, elements::AAC_CAPS)
            .with("mpegversion", 4)
            .with("stream-format", "raw"),
        Stage::factory(names::AUDIO_MUX_QUEUE, StageKind::Filter, elements::QUEUE),
    ]
}

fn output_chain(config: &StreamConfig) -> Vec<Stage> {
    let location = format!(
        "{} live=1 flashver={}",
        config.destination(),
        elements::RTMP_FLASH_VERSION
    );

    vec![
        Stage::factory(names::MUXER, StageKind::Muxer, elements::MUXER).with("streamable", true),
        Stage::factory(names::OUTPUT_QUEUE, StageKind::Filter, elements::QUEUE),
        Stage::factory(names::SINK, StageKind::Sink, elements::SINK).with("location", location),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(audio: bool, hw: bool) -> StreamConfig {
        StreamConfig {
            stream_url: "rtmp://example.com/live".into(),
            stream_key: "secret".into(),
            audio_enabled: audio,
            audio_source: "alsasrc device=hw:1".into(),
            audio_bitrate: 128_000,
            audio_sample_rate: 16_000,
            video_source: "v4l2src device=/dev/video0".into(),
            video_width: 1280,
            video_height: 720,
            video_framerate: 30,
            use_hardware_encoder: hw,
            h264_encoder: "omxh264enc".into(),
            encoder_params: "target-bitrate=2000000 control-rate=variable".into(),
            parser_params: "config-interval=1".into(),
        }
    }

    fn names_of(graph: &PipelineGraph, branch: Branch) -> Vec<&str> {
        graph.branch(branch).map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_video_branch_with_encoder() {
        let graph = build(&config(false, true));
        assert_eq!(
            names_of(&graph, Branch::Video),
            vec![
                names::VIDEO_SOURCE,
                names::VIDEO_ENCODER,
                names::VIDEO_CAPS,
                names::VIDEO_PARSER
            ]
        );

        let encoder = graph.stage(names::VIDEO_ENCODER).unwrap();
        assert_eq!(encoder.factory_name(), "omxh264enc");
        assert_eq!(encoder.param("target-bitrate"), Some("2000000"));
        assert_eq!(encoder.param("control-rate"), Some("variable"));

        let caps = graph.stage(names::VIDEO_CAPS).unwrap();
        assert_eq!(caps.param("profile"), Some("high"));
        assert_eq!(caps.param("framerate"), Some("30/1"));

        let parser = graph.stage(names::VIDEO_PARSER).unwrap();
        assert_eq!(parser.param("config-interval"), Some("1"));
    }

    #[test]
    fn test_native_h264_skips_encoder() {
        let graph = build(&config(false, false));
        assert_eq!(
            names_of(&graph, Branch::Video),
            vec![names::VIDEO_SOURCE, names::VIDEO_CAPS, names::VIDEO_PARSER]
        );
        assert_eq!(graph.count_kind(StageKind::Encoder), 0);
    }

    #[test]
    fn test_audio_branch_order() {
        let graph = build(&config(true, true));
        assert_eq!(
            names_of(&graph, Branch::Audio),
            vec![
                names::AUDIO_SOURCE,
                names::AUDIO_RAW_CAPS,
                names::AUDIO_QUEUE,
                names::AUDIO_ENCODER,
                names::AUDIO_PARSER,
                names::AUDIO_AAC_CAPS,
                names::AUDIO_MUX_QUEUE
            ]
        );
        let raw = graph.stage(names::AUDIO_RAW_CAPS).unwrap();
        assert_eq!(raw.param("rate"), Some("16000"));
        assert_eq!(raw.param("format"), Some("S16LE"));
        let enc = graph.stage(names::AUDIO_ENCODER).unwrap();
        assert_eq!(enc.param("bitrate"), Some("128000"));
    }

    #[test]
    fn test_audio_disabled_has_no_audio_stages() {
        let graph = build(&config(false, true));
        assert!(!graph.has_audio());
        assert!(graph.stage(names::AUDIO_SOURCE).is_none());
    }

    #[test]
    fn test_single_muxer_and_sink() {
        for audio in [false, true] {
            for hw in [false, true] {
                let graph = build(&config(audio, hw));
                assert_eq!(graph.count_kind(StageKind::Muxer), 1);
                assert_eq!(graph.count_kind(StageKind::Sink), 1);
                assert!(graph.has_unique_names());
            }
        }
    }

    #[test]
    fn test_branches_converge_on_muxer() {
        let graph = build(&config(true, true));
        let edges = graph.edges();
        assert!(edges.contains(&(names::AUDIO_MUX_QUEUE, names::MUXER)));
        assert!(edges.contains(&(names::VIDEO_PARSER, names::MUXER)));
        assert!(edges.contains(&(names::MUXER, names::OUTPUT_QUEUE)));
        assert!(edges.contains(&(names::OUTPUT_QUEUE, names::SINK)));
    }

    #[test]
    fn test_sink_location() {
        let graph = build(&config(false, false));
        let location = graph.sink().unwrap().param("location").unwrap();
        assert!(location.starts_with("rtmp://example.com/live/secret "));
        assert!(location.contains("live=1"));
        assert!(location.contains("flashver=FME/3.0"));
    }

    #[test]
    fn test_launch_string() {
        let graph = build(&config(true, false));
        let launch = graph.to_launch_string();
        assert!(launch.starts_with("alsasrc name=audio_src device=hw:1 ! "));
        assert!(launch.contains("queue name=audio_mux_queue ! mux. "));
        assert!(launch.contains("h264parse name=video_parse config-interval=1 ! mux. "));
        assert!(launch.contains(
            "capsfilter name=video_caps caps=\"video/x-h264,profile=high,width=1280,height=720,framerate=30/1\""
        ));
        assert!(launch.ends_with(
            "flvmux name=mux streamable=true ! queue name=output_queue ! \
             rtmpsink name=rtmp_sink location=\"rtmp://example.com/live/secret live=1 flashver=FME/3.0%20(compatible;%20FMSc%201.0)\""
        ));
    }

    #[test]
    fn test_user_names_cannot_collide_with_stages() {
        let mut cfg = config(true, true);
        cfg.video_source = "v4l2src name=mux device=/dev/video0".into();
        cfg.encoder_params = "name=rtmp_sink target-bitrate=2000000".into();
        cfg.parser_params = "name=video_src config-interval=1".into();

        let graph = build(&cfg);
        assert!(graph.has_unique_names());
        assert_eq!(graph.stage(names::VIDEO_SOURCE).unwrap().param("name"), None);
        assert_eq!(graph.stage(names::VIDEO_ENCODER).unwrap().param("name"), None);
        assert_eq!(graph.stage(names::VIDEO_PARSER).unwrap().param("name"), None);
        assert_eq!(graph.muxer().unwrap().factory_name(), "flvmux");
        assert_eq!(graph.to_launch_string().matches("name=mux ").count(), 1);
    }

    #[test]
    fn test_build_is_deterministic() {
        let cfg = config(true, true);
        assert_eq!(build(&cfg), build(&cfg));
    }
}
