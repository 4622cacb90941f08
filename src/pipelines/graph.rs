// SPDX-License-Identifier: MPL-2.0

//! Typed pipeline description
//!
//! A [`PipelineGraph`] is an ordered list of [`Stage`]s tagged with the
//! [`Branch`] they belong to. The video and audio branches both end at the
//! muxer, which heads the output chain (muxer, buffer, sink). The graph is
//! only turned into GStreamer launch syntax by [`PipelineGraph::to_launch_string`].

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Role of a stage in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StageKind {
    Source,
    Filter,
    Encoder,
    Parser,
    Muxer,
    Sink,
}

/// Sub-sequence of the graph a stage belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Branch {
    Video,
    Audio,
    /// Muxer and everything downstream of it
    Output,
}

/// What a stage instantiates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StageElement {
    /// A GStreamer element factory, e.g. `h264parse`
    Factory(String),
    /// A caps constraint on a media type, e.g. `video/x-h264`
    Caps(String),
}

/// One named processing step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub name: String,
    pub kind: StageKind,
    pub element: StageElement,
    /// Element properties or caps fields, in declaration order
    pub parameters: Vec<(String, String)>,
}

impl Stage {
    /// Stage backed by an element factory
    pub fn factory(name: &str, kind: StageKind, factory: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            element: StageElement::Factory(factory.to_string()),
            parameters: Vec::new(),
        }
    }

    /// Caps constraint stage
    pub fn caps(name: &str, media_type: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: StageKind::Filter,
            element: StageElement::Caps(media_type.to_string()),
            parameters: Vec::new(),
        }
    }

    /// Stage built from a `factory key=value ...` descriptor
    pub fn from_descriptor(name: &str, kind: StageKind, descriptor: &ElementDescriptor) -> Self {
        Self::factory(name, kind, &descriptor.factory).with_params(&descriptor.properties)
    }

    /// Add one parameter, replacing an earlier value for the same key
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        match self.parameters.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value,
            None => self.parameters.push((key.to_string(), value)),
        }
        self
    }

    /// Add several parameters in order
    pub fn with_params(self, params: &[(String, String)]) -> Self {
        params.iter().fold(self, |stage, (k, v)| stage.with(k, v))
    }

    /// Look up a parameter value
    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Factory name, or `capsfilter` for caps stages
    pub fn factory_name(&self) -> &str {
        match &self.element {
            StageElement::Factory(factory) => factory,
            StageElement::Caps(_) => "capsfilter",
        }
    }

    fn to_launch_fragment(&self) -> String {
        match &self.element {
            StageElement::Factory(factory) => {
                let mut out = format!("{} name={}", factory, self.name);
                for (key, value) in &self.parameters {
                    out.push_str(&format!(" {}={}", key, quote_value(value)));
                }
                out
            }
            StageElement::Caps(media_type) => {
                let mut caps = media_type.clone();
                for (key, value) in &self.parameters {
                    caps.push_str(&format!(",{}={}", key, value));
                }
                format!("capsfilter name={} caps={}", self.name, quote_value(&caps))
            }
        }
    }
}

/// A parsed `factory key=value ...` element descriptor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementDescriptor {
    pub factory: String,
    pub properties: Vec<(String, String)>,
}

impl ElementDescriptor {
    /// Parse a descriptor, returning the tokens that were not `key=value`
    /// pairs (or that tried to set `name`) alongside the result
    pub fn parse(descriptor: &str) -> (Self, Vec<String>) {
        let mut tokens = tokenize(descriptor).into_iter();
        let factory = tokens.next().unwrap_or_default();
        let (properties, dropped) = split_properties(tokens);
        (
            Self {
                factory,
                properties,
            },
            dropped,
        )
    }
}

/// Parse a bare `key=value ...` property list
pub fn parse_properties(params: &str) -> (Vec<(String, String)>, Vec<String>) {
    split_properties(tokenize(params).into_iter())
}

fn split_properties(
    tokens: impl Iterator<Item = String>,
) -> (Vec<(String, String)>, Vec<String>) {
    let mut properties = Vec::new();
    let mut dropped = Vec::new();
    for token in tokens {
        let property = token
            .split_once('=')
            // Stage names are assigned by the builder
            .filter(|(key, _)| !key.is_empty() && *key != "name")
            .map(|(key, value)| (key.to_string(), value.to_string()));
        match property {
            Some(property) => properties.push(property),
            None => dropped.push(token),
        }
    }
    (properties, dropped)
}

/// Split on whitespace, keeping quoted runs together and removing the quotes
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for c in input.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Quote a launch-syntax value unless it is made of plain characters only
fn quote_value(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_.:/+@-".contains(c));
    if plain {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Ordered stage list with branch membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineGraph {
    stages: Vec<(Branch, Stage)>,
}

impl PipelineGraph {
    pub(crate) fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage to a branch
    pub(crate) fn push(&mut self, branch: Branch, stage: Stage) {
        debug_assert!(
            self.stage(&stage.name).is_none(),
            "duplicate stage name {}",
            stage.name
        );
        self.stages.push((branch, stage));
    }

    /// All stages in build order
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().map(|(_, stage)| stage)
    }

    /// Stages of one branch, upstream first
    pub fn branch(&self, branch: Branch) -> impl Iterator<Item = &Stage> {
        self.stages
            .iter()
            .filter(move |(b, _)| *b == branch)
            .map(|(_, stage)| stage)
    }

    /// Whether the graph carries an audio branch
    pub fn has_audio(&self) -> bool {
        self.branch(Branch::Audio).next().is_some()
    }

    /// Find a stage by name
    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages().find(|stage| stage.name == name)
    }

    /// Number of stages of a given kind
    pub fn count_kind(&self, kind: StageKind) -> usize {
        self.stages().filter(|stage| stage.kind == kind).count()
    }

    /// The muxer every branch converges on
    pub fn muxer(&self) -> Option<&Stage> {
        self.stages().find(|stage| stage.kind == StageKind::Muxer)
    }

    /// The network sink
    pub fn sink(&self) -> Option<&Stage> {
        self.stages().find(|stage| stage.kind == StageKind::Sink)
    }

    /// Element factories the graph needs, without duplicates
    pub fn factories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.stages()
            .map(Stage::factory_name)
            .filter(|factory| seen.insert(*factory))
            .collect()
    }

    /// Whether stage names are unique within the graph
    pub fn has_unique_names(&self) -> bool {
        let mut seen = HashSet::new();
        self.stages().all(|stage| seen.insert(stage.name.as_str()))
    }

    /// Directed links between stages, by name
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges = Vec::new();
        let muxer = self.muxer().map(|m| m.name.as_str());

        for branch in [Branch::Audio, Branch::Video] {
            let names: Vec<&str> = self.branch(branch).map(|s| s.name.as_str()).collect();
            edges.extend(names.windows(2).map(|w| (w[0], w[1])));
            if let (Some(last), Some(muxer)) = (names.last(), muxer) {
                edges.push((*last, muxer));
            }
        }

        let output: Vec<&str> = self
            .branch(Branch::Output)
            .map(|s| s.name.as_str())
            .collect();
        edges.extend(output.windows(2).map(|w| (w[0], w[1])));
        edges
    }

    /// Render the graph in `gst-launch` syntax
    pub fn to_launch_string(&self) -> String {
        let muxer = self.muxer().map(|m| m.name.as_str()).unwrap_or_default();
        let chain = |branch: Branch| {
            self.branch(branch)
                .map(Stage::to_launch_fragment)
                .collect::<Vec<_>>()
                .join(" ! ")
        };

        let mut parts = Vec::new();
        for branch in [Branch::Audio, Branch::Video] {
            let fragment = chain(branch);
            if !fragment.is_empty() {
                parts.push(format!("{} ! {}.", fragment, muxer));
            }
        }
        parts.push(chain(Branch::Output));
        parts.join(" ")
    }
}

impl fmt::Display for PipelineGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_launch_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_parsing() {
        let (desc, dropped) =
            ElementDescriptor::parse("rpicamsrc keyframe-interval=2 hflip=true vflip=true");
        assert_eq!(desc.factory, "rpicamsrc");
        assert_eq!(
            desc.properties,
            vec![
                ("keyframe-interval".to_string(), "2".to_string()),
                ("hflip".to_string(), "true".to_string()),
                ("vflip".to_string(), "true".to_string()),
            ]
        );
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_descriptor_quotes_and_stray_tokens() {
        let (desc, dropped) = ElementDescriptor::parse("alsasrc device=\"hw:1,0\" loud");
        assert_eq!(desc.factory, "alsasrc");
        assert_eq!(desc.properties, vec![("device".to_string(), "hw:1,0".to_string())]);
        assert_eq!(dropped, vec!["loud"]);
    }

    #[test]
    fn test_user_name_is_dropped() {
        let (desc, dropped) = ElementDescriptor::parse("v4l2src name=mux device=/dev/video1");
        assert_eq!(
            desc.properties,
            vec![("device".to_string(), "/dev/video1".to_string())]
        );
        assert_eq!(dropped, vec!["name=mux"]);

        let (props, dropped) = parse_properties("name=video_src config-interval=1");
        assert_eq!(props, vec![("config-interval".to_string(), "1".to_string())]);
        assert_eq!(dropped, vec!["name=video_src"]);
    }

    #[test]
    fn test_empty_properties() {
        let (props, dropped) = parse_properties("   ");
        assert!(props.is_empty());
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_with_replaces_existing_key() {
        let stage = Stage::factory("enc", StageKind::Encoder, "omxh264enc")
            .with("target-bitrate", 1000)
            .with("target-bitrate", 2000);
        assert_eq!(stage.parameters.len(), 1);
        assert_eq!(stage.param("target-bitrate"), Some("2000"));
    }

    #[test]
    fn test_quote_value() {
        assert_eq!(quote_value("hw:1"), "hw:1");
        assert_eq!(quote_value("rtmp://host/live/key"), "rtmp://host/live/key");
        assert_eq!(quote_value("a b"), "\"a b\"");
        assert_eq!(quote_value("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote_value(""), "\"\"");
    }

    #[test]
    fn test_launch_string_video_only() {
        let mut graph = PipelineGraph::new();
        graph.push(
            Branch::Video,
            Stage::factory("video_src", StageKind::Source, "v4l2src"),
        );
        graph.push(
            Branch::Video,
            Stage::caps("video_caps", "video/x-h264").with("width", 640),
        );
        graph.push(
            Branch::Output,
            Stage::factory("mux", StageKind::Muxer, "flvmux").with("streamable", true),
        );
        graph.push(
            Branch::Output,
            Stage::factory("sink", StageKind::Sink, "fakesink"),
        );

        assert_eq!(
            graph.to_launch_string(),
            "v4l2src name=video_src ! capsfilter name=video_caps caps=\"video/x-h264,width=640\" ! mux. \
             flvmux name=mux streamable=true ! fakesink name=sink"
        );
        assert_eq!(
            graph.edges(),
            vec![
                ("video_src", "video_caps"),
                ("video_caps", "mux"),
                ("mux", "sink")
            ]
        );
        assert_eq!(graph.factories(), vec!["v4l2src", "capsfilter", "flvmux", "fakesink"]);
        assert!(graph.has_unique_names());
        assert!(!graph.has_audio());
    }
}
