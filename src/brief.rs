//! Brief data model: raw briefs, expanded frames, asset briefs and their results.
//!
//! Every mapping here keeps insertion order, since frame numbering and result
//! ordering both follow the order the input was given in.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::constants::FRAME_PREFIX;

/// Element labels mapped to their descriptions, in the order given.
pub type Elements = IndexMap<String, String>;

/// Builds the identifier for the `n`th frame (1-based).
pub fn frame_id(n: usize) -> String {
    format!("{FRAME_PREFIX}_{n}")
}

/// Returns true when a top-level key names a frame that should be rendered.
pub fn is_frame_key(key: &str) -> bool {
    key.starts_with(FRAME_PREFIX)
}

/// Caller input before elaboration: label to short description.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Brief(Elements);

impl Brief {
    /// An empty brief.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an entry, keeping its original position if replaced.
    pub fn insert(&mut self, label: impl Into<String>, description: impl Into<String>) {
        self.0.insert(label.into(), description.into());
    }

    /// Entries in the order they were given.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the brief has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Brief {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Expander output: `frame_<n>` to a single `{label: expanded description}`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ExpandedFrames(IndexMap<String, Elements>);

impl ExpandedFrames {
    /// Appends a frame holding one element, numbered after the existing frames.
    pub(crate) fn push(&mut self, label: String, description: String) -> String {
        let id = frame_id(self.0.len() + 1);
        let mut elements = Elements::with_capacity(1);
        elements.insert(label, description);
        self.0.insert(id.clone(), elements);
        id
    }

    /// Looks up a frame by identifier.
    pub fn get(&self, frame: &str) -> Option<&Elements> {
        self.0.get(frame)
    }

    /// Frames in numbering order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Elements)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Frame identifiers in numbering order.
    pub fn frame_ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing was expanded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One top-level value in an [`AssetBrief`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum BriefEntry {
    /// A frame's labelled element descriptions
    Elements(Elements),
    /// Anything else, such as an `explanation` string. Kept, never rendered.
    Other(serde_json::Value),
}

/// Pipeline input: frame identifier to `{element label: description}`.
///
/// Keys that don't start with `frame` ride along untouched.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AssetBrief(IndexMap<String, BriefEntry>);

impl AssetBrief {
    /// An empty asset brief.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a top-level entry.
    pub fn insert(&mut self, key: impl Into<String>, entry: BriefEntry) {
        self.0.insert(key.into(), entry);
    }

    /// Looks up a top-level entry.
    pub fn get(&self, key: &str) -> Option<&BriefEntry> {
        self.0.get(key)
    }

    /// All top-level entries, frames or not, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BriefEntry)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Only the frames eligible for rendering, in order.
    ///
    /// Non-frame keys and frame keys that don't hold labelled elements are
    /// logged and passed over.
    pub fn frames(&self) -> impl Iterator<Item = (&str, &Elements)> {
        self.iter().filter_map(|(key, entry)| match entry {
            _ if !is_frame_key(key) => {
                debug!("Skipping non-frame key '{}'", key);
                None
            }
            BriefEntry::Elements(elements) => Some((key, elements)),
            BriefEntry::Other(_) => {
                warn!("Skipping '{}', it doesn't hold labelled elements", key);
                None
            }
        })
    }
}

impl From<ExpandedFrames> for AssetBrief {
    fn from(frames: ExpandedFrames) -> Self {
        Self(
            frames
                .0
                .into_iter()
                .map(|(id, elements)| (id, BriefEntry::Elements(elements)))
                .collect(),
        )
    }
}

impl FromIterator<(String, BriefEntry)> for AssetBrief {
    fn from_iter<I: IntoIterator<Item = (String, BriefEntry)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A generated image that was downloaded and saved.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GeneratedAsset {
    /// Element label the image was generated for
    pub label: String,
    /// Where the provider said the image lives
    pub source: Url,
    /// Where we saved it
    pub saved_path: PathBuf,
}

/// Pipeline output: frame identifier to the assets saved for it, in element order.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AssetResult(IndexMap<String, Vec<GeneratedAsset>>);

impl AssetResult {
    /// Registers a frame (so it shows up even if nothing gets saved) and returns its list.
    pub(crate) fn frame_mut(&mut self, frame: &str) -> &mut Vec<GeneratedAsset> {
        self.0.entry(frame.to_string()).or_default()
    }

    /// Assets saved for a frame.
    pub fn get(&self, frame: &str) -> Option<&[GeneratedAsset]> {
        self.0.get(frame).map(Vec::as_slice)
    }

    /// Frames and their assets, in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[GeneratedAsset])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of frames processed.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no frames were processed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of saved assets across all frames.
    pub fn asset_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}
