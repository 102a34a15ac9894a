use crate::errors::DetectorError;
use std::path::Path;

/// Ordered class names, indexed by the network's class channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// One label per line; surrounding whitespace and blank lines are ignored.
    pub fn parse(contents: &str) -> Self {
        let labels = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { labels }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectorError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| DetectorError::ResourceUnavailable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let labels = Self::parse(&contents);
        if labels.is_empty() {
            return Err(DetectorError::ResourceUnavailable {
                path: path.display().to_string(),
                reason: "label file contains no labels".to_string(),
            });
        }

        tracing::info!(path = %path.display(), count = labels.len(), "Loaded labels");
        Ok(labels)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}
