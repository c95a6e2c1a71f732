//! Builder-style options used when assembling a chain.

use serde::{Deserialize, Serialize};

/// Tunable options for [`ChainReader::open`](crate::ChainReader::open).
///
/// `continuous` removes frames duplicated across segment boundaries so each
/// physical instant appears once; `dt` overrides per-frame times with a
/// constant spacing (`time = frame * dt`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChainOptions {
    #[serde(default)]
    pub continuous: bool,
    #[serde(default)]
    pub dt: Option<f64>,
}

impl ChainOptions {
    /// Start a fluent builder for `ChainOptions`.
    #[must_use]
    pub fn builder() -> ChainOptionsBuilder {
        ChainOptionsBuilder::default()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChainOptionsBuilder {
    inner: ChainOptions,
}

impl ChainOptionsBuilder {
    /// Stitch segments into a continuous trajectory, dropping frames whose
    /// order key is already covered by another segment.
    #[must_use]
    pub fn continuous(mut self, enabled: bool) -> Self {
        self.inner.continuous = enabled;
        self
    }

    /// Ignore per-frame times and report `time = frame * dt` instead.
    #[must_use]
    pub fn dt(mut self, dt: f64) -> Self {
        self.inner.dt = Some(dt);
        self
    }

    #[must_use]
    pub fn build(self) -> ChainOptions {
        self.inner
    }
}
