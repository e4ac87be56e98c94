//! Builder configuration.

/// Options controlling how a [`Builder`](crate::Builder) lays out data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderOptions {
    /// Reuse earlier copies of identical string values.
    pub share_strings: bool,
    /// Reuse earlier copies of identical map keys.
    pub share_keys: bool,
    /// Reuse the key vector of an earlier map with the same keys.
    /// Only effective together with `share_keys`.
    pub share_key_vectors: bool,
    /// Emit homogeneous vectors as typed (and fixed typed) vectors.
    pub typed_vectors: bool,
    /// Initial size of the output buffer in bytes.
    pub initial_capacity: usize,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            share_strings: true,
            share_keys: true,
            share_key_vectors: true,
            typed_vectors: true,
            initial_capacity: 1024,
        }
    }
}

impl BuilderOptions {
    /// Defaults with every form of sharing turned off.
    pub fn unshared() -> Self {
        Self {
            share_strings: false,
            share_keys: false,
            share_key_vectors: false,
            ..Self::default()
        }
    }

    pub fn with_share_strings(mut self, on: bool) -> Self {
        self.share_strings = on;
        self
    }

    pub fn with_share_keys(mut self, on: bool) -> Self {
        self.share_keys = on;
        self
    }

    pub fn with_share_key_vectors(mut self, on: bool) -> Self {
        self.share_key_vectors = on;
        self
    }

    pub fn with_typed_vectors(mut self, on: bool) -> Self {
        self.typed_vectors = on;
        self
    }

    pub fn with_initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }
}
