use flexbuf::BuilderOptions;

/// Options shared by both conversion directions.
#[derive(Debug, Clone, Default)]
pub struct BridgeOptions {
    /// Prefix every object key with its 1-based position, zero padded to
    /// this many digits. FlexBuffer maps are sorted by key, so the prefix is
    /// what keeps document order; decoding strips it again.
    pub index_key_prefix: Option<usize>,
    /// Double every backslash in strings and keys. The reader's JSON rendering
    /// leaves backslashes alone, so text rendered from such a buffer is
    /// valid JSON again.
    pub escape_backslashes: bool,
    /// Layout options for the underlying builder.
    pub builder: BuilderOptions,
}

impl BridgeOptions {
    pub fn with_index_key_prefix(mut self, digits: usize) -> Self {
        self.index_key_prefix = Some(digits);
        self
    }

    pub fn with_escape_backslashes(mut self, escape: bool) -> Self {
        self.escape_backslashes = escape;
        self
    }

    pub fn with_builder_options(mut self, builder: BuilderOptions) -> Self {
        self.builder = builder;
        self
    }
}
