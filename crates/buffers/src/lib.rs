//! flexbuf-buffers - byte buffer utilities for the FlexBuffer encoder.

mod writer;

pub use writer::Writer;
