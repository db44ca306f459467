mod source_pipe;
mod spectrum;

pub use source_pipe::{SourcePipe, BUFFER_SIZE};
pub use spectrum::{SpectrumProcessor, SPECTRUM_BINS};
