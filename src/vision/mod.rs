pub mod preprocess;

pub use preprocess::{preprocess, ImageTensor, PreprocessError, CHANNELS, INPUT_SIZE};
