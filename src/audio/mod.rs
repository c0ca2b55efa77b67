//! Audio decoding, resampling and encoding
//!
//! Everything between an uploaded file and the tensor handed to a
//! model, and back out to a WAV on disk.

pub mod decode;
pub mod encode;
pub mod resample;
mod wave;

pub use decode::decode_file;
pub use encode::write_wav;
pub use resample::to_rate;
pub use wave::Waveform;
