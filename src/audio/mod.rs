pub mod capture;
pub mod playback;
pub mod source;

pub use capture::AudioCapture;
pub use playback::{AudioSink, DeviceSink, WavFileSink};
pub use source::{AudioSource, DeviceSource, WavFileSource};
