use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModemError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Playback made no progress after {0:.1}s")]
    PlaybackStalled(f32),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ModemError>;
