use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriftmapError {
    #[error("Geolocation permission denied")]
    GeolocationDenied,

    #[error("No map center available yet")]
    NoCenter,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Controller channel closed")]
    ChannelClosed,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
