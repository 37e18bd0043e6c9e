/// Error type for [FeatureExtractor](crate::FeatureExtractor) construction.
#[derive(thiserror::Error, Debug)]
pub enum ExtractorError {
    /// A requested layer name is not part of the layer catalog.
    #[error("unknown layer `{name}`, expected one of: {}", available.join(", "))]
    UnknownLayer {
        /// The requested name.
        name: String,
        /// Every name the catalog assigns.
        available: Vec<String>,
    },

    /// The pretrained weight cache could not be set up.
    ///
    /// Only raised when no user cache directory exists; a failed network fetch panics
    /// inside burn's downloader instead.
    #[error("download error: {0}")]
    Download(String),

    /// The weight file could not be read or applied to the network.
    #[error("weights error: {0}")]
    Weights(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
