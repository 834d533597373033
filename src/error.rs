//! Error type for scene and texture loading

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    #[error("failed to decode image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode image {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image has zero width or height")]
    EmptyImage,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scene parse error: {0}")]
    SceneParse(#[from] ron::error::SpannedError),

    #[error("scene serialize error: {0}")]
    SceneSerialize(#[from] ron::Error),
}

pub type Result<T> = std::result::Result<T, RasterError>;
