#![warn(missing_docs)]

//! Intermediate activations of a pretrained VGG19 network, selected by layer name.
//!
//! Every layer of the VGG19 `features` stack gets a name (`conv3_2`, `relu4_1`, `pool2`, ...).
//! A [FeatureExtractor] is built for a fixed set of those names, normalizes its input with
//! ImageNet statistics, and runs the network only as deep as the deepest requested layer.
//! This is the usual building block for perceptual and style losses.
//!
//! ```ignore
//! use vgg_features::{FeatureExtractorConfig, WeightSource};
//!
//! let extractor = FeatureExtractorConfig::new(vec!["relu1_1".into(), "pool3".into()])
//!     .init_with_weights::<Backend>(&WeightSource::ImageNet, &device)?;
//! let features = extractor.forward(images);
//! let shallow = features.get("relu1_1");
//! ```

mod activations;
mod catalog;
mod error;
mod extractor;
mod layer;
mod normalize;
mod vgg;
mod weights;

pub use activations::*;
pub use catalog::*;
pub use error::*;
pub use extractor::*;
pub use layer::*;
pub use normalize::*;
pub use vgg::*;
pub use weights::{IMAGENET1K_V1, WeightSource, Weights};

/// Backend for test cases
#[cfg(test)]
pub(crate) type TestBackend = burn::backend::NdArray<f32>;
