use std::collections::{BTreeSet, HashMap};

use burn::config::Config;
use burn::module::{Content, DisplaySettings, Ignored, Module, ModuleDisplay};
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

use crate::activations::ActivationMap;
use crate::catalog::LayerCatalog;
use crate::error::ExtractorError;
use crate::normalize::{NormalizationConfig, Normalizer};
use crate::vgg::Vgg19Features;
use crate::weights::{WeightSource, load_features};

/// Configuration to create a [feature extractor](FeatureExtractor).
///
/// # Example
///
/// ```ignore
/// use vgg_features::{FeatureExtractorConfig, WeightSource};
///
/// let extractor = FeatureExtractorConfig::new(vec!["relu1_1".into(), "relu3_1".into()])
///     .init_with_weights::<Backend>(&WeightSource::ImageNet, &device)?;
///
/// let images: Tensor<Backend, 4> = /* [batch, 3, H, W], values in [0, 1] */;
/// let features = extractor.forward(images);
/// ```
#[derive(Config, Debug)]
pub struct FeatureExtractorConfig {
    /// Names of the layers to capture, e.g. `relu1_1` or `pool3`.
    /// Duplicates are ignored.
    pub layers: Vec<String>,
    /// Input normalization applied before the first layer.
    #[config(default = "NormalizationConfig::new()")]
    pub normalization: NormalizationConfig,
}

impl FeatureExtractorConfig {
    /// Initialize a new [feature extractor](FeatureExtractor) with randomly initialized
    /// weights.
    ///
    /// # Errors
    ///
    /// [UnknownLayer](ExtractorError::UnknownLayer) if a requested name is not in the
    /// layer catalog.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<FeatureExtractor<B>, ExtractorError> {
        let features = Vgg19Features::new(device);
        let (catalog, requested) = self.resolve_layers(&features)?;

        Ok(self.assemble(features, catalog, requested, device))
    }

    /// Initialize a new [feature extractor](FeatureExtractor) with pretrained weights.
    ///
    /// Requested layers are validated before any weights are fetched.
    pub fn init_with_weights<B: Backend>(
        &self,
        source: &WeightSource,
        device: &B::Device,
    ) -> Result<FeatureExtractor<B>, ExtractorError> {
        let features = Vgg19Features::new(device);
        let (catalog, requested) = self.resolve_layers(&features)?;
        let features = load_features(features, &source.resolve()?)?;

        Ok(self.assemble(features, catalog, requested, device))
    }

    fn resolve_layers<B: Backend>(
        &self,
        features: &Vgg19Features<B>,
    ) -> Result<(LayerCatalog, BTreeSet<String>), ExtractorError> {
        let catalog = LayerCatalog::build(features.kinds());

        if let Some(name) = self.layers.iter().find(|name| !catalog.contains(name)) {
            return Err(ExtractorError::UnknownLayer {
                name: name.clone(),
                available: catalog.names().map(ToString::to_string).collect(),
            });
        }

        let requested: BTreeSet<String> = self.layers.iter().cloned().collect();
        if requested.is_empty() {
            log::warn!("No layers requested, forward will return no activations");
        }

        Ok((catalog, requested))
    }

    fn assemble<B: Backend>(
        &self,
        features: Vgg19Features<B>,
        catalog: LayerCatalog,
        requested: BTreeSet<String>,
        device: &B::Device,
    ) -> FeatureExtractor<B> {
        log::info!(
            "Feature extractor over {} layers, capturing {:?}",
            catalog.len(),
            requested
        );

        FeatureExtractor {
            features: features.no_grad(),
            normalizer: self.normalization.init(device),
            catalog: Ignored(catalog),
            requested: Ignored(requested),
        }
    }
}

/// Runs a frozen VGG19 feature stack and returns the activations of a fixed set of layers.
///
/// Evaluation stops at the deepest requested layer; later layers are never run.
///
/// The extractor holds no per-call state. To run forward passes from several threads, give
/// each thread its own [clone](Clone::clone): clones share the parameter tensors, which are
/// only ever read. The extractor is `Send` but not `Sync`, so one instance can't be shared
/// by reference across threads.
///
/// ```ignore
/// std::thread::scope(|scope| {
///     for batch in batches {
///         let extractor = extractor.clone();
///         scope.spawn(move || extractor.forward(batch));
///     }
/// });
/// ```
///
/// Should be created with [FeatureExtractorConfig](FeatureExtractorConfig).
#[derive(Module, Debug)]
#[module(custom_display)]
pub struct FeatureExtractor<B: Backend> {
    features: Vgg19Features<B>,
    normalizer: Normalizer<B>,
    catalog: Ignored<LayerCatalog>,
    requested: Ignored<BTreeSet<String>>,
}

impl<B: Backend> ModuleDisplay for FeatureExtractor<B> {
    fn custom_settings(&self) -> Option<DisplaySettings> {
        DisplaySettings::new()
            .with_new_line_after_attribute(false)
            .optional()
    }

    fn custom_content(&self, content: Content) -> Option<Content> {
        content
            .add("layers", &format!("{:?}", self.requested().collect::<Vec<_>>()))
            .add("catalog_len", &self.catalog.len().to_string())
            .optional()
    }
}

impl<B: Backend> FeatureExtractor<B> {
    /// Captures the requested activations for a batch of images.
    ///
    /// # Arguments
    ///
    /// * `input` - RGB images with values in `[0, 1]`.
    ///
    /// # Shapes
    ///
    /// - input: `[batch_size, 3, height, width]`
    /// - output: one `[batch_size, channels, height_out, width_out]` tensor per requested
    ///   layer, spatial size reduced by 2 for every pooling layer before it.
    pub fn forward(&self, input: Tensor<B, 4>) -> ActivationMap<B> {
        let wanted = self.requested.len();
        let mut activations = HashMap::with_capacity(wanted);
        let mut evaluated = 0;

        if wanted == 0 {
            return ActivationMap::new(activations, evaluated);
        }

        let mut x = self.normalizer.forward(input);

        for (layer, name) in self.features.layers().iter().zip(self.catalog.entries()) {
            x = layer.forward(x);
            evaluated += 1;

            if let Some(name) = name
                && self.requested.contains(name)
            {
                activations.insert(name.clone(), x.clone());
            }

            if activations.len() == wanted {
                break;
            }
        }

        log::debug!(
            "Captured {} activations after {} of {} layers",
            activations.len(),
            evaluated,
            self.catalog.len()
        );

        ActivationMap::new(activations, evaluated)
    }

    /// Names of every layer of the network.
    pub fn catalog(&self) -> &LayerCatalog {
        &self.catalog
    }

    /// Requested layer names, deduplicated, in evaluation order.
    pub fn requested(&self) -> impl Iterator<Item = &str> {
        self.catalog
            .names()
            .filter(|name| self.requested.contains(*name))
    }
}
