//! Pretrained weights for the VGG19 feature stack.
//!
//! Checkpoints are torchvision state dicts. Only the `features.*` tensors are used; the
//! classifier head is reported as unused and dropped.

use std::path::{Path, PathBuf};

use burn::tensor::backend::Backend;
use burn_store::{ModuleSnapshot, PytorchStore};

use crate::error::ExtractorError;
use crate::vgg::Vgg19Features;

/// A torchvision checkpoint hosted online.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weights {
    /// Download URL.
    pub url: &'static str,
    /// File name in the local cache.
    pub file_name: &'static str,
}

/// torchvision `VGG19_Weights.IMAGENET1K_V1`.
pub const IMAGENET1K_V1: Weights = Weights {
    url: "https://download.pytorch.org/models/vgg19-dcbb9e9d.pth",
    file_name: "vgg19-dcbb9e9d.pth",
};

/// Where pretrained weights come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightSource {
    /// ImageNet weights, downloaded once into the user cache directory.
    #[cfg(feature = "pretrained")]
    ImageNet,
    /// A torchvision VGG19 state dict on disk.
    File(PathBuf),
}

impl WeightSource {
    /// Local path of the checkpoint, downloading it first if needed.
    pub fn resolve(&self) -> Result<PathBuf, ExtractorError> {
        match self {
            #[cfg(feature = "pretrained")]
            Self::ImageNet => downloader::download(&IMAGENET1K_V1),
            Self::File(path) => Ok(path.clone()),
        }
    }
}

/// Tensors moved from a checkpoint into a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportReport {
    /// Module paths that received a tensor.
    pub applied: Vec<String>,
    /// Checkpoint keys no module path asked for.
    pub unused: Vec<String>,
}

/// Applies a torchvision checkpoint to the feature stack.
///
/// Fails if any convolution parameter is absent from the checkpoint or has the wrong shape.
pub(crate) fn load_features<B: Backend>(
    mut features: Vgg19Features<B>,
    path: &Path,
) -> Result<Vgg19Features<B>, ExtractorError> {
    let report = load_torchvision::<B, _>(&mut features, path)?;

    log::info!(
        "Loaded {} tensors from {} ({} unused)",
        report.applied.len(),
        path.display(),
        report.unused.len()
    );

    Ok(features)
}

/// Applies a torchvision `features.<index>.*` state dict to any module whose layers sit in
/// a `layers: Vec<VggLayer<B>>` field.
pub(crate) fn load_torchvision<B, M>(module: &mut M, path: &Path) -> Result<ImportReport, ExtractorError>
where
    B: Backend,
    M: ModuleSnapshot<B>,
{
    if !path.exists() {
        return Err(ExtractorError::Weights(format!(
            "weights not found: {}",
            path.display()
        )));
    }

    let mut store = PytorchStore::from_file(path)
        .with_key_remapping(r"^features\.(\d+)\.(.*)$", "layers.$1.$2")
        .skip_enum_variants(true)
        .allow_partial(false);

    let result = module
        .load_from(&mut store)
        .map_err(|err| ExtractorError::Weights(err.to_string()))?;

    if !result.errors.is_empty() {
        return Err(ExtractorError::Weights(format!(
            "could not apply {}: {:?}",
            path.display(),
            result.errors
        )));
    }
    if !result.missing.is_empty() {
        return Err(ExtractorError::Weights(format!(
            "{} has no tensors for {:?}",
            path.display(),
            result.missing
        )));
    }

    Ok(ImportReport {
        applied: result.applied,
        unused: result.unused,
    })
}

#[cfg(feature = "pretrained")]
mod downloader {
    use super::*;
    use burn::data::network::downloader;
    use std::fs::{self, File, create_dir_all};
    use std::io::Write;

    /// Download the checkpoint to the cache directory, unless it is already there.
    ///
    /// The file is written under a `.part` name and renamed once complete, so an
    /// interrupted download never leaves a truncated checkpoint at the final path.
    pub(super) fn download(weights: &Weights) -> Result<PathBuf, ExtractorError> {
        let model_dir = dirs::cache_dir()
            .ok_or_else(|| ExtractorError::Download("could not get cache directory".into()))?
            .join("vgg-features");

        if !model_dir.exists() {
            create_dir_all(&model_dir)?;
        }

        let file_path = model_dir.join(weights.file_name);
        if !file_path.exists() {
            log::info!("Downloading {} to {}", weights.url, file_path.display());
            let bytes = downloader::download_file_as_bytes(weights.url, weights.file_name);
            write_atomically(&file_path, &bytes)?;
        }

        Ok(file_path)
    }

    /// Writes `bytes` next to `path` and moves the result into place.
    pub(super) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ExtractorError> {
        let mut partial = path.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        let written = File::create(&partial).and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        });
        if let Err(err) = written {
            let _ = fs::remove_file(&partial);
            return Err(err.into());
        }

        fs::rename(&partial, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestBackend;
    use crate::layer::VggLayer;
    use burn::module::Module;
    use burn::nn::conv::{Conv2d, Conv2dConfig};
    use burn::nn::{PaddingConfig2d, Relu};
    use burn::tensor::TensorData;

    const CHECKPOINT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/checkpoint/vgg_tiny.pt");

    /// A two-convolution slice laid out like [Vgg19Features].
    #[derive(Module, Debug)]
    struct TinyVgg<B: Backend> {
        layers: Vec<VggLayer<B>>,
    }

    impl<B: Backend> TinyVgg<B> {
        fn new(channels: &[usize], device: &B::Device) -> Self {
            let mut layers = Vec::new();
            for pair in channels.windows(2) {
                layers.push(VggLayer::Conv(
                    Conv2dConfig::new([pair[0], pair[1]], [3, 3])
                        .with_padding(PaddingConfig2d::Same)
                        .init(device),
                ));
                layers.push(VggLayer::Relu(Relu::new()));
            }
            Self { layers }
        }

        fn conv(&self, position: usize) -> &Conv2d<B> {
            match &self.layers[position] {
                VggLayer::Conv(conv) => conv,
                other => panic!("layer {position} is not a convolution: {other:?}"),
            }
        }
    }

    fn assert_conv_eq(conv: &Conv2d<TestBackend>, weight: TensorData, bias: TensorData) {
        conv.weight.val().into_data().assert_eq(&weight, true);
        conv.bias
            .as_ref()
            .unwrap()
            .val()
            .into_data()
            .assert_eq(&bias, true);
    }

    #[test]
    fn file_source_resolves_to_itself() {
        let source = WeightSource::File(PathBuf::from("weights/vgg19.pth"));

        assert_eq!(source.resolve().unwrap(), PathBuf::from("weights/vgg19.pth"));
    }

    #[test]
    fn missing_checkpoint_is_an_error() {
        let device = Default::default();
        let features = Vgg19Features::<TestBackend>::new(&device);

        let result = load_features(features, Path::new("does/not/exist/vgg19.pth"));

        assert!(matches!(result, Err(ExtractorError::Weights(msg)) if msg.contains("not found")));
    }

    #[test]
    fn torchvision_keys_land_on_positional_layers() {
        let device = Default::default();
        let mut model = TinyVgg::<TestBackend>::new(&[1, 2, 1], &device);

        let report = load_torchvision::<TestBackend, _>(&mut model, Path::new(CHECKPOINT)).unwrap();

        let mut applied = report.applied.clone();
        applied.sort();
        assert_eq!(
            applied,
            [
                "layers.0.bias",
                "layers.0.weight",
                "layers.2.bias",
                "layers.2.weight"
            ]
        );
        assert_eq!(report.unused, ["classifier.0.weight"]);

        let first: Vec<f32> = (0..18).map(|i| (i as f32 - 9.0) / 16.0).collect();
        let second: Vec<f32> = (0..18).map(|i| (i as f32 + 1.0) / 32.0).collect();
        assert_conv_eq(
            model.conv(0),
            TensorData::new(first, [2, 1, 3, 3]),
            TensorData::from([0.5f32, -0.25]),
        );
        assert_conv_eq(
            model.conv(2),
            TensorData::new(second, [1, 2, 3, 3]),
            TensorData::from([0.125f32]),
        );
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let device = Default::default();
        let mut model = TinyVgg::<TestBackend>::new(&[1, 3, 1], &device);

        let result = load_torchvision::<TestBackend, _>(&mut model, Path::new(CHECKPOINT));

        assert!(matches!(result, Err(ExtractorError::Weights(_))));
    }

    #[test]
    fn layer_absent_from_checkpoint_is_an_error() {
        let device = Default::default();
        let mut model = TinyVgg::<TestBackend>::new(&[1, 2, 1, 1], &device);

        let result = load_torchvision::<TestBackend, _>(&mut model, Path::new(CHECKPOINT));

        assert!(matches!(result, Err(ExtractorError::Weights(_))));
    }

    #[test]
    fn imagenet_checkpoint_name_matches_url() {
        assert!(IMAGENET1K_V1.url.ends_with(IMAGENET1K_V1.file_name));
    }

    #[cfg(feature = "pretrained")]
    #[test]
    fn checkpoint_is_written_in_one_piece() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("vgg19.pth");

        downloader::write_atomically(&path, &[1, 2, 3]).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), [1, 2, 3]);
        assert!(!temp_dir.path().join("vgg19.pth.part").exists());
    }

    #[cfg(feature = "pretrained")]
    #[test]
    fn failed_write_leaves_no_checkpoint() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("missing_dir").join("vgg19.pth");

        let result = downloader::write_atomically(&path, &[1, 2, 3]);

        assert!(matches!(result, Err(ExtractorError::Io(_))));
        assert!(!path.exists());
    }
}
