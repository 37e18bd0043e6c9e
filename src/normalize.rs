use burn::config::Config;
use burn::module::Module;
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

/// ImageNet per-channel mean of RGB pixels in `[0, 1]`.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet per-channel standard deviation of RGB pixels in `[0, 1]`.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Configuration to create a [Normalizer](Normalizer) using the [init function](NormalizationConfig::init).
#[derive(Config, Debug)]
pub struct NormalizationConfig {
    /// Per-channel mean subtracted from the input.
    #[config(default = "IMAGENET_MEAN")]
    pub mean: [f32; 3],
    /// Per-channel standard deviation the centered input is divided by.
    #[config(default = "IMAGENET_STD")]
    pub std: [f32; 3],
}

impl NormalizationConfig {
    /// Initialize a new [normalizer](Normalizer) on the given device.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Normalizer<B> {
        let channel_vector = |values: [f32; 3]| {
            Tensor::<B, 1>::from_floats(values, device).reshape([1, 3, 1, 1])
        };

        Normalizer {
            mean: channel_vector(self.mean),
            std: channel_vector(self.std),
        }
    }
}

/// Whitens RGB images channel by channel: `(x - mean) / std`.
///
/// Both vectors are constants of shape `[1, 3, 1, 1]`, never trained.
#[derive(Module, Debug)]
pub struct Normalizer<B: Backend> {
    mean: Tensor<B, 4>,
    std: Tensor<B, 4>,
}

impl<B: Backend> Normalizer<B> {
    /// Normalizes a batch of images.
    ///
    /// # Shapes
    ///
    /// - input: `[batch_size, 3, height, width]`
    /// - output: `[batch_size, 3, height, width]`
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let shape = input.dims();

        input
            .sub(self.mean.clone().expand(shape))
            .div(self.std.clone().expand(shape))
    }
}
