//! The VGG19 `features` stack.
//!
//! Sixteen 3x3 convolutions in five stages, each convolution followed by a
//! ReLU and each stage closed by a 2x2 max pooling. Layer order and positions match the
//! torchvision `vgg19().features` sequential container, so pretrained checkpoints map
//! one-to-one onto [Vgg19Features::layers].

use burn::module::Module;
use burn::nn::conv::Conv2dConfig;
use burn::nn::pool::MaxPool2dConfig;
use burn::nn::{PaddingConfig2d, Relu};
use burn::tensor::backend::Backend;

use crate::layer::{LayerKind, VggLayer};

/// Output channels of each convolution, `None` marking a pooling layer.
const VGG19_PLAN: [Option<usize>; 21] = [
    // Stage 1: 3 -> 64
    Some(64),
    Some(64),
    None,
    // Stage 2: 64 -> 128
    Some(128),
    Some(128),
    None,
    // Stage 3: 128 -> 256
    Some(256),
    Some(256),
    Some(256),
    Some(256),
    None,
    // Stage 4: 256 -> 512
    Some(512),
    Some(512),
    Some(512),
    Some(512),
    None,
    // Stage 5: 512 -> 512
    Some(512),
    Some(512),
    Some(512),
    Some(512),
    None,
];

/// Number of layers in the VGG19 `features` stack.
pub const VGG19_NUM_LAYERS: usize = 37;

/// Channels of the RGB input.
pub const INPUT_CHANNELS: usize = 3;

/// VGG19 convolutional feature stack, without the classifier head.
#[derive(Module, Debug)]
pub struct Vgg19Features<B: Backend> {
    layers: Vec<VggLayer<B>>,
}

impl<B: Backend> Vgg19Features<B> {
    /// Create a new VGG19 feature stack with randomly initialized weights.
    pub fn new(device: &B::Device) -> Self {
        let conv_config = |in_ch, out_ch| {
            Conv2dConfig::new([in_ch, out_ch], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .with_bias(true)
        };

        let mut layers = Vec::with_capacity(VGG19_NUM_LAYERS);
        let mut channels = INPUT_CHANNELS;

        for entry in VGG19_PLAN {
            match entry {
                Some(out_ch) => {
                    layers.push(VggLayer::Conv(conv_config(channels, out_ch).init(device)));
                    layers.push(VggLayer::Relu(Relu::new()));
                    channels = out_ch;
                }
                None => layers.push(VggLayer::Pool(
                    MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
                )),
            }
        }

        Self { layers }
    }

    /// The layers in evaluation order.
    pub fn layers(&self) -> &[VggLayer<B>] {
        &self.layers
    }

    /// The kind of every layer, in evaluation order.
    pub fn kinds(&self) -> impl Iterator<Item = LayerKind> + '_ {
        self.layers.iter().map(VggLayer::kind)
    }
}
