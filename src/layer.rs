use burn::module::Module;
use burn::nn::Relu;
use burn::nn::conv::Conv2d;
use burn::nn::pool::MaxPool2d;
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

/// The closed set of layer kinds a feature network is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// 2D convolution.
    Convolution,
    /// Element-wise activation following a convolution.
    Activation,
    /// Spatial pooling closing a stage.
    Pooling,
    /// Any other layer. Never named by the catalog.
    Other,
}

/// One layer of the VGG `features` stack.
///
/// Stored as a module enum so that the record paths stay positional
/// (`layers.<index>.weight`), matching the torchvision checkpoint layout.
#[derive(Module, Debug)]
pub enum VggLayer<B: Backend> {
    /// 3x3 convolution with same padding.
    Conv(Conv2d<B>),
    /// Rectified linear unit.
    Relu(Relu),
    /// 2x2 max pooling with stride 2.
    Pool(MaxPool2d),
}

impl<B: Backend> VggLayer<B> {
    /// The kind of this layer.
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Conv(_) => LayerKind::Convolution,
            Self::Relu(_) => LayerKind::Activation,
            Self::Pool(_) => LayerKind::Pooling,
        }
    }

    /// Applies the layer.
    ///
    /// Every call yields a new tensor handle; the input is consumed and never
    /// observed again, so a captured output can't be overwritten by a later layer.
    ///
    /// # Shapes
    ///
    /// - input: `[batch_size, channels_in, height_in, width_in]`
    /// - output: `[batch_size, channels_out, height_out, width_out]`
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Self::Conv(conv) => conv.forward(input),
            Self::Relu(relu) => relu.forward(input),
            Self::Pool(pool) => pool.forward(input),
        }
    }
}
