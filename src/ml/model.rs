use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::CrossEntropyLossConfig,
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        PaddingConfig2d, Relu,
    },
    prelude::*,
};

/// Hyperparameters of the fixed OCR architecture:
///
/// ```text
/// [N,1,34,56] → conv 4×4 (20) → relu → maxpool 2×2
///             → conv 5×5 (40) → relu → maxpool 3×3 → dropout
///             → flatten (840) → dense 150 → relu → dropout
///             → dense num_classes (logits)
/// ```
// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct OcrCnnConfig {
    pub num_classes: usize,
    #[config(default = 34)]
    pub img_rows:    usize,
    #[config(default = 56)]
    pub img_cols:    usize,
    #[config(default = 20)]
    pub filters1:    usize,
    #[config(default = 40)]
    pub filters2:    usize,
    #[config(default = 4)]
    pub kernel1:     usize,
    #[config(default = 5)]
    pub kernel2:     usize,
    #[config(default = 2)]
    pub pool1:       usize,
    #[config(default = 3)]
    pub pool2:       usize,
    #[config(default = 150)]
    pub dense_units: usize,
    #[config(default = 0.15)]
    pub dropout:     f64,
}

impl OcrCnnConfig {
    /// (rows, cols) of the feature map entering the flatten step.
    /// Valid convolution gives `n - k + 1`, pooling with stride = pool gives `n / p`.
    pub fn feature_map(&self) -> (usize, usize) {
        let side = |n: usize| {
            let n = (n + 1).saturating_sub(self.kernel1) / self.pool1;
            (n + 1).saturating_sub(self.kernel2) / self.pool2
        };
        (side(self.img_rows), side(self.img_cols))
    }

    pub fn flattened_size(&self) -> usize {
        let (rows, cols) = self.feature_map();
        self.filters2 * rows * cols
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> OcrCnn<B> {
        let conv1 = Conv2dConfig::new([1, self.filters1], [self.kernel1, self.kernel1])
            .with_padding(PaddingConfig2d::Valid)
            .init(device);
        let conv2 = Conv2dConfig::new([self.filters1, self.filters2], [self.kernel2, self.kernel2])
            .with_padding(PaddingConfig2d::Valid)
            .init(device);
        let pool1 = MaxPool2dConfig::new([self.pool1, self.pool1])
            .with_strides([self.pool1, self.pool1])
            .init();
        let pool2 = MaxPool2dConfig::new([self.pool2, self.pool2])
            .with_strides([self.pool2, self.pool2])
            .init();
        let fc1    = LinearConfig::new(self.flattened_size(), self.dense_units).init(device);
        let output = LinearConfig::new(self.dense_units, self.num_classes).init(device);

        OcrCnn {
            conv1, pool1, conv2, pool2, fc1, output,
            dropout:    DropoutConfig::new(self.dropout).init(),
            activation: Relu::new(),
        }
    }
}

#[derive(Module, Debug)]
pub struct OcrCnn<B: Backend> {
    pub conv1:      Conv2d<B>,
    pub pool1:      MaxPool2d,
    pub conv2:      Conv2d<B>,
    pub pool2:      MaxPool2d,
    pub fc1:        Linear<B>,
    pub output:     Linear<B>,
    pub dropout:    Dropout,
    pub activation: Relu,
}

impl<B: Backend> OcrCnn<B> {
    /// images: [batch, 1, rows, cols] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.conv1.forward(images));
        let x = self.pool1.forward(x);
        let x = self.activation.forward(self.conv2.forward(x));
        let x = self.pool2.forward(x);
        let x = self.dropout.forward(x);

        let [batch, channels, rows, cols] = x.dims();
        let x = x.reshape([batch, channels * rows * cols]);

        let x = self.activation.forward(self.fc1.forward(x));
        let x = self.dropout.forward(x);
        self.output.forward(x)
    }

    /// Categorical cross-entropy on the logits (softmax is folded into the loss).
    pub fn forward_loss(
        &self,
        images:  Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(images);
        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets);
        (loss, logits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use crate::data::preprocessor::{IMG_COLS, IMG_ROWS};

    type TestBackend = NdArray;

    #[test]
    fn test_flattened_size_for_default_resolution() {
        let cfg = OcrCnnConfig::new(10);
        // 34×56 → conv4 31×53 → pool2 15×26 → conv5 11×22 → pool3 3×7
        assert_eq!(cfg.feature_map(), (3, 7));
        assert_eq!(cfg.flattened_size(), 40 * 3 * 7);
    }

    #[test]
    fn test_forward_output_shape() {
        let device = Default::default();
        let model: OcrCnn<TestBackend> = OcrCnnConfig::new(5).init(&device);
        let images = Tensor::<TestBackend, 4>::zeros([3, 1, IMG_ROWS, IMG_COLS], &device);
        assert_eq!(model.forward(images).dims(), [3, 5]);
    }

    #[test]
    fn test_loss_is_finite_scalar() {
        let device = Default::default();
        let model: OcrCnn<TestBackend> = OcrCnnConfig::new(3).init(&device);
        let images  = Tensor::<TestBackend, 4>::ones([2, 1, IMG_ROWS, IMG_COLS], &device);
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0, 2], &device);
        let (loss, logits) = model.forward_loss(images, targets);
        let loss: f64 = loss.into_scalar().elem::<f64>();
        assert!(loss.is_finite() && loss > 0.0);
        assert_eq!(logits.dims(), [2, 3]);
    }
}
