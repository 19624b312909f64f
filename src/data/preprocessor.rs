// ============================================================
// Layer 4 — Image Preprocessor
// ============================================================
// Converts between pixels and the tensor convention every
// stage is built for.
//
// Into the network (to_tensor):
//   1. Drop alpha / widen greyscale → 8-bit RGB
//   2. Bilinear resize to 64×64 (aspect ratio is not kept)
//   3. HWC u8 → CHW f32 in [0, 1]  (pixel / 255)
//   4. Add a batch dimension        → [1, 3, 64, 64]
//
// Out of the network (to_image):
//   first image of the batch, each value v becomes
//   clamp(v·255 + 0.5, 0, 255) truncated to u8, i.e. rounded
//   and saturated. The decoder's tanh range [-1, 0) therefore
//   maps to black; that is the convention the published
//   weights were trained and displayed with.
//
// Reference: image crate docs (imageops::resize, FilterType)
//            Burn Book §2 (Tensor creation from data)

use burn::prelude::*;
use image::{imageops::FilterType, DynamicImage, RgbImage};

use crate::domain::error::PipelineError;
use crate::ml::stage::{IMAGE_CHANNELS, IMAGE_SIZE};

pub struct ImagePreprocessor {
    /// Side length of the square network input
    size: u32,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new(IMAGE_SIZE as u32)
    }
}

impl ImagePreprocessor {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Decode-ready image → `[1, 3, size, size]` tensor in [0, 1].
    pub fn to_tensor<B: Backend>(&self, image: &DynamicImage, device: &B::Device) -> Tensor<B, 4> {
        let rgb = image.to_rgb8();
        let rgb = if rgb.dimensions() == (self.size, self.size) {
            rgb
        } else {
            image::imageops::resize(&rgb, self.size, self.size, FilterType::Triangle)
        };

        let side   = self.size as usize;
        let values: Vec<f32> = rgb.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect();
        let data   = TensorData::new(values, [side, side, IMAGE_CHANNELS]);

        Tensor::<B, 3>::from_data(data, device)
            .permute([2, 0, 1])
            .unsqueeze::<4>()
    }

    /// First image of a `[N, 3, H, W]` batch → 8-bit RGB image.
    pub fn to_image<B: Backend>(&self, tensor: Tensor<B, 4>) -> Result<RgbImage, PipelineError> {
        let [batch, channels, height, width] = tensor.dims();
        if batch == 0 || channels != IMAGE_CHANNELS {
            return Err(PipelineError::Image(format!(
                "expected [N≥1, {IMAGE_CHANNELS}, H, W], got {:?}",
                [batch, channels, height, width]
            )));
        }

        let hwc: Tensor<B, 3> = tensor
            .slice([0..1])
            .reshape([channels, height, width])
            .permute([1, 2, 0]);

        let bytes: Vec<u8> = hwc
            .into_data()
            .iter::<f32>()
            .map(|v| (v * 255.0 + 0.5).clamp(0.0, 255.0) as u8)
            .collect();

        RgbImage::from_raw(width as u32, height as u32, bytes)
            .ok_or_else(|| PipelineError::Image(format!("buffer does not fit {width}×{height}")))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn resizes_to_network_input() {
        let pre   = ImagePreprocessor::default();
        let photo = DynamicImage::new_rgb8(200, 120);
        let t = pre.to_tensor::<TestBackend>(&photo, &Default::default());
        assert_eq!(t.dims(), [1, 3, 64, 64]);
    }

    #[test]
    fn scales_pixels_into_unit_range_channel_first() {
        let pre = ImagePreprocessor::new(2);
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(1, 0, Rgb([255, 51, 0]));

        let t = pre.to_tensor::<TestBackend>(&DynamicImage::ImageRgb8(img), &Default::default());
        let v: Vec<f32> = t.into_data().iter().collect();

        // channel planes: R = [0, 1, 0, 0], G = [0, 0.2, 0, 0], B = zeros
        assert_eq!(v[1], 1.0);
        assert!((v[4 + 1] - 0.2).abs() < 1e-6);
        assert_eq!(v[8 + 1], 0.0);
        assert_eq!(v.iter().filter(|x| **x != 0.0).count(), 2);
    }

    #[test]
    fn greyscale_with_alpha_becomes_rgb() {
        let pre = ImagePreprocessor::new(4);
        let img = DynamicImage::new_luma_a8(4, 4);
        assert_eq!(pre.to_tensor::<TestBackend>(&img, &Default::default()).dims(), [1, 3, 4, 4]);
    }

    #[test]
    fn output_rule_rounds_and_saturates() {
        let pre = ImagePreprocessor::new(2);
        let t = Tensor::<TestBackend, 1>::from_floats(
            [-1.0, 0.0, 0.5, 2.0, 0.1, 0.2, 0.3, 0.4, 1.0, 1.0, 1.0, 1.0],
            &Default::default(),
        )
        .reshape([1, 3, 2, 2]);

        let img = pre.to_image(t).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 26, 255]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([0, 51, 255]));
        assert_eq!(img.get_pixel(0, 1), &Rgb([128, 77, 255]));
        assert_eq!(img.get_pixel(1, 1), &Rgb([255, 102, 255]));
    }

    #[test]
    fn pixels_survive_a_round_trip() {
        let pre = ImagePreprocessor::new(3);
        let mut img = RgbImage::new(3, 3);
        for (i, p) in img.pixels_mut().enumerate() {
            *p = Rgb([i as u8 * 20, 255 - i as u8 * 20, 7]);
        }

        let t = pre.to_tensor::<TestBackend>(&DynamicImage::ImageRgb8(img.clone()), &Default::default());
        assert_eq!(pre.to_image(t).unwrap(), img);
    }

    #[test]
    fn rejects_non_rgb_tensor() {
        let pre = ImagePreprocessor::default();
        let t = Tensor::<TestBackend, 4>::zeros([1, 1, 4, 4], &Default::default());
        assert!(matches!(pre.to_image(t), Err(PipelineError::Image(_))));
    }
}
