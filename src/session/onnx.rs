//! ONNX Runtime-backed removal session.
//!
//! Works with single-input salient-object models (U^2-Net, ISNet and friends):
//! the image is letterboxed to a fixed square tensor, the predicted matte is
//! stretched to full range, resized back to the source dimensions, and applied
//! as the alpha channel.
use std::path::Path;
use std::sync::Mutex;

use image::{imageops, DynamicImage, GrayImage, Luma, RgbaImage};
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;

use super::RemovalSession;
use crate::error::{AppError, AppResult};

pub struct OnnxSession {
    // The runtime's thread-safety is not assumed; inference is serialized.
    session: Mutex<Session>,
    input_size: u32,
}

impl OnnxSession {
    pub fn load<P: AsRef<Path>>(model_path: P, input_size: u32) -> AppResult<Self> {
        let path = model_path.as_ref();
        tracing::info!("Loading segmentation model from {}", path.display());
        let session = (|| {
            Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .with_intra_threads(4)?
                .commit_from_file(path)
        })()
        .map_err(|e| {
            AppError::Inference(format!("failed to load model {}: {}", path.display(), e))
        })?;
        tracing::info!("Segmentation model loaded");
        Ok(OnnxSession {
            session: Mutex::new(session),
            input_size,
        })
    }

    /// Resize to the model's square input and normalize to an NCHW tensor
    /// with ImageNet mean/std.
    fn preprocess(&self, image: &DynamicImage) -> Array4<f32> {
        let side = self.input_size;
        let resized = image
            .resize_exact(side, side, imageops::FilterType::Lanczos3)
            .to_rgb8();
        let mean = [0.485, 0.456, 0.406];
        let std = [0.229, 0.224, 0.225];
        let mut tensor = Array4::<f32>::zeros((1, 3, side as usize, side as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] =
                    (f32::from(pixel[c]) / 255.0 - mean[c]) / std[c];
            }
        }
        tensor
    }

    /// Run the model and return the flattened matte at input resolution.
    fn run(&self, input: Array4<f32>) -> AppResult<Vec<f32>> {
        let side = self.input_size as usize;
        let tensor = Tensor::from_array(([1usize, 3, side, side], input.into_raw_vec_and_offset().0))
            .map_err(|e| AppError::Inference(format!("failed to build input tensor: {}", e)))?;
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| AppError::Inference(format!("inference failed: {}", e)))?;
        let (_, matte) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| AppError::Inference(format!("unexpected model output: {}", e)))?;
        if matte.len() != side * side {
            return Err(AppError::Inference(format!(
                "unexpected matte size {} for {}x{} input",
                matte.len(),
                side,
                side
            )));
        }
        Ok(matte.to_vec())
    }
}

impl RemovalSession for OnnxSession {
    fn remove(&self, image: &DynamicImage) -> AppResult<RgbaImage> {
        let (width, height) = (image.width(), image.height());
        let matte = self.run(self.preprocess(image))?;

        // Matte values are not guaranteed to span [0, 1]; stretch them so the
        // background actually reaches full transparency.
        let lo = matte.iter().copied().fold(f32::MAX, f32::min);
        let hi = matte.iter().copied().fold(f32::MIN, f32::max);
        let range = (hi - lo).max(f32::EPSILON);

        let side = self.input_size;
        let matte_img = GrayImage::from_fn(side, side, |x, y| {
            let v = (matte[(y * side + x) as usize] - lo) / range;
            Luma([(v * 255.0).clamp(0.0, 255.0) as u8])
        });
        let alpha = imageops::resize(&matte_img, width, height, imageops::FilterType::Lanczos3);

        let mut out = image.to_rgba8();
        for (pixel, a) in out.pixels_mut().zip(alpha.pixels()) {
            pixel[3] = a[0];
        }
        Ok(out)
    }
}
