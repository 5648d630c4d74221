use ndarray::{s, Array2, ArrayView2};

use crate::shared::frame::GrayFrame;
use crate::shared::region::Region;
use crate::tracking::domain::face_localizer::{FaceLocalizer, Localization, LocalizerFactory};

pub const DEFAULT_SEARCH_RADIUS: i32 = 16;
pub const DEFAULT_SEARCH_STEP: i32 = 2;
pub const DEFAULT_LEARNING_RATE: f32 = 0.1;

/// Template-matching face localizer.
///
/// Each update scans a window around the previous position with normalized
/// cross-correlation and moves to the peak. Quality is the peak-to-sidelobe
/// ratio of the response map: a sharp, isolated peak scores high, a flat or
/// ambiguous response scores near zero. The template slowly adapts to the
/// matched patch to follow gradual appearance changes.
pub struct CorrelationLocalizer {
    template: Array2<f32>,
    region: Region,
    search_radius: i32,
    step: i32,
    learning_rate: f32,
}

impl CorrelationLocalizer {
    pub fn new(
        frame: &GrayFrame,
        region: Region,
        search_radius: i32,
        step: i32,
        learning_rate: f32,
    ) -> Self {
        let (template, region) = match region.clamp_to(frame.width(), frame.height()) {
            Some(r) => (patch(frame.as_ndarray(), &r).mapv(f32::from), r),
            None => (Array2::zeros((0, 0)), region),
        };
        Self {
            template,
            region,
            search_radius: search_radius.max(0),
            step: step.max(1),
            learning_rate: learning_rate.clamp(0.0, 1.0),
        }
    }

    fn lost(&self) -> Localization {
        Localization {
            region: self.region,
            quality: 0.0,
        }
    }

    fn adapt_template(&mut self, frame: ArrayView2<'_, u8>) {
        let current = patch(frame, &self.region);
        let lr = self.learning_rate;
        self.template
            .zip_mut_with(&current, |t, &p| *t = (1.0 - lr) * *t + lr * f32::from(p));
    }
}

impl FaceLocalizer for CorrelationLocalizer {
    fn update(&mut self, frame: &GrayFrame) -> Result<Localization, Box<dyn std::error::Error>> {
        if self.template.is_empty() {
            return Ok(self.lost());
        }

        let view = frame.as_ndarray();
        let centered = CenteredTemplate::new(&self.template);

        let mut responses: Vec<(i32, i32, f32)> = Vec::new();
        for dy in (-self.search_radius..=self.search_radius).step_by(self.step as usize) {
            for dx in (-self.search_radius..=self.search_radius).step_by(self.step as usize) {
                let candidate = self.region.translated(dx, dy);
                if !candidate.fits_within(frame.width(), frame.height()) {
                    continue;
                }
                responses.push((dx, dy, centered.ncc(patch(view, &candidate))));
            }
        }

        let Some(&(peak_dx, peak_dy, peak)) = responses
            .iter()
            .max_by(|a, b| a.2.total_cmp(&b.2))
        else {
            return Ok(self.lost());
        };

        let sidelobe: Vec<f32> = responses
            .iter()
            .filter(|(dx, dy, _)| {
                (dx - peak_dx).abs() > self.step || (dy - peak_dy).abs() > self.step
            })
            .map(|&(_, _, r)| r)
            .collect();

        self.region = self.region.translated(peak_dx, peak_dy);
        let quality = peak_to_sidelobe(peak, &sidelobe);
        self.adapt_template(view);

        Ok(Localization {
            region: self.region,
            quality,
        })
    }
}

/// Starts a [`CorrelationLocalizer`] for each new track.
pub struct CorrelationLocalizerFactory {
    pub search_radius: i32,
    pub step: i32,
    pub learning_rate: f32,
}

impl Default for CorrelationLocalizerFactory {
    fn default() -> Self {
        Self {
            search_radius: DEFAULT_SEARCH_RADIUS,
            step: DEFAULT_SEARCH_STEP,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

impl LocalizerFactory for CorrelationLocalizerFactory {
    fn start(&self, frame: &GrayFrame, region: Region) -> Box<dyn FaceLocalizer> {
        Box::new(CorrelationLocalizer::new(
            frame,
            region,
            self.search_radius,
            self.step,
            self.learning_rate,
        ))
    }
}

/// Template with its mean removed, plus its L2 norm.
struct CenteredTemplate {
    values: Array2<f32>,
    norm: f32,
}

impl CenteredTemplate {
    fn new(template: &Array2<f32>) -> Self {
        let mean = template.mean().unwrap_or(0.0);
        let values = template.mapv(|v| v - mean);
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        Self { values, norm }
    }

    /// Normalized cross-correlation in [-1, 1]; 0 for textureless input.
    fn ncc(&self, candidate: ArrayView2<'_, u8>) -> f32 {
        let n = candidate.len() as f32;
        if n == 0.0 {
            return 0.0;
        }
        let mean = candidate.iter().map(|&v| f32::from(v)).sum::<f32>() / n;

        let mut dot = 0.0f32;
        let mut energy = 0.0f32;
        for (&t, &p) in self.values.iter().zip(candidate.iter()) {
            let c = f32::from(p) - mean;
            dot += t * c;
            energy += c * c;
        }

        let denom = self.norm * energy.sqrt();
        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }
}

fn patch<'a>(frame: ArrayView2<'a, u8>, region: &Region) -> ArrayView2<'a, u8> {
    frame.slice_move(s![
        region.y as usize..region.bottom() as usize,
        region.x as usize..region.right() as usize
    ])
}

fn peak_to_sidelobe(peak: f32, sidelobe: &[f32]) -> f64 {
    if sidelobe.len() < 2 {
        return 0.0;
    }
    let n = sidelobe.len() as f64;
    let mean = sidelobe.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = sidelobe
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let std = var.sqrt();
    if std <= 1e-9 {
        return 0.0;
    }
    ((peak as f64 - mean) / std).max(0.0)
}
