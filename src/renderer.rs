//! Saliency map synthesis
//!
//! Smooths a fixation splat with a Gaussian whose horizontal spread widens
//! towards the poles, compensating for equirectangular stretching.
//!
//! The image is processed one row at a time, in place and top to bottom.
//! Row `i` is produced by a separable filter made of that row's horizontal
//! kernel and a vertical kernel shared by all rows. The vertical taps read
//! the neighbouring rows of the working image, so rows above `i` have
//! already been smoothed when `i` is computed. Borders reflect without
//! repeating the edge pixel (`gfedcb|abcdefgh|gfedcba`).

use image::GrayImage;

/// Smoothed fixation map for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct SaliencyMap {
    image: GrayImage,
}

impl SaliencyMap {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.image.get_pixel(x, y)[0]
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }
}

/// Renders saliency maps from fixation splats
#[derive(Debug, Clone, Copy)]
pub struct SaliencyRenderer {
    sigma_in_degs: f64,
}

impl SaliencyRenderer {
    pub fn new(sigma_in_degs: f64) -> Self {
        Self { sigma_in_degs }
    }

    /// Vertical sigma in pixels for an image `width` pixels wide (360°)
    pub fn sigma_y(&self, width: u32) -> f64 {
        self.sigma_in_degs * (width as f64 / 360.0)
    }

    /// Horizontal sigma for row `row` of `rows`
    pub fn sigma_x(sigma_y: f64, row: u32, rows: u32) -> f64 {
        let angle = (((row + 1) as f64 / rows as f64) - 0.5).abs() * std::f64::consts::PI;
        sigma_y / angle.cos()
    }

    pub fn render(&self, splat: &GrayImage) -> SaliencyMap {
        let (width, height) = splat.dimensions();
        let mut image = splat.clone();
        if width == 0 || height == 0 {
            return SaliencyMap { image };
        }

        let sigma_y = self.sigma_y(width);
        let ksize = kernel_size(sigma_y);
        let kernel_y = gaussian_kernel(ksize, sigma_y);
        let half = (ksize / 2) as i64;

        let w = width as usize;
        let mut column_sums = vec![0.0f64; w];
        let mut row_out = vec![0u8; w];

        for row in 0..height {
            let kernel_x = gaussian_kernel(ksize, Self::sigma_x(sigma_y, row, height));

            // Vertical pass over the current state of the neighbouring rows
            column_sums.iter_mut().for_each(|s| *s = 0.0);
            {
                let buf = image.as_raw();
                for (tap, weight) in kernel_y.iter().enumerate() {
                    let src_row = reflect_101(row as i64 + tap as i64 - half, height as i64);
                    let offset = src_row * w;
                    for (sum, &px) in column_sums.iter_mut().zip(&buf[offset..offset + w]) {
                        *sum += weight * px as f64;
                    }
                }
            }

            // Horizontal pass with this row's kernel
            for (x, out) in row_out.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (tap, weight) in kernel_x.iter().enumerate() {
                    let src = reflect_101(x as i64 + tap as i64 - half, w as i64);
                    acc += weight * column_sums[src];
                }
                *out = acc.round_ties_even().clamp(0.0, 255.0) as u8;
            }

            let start = row as usize * w;
            image.as_mut()[start..start + w].copy_from_slice(&row_out);
        }

        SaliencyMap { image }
    }
}

/// Smallest odd integer not below `3 * sigma`
pub fn kernel_size(sigma: f64) -> usize {
    let size = (3.0 * sigma).ceil().max(1.0) as usize;
    if size % 2 == 0 {
        size + 1
    } else {
        size
    }
}

/// Normalized 1-D Gaussian of `ksize` taps centred on the middle tap
///
/// A non-positive or non-finite sigma falls back to
/// `0.3 * ((ksize - 1) / 2 - 1) + 0.8`.
pub fn gaussian_kernel(ksize: usize, sigma: f64) -> Vec<f64> {
    let sigma = if sigma > 0.0 && sigma.is_finite() {
        sigma
    } else {
        0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let center = (ksize as f64 - 1.0) / 2.0;
    let scale = -0.5 / (sigma * sigma);

    let mut kernel: Vec<f64> = (0..ksize)
        .map(|i| {
            let x = i as f64 - center;
            (scale * x * x).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

/// Reflect an out-of-range index back into `[0, len)` without repeating the edge
fn reflect_101(mut idx: i64, len: i64) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    idx = idx.rem_euclid(period);
    if idx >= len {
        idx = period - idx;
    }
    idx as usize
}
