//! Bilinear resampling over interleaved float pixels.
//!
//! Sampling follows the classic TensorFlow `ResizeBilinear` kernel with
//! `align_corners = false` and `half_pixel_centers = false`: output index `o`
//! reads source position `o * in / out`, and the right/bottom neighbour is
//! clamped to the last row or column.

/// Source neighbours and blend weight for one output coordinate.
#[derive(Debug, Clone, Copy)]
struct Sample {
    lower: usize,
    upper: usize,
    lerp: f32,
}

fn sample_positions(in_len: usize, out_len: usize) -> Vec<Sample> {
    let scale = in_len as f32 / out_len as f32;
    (0..out_len)
        .map(|o| {
            let src = o as f32 * scale;
            let lower = (src.floor() as usize).min(in_len - 1);
            let upper = (lower + 1).min(in_len - 1);
            Sample {
                lower,
                upper,
                lerp: src - lower as f32,
            }
        })
        .collect()
}

/// Resize an HWC float buffer with bilinear interpolation.
///
/// `src` must hold `width * height * channels` values. Returns
/// `out_width * out_height * channels` values in the same layout. Aspect ratio
/// is not preserved.
pub fn resize_bilinear(
    src: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    out_width: usize,
    out_height: usize,
) -> Vec<f32> {
    debug_assert_eq!(src.len(), width * height * channels);

    let mut out = vec![0.0f32; out_width * out_height * channels];
    if width == 0 || height == 0 || out_width == 0 || out_height == 0 {
        return out;
    }

    let xs = sample_positions(width, out_width);
    let ys = sample_positions(height, out_height);
    let row_stride = width * channels;

    for (oy, y) in ys.iter().enumerate() {
        let top_row = &src[y.lower * row_stride..(y.lower + 1) * row_stride];
        let bottom_row = &src[y.upper * row_stride..(y.upper + 1) * row_stride];
        let out_row = &mut out[oy * out_width * channels..(oy + 1) * out_width * channels];

        for (ox, x) in xs.iter().enumerate() {
            for c in 0..channels {
                let top_left = top_row[x.lower * channels + c];
                let top_right = top_row[x.upper * channels + c];
                let bottom_left = bottom_row[x.lower * channels + c];
                let bottom_right = bottom_row[x.upper * channels + c];

                let top = top_left + (top_right - top_left) * x.lerp;
                let bottom = bottom_left + (bottom_right - bottom_left) * x.lerp;
                out_row[ox * channels + c] = top + (bottom - top) * y.lerp;
            }
        }
    }

    out
}
