/// Brightness/contrast filter applied when drawing a raster.
///
/// Both values are signed percentage offsets from 100%: `brightness = 20.0`
/// means `brightness(120%)`, `contrast = -50.0` means `contrast(50%)`.
/// Brightness is applied first, then contrast around mid-gray, matching the
/// CSS filter chain `brightness(..) contrast(..)`.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct ImageAdjustments {
    pub brightness: f32,
    pub contrast: f32,
}

impl ImageAdjustments {
    pub fn new(brightness: f32, contrast: f32) -> Self {
        Self {
            brightness,
            contrast,
        }
    }

    /// True when the filter is the identity.
    pub fn is_identity(&self) -> bool {
        self.brightness == 0.0 && self.contrast == 0.0
    }

    /// Multiplicative brightness factor (1.0 = unchanged, never negative).
    pub fn brightness_factor(&self) -> f32 {
        ((100.0 + self.brightness) / 100.0).max(0.0)
    }

    /// Multiplicative contrast factor (1.0 = unchanged, never negative).
    pub fn contrast_factor(&self) -> f32 {
        ((100.0 + self.contrast) / 100.0).max(0.0)
    }

    /// Apply the filter to one normalized channel value.
    pub fn apply_channel(&self, value: f32) -> f32 {
        let v = value * self.brightness_factor();
        ((v - 0.5) * self.contrast_factor() + 0.5).clamp(0.0, 1.0)
    }

    /// Build a 256-entry lookup table for 8-bit channels.
    pub fn lookup_table(&self) -> [u8; 256] {
        let mut lut = [0u8; 256];
        for (i, slot) in lut.iter_mut().enumerate() {
            let v = self.apply_channel(i as f32 / 255.0);
            *slot = (v * 255.0).round() as u8;
        }
        lut
    }

    /// Apply the filter in place to straight RGBA8 pixels. Alpha is untouched.
    pub fn apply_rgba8(&self, pixels: &mut [u8]) {
        if self.is_identity() {
            return;
        }
        let lut = self.lookup_table();
        for px in pixels.chunks_exact_mut(4) {
            px[0] = lut[px[0] as usize];
            px[1] = lut[px[1] as usize];
            px[2] = lut[px[2] as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_noop() {
        let adj = ImageAdjustments::default();
        let mut px = [10, 128, 250, 7];
        adj.apply_rgba8(&mut px);
        assert_eq!(px, [10, 128, 250, 7]);
        assert_eq!(adj.lookup_table()[200], 200);
    }

    #[test]
    fn test_brightness_scales_channels() {
        let adj = ImageAdjustments::new(100.0, 0.0);
        let mut px = [50, 100, 200, 255];
        adj.apply_rgba8(&mut px);
        assert_eq!(px, [100, 200, 255, 255]);
    }

    #[test]
    fn test_zero_contrast_is_mid_gray() {
        let adj = ImageAdjustments::new(0.0, -100.0);
        assert!((adj.apply_channel(0.0) - 0.5).abs() < 1e-6);
        assert!((adj.apply_channel(1.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_factors_never_negative() {
        let adj = ImageAdjustments::new(-250.0, -300.0);
        assert_eq!(adj.brightness_factor(), 0.0);
        assert_eq!(adj.contrast_factor(), 0.0);
    }
}
