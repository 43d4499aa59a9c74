//! Scale/pad layout math for fitting frames into the target canvas.

/// How a source frame is scaled and padded into the target canvas.
///
/// Scales to fill the target width; if the scaled height overflows,
/// scales to fit the height instead. The remainder is centered with
/// black padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitLayout {
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub target_width: u32,
    pub target_height: u32,
}

impl FitLayout {
    /// Compute the layout for a `src_width`x`src_height` frame.
    pub fn compute(src_width: u32, src_height: u32, target_width: u32, target_height: u32) -> Self {
        let scale = target_width as f64 / src_width as f64;
        let scaled_height = (src_height as f64 * scale) as u32;

        if scaled_height > target_height {
            let scale = target_height as f64 / src_height as f64;
            let scaled_width = (src_width as f64 * scale) as u32;
            Self {
                scaled_width,
                scaled_height: target_height,
                pad_x: (target_width - scaled_width) / 2,
                pad_y: 0,
                target_width,
                target_height,
            }
        } else {
            Self {
                scaled_width: target_width,
                scaled_height,
                pad_x: 0,
                pad_y: (target_height - scaled_height) / 2,
                target_width,
                target_height,
            }
        }
    }

    /// FFmpeg `scale`/`pad` filter string for this layout.
    pub fn to_filter(self) -> String {
        format!(
            "scale={}:{},pad={}:{}:{}:{}:color=black",
            self.scaled_width,
            self.scaled_height,
            self.target_width,
            self.target_height,
            self.pad_x,
            self.pad_y
        )
    }
}

/// Fit filter that needs no probed source dimensions; lets FFmpeg
/// compute the scale and centers the result with black padding.
pub fn fit_filter(target_width: u32, target_height: u32) -> String {
    format!(
        "scale={tw}:{th}:force_original_aspect_ratio=decrease,\
         pad={tw}:{th}:(ow-iw)/2:(oh-ih)/2:color=black",
        tw = target_width,
        th = target_height
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portrait_source_fits_height() {
        // 1024x1536 into 720x1280: width-fit would give 1080 high, too tall
        let layout = FitLayout::compute(1024, 1536, 720, 1280);
        assert_eq!(layout.scaled_height, 1280);
        assert_eq!(layout.scaled_width, 853);
        assert_eq!(layout.pad_y, 0);
        assert!(layout.pad_x > 0);
    }

    #[test]
    fn test_landscape_source_fits_width() {
        let layout = FitLayout::compute(1920, 1080, 720, 1280);
        assert_eq!(layout.scaled_width, 720);
        assert_eq!(layout.scaled_height, 405);
        assert_eq!(layout.pad_x, 0);
        assert_eq!(layout.pad_y, (1280 - 405) / 2);
    }

    #[test]
    fn test_exact_fit_has_no_padding() {
        let layout = FitLayout::compute(720, 1280, 720, 1280);
        assert_eq!(layout.pad_x, 0);
        assert_eq!(layout.pad_y, 0);
        assert_eq!(layout.scaled_width, 720);
        assert_eq!(layout.scaled_height, 1280);
    }

    #[test]
    fn test_filter_string_shape() {
        let filter = FitLayout::compute(1920, 1080, 720, 1280).to_filter();
        assert_eq!(filter, "scale=720:405,pad=720:1280:0:437:color=black");
    }

    #[test]
    fn test_generic_fit_filter() {
        let filter = fit_filter(720, 1280);
        assert!(filter.contains("force_original_aspect_ratio=decrease"));
        assert!(filter.contains("pad=720:1280"));
    }
}
