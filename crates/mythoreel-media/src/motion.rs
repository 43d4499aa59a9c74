//! Motion effects for still-image segments.
//!
//! Each effect maps deterministically to a `zoompan` filter given the
//! image dimensions and segment duration. Effect selection is a
//! weighted draw biased towards the subtler effects.

use serde::{Deserialize, Serialize};

/// Available motion effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionEffect {
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
    ZoomInPan,
    ZoomOutPan,
    SubtleZoom,
}

/// How a segment's image should move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionSetting {
    /// Hold the image static.
    #[default]
    Static,
    /// Draw a weighted-random effect per segment.
    Random,
    /// Apply one fixed effect to every segment.
    Fixed(MotionEffect),
}

impl MotionSetting {
    /// Resolve to a concrete effect, if any.
    pub fn pick(self) -> Option<MotionEffect> {
        match self {
            MotionSetting::Static => None,
            MotionSetting::Random => Some(random_effect()),
            MotionSetting::Fixed(effect) => Some(effect),
        }
    }
}

/// Selection weights; subtler effects are drawn more often.
const EFFECT_WEIGHTS: &[(MotionEffect, u32)] = &[
    (MotionEffect::ZoomIn, 20),
    (MotionEffect::ZoomOut, 20),
    (MotionEffect::PanLeft, 15),
    (MotionEffect::PanRight, 15),
    (MotionEffect::PanUp, 10),
    (MotionEffect::PanDown, 10),
    (MotionEffect::SubtleZoom, 25),
    (MotionEffect::ZoomInPan, 5),
    (MotionEffect::ZoomOutPan, 5),
];

/// Draw a random motion effect from the fixed weight table.
pub fn random_effect() -> MotionEffect {
    use rand::prelude::IndexedRandom;

    let mut rng = rand::rng();
    EFFECT_WEIGHTS
        .choose_weighted(&mut rng, |(_, weight)| *weight)
        .map(|(effect, _)| *effect)
        .unwrap_or(MotionEffect::SubtleZoom)
}

/// FFmpeg filter string for an effect over a `width`x`height` frame
/// held for `duration` seconds at 30 fps.
pub fn motion_filter(effect: MotionEffect, duration: f64, width: u32, height: u32) -> String {
    let frames = (duration * 30.0) as u32;
    let size = format!("{width}x{height}");

    match effect {
        MotionEffect::ZoomIn => format!(
            "scale={w2}:{h2},zoompan=z='min(zoom+0.0015,1.5)':d={frames}:\
             x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':s={size}",
            w2 = 2 * width,
            h2 = 2 * height,
        ),
        MotionEffect::ZoomOut => format!(
            "scale={w2}:{h2},zoompan=z='max(zoom-0.0015,1.0)':d={frames}:\
             x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':s={size}",
            w2 = 2 * width,
            h2 = 2 * height,
        ),
        MotionEffect::PanLeft => format!(
            "scale={w}:{h},zoompan=z=1:d={frames}:\
             x='iw-ow-(t/{duration})*(iw-ow)':y='ih/2-(ih/zoom/2)':s={size}",
            w = width * 6 / 5,
            h = height * 6 / 5,
        ),
        MotionEffect::PanRight => format!(
            "scale={w}:{h},zoompan=z=1:d={frames}:\
             x='(t/{duration})*(iw-ow)':y='ih/2-(ih/zoom/2)':s={size}",
            w = width * 6 / 5,
            h = height * 6 / 5,
        ),
        MotionEffect::PanUp => format!(
            "scale={w}:{h},zoompan=z=1:d={frames}:\
             x='iw/2-(iw/zoom/2)':y='ih-oh-(t/{duration})*(ih-oh)':s={size}",
            w = width * 6 / 5,
            h = height * 6 / 5,
        ),
        MotionEffect::PanDown => format!(
            "scale={w}:{h},zoompan=z=1:d={frames}:\
             x='iw/2-(iw/zoom/2)':y='(t/{duration})*(ih-oh)':s={size}",
            w = width * 6 / 5,
            h = height * 6 / 5,
        ),
        MotionEffect::ZoomInPan => format!(
            "scale={w2}:{h2},zoompan=z='min(zoom+0.001,1.3)':d={frames}:\
             x='(t/{duration})*(iw-ow)/2':y='ih/2-(ih/zoom/2)':s={size}",
            w2 = 2 * width,
            h2 = 2 * height,
        ),
        MotionEffect::ZoomOutPan => format!(
            "scale={w}:{h},zoompan=z='max(zoom-0.001,1.0)':d={frames}:\
             x='iw-ow-(t/{duration})*(iw-ow)/2':y='ih/2-(ih/zoom/2)':s={size}",
            w = width * 3 / 2,
            h = height * 3 / 2,
        ),
        MotionEffect::SubtleZoom => format!(
            "scale={w}:{h},zoompan=z='1+0.05*sin(2*PI*t/{duration})':d={frames}:\
             x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':s={size}",
            w = width * 11 / 10,
            h = height * 11 / 10,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_is_deterministic_per_effect() {
        let a = motion_filter(MotionEffect::ZoomIn, 3.0, 720, 1280);
        let b = motion_filter(MotionEffect::ZoomIn, 3.0, 720, 1280);
        assert_eq!(a, b);
        assert!(a.contains("zoompan"));
        assert!(a.contains("s=720x1280"));
    }

    #[test]
    fn test_frame_count_scales_with_duration() {
        let filter = motion_filter(MotionEffect::SubtleZoom, 2.0, 720, 1280);
        assert!(filter.contains("d=60"));
    }

    #[test]
    fn test_every_effect_targets_output_size() {
        for (effect, _) in EFFECT_WEIGHTS {
            let filter = motion_filter(*effect, 1.5, 1080, 1920);
            assert!(filter.ends_with("s=1080x1920"), "bad filter: {filter}");
        }
    }

    #[test]
    fn test_random_effect_draws_from_table() {
        for _ in 0..50 {
            let effect = random_effect();
            assert!(EFFECT_WEIGHTS.iter().any(|(e, _)| *e == effect));
        }
    }

    #[test]
    fn test_static_setting_picks_nothing() {
        assert_eq!(MotionSetting::Static.pick(), None);
        assert_eq!(
            MotionSetting::Fixed(MotionEffect::PanLeft).pick(),
            Some(MotionEffect::PanLeft)
        );
    }
}
