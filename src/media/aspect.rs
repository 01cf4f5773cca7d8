use strum_macros::{Display, EnumString};

const RATIO_TOLERANCE: f64 = 0.02;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
pub enum AspectRatio {
    #[strum(serialize = "16:9")]
    Landscape,
    #[strum(serialize = "9:16")]
    Portrait,
    #[strum(serialize = "other")]
    Other,
}

impl AspectRatio {
    /// Classifies a frame size. Exact 16:9 / 9:16 after reduction wins,
    /// otherwise sizes within a small tolerance of either target are accepted.
    pub fn classify(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return AspectRatio::Other;
        }

        let divisor = gcd(width, height);
        match (width / divisor, height / divisor) {
            (16, 9) => return AspectRatio::Landscape,
            (9, 16) => return AspectRatio::Portrait,
            _ => {}
        }

        let ratio = width as f64 / height as f64;
        if (ratio - 9.0 / 16.0).abs() < RATIO_TOLERANCE {
            AspectRatio::Portrait
        } else if (ratio - 16.0 / 9.0).abs() < RATIO_TOLERANCE {
            AspectRatio::Landscape
        } else {
            AspectRatio::Other
        }
    }

    /// Object key prefix videos of this shape are grouped under.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "landscape",
            AspectRatio::Portrait => "portrait",
            AspectRatio::Other => "other",
        }
    }
}

pub fn gcd(a: u32, b: u32) -> u32 {
    if a == 0 {
        return b;
    }
    gcd(b % a, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcd_of_common_sizes() {
        assert_eq!(gcd(1920, 1080), 120);
        assert_eq!(gcd(1280, 720), 80);
        assert_eq!(gcd(9, 16), 1);
        assert_eq!(gcd(0, 7), 7);
    }

    #[test]
    fn exact_ratios() {
        assert_eq!(AspectRatio::classify(1920, 1080), AspectRatio::Landscape);
        assert_eq!(AspectRatio::classify(1080, 1920), AspectRatio::Portrait);
        assert_eq!(AspectRatio::classify(640, 480), AspectRatio::Other);
        assert_eq!(AspectRatio::classify(1000, 1000), AspectRatio::Other);
    }

    #[test]
    fn near_ratios_fall_within_tolerance() {
        // 1.7777 vs 854/480 = 1.7791
        assert_eq!(AspectRatio::classify(854, 480), AspectRatio::Landscape);
        // 0.5625 vs 608/1080 = 0.5629
        assert_eq!(AspectRatio::classify(608, 1080), AspectRatio::Portrait);
        // 1.85 is too far from 16:9
        assert_eq!(AspectRatio::classify(1850, 1000), AspectRatio::Other);
    }

    #[test]
    fn names_and_prefixes() {
        assert_eq!(AspectRatio::Landscape.to_string(), "16:9");
        assert_eq!(AspectRatio::Portrait.to_string(), "9:16");
        assert_eq!("other".parse::<AspectRatio>().unwrap(), AspectRatio::Other);
        assert_eq!(AspectRatio::Landscape.key_prefix(), "landscape");
        assert_eq!(AspectRatio::Portrait.key_prefix(), "portrait");
        assert_eq!(AspectRatio::Other.key_prefix(), "other");
    }
}
