//! Closed option sets used by layout and direction.
//!
//! Every enum accepts any string on input: unknown values resolve to the
//! variant's default instead of failing, so a request with a typo still
//! renders with sane settings.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant),+
        }

        #[allow(dead_code)]
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Strict lookup. Accepts any case and `-`/space as separators.
            pub fn parse(value: &str) -> Option<Self> {
                let normalized = value.trim().to_ascii_uppercase().replace(['-', ' '], "_");
                match normalized.as_str() {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Lenient lookup: unknown values fall back to the default.
            pub fn resolve(value: &str) -> Self {
                Self::parse(value).unwrap_or_default()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::resolve(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum! {
    /// Visual subtitle style of a whole timeline.
    SubtitleStyle, default = LineByLine {
        LineByLine => "LINE_BY_LINE",
        LineByLineBig => "LINE_BY_LINE_BIG",
        AlexHormozi => "ALEX_HORMOZI",
        Trailer => "TRAILER",
        CinematicDynamic => "CINEMATIC_DYNAMIC",
    }
}

closed_enum! {
    /// Whether placement is fixed for the whole timeline or chosen per segment.
    PlacementStrategy, default = Fixed {
        Fixed => "FIXED",
        Dynamic => "DYNAMIC",
    }
}

closed_enum! {
    /// Screen zone a segment is rendered in.
    Placement, default = Bottom {
        Top => "TOP",
        Center => "CENTER",
        Bottom => "BOTTOM",
    }
}

closed_enum! {
    OverflowStrategy, default = RebalanceThenShrink {
        Rebalance => "REBALANCE",
        Shrink => "SHRINK",
        RebalanceThenShrink => "REBALANCE_THEN_SHRINK",
    }
}

closed_enum! {
    /// Entry animation of a segment.
    Animation, default = FadeIn {
        FadeIn => "FADE_IN",
        Pop => "POP",
        SlideUp => "SLIDE_UP",
        Typewriter => "TYPEWRITER",
    }
}

closed_enum! {
    SubtitleSize, default = M {
        S => "S",
        M => "M",
        L => "L",
        Xl => "XL",
    }
}

closed_enum! {
    /// Named direction bundle. An empty or unknown name means "no preset",
    /// see [`resolve_preset`].
    DirectionPreset, default = CinematicDynamicV1 {
        CinematicDynamicV1 => "CINEMATIC_DYNAMIC_V1",
        TrailerV1 => "TRAILER_V1",
        Documentary => "DOCUMENTARY",
    }
}

closed_enum! {
    /// Kind of visual attached to a scene.
    VisualKind, default = None {
        Image => "IMAGE",
        Video => "VIDEO",
        None => "NONE",
    }
}

/// Resolve an optional preset name. Empty and unknown names mean no preset.
pub fn resolve_preset(value: Option<&str>) -> Option<DirectionPreset> {
    value.and_then(DirectionPreset::parse)
}
