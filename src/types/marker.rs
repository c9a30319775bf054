use serde::Serialize;

/// Icon configuration for the vehicle marker, handed to the renderer
/// explicitly instead of being patched into any shared default.
#[derive(Debug, Clone, Serialize)]
pub struct MarkerStyle {
    pub name: &'static str,
    pub fill: &'static str,
    pub stroke: &'static str,
    pub radius: f32,
    /// Colour of the already travelled part of the route.
    pub trail: &'static str,
}

impl MarkerStyle {
    pub fn get(name: &str) -> Option<Self> {
        match name {
            "car" => Some(Self::car()),
            "bike" => Some(Self {
                name: "bike",
                fill: "#00C2FF",
                stroke: "#FFFFFF",
                radius: 7.0,
                trail: "#00EABD",
            }),
            "bus" => Some(Self {
                name: "bus",
                fill: "#FF9933",
                stroke: "#1A1A1A",
                radius: 11.0,
                trail: "#FF6600",
            }),
            "pin" => Some(Self {
                name: "pin",
                fill: "#FF2D55",
                stroke: "#FFFFFF",
                radius: 8.0,
                trail: "#FF7E5F",
            }),
            _ => None,
        }
    }

    fn car() -> Self {
        Self {
            name: "car",
            fill: "#2A81CB",
            stroke: "#FFFFFF",
            radius: 9.0,
            trail: "#3388FF",
        }
    }
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self::car()
    }
}

pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let value = hex.trim_start_matches('#');
    if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&value[0..2], 16).ok()?;
    let g = u8::from_str_radix(&value[2..4], 16).ok()?;
    let b = u8::from_str_radix(&value[4..6], 16).ok()?;
    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_have_valid_colors() {
        for name in ["car", "bike", "bus", "pin"] {
            let style = MarkerStyle::get(name).expect("preset");
            assert_eq!(style.name, name);
            assert!(parse_hex_color(style.fill).is_some());
            assert!(parse_hex_color(style.stroke).is_some());
            assert!(parse_hex_color(style.trail).is_some());
        }
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(MarkerStyle::get("submarine").is_none());
    }

    #[test]
    fn parses_hex_with_and_without_hash() {
        assert_eq!(parse_hex_color("#FF6600"), Some((255, 102, 0)));
        assert_eq!(parse_hex_color("000000"), Some((0, 0, 0)));
        assert_eq!(parse_hex_color("#FFF"), None);
    }

    #[test]
    fn rejects_non_ascii_of_hex_length() {
        assert_eq!(parse_hex_color("a\u{e9}123"), None);
        assert_eq!(parse_hex_color("#a\u{e9}123"), None);
        assert_eq!(parse_hex_color("+1+2+3"), None);
    }
}
