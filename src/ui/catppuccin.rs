/// Catppuccin Mocha color palette.
///
/// Values are hex RGB strings in the `#RRGGBB` format.
pub mod colors {
    pub const MAUVE: &str = "#cba6f7";
    pub const TEXT: &str = "#cdd6f4";
    pub const CRUST: &str = "#11111b";
}

/// Catppuccin Latte (light) counterparts of the colors used by themes.
pub mod latte {
    pub const MAUVE: &str = "#8839ef";
    pub const TEXT: &str = "#4c4f69";
    pub const CRUST: &str = "#dce0e8";
}

pub fn parse_hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Convert hex color (`#RRGGBB`) to a 24-bit true color foreground escape.
pub fn hex_to_ansi_fg(hex: &str) -> String {
    let Some((r, g, b)) = parse_hex_rgb(hex) else {
        return String::new();
    };

    format!("\x1b[38;2;{r};{g};{b}m")
}

/// Convert hex color (`#RRGGBB`) to an ASS color (`&HAABBGGRR`).
///
/// `alpha` is the ASS transparency byte: 0x00 is opaque.
pub fn hex_to_ass_color(hex: &str, alpha: u8) -> Option<String> {
    let (r, g, b) = parse_hex_rgb(hex)?;
    Some(format!("&H{alpha:02X}{b:02X}{g:02X}{r:02X}"))
}

/// Render a small colored swatch followed by the hex value.
pub fn swatch(hex: &str, color: bool) -> String {
    if !color {
        return hex.to_string();
    }
    format!("{}■\x1b[0m {hex}", hex_to_ansi_fg(hex))
}
