//! Theme colors for the contact form
//! Defaults mirror the site stylesheet; `[theme]` in config.toml overrides them.

use ratatui::style::Color;

use crate::config::ThemeConfig;

/// Theme colors for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accent: Color,          // Focused field border, submit control
    pub error: Color,           // Inline field errors (#ef4444)
    pub banner: Color,          // Form-level error banner text (#dc2626)
    pub banner_border: Color,   // #fecaca
    pub success: Color,
    pub text: Color,
    pub text_dim: Color,
    pub inactive: Color,
    pub progress_start: Color,  // Scroll progress gradient (#6b8e23 -> #d2b48c)
    pub progress_end: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Rgb(107, 142, 35),
            error: Color::Rgb(239, 68, 68),
            banner: Color::Rgb(220, 38, 38),
            banner_border: Color::Rgb(254, 202, 202),
            success: Color::Rgb(166, 218, 149),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            inactive: Color::Rgb(88, 91, 112),
            progress_start: Color::Rgb(107, 142, 35),
            progress_end: Color::Rgb(210, 180, 140),
        }
    }
}

impl Theme {
    /// Defaults with any parseable overrides applied
    pub fn from_config(config: &ThemeConfig) -> Self {
        let mut theme = Self::default();

        let overrides = [
            (&config.accent, &mut theme.accent),
            (&config.error, &mut theme.error),
            (&config.banner, &mut theme.banner),
            (&config.progress_start, &mut theme.progress_start),
            (&config.progress_end, &mut theme.progress_end),
        ];

        for (value, slot) in overrides {
            let Some(raw) = value else { continue };
            match parse_hex_color(raw) {
                Some(color) => *slot = color,
                None => tracing::warn!("Ignoring invalid theme color: {}", raw),
            }
        }

        theme
    }

    /// Colour `fraction` (0.0..=1.0) of the way along the progress gradient
    pub fn progress_color(&self, fraction: f64) -> Color {
        match (self.progress_start, self.progress_end) {
            (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
                let t = fraction.clamp(0.0, 1.0);
                let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
                Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
            }
            (start, _) => start,
        }
    }
}

/// Parse a hex color string (#RRGGBB or #RGB)
fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }

    if s.len() == 6 {
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        Some(Color::Rgb(r, g, b))
    } else if s.len() == 3 {
        let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
        let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
        let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
        Some(Color::Rgb(r, g, b))
    } else {
        None
    }
}
