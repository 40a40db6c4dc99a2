//! Placeholder Generator
//!
//! Inline SVG substitutes shown before a load begins and after one fails.
//! Pure and deterministic: same dimensions and kind, same data URL.

/// Fallback width when a slot declares no dimensions.
pub const DEFAULT_WIDTH: u32 = 300;

/// Fallback height when a slot declares no dimensions.
pub const DEFAULT_HEIGHT: u32 = 200;

/// Which substitute to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    Loading,
    Error,
}

impl PlaceholderKind {
    fn fill(&self) -> &'static str {
        match self {
            PlaceholderKind::Loading => "#f0f0f0",
            PlaceholderKind::Error => "#ffebee",
        }
    }

    fn text_fill(&self) -> &'static str {
        match self {
            PlaceholderKind::Loading => "#999",
            PlaceholderKind::Error => "#c62828",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PlaceholderKind::Loading => "Loading...",
            PlaceholderKind::Error => "Image failed to load",
        }
    }
}

/// Build an inline SVG data URL with the given dimensions and status text.
pub fn make_placeholder(width: u32, height: u32, kind: PlaceholderKind) -> String {
    let svg = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{width}' height='{height}' \
         viewBox='0 0 {width} {height}'>\
         <rect width='100%' height='100%' fill='{fill}'/>\
         <text x='50%' y='50%' dominant-baseline='middle' text-anchor='middle' \
         fill='{text_fill}' font-size='14'>{label}</text></svg>",
        fill = kind.fill(),
        text_fill = kind.text_fill(),
        label = kind.label(),
    );
    format!("data:image/svg+xml;charset=utf-8,{}", encode(&svg))
}

// Minimal percent-encoding for an SVG riding in a data URL. '%' must be
// escaped before the characters whose escapes introduce new '%' bytes.
fn encode(svg: &str) -> String {
    svg.replace('%', "%25")
        .replace('<', "%3C")
        .replace('>', "%3E")
        .replace('#', "%23")
        .replace(' ', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_dimensions_are_embedded() {
        let url = make_placeholder(170, 100, PlaceholderKind::Loading);
        assert!(url.starts_with("data:image/svg+xml;charset=utf-8,"));
        assert!(url.contains("width='170'"));
        assert!(url.contains("height='100'"));
    }

    #[test]
    fn test_kinds_differ_in_fill_and_text() {
        let loading = make_placeholder(DEFAULT_WIDTH, DEFAULT_HEIGHT, PlaceholderKind::Loading);
        let error = make_placeholder(DEFAULT_WIDTH, DEFAULT_HEIGHT, PlaceholderKind::Error);
        assert!(loading.contains("%23f0f0f0"));
        assert!(loading.contains("Loading..."));
        assert!(error.contains("%23ffebee"));
        assert!(error.contains("failed"));
        assert_ne!(loading, error);
    }

    #[test]
    fn test_deterministic() {
        let a = make_placeholder(40, 40, PlaceholderKind::Error);
        let b = make_placeholder(40, 40, PlaceholderKind::Error);
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_raw_markup_characters_survive() {
        let url = make_placeholder(10, 10, PlaceholderKind::Loading);
        let payload = url.trim_start_matches("data:image/svg+xml;charset=utf-8,");
        assert!(!payload.contains('<'));
        assert!(!payload.contains('>'));
        assert!(!payload.contains('#'));
        assert!(!payload.contains(' '));
    }
}
