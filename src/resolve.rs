//! Format Resolver
//!
//! Pure mapping from an original image reference and a detected role to the
//! most compact candidate URL the session can decode. Cross-origin
//! references are never rewritten; the resolver only rewrites URLs the page
//! controls.

use url::Url;

use crate::capability::CapabilitySet;
use crate::config::CompressionLevels;
use crate::slot::ImageElement;

/// Image role, driving the target compression quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageRole {
    Hero,
    #[default]
    Content,
    Thumbnail,
    Background,
}

impl ImageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageRole::Hero => "hero",
            ImageRole::Content => "content",
            ImageRole::Thumbnail => "thumbnail",
            ImageRole::Background => "background",
        }
    }

    /// Classify an element from its own classes and its ancestor hint.
    pub fn detect(element: &ImageElement) -> Self {
        let parent = element.parent_class.as_deref();
        if element.has_class("hero-image") || parent == Some("hero") {
            ImageRole::Hero
        } else if element.has_class("thumbnail") || parent == Some("thumbnail") {
            ImageRole::Thumbnail
        } else if element.has_class("background") || element.object_fit_cover {
            ImageRole::Background
        } else {
            ImageRole::Content
        }
    }
}

/// Resolve the candidate URL for one load attempt.
///
/// Already-negotiated references pass through unchanged, as do references
/// the resolver cannot parse or that live on another origin. Same-origin
/// legacy encodings are rewritten to AVIF when decodable, else WebP, each
/// with the role's quality target as a query parameter.
pub fn resolve_candidate(
    original: &str,
    role: ImageRole,
    capabilities: &CapabilitySet,
    levels: &CompressionLevels,
    page_origin: &str,
) -> String {
    // Avoid double negotiation.
    if original.contains(".webp") || original.contains(".avif") {
        return original.to_string();
    }

    let base = match Url::parse(page_origin) {
        Ok(url) => url,
        Err(_) => return original.to_string(),
    };
    let resolved = match base.join(original) {
        Ok(url) => url,
        Err(_) => return original.to_string(),
    };
    if resolved.origin() != base.origin() {
        return original.to_string();
    }

    let path = resolved.path();
    let (stem, extension) = match path.rsplit_once('.') {
        Some(parts) => parts,
        None => return original.to_string(),
    };
    let extension = extension.to_ascii_lowercase();
    let rewritable = matches!(extension.as_str(), "jpg" | "jpeg" | "png");
    if !rewritable {
        return original.to_string();
    }

    let quality = levels.quality(role);
    if capabilities.avif {
        format!("{stem}.avif?q={quality}")
    } else if capabilities.webp {
        format!("{stem}.webp?q={quality}")
    } else {
        original.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "http://localhost";

    fn all() -> CapabilitySet {
        CapabilitySet {
            webp: true,
            avif: true,
        }
    }

    #[test]
    fn test_avif_preferred_for_same_origin_legacy() {
        let levels = CompressionLevels::default();
        let candidate =
            resolve_candidate("/images/cat.jpg", ImageRole::Content, &all(), &levels, ORIGIN);
        assert_eq!(candidate, "/images/cat.avif?q=80");
    }

    #[test]
    fn test_thumbnail_quality_with_avif_only() {
        let levels = CompressionLevels::default();
        let caps = CapabilitySet {
            webp: false,
            avif: true,
        };
        let candidate = resolve_candidate("photo.jpg", ImageRole::Thumbnail, &caps, &levels, ORIGIN);
        assert!(candidate.contains(".avif"));
        assert!(candidate.ends_with("?q=70"));
    }

    #[test]
    fn test_webp_fallback_when_avif_unsupported() {
        let levels = CompressionLevels::default();
        let caps = CapabilitySet {
            webp: true,
            avif: false,
        };
        let candidate =
            resolve_candidate("/hero/banner.png", ImageRole::Hero, &caps, &levels, ORIGIN);
        assert_eq!(candidate, "/hero/banner.webp?q=90");
    }

    #[test]
    fn test_no_capability_returns_original() {
        let levels = CompressionLevels::default();
        let caps = CapabilitySet::default();
        let candidate = resolve_candidate("photo.jpg", ImageRole::Thumbnail, &caps, &levels, ORIGIN);
        assert_eq!(candidate, "photo.jpg");
    }

    #[test]
    fn test_already_negotiated_passes_through() {
        let levels = CompressionLevels::default();
        let candidate =
            resolve_candidate("/img/pic.avif", ImageRole::Content, &all(), &levels, ORIGIN);
        assert_eq!(candidate, "/img/pic.avif");
        let candidate =
            resolve_candidate("/img/pic.webp", ImageRole::Content, &all(), &levels, ORIGIN);
        assert_eq!(candidate, "/img/pic.webp");
    }

    #[test]
    fn test_cross_origin_never_rewritten() {
        let levels = CompressionLevels::default();
        let candidate = resolve_candidate(
            "https://cdn.example.com/pic.jpg",
            ImageRole::Content,
            &all(),
            &levels,
            ORIGIN,
        );
        assert_eq!(candidate, "https://cdn.example.com/pic.jpg");
    }

    #[test]
    fn test_unknown_extension_untouched() {
        let levels = CompressionLevels::default();
        let candidate = resolve_candidate("/img/anim.gif", ImageRole::Content, &all(), &levels, ORIGIN);
        assert_eq!(candidate, "/img/anim.gif");
        let candidate = resolve_candidate("/img/no-extension", ImageRole::Content, &all(), &levels, ORIGIN);
        assert_eq!(candidate, "/img/no-extension");
    }

    #[test]
    fn test_role_detection() {
        let hero = ImageElement::new(1).with_class("hero-image");
        assert_eq!(ImageRole::detect(&hero), ImageRole::Hero);

        let hero_child = ImageElement::new(2).with_parent_class("hero");
        assert_eq!(ImageRole::detect(&hero_child), ImageRole::Hero);

        let thumb = ImageElement::new(3).with_class("thumbnail");
        assert_eq!(ImageRole::detect(&thumb), ImageRole::Thumbnail);

        let mut cover = ImageElement::new(4);
        cover.object_fit_cover = true;
        assert_eq!(ImageRole::detect(&cover), ImageRole::Background);

        let plain = ImageElement::new(5);
        assert_eq!(ImageRole::detect(&plain), ImageRole::Content);
    }
}
