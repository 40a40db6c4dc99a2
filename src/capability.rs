//! Capability Probe
//!
//! Detects which next-generation image encodings the current session can
//! decode. Probed once at start-up and cached for the session.

/// Next-generation image encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Webp,
    Avif,
}

impl ImageFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Webp => "webp",
            ImageFormat::Avif => "avif",
        }
    }

    /// MIME type.
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Webp => "image/webp",
            ImageFormat::Avif => "image/avif",
        }
    }
}

/// Host seam for format-support probing.
///
/// The host renders a 1x1 surface and asks the platform whether it can
/// re-encode to the target format. `None` means the platform cannot answer
/// (old environment); that is treated as unsupported, silently.
pub trait FormatProbe {
    fn encode_to(&self, format: ImageFormat) -> Option<bool>;
}

/// A probe for environments that cannot answer at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

impl FormatProbe for NoProbe {
    fn encode_to(&self, _format: ImageFormat) -> Option<bool> {
        None
    }
}

/// Decoding support for next-generation encodings, fixed for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet {
    pub webp: bool,
    pub avif: bool,
}

impl CapabilitySet {
    /// Run the probe once for every encoding.
    pub fn detect(probe: &dyn FormatProbe) -> Self {
        Self {
            webp: probe.encode_to(ImageFormat::Webp).unwrap_or(false),
            avif: probe.encode_to(ImageFormat::Avif).unwrap_or(false),
        }
    }

    /// Is the given format decodable?
    pub fn supports(&self, format: ImageFormat) -> bool {
        match format {
            ImageFormat::Webp => self.webp,
            ImageFormat::Avif => self.avif,
        }
    }
}
