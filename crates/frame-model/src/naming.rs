//! Camera filename conventions.
//!
//! Two layouts are recognised, both case-insensitive:
//!
//! ```text
//! DSCF0851.JPG        simple:   frame number is the camera counter (0851)
//! DSCF0851_0001.jpg   suffixed: frame number is the trailing counter (0001)
//! ```

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::manifest::ManifestError;

/// Camera filename prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "DSCF";

/// Which filename layout a frame directory uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingConvention {
    /// `<PREFIX>NNNN.JPG`
    Simple,
    /// `<PREFIX>NNNN_SSSS.JPG`
    Suffixed,
}

impl NamingConvention {
    pub fn as_str(self) -> &'static str {
        match self {
            NamingConvention::Simple => "simple",
            NamingConvention::Suffixed => "suffix",
        }
    }
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiled matchers for both conventions under one prefix.
#[derive(Debug, Clone)]
pub struct FramePatterns {
    prefix: String,
    simple: Regex,
    suffixed: Regex,
}

impl FramePatterns {
    /// Build matchers for `prefix` (matched literally, case-insensitive).
    pub fn new(prefix: &str) -> Result<Self, ManifestError> {
        let escaped = regex::escape(prefix);
        let simple = RegexBuilder::new(&format!(r"^{escaped}([0-9]{{4}})\.jpg$"))
            .case_insensitive(true)
            .build()?;
        let suffixed = RegexBuilder::new(&format!(r"^{escaped}[0-9]{{4}}_([0-9]{{4}})\.jpg$"))
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            prefix: prefix.to_string(),
            simple,
            suffixed,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Classify a single filename. Suffixed wins when both could apply.
    pub fn classify(&self, file_name: &str) -> Option<NamingConvention> {
        if self.suffixed.is_match(file_name) {
            Some(NamingConvention::Suffixed)
        } else if self.simple.is_match(file_name) {
            Some(NamingConvention::Simple)
        } else {
            None
        }
    }

    /// The convention of the first classifiable name, which fixes the mode
    /// for the whole directory.
    pub fn detect<'a, I>(&self, file_names: I) -> Option<NamingConvention>
    where
        I: IntoIterator<Item = &'a str>,
    {
        file_names.into_iter().find_map(|name| self.classify(name))
    }

    /// Extract the frame number of `file_name` under `convention`.
    pub fn frame_number(&self, convention: NamingConvention, file_name: &str) -> Option<u32> {
        let pattern = match convention {
            NamingConvention::Simple => &self.simple,
            NamingConvention::Suffixed => &self.suffixed,
        };
        pattern
            .captures(file_name)
            .and_then(|caps| caps.get(1))
            .and_then(|digits| digits.as_str().parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dscf() -> FramePatterns {
        FramePatterns::new(DEFAULT_PREFIX).unwrap()
    }

    #[test]
    fn test_classify_both_layouts() {
        let patterns = dscf();
        assert_eq!(
            patterns.classify("DSCF0851.JPG"),
            Some(NamingConvention::Simple)
        );
        assert_eq!(
            patterns.classify("DSCF0851_0001.jpg"),
            Some(NamingConvention::Suffixed)
        );
        assert_eq!(
            patterns.classify("dscf0851.jpg"),
            Some(NamingConvention::Simple)
        );
    }

    #[test]
    fn test_classify_rejects_other_names() {
        let patterns = dscf();
        for name in [
            "DSCF851.JPG",
            "DSCF08510.JPG",
            "DSCF0851.RAF",
            "IMG_0851.JPG",
            "xDSCF0851.JPG",
            "DSCF0851_001.JPG",
            "DSCF0851.JPG.bak",
        ] {
            assert_eq!(patterns.classify(name), None, "{name} should not match");
        }
    }

    #[test]
    fn test_frame_number_per_convention() {
        let patterns = dscf();
        assert_eq!(
            patterns.frame_number(NamingConvention::Simple, "DSCF0851.JPG"),
            Some(851)
        );
        assert_eq!(
            patterns.frame_number(NamingConvention::Suffixed, "DSCF0851_0042.JPG"),
            Some(42)
        );
        assert_eq!(
            patterns.frame_number(NamingConvention::Simple, "DSCF0851_0042.JPG"),
            None
        );
        assert_eq!(
            patterns.frame_number(NamingConvention::Suffixed, "DSCF0851.JPG"),
            None
        );
    }

    #[test]
    fn test_detect_uses_first_match() {
        let patterns = dscf();
        let names = ["notes.txt", "DSCF0001.JPG", "DSCF0001_0001.JPG"];
        assert_eq!(patterns.detect(names), Some(NamingConvention::Simple));

        let names = ["DSCF0001_0001.JPG", "DSCF0002.JPG"];
        assert_eq!(patterns.detect(names), Some(NamingConvention::Suffixed));

        let names = ["a.png", "b.txt"];
        assert_eq!(patterns.detect(names), None);
    }

    #[test]
    fn test_custom_prefix_is_literal() {
        let patterns = FramePatterns::new("IMG.").unwrap();
        assert_eq!(patterns.prefix(), "IMG.");
        assert_eq!(
            patterns.frame_number(NamingConvention::Simple, "img.0007.jpg"),
            Some(7)
        );
        assert_eq!(patterns.classify("IMGx0007.jpg"), None);
    }

    #[test]
    fn test_convention_display() {
        assert_eq!(NamingConvention::Simple.to_string(), "simple");
        assert_eq!(NamingConvention::Suffixed.to_string(), "suffix");
    }
}
