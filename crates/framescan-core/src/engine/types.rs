//! Core types for the decode-engine boundary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for a decode attempt.
///
/// "No symbol found" is the majority-case result of a live decode attempt,
/// not a fault; callers route it as an ordinary failed attempt and never
/// surface it as an error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine examined the image and found no recognizable symbol.
    #[error("no symbol found")]
    SymbolNotFound,

    /// The engine failed in an unexpected way. The attempt degrades to a
    /// plain failure; the engine must still be reset afterwards.
    #[error("decode engine fault: {0}")]
    Fault(String),
}

/// Symbology families an engine may recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbology {
    /// QR matrix code.
    QrCode,
    /// EAN-13 / UPC-A linear code.
    Ean13,
    /// Code 128 linear code.
    Code128,
    /// Data Matrix code.
    DataMatrix,
    /// Aztec matrix code.
    Aztec,
    /// PDF417 stacked linear code.
    Pdf417,
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Symbology::QrCode => "QR_CODE",
            Symbology::Ean13 => "EAN_13",
            Symbology::Code128 => "CODE_128",
            Symbology::DataMatrix => "DATA_MATRIX",
            Symbology::Aztec => "AZTEC",
            Symbology::Pdf417 => "PDF_417",
        };
        f.write_str(name)
    }
}

/// A decoded symbol as returned by the engine.
///
/// The pipeline passes this through without interpreting it; only the
/// display layer formats it for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedSymbol {
    /// Decoded payload text.
    pub text: String,
    /// Which symbology matched.
    pub symbology: Symbology,
    /// Engine-specific metadata (error-correction level, version, ...).
    pub metadata: BTreeMap<String, String>,
}

impl DecodedSymbol {
    /// Create a symbol with no metadata.
    pub fn new(text: impl Into<String>, symbology: Symbology) -> Self {
        Self {
            text: text.into(),
            symbology,
            metadata: BTreeMap::new(),
        }
    }
}

/// Optional guidance passed to the engine with each attempt.
///
/// Live scanning passes camera-supplied context; the still-image path always
/// sets an explicit UTF-8 character set since a picked file carries no hint
/// context of its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodeHints {
    /// Character set for text payloads, e.g. `"utf-8"`.
    pub character_set: Option<String>,
    /// Restrict the attempt to these symbologies. `None` means try all the
    /// engine supports.
    pub possible_formats: Option<Vec<Symbology>>,
}

impl DecodeHints {
    /// Hints for the still-image path: explicit UTF-8, all formats.
    pub fn utf8() -> Self {
        Self {
            character_set: Some("utf-8".to_string()),
            possible_formats: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbology_display() {
        assert_eq!(Symbology::QrCode.to_string(), "QR_CODE");
        assert_eq!(Symbology::Ean13.to_string(), "EAN_13");
    }

    #[test]
    fn test_decoded_symbol_new() {
        let symbol = DecodedSymbol::new("hello", Symbology::QrCode);
        assert_eq!(symbol.text, "hello");
        assert_eq!(symbol.symbology, Symbology::QrCode);
        assert!(symbol.metadata.is_empty());
    }

    #[test]
    fn test_utf8_hints() {
        let hints = DecodeHints::utf8();
        assert_eq!(hints.character_set.as_deref(), Some("utf-8"));
        assert!(hints.possible_formats.is_none());
    }

    #[test]
    fn test_engine_error_display() {
        assert_eq!(EngineError::SymbolNotFound.to_string(), "no symbol found");
        assert_eq!(
            EngineError::Fault("boom".to_string()).to_string(),
            "decode engine fault: boom"
        );
    }
}
