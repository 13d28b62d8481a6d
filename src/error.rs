//! Decoder error enums.

/// Error returned by [`crate::decode`] and [`crate::decode_with_config`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Too few dots (or dot pairs) were found to infer the carrier grid.
    InsufficientGeometry(GeometryErrorKind),
    /// The classified symbol grid contains no clean, fully-populated 4x4
    /// block to hand to the external codec.
    NoDecodableRegion,
    /// The external codec refused the 4x4 block as inconsistent.
    CodecRejected(String),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientGeometry(kind) => {
                write!(f, "insufficient geometry to infer carrier grid: {kind}")
            }
            Self::NoDecodableRegion => {
                write!(f, "no fully-populated 4x4 region in the symbol grid")
            }
            Self::CodecRejected(msg) => write!(f, "codec rejected the symbol block: {msg}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// Sub-cases of [`DecodeError::InsufficientGeometry`], raised by the grid
/// estimator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeometryErrorKind {
    /// Fewer than one centroid pair survived the pair survey (§4.5 Step 1).
    TooFewPairs,
    /// The angle survey produced no clusters at all.
    NoAngleClusters,
}

impl std::fmt::Display for GeometryErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewPairs => write!(f, "no centroid pairs within a grid-spacing multiple"),
            Self::NoAngleClusters => write!(f, "no angle clusters found among surviving pairs"),
        }
    }
}
