//! Error codes for resolver diagnostics.
//!
//! Each code is a unique identifier (e.g., `E2003`) whose first digit names
//! the stage that produced it.

use std::fmt;

/// Error codes for resolver diagnostics.
///
/// Format: E#### where first digit indicates the stage:
/// - E1xxx: Compiled metadata and raw declaration loading
/// - E2xxx: Resolution of references, supertypes and signatures
/// - E9xxx: Internal failures surfaced at the analysis boundary
///
/// Warnings use the W prefix with the same stage digits.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Loading (E1xxx)
    /// Compiled metadata has an incompatible ABI version
    E1001,
    /// Malformed generic signature on a raw declaration
    E1002,

    // Resolution (E2xxx)
    /// Unresolved class reference
    E2001,
    /// Unresolved import
    E2002,
    /// Unresolved supertype
    E2003,
    /// Unresolved package in a package header or qualifier
    E2004,
    /// Foreign signature disagrees with the member it overrides
    E2005,

    // Internal (E9xxx)
    /// Unexpected failure while analyzing a file
    E9001,

    // Warnings
    /// Annotation skipped because its class cannot be resolved
    W2001,
}

impl ErrorCode {
    /// All error codes, in declaration order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E9001,
        ErrorCode::W2001,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E9001 => "E9001",
            ErrorCode::W2001 => "W2001",
        }
    }

    pub fn is_loading_error(&self) -> bool {
        matches!(self, ErrorCode::E1001 | ErrorCode::E1002)
    }

    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E2001
                | ErrorCode::E2002
                | ErrorCode::E2003
                | ErrorCode::E2004
                | ErrorCode::E2005
        )
    }

    pub fn is_internal_error(&self) -> bool {
        matches!(self, ErrorCode::E9001)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, ErrorCode::W2001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse an error code string like `"E2003"`. Case-insensitive.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}
