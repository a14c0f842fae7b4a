//! Diagnostic records produced by the validator core.
//!
//! Every finding is an [`Issue`]: a stable machine-readable [`IssueCode`], a
//! human-readable message, a [`Severity`] and a JSON pointer into the document.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Issue severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
            Severity::Hint => "HINT",
        };
        f.write_str(s)
    }
}

macro_rules! issue_codes {
    ($($variant:ident => $name:literal, $severity:ident;)+) => {
        /// Stable identifier of a validation rule.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum IssueCode {
            $($variant,)+
        }

        impl IssueCode {
            /// Every known code, in declaration order.
            pub const ALL: &'static [IssueCode] = &[$(IssueCode::$variant,)+];

            /// Wire name, e.g. `ACCESSOR_TOO_LONG`.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(IssueCode::$variant => $name,)+
                }
            }

            /// Severity used when no override is configured.
            pub const fn default_severity(self) -> Severity {
                match self {
                    $(IssueCode::$variant => Severity::$severity,)+
                }
            }
        }

        impl FromStr for IssueCode {
            type Err = UnknownIssueCode;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(IssueCode::$variant),)+
                    _ => Err(UnknownIssueCode(s.to_string())),
                }
            }
        }
    };
}

issue_codes! {
    // References and buffers
    UnresolvedReference => "UNRESOLVED_REFERENCE", Error;
    BufferDataTooShort => "BUFFER_DATA_TOO_SHORT", Error;
    BufferViewTooLong => "BUFFER_VIEW_TOO_LONG", Error;
    BufferViewTooBigByteStride => "BUFFER_VIEW_TOO_BIG_BYTE_STRIDE", Error;

    // Accessor layout
    AccessorOffsetAlignment => "ACCESSOR_OFFSET_ALIGNMENT", Error;
    AccessorTotalOffsetAlignment => "ACCESSOR_TOTAL_OFFSET_ALIGNMENT", Error;
    AccessorSmallBytestride => "ACCESSOR_SMALL_BYTESTRIDE", Error;
    AccessorTooLong => "ACCESSOR_TOO_LONG", Error;

    // Accessor data
    AccessorMinMismatch => "ACCESSOR_MIN_MISMATCH", Error;
    AccessorMaxMismatch => "ACCESSOR_MAX_MISMATCH", Error;
    AccessorElementOutOfMinBound => "ACCESSOR_ELEMENT_OUT_OF_MIN_BOUND", Error;
    AccessorElementOutOfMaxBound => "ACCESSOR_ELEMENT_OUT_OF_MAX_BOUND", Error;
    AccessorInvalidFloat => "ACCESSOR_INVALID_FLOAT", Error;
    AccessorSparseIndicesNonIncreasing => "ACCESSOR_SPARSE_INDICES_NON_INCREASING", Error;
    AccessorSparseIndexOob => "ACCESSOR_SPARSE_INDEX_OOB", Error;

    // Semantic attribute rules
    AccessorIndexOob => "ACCESSOR_INDEX_OOB", Error;
    AccessorIndexPrimitiveRestart => "ACCESSOR_INDEX_PRIMITIVE_RESTART", Error;
    AccessorJointsIndexOob => "ACCESSOR_JOINTS_INDEX_OOB", Error;
    AccessorJointsIndexDuplicate => "ACCESSOR_JOINTS_INDEX_DUPLICATE", Error;
    AccessorJointsUsedZeroWeight => "ACCESSOR_JOINTS_USED_ZERO_WEIGHT", Info;
    AccessorWeightsNegative => "ACCESSOR_WEIGHTS_NEGATIVE", Error;
    AccessorWeightsNonNormalized => "ACCESSOR_WEIGHTS_NON_NORMALIZED", Error;
    AccessorNonUnit => "ACCESSOR_NON_UNIT", Error;
    AccessorInvalidSign => "ACCESSOR_INVALID_SIGN", Error;
    AccessorAnimationInputNonIncreasing => "ACCESSOR_ANIMATION_INPUT_NON_INCREASING", Error;
    AccessorAnimationInputNegative => "ACCESSOR_ANIMATION_INPUT_NEGATIVE", Error;
    AccessorInvalidIbm => "ACCESSOR_INVALID_IBM", Warning;

    // Node hierarchy
    NodeLoop => "NODE_LOOP", Error;
    NodeParentOverride => "NODE_PARENT_OVERRIDE", Error;
    SceneNonRootNode => "SCENE_NON_ROOT_NODE", Error;
    SkinNoCommonRoot => "SKIN_NO_COMMON_ROOT", Error;
    SkinSkeletonInvalid => "SKIN_SKELETON_INVALID", Error;

    // Usage
    UnusedObject => "UNUSED_OBJECT", Info;

    // Extensions
    UndeclaredExtension => "UNDECLARED_EXTENSION", Error;
    UnsupportedExtension => "UNSUPPORTED_EXTENSION", Info;
    KhrLightsPunctualLightSpotAngles => "KHR_LIGHTS_PUNCTUAL_LIGHT_SPOT_ANGLES", Error;
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IssueCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IssueCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Returned when parsing a string that names no known [`IssueCode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown issue code '{0}'")]
pub struct UnknownIssueCode(pub String);

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub code: IssueCode,
    pub message: String,
    pub severity: Severity,
    /// JSON pointer of the offending value, e.g. `/accessors/3/min/0`.
    pub pointer: String,
    /// Component index inside the accessor data, for data-level findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl Issue {
    /// Create an issue with the code's default severity.
    pub fn new(code: IssueCode, pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            severity: code.default_severity(),
            pointer: pointer.into(),
            offset: None,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.severity, self.code, self.pointer)?;
        if let Some(offset) = self.offset {
            write!(f, " @{offset}")?;
        }
        write!(f, ": {}", self.message)
    }
}
