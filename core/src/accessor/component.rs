//! Component reader
//!
//! Decodes single little-endian numeric components out of raw buffer bytes.
//! No bounds checking happens here: callers validate ranges through
//! [`super::layout`] before reading.

/// glTF tag reserved for 64-bit floats. No accessor data path decodes it, so
/// [`ComponentType::from_gl`] treats it as unknown.
pub const GL_DOUBLE: u32 = 5130;

/// Numeric type of a single accessor component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    UnsignedInt,
    Float,
}

impl ComponentType {
    /// Map a GL enum value (5120..=5126) to a component type.
    pub const fn from_gl(code: u32) -> Option<Self> {
        match code {
            5120 => Some(ComponentType::Byte),
            5121 => Some(ComponentType::UnsignedByte),
            5122 => Some(ComponentType::Short),
            5123 => Some(ComponentType::UnsignedShort),
            5125 => Some(ComponentType::UnsignedInt),
            5126 => Some(ComponentType::Float),
            _ => None,
        }
    }

    pub const fn gl(self) -> u32 {
        match self {
            ComponentType::Byte => 5120,
            ComponentType::UnsignedByte => 5121,
            ComponentType::Short => 5122,
            ComponentType::UnsignedShort => 5123,
            ComponentType::UnsignedInt => 5125,
            ComponentType::Float => 5126,
        }
    }

    /// Size of one component in bytes.
    pub const fn size(self) -> usize {
        match self {
            ComponentType::Byte | ComponentType::UnsignedByte => 1,
            ComponentType::Short | ComponentType::UnsignedShort => 2,
            ComponentType::UnsignedInt | ComponentType::Float => 4,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, ComponentType::Float)
    }

    pub const fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            ComponentType::UnsignedByte | ComponentType::UnsignedShort | ComponentType::UnsignedInt
        )
    }

    /// Largest value representable by an unsigned integer type.
    pub const fn unsigned_max(self) -> Option<u64> {
        match self {
            ComponentType::UnsignedByte => Some(u8::MAX as u64),
            ComponentType::UnsignedShort => Some(u16::MAX as u64),
            ComponentType::UnsignedInt => Some(u32::MAX as u64),
            _ => None,
        }
    }

    /// Read one component at `offset`.
    ///
    /// Every supported type is exactly representable as `f64`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + self.size()` exceeds `bytes.len()`.
    pub fn read(self, bytes: &[u8], offset: usize) -> f64 {
        match self {
            ComponentType::Byte => bytes[offset] as i8 as f64,
            ComponentType::UnsignedByte => bytes[offset] as f64,
            ComponentType::Short => i16::from_le_bytes([bytes[offset], bytes[offset + 1]]) as f64,
            ComponentType::UnsignedShort => {
                u16::from_le_bytes([bytes[offset], bytes[offset + 1]]) as f64
            }
            ComponentType::UnsignedInt => u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ]) as f64,
            ComponentType::Float => f32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ]) as f64,
        }
    }

    /// Convert a raw integer component to its normalized value.
    ///
    /// Unsigned types map to [0, 1], signed types to [-1, 1]. Floats and
    /// 32-bit unsigned integers are returned unchanged.
    pub fn normalize(self, raw: f64) -> f64 {
        match self {
            ComponentType::Byte => (raw / 127.0).max(-1.0),
            ComponentType::UnsignedByte => raw / 255.0,
            ComponentType::Short => (raw / 32767.0).max(-1.0),
            ComponentType::UnsignedShort => raw / 65535.0,
            ComponentType::UnsignedInt | ComponentType::Float => raw,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ComponentType::Byte => "BYTE",
            ComponentType::UnsignedByte => "UNSIGNED_BYTE",
            ComponentType::Short => "SHORT",
            ComponentType::UnsignedShort => "UNSIGNED_SHORT",
            ComponentType::UnsignedInt => "UNSIGNED_INT",
            ComponentType::Float => "FLOAT",
        }
    }
}

/// Shape of one accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SCALAR" => Some(ElementType::Scalar),
            "VEC2" => Some(ElementType::Vec2),
            "VEC3" => Some(ElementType::Vec3),
            "VEC4" => Some(ElementType::Vec4),
            "MAT2" => Some(ElementType::Mat2),
            "MAT3" => Some(ElementType::Mat3),
            "MAT4" => Some(ElementType::Mat4),
            _ => None,
        }
    }

    /// Number of components per element.
    pub const fn component_count(self) -> usize {
        match self {
            ElementType::Scalar => 1,
            ElementType::Vec2 => 2,
            ElementType::Vec3 => 3,
            ElementType::Vec4 | ElementType::Mat2 => 4,
            ElementType::Mat3 => 9,
            ElementType::Mat4 => 16,
        }
    }

    pub const fn is_matrix(self) -> bool {
        matches!(self, ElementType::Mat2 | ElementType::Mat3 | ElementType::Mat4)
    }

    /// Rows per matrix column (1 for non-matrix types).
    pub const fn column_len(self) -> usize {
        match self {
            ElementType::Mat2 => 2,
            ElementType::Mat3 => 3,
            ElementType::Mat4 => 4,
            _ => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ElementType::Scalar => "SCALAR",
            ElementType::Vec2 => "VEC2",
            ElementType::Vec3 => "VEC3",
            ElementType::Vec4 => "VEC4",
            ElementType::Mat2 => "MAT2",
            ElementType::Mat3 => "MAT3",
            ElementType::Mat4 => "MAT4",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_and_counts() {
        assert_eq!(ComponentType::Byte.size(), 1);
        assert_eq!(ComponentType::UnsignedShort.size(), 2);
        assert_eq!(ComponentType::UnsignedInt.size(), 4);
        assert_eq!(ComponentType::Float.size(), 4);

        let counts: Vec<_> = ["SCALAR", "VEC2", "VEC3", "VEC4", "MAT2", "MAT3", "MAT4"]
            .iter()
            .map(|n| ElementType::from_name(n).unwrap().component_count())
            .collect();
        assert_eq!(counts, [1, 2, 3, 4, 4, 9, 16]);
    }

    #[test]
    fn test_gl_codes() {
        for code in [5120, 5121, 5122, 5123, 5125, 5126] {
            assert_eq!(ComponentType::from_gl(code).unwrap().gl(), code);
        }
        assert_eq!(ComponentType::from_gl(5124), None);
        assert_eq!(ComponentType::from_gl(GL_DOUBLE), None);
    }

    #[test]
    fn test_read_little_endian() {
        let bytes = [0xFF, 0x01, 0x80, 0x00, 0x00, 0x00, 0x80, 0x3F];
        assert_eq!(ComponentType::Byte.read(&bytes, 0), -1.0);
        assert_eq!(ComponentType::UnsignedByte.read(&bytes, 0), 255.0);
        assert_eq!(ComponentType::UnsignedShort.read(&bytes, 0), 0x01FF as f64);
        assert_eq!(ComponentType::Short.read(&bytes, 2), 128.0);
        assert_eq!(ComponentType::Float.read(&bytes, 4), 1.0);
        assert_eq!(ComponentType::UnsignedInt.read(&bytes, 4), 0x3F80_0000 as f64);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(ComponentType::UnsignedByte.normalize(255.0), 1.0);
        assert_eq!(ComponentType::UnsignedShort.normalize(0.0), 0.0);
        assert_eq!(ComponentType::Byte.normalize(-128.0), -1.0);
        assert_eq!(ComponentType::Float.normalize(0.25), 0.25);
    }
}
