//! Wire value primitives.
//!
//! Every event delivered to the decoder is a `(PathKey, Value)` pair. The
//! closed set of variants below is the whole wire vocabulary; both carriers
//! (tree-structured textual and flat binary) produce exactly these.

/// Byte-order tag of the flat binary carrier.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub enum ByteOrder {
    /// Detect from the stream preamble.
    #[default]
    Auto,
    Big,
    Little,
}

/// 8-bit-per-channel RGBA color.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

/// 3×3 affine transform, row-major.
#[derive(Clone, Copy, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct Matrix3(pub [f32; 9]);

impl Matrix3 {
    pub const IDENTITY: Self = Self([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    /// Build from a raw float array as produced by the binary carrier.
    /// Returns `None` unless the slice holds exactly nine elements.
    pub fn from_floats(floats: &[f32]) -> Option<Self> {
        let arr: [f32; 9] = floats.try_into().ok()?;
        Some(Self(arr))
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Name of a wire primitive type, for schema errors and diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WireType {
    Bool,
    Color,
    U8,
    U16,
    U32,
    U64,
    I16,
    I32,
    F32,
    F64,
    F32Array,
    F64Array,
    U16Array,
    Matrix,
    Bytes,
    Id,
    OwnerRef,
}

impl std::fmt::Display for WireType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Color => "color",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::F32Array => "f32 array",
            Self::F64Array => "f64 array",
            Self::U16Array => "u16 array",
            Self::Matrix => "matrix",
            Self::Bytes => "bytes",
            Self::Id => "id string",
            Self::OwnerRef => "owner-ref string",
        };
        f.write_str(name)
    }
}

/// A wire value: the payload half of one decode event.
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Bool(bool),
    Color(Rgba),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I16(i16),
    I32(i32),
    F32(f32),
    F64(f64),
    F32Array(Vec<f32>),
    F64Array(Vec<f64>),
    U16Array(Vec<u16>),
    Matrix(Matrix3),
    Bytes(Vec<u8>),
    /// Identifier string, interned per category by the decoder.
    Id(String),
    /// Owner-reference string, passed through to the consumer uninterned.
    OwnerRef(String),
}

impl Value {
    /// The wire type of this value.
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Bool(_) => WireType::Bool,
            Self::Color(_) => WireType::Color,
            Self::U8(_) => WireType::U8,
            Self::U16(_) => WireType::U16,
            Self::U32(_) => WireType::U32,
            Self::U64(_) => WireType::U64,
            Self::I16(_) => WireType::I16,
            Self::I32(_) => WireType::I32,
            Self::F32(_) => WireType::F32,
            Self::F64(_) => WireType::F64,
            Self::F32Array(_) => WireType::F32Array,
            Self::F64Array(_) => WireType::F64Array,
            Self::U16Array(_) => WireType::U16Array,
            Self::Matrix(_) => WireType::Matrix,
            Self::Bytes(_) => WireType::Bytes,
            Self::Id(_) => WireType::Id,
            Self::OwnerRef(_) => WireType::OwnerRef,
        }
    }
}
