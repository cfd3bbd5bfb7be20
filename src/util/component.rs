//! Numeric component kinds - the storage widths buffers can be exchanged in.

use bytemuck::{Pod, Zeroable};
use half::f16;
use std::fmt;

/// Component type enum - the numeric width of one buffer element.
///
/// The host pipeline declares the width of every raw buffer it hands to
/// the codec; the codec reports the widths of the buffers it produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ComponentType {
    /// Unsigned 8-bit integer
    Uint8 = 1,
    /// Signed 8-bit integer
    Int8 = 2,
    /// Unsigned 16-bit integer
    Uint16 = 3,
    /// Signed 16-bit integer
    Int16 = 4,
    /// Unsigned 32-bit integer
    Uint32 = 5,
    /// Signed 32-bit integer
    Int32 = 6,
    /// Unsigned 64-bit integer
    Uint64 = 7,
    /// Signed 64-bit integer
    Int64 = 8,
    /// 16-bit floating point (IEEE 754 half precision)
    Float16 = 9,
    /// 32-bit floating point (IEEE 754 single precision)
    Float32 = 10,
    /// 64-bit floating point (IEEE 754 double precision)
    Float64 = 11,
    /// Unknown/invalid type (also stands in for extended precision floats)
    #[default]
    Unknown = 127,
}

impl ComponentType {
    /// Returns the size in bytes of a single element of this type.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Uint8 | Self::Int8 => 1,
            Self::Uint16 | Self::Int16 | Self::Float16 => 2,
            Self::Uint32 | Self::Int32 | Self::Float32 => 4,
            Self::Uint64 | Self::Int64 | Self::Float64 => 8,
            Self::Unknown => 0,
        }
    }

    /// Returns the name of this type as a string.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uint8 => "uint8_t",
            Self::Int8 => "int8_t",
            Self::Uint16 => "uint16_t",
            Self::Int16 => "int16_t",
            Self::Uint32 => "uint32_t",
            Self::Int32 => "int32_t",
            Self::Uint64 => "uint64_t",
            Self::Int64 => "int64_t",
            Self::Float16 => "float16_t",
            Self::Float32 => "float32_t",
            Self::Float64 => "float64_t",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parse a component type from its name string.
    pub fn from_name(name: &str) -> Self {
        match name {
            "uint8_t" => Self::Uint8,
            "int8_t" => Self::Int8,
            "uint16_t" => Self::Uint16,
            "int16_t" => Self::Int16,
            "uint32_t" => Self::Uint32,
            "int32_t" => Self::Int32,
            "uint64_t" => Self::Uint64,
            "int64_t" => Self::Int64,
            "float16_t" => Self::Float16,
            "float32_t" => Self::Float32,
            "float64_t" => Self::Float64,
            _ => Self::Unknown,
        }
    }

    /// Returns true if this is an integer type.
    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Uint8
                | Self::Int8
                | Self::Uint16
                | Self::Int16
                | Self::Uint32
                | Self::Int32
                | Self::Uint64
                | Self::Int64
        )
    }

    /// Returns true if this is a floating point type.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float16 | Self::Float32 | Self::Float64)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// === Component traits for type-safe buffers ===

/// Trait for scalars a point or cell buffer can be made of.
///
/// `Display` must produce text that parses back to the same value, which
/// holds for Rust's integer and float formatting (shortest round-trip form).
pub trait SwcComponent: Pod + Zeroable + Copy + Default + fmt::Display {
    /// The corresponding ComponentType enum value.
    const COMPONENT: ComponentType;

    /// Size of this type in bytes.
    const SIZE: usize = std::mem::size_of::<Self>();
}

/// Integer components usable as connectivity entries.
pub trait SwcIndex: SwcComponent {
    /// Convert to a point index, `None` for negative values.
    fn to_index(self) -> Option<u64>;
}

impl SwcComponent for u8 {
    const COMPONENT: ComponentType = ComponentType::Uint8;
}

impl SwcComponent for i8 {
    const COMPONENT: ComponentType = ComponentType::Int8;
}

impl SwcComponent for u16 {
    const COMPONENT: ComponentType = ComponentType::Uint16;
}

impl SwcComponent for i16 {
    const COMPONENT: ComponentType = ComponentType::Int16;
}

impl SwcComponent for u32 {
    const COMPONENT: ComponentType = ComponentType::Uint32;
}

impl SwcComponent for i32 {
    const COMPONENT: ComponentType = ComponentType::Int32;
}

impl SwcComponent for u64 {
    const COMPONENT: ComponentType = ComponentType::Uint64;
}

impl SwcComponent for i64 {
    const COMPONENT: ComponentType = ComponentType::Int64;
}

impl SwcComponent for f16 {
    const COMPONENT: ComponentType = ComponentType::Float16;
}

impl SwcComponent for f32 {
    const COMPONENT: ComponentType = ComponentType::Float32;
}

impl SwcComponent for f64 {
    const COMPONENT: ComponentType = ComponentType::Float64;
}

macro_rules! impl_swc_index {
    ($($t:ty),*) => {
        $(
            impl SwcIndex for $t {
                #[inline]
                fn to_index(self) -> Option<u64> {
                    u64::try_from(self).ok()
                }
            }
        )*
    };
}

impl_swc_index!(u8, i8, u16, i16, u32, i32, u64, i64);

/// Run `$body` with `$t` bound to the Rust scalar for a runtime
/// [`ComponentType`]; `$fallback` handles kinds without one.
macro_rules! dispatch_component {
    ($kind:expr, $t:ident => $body:expr, else $fallback:expr) => {
        match $kind {
            $crate::util::ComponentType::Uint8 => { type $t = u8; $body }
            $crate::util::ComponentType::Int8 => { type $t = i8; $body }
            $crate::util::ComponentType::Uint16 => { type $t = u16; $body }
            $crate::util::ComponentType::Int16 => { type $t = i16; $body }
            $crate::util::ComponentType::Uint32 => { type $t = u32; $body }
            $crate::util::ComponentType::Int32 => { type $t = i32; $body }
            $crate::util::ComponentType::Uint64 => { type $t = u64; $body }
            $crate::util::ComponentType::Int64 => { type $t = i64; $body }
            $crate::util::ComponentType::Float16 => { type $t = half::f16; $body }
            $crate::util::ComponentType::Float32 => { type $t = f32; $body }
            $crate::util::ComponentType::Float64 => { type $t = f64; $body }
            $crate::util::ComponentType::Unknown => $fallback,
        }
    };
}

/// Like [`dispatch_component`] but restricted to integer kinds.
macro_rules! dispatch_index {
    ($kind:expr, $t:ident => $body:expr, else $fallback:expr) => {
        match $kind {
            $crate::util::ComponentType::Uint8 => { type $t = u8; $body }
            $crate::util::ComponentType::Int8 => { type $t = i8; $body }
            $crate::util::ComponentType::Uint16 => { type $t = u16; $body }
            $crate::util::ComponentType::Int16 => { type $t = i16; $body }
            $crate::util::ComponentType::Uint32 => { type $t = u32; $body }
            $crate::util::ComponentType::Int32 => { type $t = i32; $body }
            $crate::util::ComponentType::Uint64 => { type $t = u64; $body }
            $crate::util::ComponentType::Int64 => { type $t = i64; $body }
            _ => $fallback,
        }
    };
}

pub(crate) use dispatch_component;
pub(crate) use dispatch_index;
