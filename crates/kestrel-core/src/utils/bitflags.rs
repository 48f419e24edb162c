// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Declarative bitflag sets.
//!
//! The runtime carries several small flag words (feature properties, launch
//! options, suspend overrides, path lookup flags). They are declared with
//! [`kestrel_bitflags!`](crate::kestrel_bitflags), which generates a `Copy`
//! newtype with set operations, operator overloads and a readable `Debug`.

/// Declares a flag set over an unsigned integer.
///
/// ```
/// kestrel_core::kestrel_bitflags! {
///     /// Example flags.
///     pub struct Modes: u8 {
///         const FAST = 1 << 0;
///         const QUIET = 1 << 1;
///     }
/// }
///
/// let m = Modes::FAST | Modes::QUIET;
/// assert!(m.contains(Modes::QUIET));
/// assert_eq!(format!("{m:?}"), "Modes { FAST | QUIET }");
/// ```
#[macro_export]
macro_rules! kestrel_bitflags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$flag_attr:meta])*
                const $flag_name:ident = $flag_value:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            bits: $ty,
        }

        impl $name {
            /// The set with no flag raised.
            pub const EMPTY: Self = Self { bits: 0 };

            /// The union of every declared flag.
            pub const ALL: Self = Self { bits: 0 $(| $flag_value)* };

            $(
                $(#[$flag_attr])*
                pub const $flag_name: Self = Self { bits: $flag_value };
            )*

            /// Builds a set from raw bits, rejecting bits no flag declares.
            pub const fn from_bits(bits: $ty) -> Option<Self> {
                if bits & !Self::ALL.bits == 0 {
                    Some(Self { bits })
                } else {
                    None
                }
            }

            /// Builds a set from raw bits, dropping undeclared bits.
            pub const fn from_bits_truncate(bits: $ty) -> Self {
                Self { bits: bits & Self::ALL.bits }
            }

            /// Builds a set from raw bits, keeping undeclared bits as-is.
            pub const fn from_bits_retain(bits: $ty) -> Self {
                Self { bits }
            }

            /// Raw value.
            pub const fn bits(&self) -> $ty {
                self.bits
            }

            /// `true` when no bit is raised.
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }

            /// `true` when every flag of `other` is raised in `self`.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// `true` when at least one flag of `other` is raised in `self`.
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }

            /// Raises the flags of `other`.
            pub fn insert(&mut self, other: Self) {
                self.bits |= other.bits;
            }

            /// Clears the flags of `other`.
            pub fn remove(&mut self, other: Self) {
                self.bits &= !other.bits;
            }

            /// Raises or clears the flags of `other` depending on `value`.
            pub fn set(&mut self, other: Self, value: bool) {
                if value {
                    self.insert(other);
                } else {
                    self.remove(other);
                }
            }

            /// Copy of `self` with `other` raised.
            #[must_use]
            pub const fn with(mut self, other: Self) -> Self {
                self.bits |= other.bits;
                self
            }

            /// Copy of `self` with `other` cleared.
            #[must_use]
            pub const fn without(mut self, other: Self) -> Self {
                self.bits &= !other.bits;
                self
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, other: Self) -> Self {
                Self { bits: self.bits | other.bits }
            }
        }

        impl core::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, other: Self) -> Self {
                Self { bits: self.bits & other.bits }
            }
        }

        impl core::ops::Sub for $name {
            type Output = Self;
            fn sub(self, other: Self) -> Self {
                Self { bits: self.bits & !other.bits }
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, other: Self) {
                self.bits |= other.bits;
            }
        }

        impl core::ops::BitAndAssign for $name {
            fn bitand_assign(&mut self, other: Self) {
                self.bits &= other.bits;
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut rest = self.bits;
                let mut wrote_any = false;

                write!(f, "{} {{ ", stringify!($name))?;

                $(
                    let flag: $ty = $flag_value;
                    if flag != 0 && (rest & flag) == flag {
                        if wrote_any {
                            write!(f, " | ")?;
                        }
                        write!(f, "{}", stringify!($flag_name))?;
                        rest &= !flag;
                        wrote_any = true;
                    }
                )*

                if rest != 0 {
                    if wrote_any {
                        write!(f, " | ")?;
                    }
                    write!(f, "UNKNOWN({:#x})", rest)?;
                    wrote_any = true;
                }

                if !wrote_any {
                    write!(f, "EMPTY")?;
                }

                write!(f, " }}")
            }
        }
    };
}

#[cfg(test)]
mod tests {
    crate::kestrel_bitflags! {
        /// Flags used only by these tests.
        pub struct Lanes: u16 {
            const NORTH = 1 << 0;
            const EAST = 1 << 1;
            const SOUTH = 1 << 2;
            const WEST = 1 << 3;
            const VERTICAL = Self::NORTH.bits() | Self::SOUTH.bits();
        }
    }

    #[test]
    fn empty_set_formats_as_empty() {
        let lanes = Lanes::default();
        assert!(lanes.is_empty());
        assert_eq!(lanes, Lanes::EMPTY);
        assert!(lanes.contains(Lanes::EMPTY));
        assert_eq!(format!("{lanes:?}"), "Lanes { EMPTY }");
    }

    #[test]
    fn all_is_union_of_declared_flags() {
        assert_eq!(Lanes::ALL.bits(), 0b1111);
    }

    #[test]
    fn composite_constant_prints_its_parts() {
        assert!(Lanes::VERTICAL.contains(Lanes::NORTH));
        assert!(Lanes::VERTICAL.contains(Lanes::SOUTH));
        assert!(!Lanes::VERTICAL.intersects(Lanes::EAST | Lanes::WEST));
        assert_eq!(format!("{:?}", Lanes::VERTICAL), "Lanes { NORTH | SOUTH }");
    }

    #[test]
    fn from_bits_rejects_undeclared_bits() {
        assert_eq!(Lanes::from_bits(0b0101), Some(Lanes::VERTICAL));
        assert_eq!(Lanes::from_bits(0b1_0000), None);
        assert_eq!(Lanes::from_bits_truncate(0b1_0010), Lanes::EAST);
    }

    #[test]
    fn retained_unknown_bits_are_reported() {
        let lanes = Lanes::from_bits_retain(0b1_0001);
        assert_eq!(format!("{lanes:?}"), "Lanes { NORTH | UNKNOWN(0x10) }");
    }

    #[test]
    fn set_insert_and_remove() {
        let mut lanes = Lanes::EAST;
        lanes.insert(Lanes::WEST);
        assert_eq!(lanes.bits(), 0b1010);

        lanes.set(Lanes::EAST, false);
        assert_eq!(lanes, Lanes::WEST);

        lanes.set(Lanes::NORTH, true);
        lanes.remove(Lanes::WEST | Lanes::SOUTH);
        assert_eq!(lanes, Lanes::NORTH);
    }

    #[test]
    fn with_and_without_leave_the_receiver_alone() {
        let base = Lanes::NORTH;
        let wider = base.with(Lanes::EAST);
        assert_eq!(base, Lanes::NORTH);
        assert_eq!(wider.without(Lanes::NORTH), Lanes::EAST);
    }

    #[test]
    fn operators() {
        let a = Lanes::NORTH | Lanes::EAST;
        let b = Lanes::EAST | Lanes::SOUTH;
        assert_eq!(a & b, Lanes::EAST);
        assert_eq!(a - b, Lanes::NORTH);

        let mut c = a;
        c |= Lanes::WEST;
        c &= Lanes::WEST | Lanes::NORTH;
        assert_eq!(c, Lanes::NORTH | Lanes::WEST);
    }
}
