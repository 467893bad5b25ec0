/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Not};

use super::{Color, File, Rank, Square};

/// A [`Bitboard`] represents a set of squares as the bits of a `u64`.
///
/// The internal encoding uses [Little-Endian Rank-File Mapping (LERF)](https://www.chessprogramming.org/Square_Mapping_Considerations#Little-Endian_Rank-File_Mapping):
/// bit index 0 is a1, bit index 63 is h8. So a bitboard of the first rank looks like this:
/// ```text
/// 00000000
/// 00000000
/// 00000000
/// 00000000
/// 00000000
/// 00000000
/// 00000000
/// 11111111
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Bitboard(pub(crate) u64);

impl Bitboard {
    pub const FILE_A: Self = Self(0x0101010101010101);
    pub const FILE_H: Self = Self(0x8080808080808080);
    pub const FILE_AB: Self = Self(0x0303030303030303);
    pub const FILE_GH: Self = Self(0xC0C0C0C0C0C0C0C0);
    pub const NOT_FILE_A: Self = Self(!Self::FILE_A.0);
    pub const NOT_FILE_H: Self = Self(!Self::FILE_H.0);
    pub const NOT_FILE_AB: Self = Self(!Self::FILE_AB.0);
    pub const NOT_FILE_GH: Self = Self(!Self::FILE_GH.0);
    pub const RANK_1: Self = Self(0x00000000000000FF);
    pub const RANK_8: Self = Self(0xFF00000000000000);
    pub const EMPTY_BOARD: Self = Self(0);
    pub const FULL_BOARD: Self = Self(u64::MAX);

    /// Constructs a new [`Bitboard`] from the provided bit pattern.
    #[inline(always)]
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Constructs a new [`Bitboard`] with only the bit of `square` set.
    ///
    /// # Example
    /// ```
    /// # use newt::{Bitboard, Square};
    /// assert_eq!(Bitboard::from_square(Square::H8).inner(), 0x8000000000000000);
    /// ```
    #[inline(always)]
    pub const fn from_square(square: Square) -> Self {
        Self(1 << square.0)
    }

    /// Constructs a new [`Bitboard`] with an entire column of bits set.
    #[inline(always)]
    pub const fn from_file(file: File) -> Self {
        Self(Self::FILE_A.0 << file.0)
    }

    /// Constructs a new [`Bitboard`] with an entire row of bits set.
    #[inline(always)]
    pub const fn from_rank(rank: Rank) -> Self {
        Self(Self::RANK_1.0 << (rank.0 * 8))
    }

    /// The back rank relative to `color`.
    #[inline(always)]
    pub const fn first_rank(color: Color) -> Self {
        Self::from_rank(Rank::first(color))
    }

    /// The promotion rank relative to `color`.
    #[inline(always)]
    pub const fn eighth_rank(color: Color) -> Self {
        Self::from_rank(Rank::eighth(color))
    }

    /// Returns the inner `u64` of this [`Bitboard`].
    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub const fn is_nonempty(&self) -> bool {
        self.0 != 0
    }

    /// Returns `true` if `self` and `other` share at least one set bit.
    #[inline(always)]
    pub fn intersects(&self, other: impl Into<Self>) -> bool {
        self.0 & other.into().0 != 0
    }

    /// Returns `true` if all of `self`'s set bits are also set in `other`.
    #[inline(always)]
    pub fn is_subset(&self, other: impl Into<Self>) -> bool {
        self.0 & !other.into().0 == 0
    }

    /// Sets the bit(s) of `other`.
    #[inline(always)]
    pub fn set(&mut self, other: impl Into<Self>) {
        *self |= other.into()
    }

    /// Clears the bit(s) of `other`.
    #[inline(always)]
    pub fn clear(&mut self, other: impl Into<Self>) {
        *self &= !other.into()
    }

    /// Yields the number of set bits.
    #[inline(always)]
    pub const fn population(&self) -> u8 {
        self.0.count_ones() as u8
    }

    /// The lowest set bit, as a [`Square`], if any.
    #[inline(always)]
    pub const fn lsb(&self) -> Option<Square> {
        if self.is_empty() {
            None
        } else {
            Some(Square(self.0.trailing_zeros() as u8))
        }
    }

    /// The lowest set bit, as a [`Square`].
    ///
    /// The result is meaningless if `self` is empty.
    #[inline(always)]
    pub const fn to_square_unchecked(&self) -> Square {
        Square::from_index_unchecked(self.0.trailing_zeros() as usize)
    }

    /// Pops the lowest set bit and returns it as a [`Square`].
    #[inline(always)]
    pub fn pop_lsb(&mut self) -> Option<Square> {
        let lsb = self.lsb();
        self.0 &= self.0.wrapping_sub(1);
        lsb
    }

    /// Iterates the set bits as [`Square`]s, lowest first.
    #[inline(always)]
    pub const fn iter(&self) -> BitboardIter {
        BitboardIter { bitboard: *self }
    }

    /// Shifts every bit one rank toward the opponent of `color`.
    ///
    /// Bits on the last rank fall off the board.
    #[inline(always)]
    pub const fn forward(self, color: Color) -> Self {
        match color {
            Color::White => Self(self.0 << 8),
            Color::Black => Self(self.0 >> 8),
        }
    }

    #[inline(always)]
    pub const fn and(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[inline(always)]
    pub const fn or(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline(always)]
    pub const fn xor(self, other: Self) -> Self {
        Self(self.0 ^ other.0)
    }

    #[inline(always)]
    pub const fn not(self) -> Self {
        Self(!self.0)
    }
}

macro_rules! impl_bitwise_op {
    ($op:tt, $op_assign:tt, $func:ident, $func_assign:ident) => {
        impl<T> std::ops::$op<T> for Bitboard
        where
            Self: From<T>,
        {
            type Output = Self;
            #[inline(always)]
            fn $func(self, rhs: T) -> Self::Output {
                Self(self.0.$func(Self::from(rhs).0))
            }
        }

        impl<T> std::ops::$op_assign<T> for Bitboard
        where
            Self: From<T>,
        {
            #[inline(always)]
            fn $func_assign(&mut self, rhs: T) {
                self.0.$func_assign(Self::from(rhs).0);
            }
        }
    };
}

impl_bitwise_op!(BitAnd, BitAndAssign, bitand, bitand_assign);
impl_bitwise_op!(BitOr, BitOrAssign, bitor, bitor_assign);
impl_bitwise_op!(BitXor, BitXorAssign, bitxor, bitxor_assign);

impl Not for Bitboard {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl From<Square> for Bitboard {
    #[inline(always)]
    fn from(value: Square) -> Self {
        Self::from_square(value)
    }
}

impl From<u64> for Bitboard {
    #[inline(always)]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl<T> From<Option<T>> for Bitboard
where
    Self: From<T>,
{
    #[inline(always)]
    fn from(value: Option<T>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

impl FromIterator<Square> for Bitboard {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::EMPTY_BOARD, |bb, square| bb | square)
    }
}

impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut board = String::with_capacity(136);

        for rank in Rank::iter().rev() {
            for file in File::iter() {
                let occupant = if self.intersects(Square::new(file, rank)) {
                    'X'
                } else {
                    '.'
                };

                board.push(occupant);
                board.push(' ');
            }
            board.push('\n');
        }

        write!(f, "{board}")
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}\n{self}", self.0)
    }
}

/// An iterator over all set bits in a [`Bitboard`].
///
/// See [`Bitboard::iter`].
pub struct BitboardIter {
    bitboard: Bitboard,
}

impl Iterator for BitboardIter {
    type Item = Square;
    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.bitboard.pop_lsb()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.bitboard.population() as usize;
        (size, Some(size))
    }
}

impl ExactSizeIterator for BitboardIter {}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;
    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        BitboardIter { bitboard: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitboard_to_string() {
        let board = Bitboard::from_rank(Rank::TWO) | Bitboard::from_file(File::C);
        let expected = ". . X . . . . . \n\
                        . . X . . . . . \n\
                        . . X . . . . . \n\
                        . . X . . . . . \n\
                        . . X . . . . . \n\
                        . . X . . . . . \n\
                        X X X X X X X X \n\
                        . . X . . . . . \n";
        assert_eq!(board.to_string(), expected);
    }

    #[test]
    fn test_bitboard_masks() {
        assert_eq!(Bitboard::FILE_A ^ Bitboard::FULL_BOARD, Bitboard::NOT_FILE_A);
        assert_eq!(
            Bitboard::from_file(File::A) | Bitboard::from_file(File::B),
            Bitboard::FILE_AB
        );
        assert_eq!(
            Bitboard::from_file(File::G) | Bitboard::from_file(File::H),
            Bitboard::FILE_GH
        );
        assert_eq!(Bitboard::first_rank(Color::Black), Bitboard::RANK_8);
        assert_eq!(Bitboard::eighth_rank(Color::Black), Bitboard::RANK_1);
    }

    #[test]
    fn test_bitboard_iter() {
        let board = Bitboard::from_square(Square::A1) | Square::E4 | Square::H8;
        let squares = board.iter().collect::<Vec<_>>();
        assert_eq!(squares, [Square::A1, Square::E4, Square::H8]);
        assert_eq!(board.iter().len(), 3);
        assert_eq!(squares.into_iter().collect::<Bitboard>(), board);
    }

    #[test]
    fn test_bitboard_forward() {
        let rank2 = Bitboard::from_rank(Rank::TWO);
        assert_eq!(rank2.forward(Color::White), Bitboard::from_rank(Rank::THREE));
        assert_eq!(rank2.forward(Color::Black), Bitboard::RANK_1);
        assert_eq!(Bitboard::RANK_8.forward(Color::White), Bitboard::EMPTY_BOARD);
    }
}
