/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{CastlingRights, Color, PieceKind, Position, Rank, Square};

/// Keys for Zobrist hashing, generated once at compile time so they are stable between builds.
const ZOBRIST_TABLE: ZobristTable = ZobristTable::new();

/// A position fingerprint built by XOR-ing one random key per feature of a [`Position`].
///
/// Because XOR is its own inverse, moving a piece is a matter of hashing it out of its old square
/// and into its new one, rather than rehashing the whole board.
#[derive(Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct ZobristKey(u64);

impl ZobristKey {
    /// Computes the key of `position` from scratch.
    ///
    /// # Example
    /// ```
    /// # use newt::*;
    /// let pos = Position::default();
    /// assert_eq!(pos.key(), ZobristKey::new(&pos));
    /// assert_ne!(pos.key().inner(), 0);
    /// ```
    pub fn new(position: &Position) -> Self {
        let mut key = Self::default();

        for color in Color::all() {
            for kind in PieceKind::all() {
                for square in position.pieces(color, kind) {
                    key.hash_piece(square, color, kind);
                }
            }
        }

        key.hash_optional_ep_square(position.ep_square());
        key.hash_castling_rights(position.castling_rights());
        key.hash_side_to_move(position.side_to_move());

        key
    }

    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Adds/removes `hash_key` to this key.
    #[inline(always)]
    pub fn hash(&mut self, hash_key: u64) {
        self.0 ^= hash_key;
    }

    /// Adds/removes a piece of `color` and `kind` on `square`.
    #[inline(always)]
    pub fn hash_piece(&mut self, square: Square, color: Color, kind: PieceKind) {
        self.hash(ZOBRIST_TABLE.piece_keys[color][kind][square]);
    }

    /// Adds/removes an en passant target square.
    ///
    /// Only squares on ranks 3 and 6 carry a key; anything else is a no-op.
    #[inline(always)]
    pub fn hash_ep_square(&mut self, ep_square: Square) {
        self.hash(ZOBRIST_TABLE.ep_keys[ep_square]);
    }

    #[inline(always)]
    pub fn hash_optional_ep_square(&mut self, ep_square: Option<Square>) {
        if let Some(square) = ep_square {
            self.hash_ep_square(square);
        }
    }

    /// Adds/removes one key for the whole combination of castling rights.
    #[inline(always)]
    pub fn hash_castling_rights(&mut self, rights: CastlingRights) {
        self.hash(ZOBRIST_TABLE.castling_keys[rights.index()]);
    }

    /// Adds/removes the side-to-move key. White's key is 0.
    #[inline(always)]
    pub fn hash_side_to_move(&mut self, color: Color) {
        self.hash(ZOBRIST_TABLE.color_key[color]);
    }
}

impl fmt::Display for ZobristKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

struct ZobristTable {
    piece_keys: [[[u64; Square::COUNT]; PieceKind::COUNT]; Color::COUNT],
    ep_keys: [u64; Square::COUNT],
    castling_keys: [u64; CastlingRights::COUNT],
    color_key: [u64; Color::COUNT],
}

impl ZobristTable {
    const fn new() -> Self {
        let mut piece_keys = [[[0; Square::COUNT]; PieceKind::COUNT]; Color::COUNT];
        let mut ep_keys = [0; Square::COUNT];
        let mut castling_keys = [0; CastlingRights::COUNT];
        let mut color_key = [0; Color::COUNT];

        let mut prng = Xoshiro256::new();

        let mut c = 0;
        while c < Color::COUNT {
            let mut k = 0;
            while k < PieceKind::COUNT {
                let mut sq = 0;
                while sq < Square::COUNT {
                    let key;
                    (key, prng) = prng.next();
                    piece_keys[c][k][sq] = key;
                    sq += 1;
                }
                k += 1;
            }
            c += 1;
        }

        let mut sq = 0;
        while sq < Square::COUNT {
            let rank = Square::from_index_unchecked(sq).rank();
            if rank.0 == Rank::THREE.0 || rank.0 == Rank::SIX.0 {
                let key;
                (key, prng) = prng.next();
                ep_keys[sq] = key;
            }
            sq += 1;
        }

        let mut i = 0;
        while i < CastlingRights::COUNT {
            let key;
            (key, prng) = prng.next();
            castling_keys[i] = key;
            i += 1;
        }

        let (key, _) = prng.next();
        color_key[Color::Black.index()] = key;

        Self {
            piece_keys,
            ep_keys,
            castling_keys,
            color_key,
        }
    }
}

/// The `xoshiro256**` generator from <https://prng.di.unimi.it/xoshiro256starstar.c>, usable in `const` contexts.
struct Xoshiro256([u64; 4]);

impl Xoshiro256 {
    const SEEDS: [u64; 4] = [
        0x9E37_79B9_7F4A_7C15,
        0xD1B5_4A32_D192_ED03,
        0x8CB9_2BA7_2F3D_8DD7,
        0xF135_7AEA_2E62_A9C5,
    ];

    const fn new() -> Self {
        Self(Self::SEEDS)
    }

    /// Returns the next number in the sequence along with the advanced generator.
    const fn next(self) -> (u64, Self) {
        let mut s = self.0;
        let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = s[1] << 17;

        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];
        s[2] ^= t;
        s[3] = s[3].rotate_left(45);

        (result, Self(s))
    }
}
