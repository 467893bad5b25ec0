/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{Bitboard, Color, PieceKind, Square};

/// One of the eight compass directions a slider can travel in.
///
/// Positive directions move toward higher square indices (h8); negative ones toward a1.
/// The direction at `d + 4` is always the opposite of the one at `d`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Direction {
    North,
    East,
    NorthEast,
    NorthWest,
    South,
    West,
    SouthWest,
    SouthEast,
}

impl Direction {
    pub const COUNT: usize = 8;

    /// Every direction, positive ones first.
    pub const ALL: [Self; Self::COUNT] = [
        Self::North,
        Self::East,
        Self::NorthEast,
        Self::NorthWest,
        Self::South,
        Self::West,
        Self::SouthWest,
        Self::SouthEast,
    ];

    /// `(file, rank)` step for this direction.
    #[inline(always)]
    pub const fn delta(&self) -> (i8, i8) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::NorthEast => (1, 1),
            Self::NorthWest => (-1, 1),
            Self::South => (0, -1),
            Self::West => (-1, 0),
            Self::SouthWest => (-1, -1),
            Self::SouthEast => (1, -1),
        }
    }

    /// Whether travelling in this direction increases the square index.
    #[inline(always)]
    pub const fn is_positive(&self) -> bool {
        (*self as u8) < 4
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

/// Empty-board rays from every square, in every direction. The origin square is excluded.
const RAYS: [[Bitboard; Square::COUNT]; Direction::COUNT] = {
    let mut rays = [[Bitboard::EMPTY_BOARD; Square::COUNT]; Direction::COUNT];

    let mut d = 0;
    while d < Direction::COUNT {
        let (df, dr) = Direction::ALL[d].delta();
        let mut i = 0;
        while i < Square::COUNT {
            let mut ray = Bitboard::EMPTY_BOARD;
            let mut to = Square::from_index_unchecked(i);

            while let Some(shifted) = to.offset(df, dr) {
                ray = ray.or(shifted.bitboard());
                to = shifted;
            }

            rays[d][i] = ray;
            i += 1;
        }
        d += 1;
    }

    rays
};

/// A table indexed by two squares that returns the squares strictly between them, if they share a line.
const RAY_BETWEEN: [[Bitboard; Square::COUNT]; Square::COUNT] = {
    let mut between = [[Bitboard::EMPTY_BOARD; Square::COUNT]; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let from = Square::from_index_unchecked(i);
        let mut d = 0;
        while d < Direction::COUNT {
            let (df, dr) = Direction::ALL[d].delta();
            let mut ray = Bitboard::EMPTY_BOARD;
            let mut to = from;

            while let Some(shifted) = to.offset(df, dr) {
                between[i][shifted.index()] = ray;
                ray = ray.or(shifted.bitboard());
                to = shifted;
            }

            d += 1;
        }
        i += 1;
    }

    between
};

/// A table indexed by two squares that returns the full line (edge to edge) through both of them, if they share one.
const RAY_CONTAINING: [[Bitboard; Square::COUNT]; Square::COUNT] = {
    let mut containing = [[Bitboard::EMPTY_BOARD; Square::COUNT]; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let from = Square::from_index_unchecked(i);
        // Each positive direction is paired with its opposite at `d + 4`
        let mut d = 0;
        while d < 4 {
            let line = RAYS[d][i].or(RAYS[d + 4][i]).or(from.bitboard());
            let mut ray = line.inner();

            while ray != 0 {
                let j = ray.trailing_zeros() as usize;
                containing[i][j] = line;
                ray &= ray - 1;
            }

            d += 1;
        }
        i += 1;
    }

    containing
};

/// Applies a shift function to every square of the board, building a lookup table.
macro_rules! generate_leaper_table {
    ($shifts:ident) => {{
        let mut table = [Bitboard::EMPTY_BOARD; Square::COUNT];

        let mut i = 0;
        while i < Square::COUNT {
            table[i] = $shifts(Square::from_index_unchecked(i).bitboard());
            i += 1;
        }

        table
    }};
}

const KING_ATTACKS: [Bitboard; Square::COUNT] = generate_leaper_table!(king_shifts);
const KNIGHT_ATTACKS: [Bitboard; Square::COUNT] = generate_leaper_table!(knight_shifts);
const WHITE_PAWN_ATTACKS: [Bitboard; Square::COUNT] = generate_leaper_table!(white_pawn_shifts);
const BLACK_PAWN_ATTACKS: [Bitboard; Square::COUNT] = generate_leaper_table!(black_pawn_shifts);

/// King attacks of every bit in `bb`.
///
/// Sources on file a are masked out before shifting west, and sources on file h before shifting east,
/// so nothing wraps around to the other side of the board.
pub const fn king_shifts(bb: Bitboard) -> Bitboard {
    let b = bb.inner();
    let not_a = b & Bitboard::NOT_FILE_A.inner();
    let not_h = b & Bitboard::NOT_FILE_H.inner();

    Bitboard::new(
        b << 8 | b >> 8 | not_h << 1 | not_a >> 1 | not_h << 9 | not_a << 7 | not_h >> 7 | not_a >> 9,
    )
}

/// Knight attacks of every bit in `bb`.
///
/// One-file jumps mask file a/h beforehand; two-file jumps mask files a+b / g+h.
pub const fn knight_shifts(bb: Bitboard) -> Bitboard {
    let b = bb.inner();
    let not_a = b & Bitboard::NOT_FILE_A.inner();
    let not_h = b & Bitboard::NOT_FILE_H.inner();
    let not_ab = b & Bitboard::NOT_FILE_AB.inner();
    let not_gh = b & Bitboard::NOT_FILE_GH.inner();

    Bitboard::new(
        not_h << 17
            | not_a << 15
            | not_gh << 10
            | not_ab << 6
            | not_gh >> 6
            | not_ab >> 10
            | not_h >> 15
            | not_a >> 17,
    )
}

/// Squares attacked by every White pawn in `bb`.
pub const fn white_pawn_shifts(bb: Bitboard) -> Bitboard {
    let b = bb.inner();
    Bitboard::new((b & Bitboard::NOT_FILE_A.inner()) << 7 | (b & Bitboard::NOT_FILE_H.inner()) << 9)
}

/// Squares attacked by every Black pawn in `bb`.
pub const fn black_pawn_shifts(bb: Bitboard) -> Bitboard {
    let b = bb.inner();
    Bitboard::new((b & Bitboard::NOT_FILE_H.inner()) >> 7 | (b & Bitboard::NOT_FILE_A.inner()) >> 9)
}

/// Fetches the empty-board ray leaving `square` in `direction`.
#[inline(always)]
pub const fn ray(square: Square, direction: Direction) -> Bitboard {
    RAYS[direction.index()][square.index()]
}

/// Computes the squares a slider on `square` reaches in `direction`, stopping at (and including) the first blocker.
///
/// If nothing blocks the ray, it is returned whole.
#[inline(always)]
pub const fn ray_attacks(square: Square, blockers: Bitboard, direction: Direction) -> Bitboard {
    let full = ray(square, direction);
    let blocking = full.inner() & blockers.inner();

    if blocking == 0 {
        return full;
    }

    let nearest = if direction.is_positive() {
        blocking.trailing_zeros()
    } else {
        63 - blocking.leading_zeros()
    };

    // Everything past the blocker is exactly the blocker's own ray in the same direction
    full.xor(RAYS[direction.index()][nearest as usize])
}

/// Fetches a [`Bitboard`] with all of the bits along the ray between `from` and `to` (exclusive) set.
///
/// # Example
/// ```
/// # use newt::*;
/// let between = ray_between(Square::A1, Square::A4);
/// assert_eq!(between, Bitboard::from_square(Square::A2) | Square::A3);
/// ```
#[inline(always)]
pub const fn ray_between(from: Square, to: Square) -> Bitboard {
    RAY_BETWEEN[from.index()][to.index()]
}

/// Fetches a [`Bitboard`] of the whole line through `from` and `to`, or an empty board if they are not aligned.
#[inline(always)]
pub const fn ray_containing(from: Square, to: Square) -> Bitboard {
    RAY_CONTAINING[from.index()][to.index()]
}

/// Computes the squares a Rook on `square` attacks, given `blockers`.
pub const fn rook_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    ray_attacks(square, blockers, Direction::North)
        .or(ray_attacks(square, blockers, Direction::East))
        .or(ray_attacks(square, blockers, Direction::South))
        .or(ray_attacks(square, blockers, Direction::West))
}

/// Computes the squares a Bishop on `square` attacks, given `blockers`.
pub const fn bishop_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    ray_attacks(square, blockers, Direction::NorthEast)
        .or(ray_attacks(square, blockers, Direction::NorthWest))
        .or(ray_attacks(square, blockers, Direction::SouthEast))
        .or(ray_attacks(square, blockers, Direction::SouthWest))
}

/// A Queen attacks the union of a Rook and a Bishop on the same square.
#[inline(always)]
pub const fn queen_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    rook_attacks(square, blockers).or(bishop_attacks(square, blockers))
}

/// Unblocked Rook rays from `square`.
#[inline(always)]
pub const fn rook_rays(square: Square) -> Bitboard {
    rook_attacks(square, Bitboard::EMPTY_BOARD)
}

/// Unblocked Bishop rays from `square`.
#[inline(always)]
pub const fn bishop_rays(square: Square) -> Bitboard {
    bishop_attacks(square, Bitboard::EMPTY_BOARD)
}

#[inline(always)]
pub const fn knight_attacks(square: Square) -> Bitboard {
    KNIGHT_ATTACKS[square.index()]
}

#[inline(always)]
pub const fn king_attacks(square: Square) -> Bitboard {
    KING_ATTACKS[square.index()]
}

/// Diagonal captures for a pawn of `color` on `square`. Pushes are not attacks.
#[inline(always)]
pub const fn pawn_attacks(square: Square, color: Color) -> Bitboard {
    match color {
        Color::White => WHITE_PAWN_ATTACKS[square.index()],
        Color::Black => BLACK_PAWN_ATTACKS[square.index()],
    }
}

/// Pseudo-legal attacks for a `kind` of `color` on `square`, given `blockers`.
///
/// For Pawns this is only their captures, since a push can never threaten a square.
#[inline(always)]
pub const fn attacks_for(kind: PieceKind, color: Color, square: Square, blockers: Bitboard) -> Bitboard {
    match kind {
        PieceKind::Pawn => pawn_attacks(square, color),
        PieceKind::Knight => knight_attacks(square),
        PieceKind::Bishop => bishop_attacks(square, blockers),
        PieceKind::Rook => rook_attacks(square, blockers),
        PieceKind::Queen => queen_attacks(square, blockers),
        PieceKind::King => king_attacks(square),
    }
}
