/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Precomputed and computed attack sets for every kind of piece.
mod attacks;

/// Bitboards, the 64-bit square sets that every other board type is built on.
mod bitboard;

/// Legal move generation and perft.
mod movegen;

/// Moves and move lists.
mod moves;

/// Colors, piece kinds, and pieces.
mod piece;

/// The board state: placements, castling, en passant, counters, and the Zobrist key.
mod position;

/// Squares, ranks, and files.
mod square;

/// Constants used throughout the board code.
mod utils;

/// Zobrist hashing of positions.
mod zobrist;

pub use attacks::*;
pub use bitboard::*;
pub use movegen::*;
pub use moves::*;
pub use piece::*;
pub use position::*;
pub use square::*;
pub use utils::*;
pub use zobrist::*;
