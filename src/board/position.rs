/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};

use super::{
    attacks::*, Bitboard, Color, File, Move, MoveKind, Piece, PieceKind, Rank, Square,
    ZobristKey, FEN_STARTPOS,
};

/// The four castling permissions, stored as bit flags.
///
/// The flags double as an index in `[0, 15]` for Zobrist hashing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const WHITE_SHORT: Self = Self(0b0001);
    pub const WHITE_LONG: Self = Self(0b0010);
    pub const BLACK_SHORT: Self = Self(0b0100);
    pub const BLACK_LONG: Self = Self(0b1000);
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b1111);

    /// Number of possible combinations of castling rights.
    pub const COUNT: usize = 16;

    #[inline(always)]
    pub const fn short(color: Color) -> Self {
        [Self::WHITE_SHORT, Self::BLACK_SHORT][color.index()]
    }

    #[inline(always)]
    pub const fn long(color: Color) -> Self {
        [Self::WHITE_LONG, Self::BLACK_LONG][color.index()]
    }

    #[inline(always)]
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Drops whichever rights depend on a King or Rook still standing on `square`.
    #[inline(always)]
    fn touch(&mut self, square: Square) {
        let lost = match square {
            Square::E1 => Self::WHITE_SHORT.0 | Self::WHITE_LONG.0,
            Square::H1 => Self::WHITE_SHORT.0,
            Square::A1 => Self::WHITE_LONG.0,
            Square::E8 => Self::BLACK_SHORT.0 | Self::BLACK_LONG.0,
            Square::H8 => Self::BLACK_SHORT.0,
            Square::A8 => Self::BLACK_LONG.0,
            _ => 0,
        };

        self.0 &= !lost;
    }

    /// Parses the castling field of a FEN string: any combination of `KQkq`, or `-`.
    pub fn from_uci(castling: &str) -> Result<Self> {
        if castling == "-" {
            return Ok(Self::NONE);
        }

        castling.chars().try_fold(Self::NONE, |rights, c| {
            let flag = match c {
                'K' => Self::WHITE_SHORT,
                'Q' => Self::WHITE_LONG,
                'k' => Self::BLACK_SHORT,
                'q' => Self::BLACK_LONG,
                _ => bail!("Invalid castling rights {castling:?}: Unexpected char {c:?}"),
            };

            if rights.contains(flag) {
                bail!("Invalid castling rights {castling:?}: Duplicate char {c:?}");
            }

            Ok(Self(rights.0 | flag.0))
        })
    }

    /// Renders these rights as they appear in a FEN string.
    pub fn to_uci(&self) -> String {
        let castling = [
            (Self::WHITE_SHORT, 'K'),
            (Self::WHITE_LONG, 'Q'),
            (Self::BLACK_SHORT, 'k'),
            (Self::BLACK_LONG, 'q'),
        ]
        .into_iter()
        .filter_map(|(flag, c)| self.contains(flag).then_some(c))
        .collect::<String>();

        if castling.is_empty() {
            String::from("-")
        } else {
            castling
        }
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl fmt::Debug for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// A chess position: piece placements plus all of the state needed to continue the game.
///
/// Positions are values. Making a move produces a new [`Position`] and leaves the original untouched,
/// so a search can hold on to every ancestor of the current node without bookkeeping.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// One [`Bitboard`] per piece kind, per color.
    pieces: [[Bitboard; PieceKind::COUNT]; Color::COUNT],

    /// Union of each color's pieces, kept in sync with `pieces`.
    colors: [Bitboard; Color::COUNT],

    side_to_move: Color,

    castling_rights: CastlingRights,

    /// The square a pawn skipped over on the previous move, if that move was a double push.
    ep_square: Option<Square>,

    /// Plies since the last capture or pawn move.
    halfmove: usize,

    /// Starts at 1 and increments after Black moves.
    fullmove: usize,

    /// Incrementally maintained fingerprint of everything above except the move counters.
    key: ZobristKey,
}

impl Position {
    /// An empty board with White to move.
    fn empty() -> Self {
        Self {
            pieces: [[Bitboard::EMPTY_BOARD; PieceKind::COUNT]; Color::COUNT],
            colors: [Bitboard::EMPTY_BOARD; Color::COUNT],
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            ep_square: None,
            halfmove: 0,
            fullmove: 1,
            key: ZobristKey::default(),
        }
    }

    /// The standard starting position.
    ///
    /// # Example
    /// ```
    /// # use newt::*;
    /// assert_eq!(Position::startpos().to_fen(), FEN_STARTPOS);
    /// ```
    pub fn startpos() -> Self {
        let mut pos = Self::empty();

        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        for color in Color::all() {
            for (file, kind) in File::iter().zip(back_rank) {
                pos.place(color, kind, Square::new(file, Rank::first(color)));
                pos.place(color, PieceKind::Pawn, Square::new(file, Rank::second(color)));
            }
        }

        pos.castling_rights = CastlingRights::ALL;
        pos.key = ZobristKey::new(&pos);
        pos
    }

    /// Parses a [FEN](https://www.chessprogramming.org/Forsyth-Edwards_Notation) string.
    ///
    /// Only the placements are required; missing trailing fields default to `w - - 0 1`.
    /// Each side must have exactly one King, and no Pawns may stand on the first or last rank.
    ///
    /// # Example
    /// ```
    /// # use newt::*;
    /// let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 3 40").unwrap();
    /// assert_eq!(pos.side_to_move(), Color::Black);
    /// assert!(Position::from_fen("4k3/8/8/8/8/8/8/8 w - - 0 1").is_err());
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut pos = Self::empty();
        let mut split = fen.split_whitespace();

        let placements = split
            .next()
            .ok_or_else(|| anyhow!("FEN string must have piece placements."))?;
        pos.parse_placements(placements)
            .with_context(|| format!("Invalid FEN {fen:?}"))?;

        let active_color = split.next().unwrap_or("w");
        pos.side_to_move = match active_color {
            "w" => Color::White,
            "b" => Color::Black,
            _ => bail!("FEN side-to-move must be 'w' or 'b'. Got {active_color:?}"),
        };

        let castling = split.next().unwrap_or("-");
        pos.castling_rights = CastlingRights::from_uci(castling)?;

        let en_passant_target = split.next().unwrap_or("-");
        pos.ep_square = match en_passant_target {
            "-" => None,
            square => {
                let square = Square::from_uci(square)?;
                let expected = if pos.side_to_move.is_white() {
                    Rank::SIX
                } else {
                    Rank::THREE
                };
                if square.rank() != expected {
                    bail!("FEN en passant square {square} is on the wrong rank for {} to move", pos.side_to_move.name());
                }
                pos.validate_ep_square(square)?;
                Some(square)
            }
        };

        let halfmove = split.next().unwrap_or("0");
        pos.halfmove = halfmove.parse().map_err(|_| {
            anyhow!("FEN string must have valid halfmove counter. Got {halfmove:?}")
        })?;

        let fullmove = split.next().unwrap_or("1");
        pos.fullmove = fullmove.parse().map_err(|_| {
            anyhow!("FEN string must have valid fullmove counter. Got {fullmove:?}")
        })?;

        if let Some(extra) = split.next() {
            bail!("FEN string has unexpected trailing field {extra:?}");
        }

        pos.key = ZobristKey::new(&pos);

        Ok(pos)
    }

    /// Ensures a double push could actually have left `ep` behind: the target and the pawn's origin are empty,
    /// and the pushed pawn stands just past the target.
    fn validate_ep_square(&self, ep: Square) -> Result<()> {
        let pusher = self.side_to_move.opponent();

        // The rank was checked already, so both neighbours exist
        let (Some(pawn), Some(origin)) = (ep.backward_by(self.side_to_move, 1), ep.forward_by(self.side_to_move, 1))
        else {
            bail!("FEN en passant square {ep} has no pawn behind it");
        };

        if self.occupied().intersects(ep) || self.occupied().intersects(origin) {
            bail!("FEN en passant square {ep} requires {ep} and {origin} to be empty");
        }

        if !self.pieces(pusher, PieceKind::Pawn).intersects(pawn) {
            bail!("FEN en passant square {ep} requires a {} pawn on {pawn}", pusher.name());
        }

        Ok(())
    }

    /// Places the pieces from the first FEN field onto this (empty) position.
    fn parse_placements(&mut self, placements: &str) -> Result<()> {
        let ranks = placements.split('/').collect::<Vec<_>>();
        if ranks.len() != Rank::COUNT {
            bail!("FEN must have piece placements for all 8 ranks. Got {}", ranks.len());
        }

        // Placements start at rank 8
        for (rank, row) in Rank::iter().rev().zip(ranks) {
            let mut file = 0;

            for c in row.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        bail!("Invalid empty-square count {c:?} on rank {rank}");
                    }
                    file += skip as u8;
                } else {
                    let piece = Piece::from_uci(c)?;
                    if file >= File::COUNT as u8 {
                        bail!("Too many squares on rank {rank}: {row:?}");
                    }

                    let square = Square::new(File(file), rank);
                    if piece.kind() == PieceKind::Pawn && (rank == Rank::ONE || rank == Rank::EIGHT) {
                        bail!("Pawns cannot stand on {square}");
                    }

                    self.place(piece.color(), piece.kind(), square);
                    file += 1;
                }
            }

            if file != File::COUNT as u8 {
                bail!("Rank {rank} must describe exactly 8 squares: {row:?}");
            }
        }

        for color in Color::all() {
            let kings = self.pieces(color, PieceKind::King).population();
            if kings != 1 {
                bail!("{} must have exactly one King. Found {kings}", color.name());
            }
        }

        Ok(())
    }

    /// Generates a FEN string from this [`Position`].
    ///
    /// # Example
    /// ```
    /// # use newt::*;
    /// let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    /// assert_eq!(Position::from_fen(fen).unwrap().to_fen(), fen);
    /// ```
    pub fn to_fen(&self) -> String {
        let mut placements = Vec::with_capacity(Rank::COUNT);

        for rank in Rank::iter().rev() {
            let mut row = String::with_capacity(File::COUNT);
            let mut empty = 0;

            for file in File::iter() {
                match self.piece_at(Square::new(file, rank)) {
                    Some(piece) => {
                        if empty != 0 {
                            row.push_str(&empty.to_string());
                            empty = 0;
                        }
                        row.push(piece.to_uci());
                    }
                    None => empty += 1,
                }
            }

            if empty != 0 {
                row.push_str(&empty.to_string());
            }
            placements.push(row);
        }

        let ep = self
            .ep_square
            .map(Square::to_uci)
            .unwrap_or_else(|| String::from("-"));

        format!(
            "{} {} {} {ep} {} {}",
            placements.join("/"),
            self.side_to_move.to_uci(),
            self.castling_rights,
            self.halfmove,
            self.fullmove
        )
    }

    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub const fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    #[inline(always)]
    pub const fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    #[inline(always)]
    pub const fn halfmove(&self) -> usize {
        self.halfmove
    }

    #[inline(always)]
    pub const fn fullmove(&self) -> usize {
        self.fullmove
    }

    #[inline(always)]
    pub const fn key(&self) -> ZobristKey {
        self.key
    }

    /// All pieces of `color` and `kind`.
    #[inline(always)]
    pub const fn pieces(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces[color.index()][kind.index()]
    }

    /// All pieces of `color`.
    #[inline(always)]
    pub const fn color(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    /// All pieces of `kind`, of either color.
    #[inline(always)]
    pub const fn kind(&self, kind: PieceKind) -> Bitboard {
        self.pieces(Color::White, kind).or(self.pieces(Color::Black, kind))
    }

    /// Every occupied square.
    #[inline(always)]
    pub const fn occupied(&self) -> Bitboard {
        self.colors[0].or(self.colors[1])
    }

    #[inline(always)]
    pub const fn king_square(&self, color: Color) -> Square {
        self.pieces(color, PieceKind::King).to_square_unchecked()
    }

    /// Fetches the [`Piece`] on `square`, if any.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        let color = Color::all()
            .into_iter()
            .find(|&c| self.color(c).intersects(square))?;

        PieceKind::all()
            .into_iter()
            .find(|&k| self.pieces(color, k).intersects(square))
            .map(|kind| Piece::new(color, kind))
    }

    /// Rook and Queen sliders of `color`.
    #[inline(always)]
    pub const fn orthogonal_sliders(&self, color: Color) -> Bitboard {
        self.pieces(color, PieceKind::Rook)
            .or(self.pieces(color, PieceKind::Queen))
    }

    /// Bishop and Queen sliders of `color`.
    #[inline(always)]
    pub const fn diagonal_sliders(&self, color: Color) -> Bitboard {
        self.pieces(color, PieceKind::Bishop)
            .or(self.pieces(color, PieceKind::Queen))
    }

    /// Every square attacked by `color`, computed against `blockers`.
    ///
    /// Pass an occupancy without the defending King to let sliders "see through" him.
    pub fn attacks_by(&self, color: Color, blockers: Bitboard) -> Bitboard {
        let mut attacks = match color {
            Color::White => white_pawn_shifts(self.pieces(color, PieceKind::Pawn)),
            Color::Black => black_pawn_shifts(self.pieces(color, PieceKind::Pawn)),
        };

        attacks |= knight_shifts(self.pieces(color, PieceKind::Knight));
        attacks |= king_shifts(self.pieces(color, PieceKind::King));

        for square in self.diagonal_sliders(color) {
            attacks |= bishop_attacks(square, blockers);
        }

        for square in self.orthogonal_sliders(color) {
            attacks |= rook_attacks(square, blockers);
        }

        attacks
    }

    /// Pieces of `color` that attack `square`, given `blockers`.
    pub fn attackers_to(&self, square: Square, color: Color, blockers: Bitboard) -> Bitboard {
        pawn_attacks(square, color.opponent()) & self.pieces(color, PieceKind::Pawn)
            | knight_attacks(square) & self.pieces(color, PieceKind::Knight)
            | king_attacks(square) & self.pieces(color, PieceKind::King)
            | bishop_attacks(square, blockers) & self.diagonal_sliders(color)
            | rook_attacks(square, blockers) & self.orthogonal_sliders(color)
    }

    /// Returns `true` if `color`'s King is attacked.
    #[inline(always)]
    pub fn is_color_in_check(&self, color: Color) -> bool {
        self.attackers_to(self.king_square(color), color.opponent(), self.occupied())
            .is_nonempty()
    }

    /// Returns `true` if the side to move is in check.
    #[inline(always)]
    pub fn is_in_check(&self) -> bool {
        self.is_color_in_check(self.side_to_move)
    }

    /// Copies this position and applies `mv` to the copy.
    ///
    /// `mv` is assumed to be legal here; use [`Position::with_uci_move_made`] for untrusted input.
    ///
    /// # Example
    /// ```
    /// # use newt::*;
    /// let start = Position::default();
    /// let mv = Move::from_uci(&start, "e2e4").unwrap();
    /// let next = start.with_move_made(mv);
    /// assert_eq!(next.to_fen(), "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
    /// assert_eq!(start.to_fen(), FEN_STARTPOS);
    /// ```
    #[inline(always)]
    pub fn with_move_made(&self, mv: Move) -> Self {
        let mut copied = *self;
        copied.make_move(mv);
        copied
    }

    /// Parses `uci` against the legal moves of this position and applies it to a copy.
    ///
    /// On failure, `self` is untouched and an error describes the rejected text.
    pub fn with_uci_move_made(&self, uci: &str) -> Result<Self> {
        let mv = Move::from_uci(self, uci)?;
        Ok(self.with_move_made(mv))
    }

    /// Applies `mv` in place, updating every field and the Zobrist key incrementally.
    fn make_move(&mut self, mv: Move) {
        let color = self.side_to_move;
        let (from, to) = (mv.from(), mv.to());

        self.key.hash_side_to_move(color);
        self.key.hash_castling_rights(self.castling_rights);
        if let Some(ep_square) = self.ep_square.take() {
            self.key.hash_ep_square(ep_square);
        }

        self.halfmove += 1;
        if color.is_black() {
            self.fullmove += 1;
        }

        self.take(color, mv.piece(), from);

        if let Some(victim) = mv.captured() {
            let victim_square = if mv.is_en_passant() {
                to.backward_by(color, 1)
            } else {
                Some(to)
            };

            if let Some(victim_square) = victim_square {
                self.take(color.opponent(), victim, victim_square);
            }
            self.halfmove = 0;
        }

        match mv.kind() {
            MoveKind::PawnDoublePush => {
                self.ep_square = from.forward_by(color, 1);
                self.key.hash_optional_ep_square(self.ep_square);
            }
            MoveKind::ShortCastle => {
                let rank = Rank::first(color);
                self.shift_rook(color, Square::new(File::H, rank), Square::new(File::F, rank));
            }
            MoveKind::LongCastle => {
                let rank = Rank::first(color);
                self.shift_rook(color, Square::new(File::A, rank), Square::new(File::D, rank));
            }
            MoveKind::Normal | MoveKind::EnPassant => {}
        }

        if mv.piece() == PieceKind::Pawn {
            self.halfmove = 0;
        }

        self.place(color, mv.promotion().unwrap_or(mv.piece()), to);

        // Anything moving off of, or onto, a King or Rook home square voids the rights tied to it
        self.castling_rights.touch(from);
        self.castling_rights.touch(to);
        self.key.hash_castling_rights(self.castling_rights);

        self.side_to_move = color.opponent();
        self.key.hash_side_to_move(self.side_to_move);
    }

    /// Moves a castling Rook, if it is actually there.
    fn shift_rook(&mut self, color: Color, from: Square, to: Square) {
        if self.pieces(color, PieceKind::Rook).intersects(from) {
            self.take(color, PieceKind::Rook, from);
            self.place(color, PieceKind::Rook, to);
        }
    }

    #[inline(always)]
    fn place(&mut self, color: Color, kind: PieceKind, square: Square) {
        self.pieces[color][kind].set(square);
        self.colors[color].set(square);
        self.key.hash_piece(square, color, kind);
    }

    #[inline(always)]
    fn take(&mut self, color: Color, kind: PieceKind, square: Square) {
        self.pieces[color][kind].clear(square);
        self.colors[color].clear(square);
        self.key.hash_piece(square, color, kind);
    }
}

impl Default for Position {
    /// The standard starting position.
    #[inline(always)]
    fn default() -> Self {
        Self::startpos()
    }
}

impl FromStr for Position {
    type Err = anyhow::Error;
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (key {})", self.to_fen(), self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Applies every move in `moves`, checking the incremental key after each.
    fn play(fen: &str, moves: &[&str]) -> Position {
        let mut pos = Position::from_fen(fen).unwrap();
        for uci in moves {
            pos = pos.with_uci_move_made(uci).unwrap();
            assert_eq!(pos.key(), ZobristKey::new(&pos), "Key drifted after {uci} on {fen}");
        }
        pos
    }

    #[test]
    fn test_fen_round_trip() {
        let fens = [
            FEN_STARTPOS,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            "3r4/pR6/2p5/2kb1N2/8/2B5/qP3PPP/3R2K1 w - - 1 3",
            "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w Kq d6 0 3",
        ];

        for fen in fens {
            assert_eq!(Position::from_fen(fen).unwrap().to_fen(), fen);
        }
    }

    #[test]
    fn test_fen_normalization() {
        let pos = Position::from_fen("  4k3/8/8/8/8/8/8/4K3   b ").unwrap();
        assert_eq!(pos.to_fen(), "4k3/8/8/8/8/8/8/4K3 b - - 0 1");

        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w qK").unwrap();
        assert_eq!(pos.to_fen(), "4k3/8/8/8/8/8/8/4K3 w Kq - 0 1");
    }

    #[test]
    fn test_invalid_fens() {
        let bad = [
            "",
            "4k3/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K4 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K2 w - - 0 1",
            "4k3/8/8/8/8/8/8/4X3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K3 x - - 0 1",
            "4k3/8/8/8/8/8/8/4K3 w X - 0 1",
            "4k3/8/8/8/8/8/8/4K3 w KK - 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - e4 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - e3 0 1",
            "4k3/8/8/4P3/8/8/8/4K3 w - d6 0 1",
            "4k3/3p4/8/3pP3/8/8/8/4K3 w - d6 0 1",
            "4k3/8/3n4/3pP3/8/8/8/4K3 w - d6 0 1",
            "4k3/8/8/8/3Pp3/3N4/8/4K3 b - d3 0 1",
            "4k3/8/8/8/3Bp3/8/8/4K3 b - d3 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - - x 1",
            "4k3/8/8/8/8/8/8/4K3 w - - 0 -1",
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1 extra",
            "4k3/8/8/8/8/8/8/8 w - - 0 1",
            "4kk2/8/8/8/8/8/8/4K3 w - - 0 1",
            "P3k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/4K3p w - - 0 1",
            "4k3/8/8/8/8/8/8/0004K3 w - - 0 1",
        ];

        for fen in bad {
            assert!(Position::from_fen(fen).is_err(), "{fen:?} should be rejected");
        }
    }

    #[test]
    fn test_move_is_copy_on_write() {
        let start = Position::default();
        let next = start.with_uci_move_made("g1f3").unwrap();

        assert_eq!(start, Position::default());
        assert_eq!(next.side_to_move(), Color::Black);
        assert_eq!(next.halfmove(), 1);
        assert_eq!(next.fullmove(), 1);

        let after = next.with_uci_move_made("g8f6").unwrap();
        assert_eq!(after.side_to_move(), Color::White);
        assert_eq!(after.fullmove(), 2);

        // A failed parse leaves the original untouched
        assert!(after.with_uci_move_made("e2e5").is_err());
        assert_eq!(after.side_to_move(), Color::White);
    }

    #[test]
    fn test_no_square_is_shared() {
        let pos = play(
            FEN_STARTPOS,
            &["e2e4", "d7d5", "e4d5", "d8d5", "b1c3", "d5a5", "d2d4", "c7c6", "g1f3"],
        );

        let mut seen = Bitboard::EMPTY_BOARD;
        for color in Color::all() {
            for kind in PieceKind::all() {
                let pieces = pos.pieces(color, kind);
                assert!(!seen.intersects(pieces), "{color:?} {kind:?} overlaps another piece");
                seen |= pieces;
            }
        }
        assert_eq!(seen, pos.occupied());
    }

    #[test]
    fn test_zobrist_key_side_to_move_and_ep() {
        let fen = "r3k2r/pppp1ppp/8/4p3/8/8/PPPPPPPP/R3K2R w KQkq e6 0 1";
        let pos = Position::from_fen(fen).unwrap();

        let black = Position::from_fen("r3k2r/pppp1ppp/8/4p3/8/8/PPPPPPPP/R3K2R b KQkq - 0 1").unwrap();
        let no_ep = Position::from_fen("r3k2r/pppp1ppp/8/4p3/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let no_k = Position::from_fen("r3k2r/pppp1ppp/8/4p3/8/8/PPPPPPPP/R3K2R w KQq e6 0 1").unwrap();

        assert_ne!(pos.key(), black.key());
        assert_ne!(pos.key(), no_ep.key());
        assert_ne!(pos.key(), no_k.key());
    }

    #[test]
    fn test_zobrist_key_returns_after_knight_dance() {
        let original = Position::default();
        let pos = play(FEN_STARTPOS, &["b1a3", "b8a6", "a3b1", "a6b8"]);
        assert_eq!(pos.key(), original.key());
    }

    #[test]
    fn test_zobrist_key_special_moves() {
        play(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            &["e1g1", "e8c8", "a2a4", "b4a3", "d5e6", "h3g2", "e6f7", "g2f1q"],
        );
    }

    #[test]
    fn test_castling_rights_update_on_king_move() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        assert_eq!(play(fen, &["e1d1"]).castling_rights().to_uci(), "kq");
        assert_eq!(play(fen, &["e1d1", "e8f8"]).castling_rights().to_uci(), "-");
        assert_eq!(
            play(fen, &["e1d1", "e8f8", "d1e1", "f8e8"]).castling_rights().to_uci(),
            "-"
        );
    }

    #[test]
    fn test_castling_rights_update_on_rook_move_and_capture() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        assert_eq!(play(fen, &["a1b1"]).castling_rights().to_uci(), "Kkq");
        assert_eq!(play(fen, &["a1b1", "h8g8"]).castling_rights().to_uci(), "Kq");
        assert_eq!(play(fen, &["a1a8"]).castling_rights().to_uci(), "Kk");
        assert_eq!(play(fen, &["h1h8"]).castling_rights().to_uci(), "Qq");
    }

    #[test]
    fn test_castling_moves_rook() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let pos = play(fen, &["e1g1", "e8c8"]);
        assert_eq!(pos.to_fen(), "2kr3r/8/8/8/8/8/8/R4RK1 w - - 2 2");
    }

    #[test]
    fn test_en_passant_and_promotion() {
        let pos = play(FEN_STARTPOS, &["e2e4", "a7a6", "e4e5", "d7d5"]);
        assert_eq!(pos.ep_square(), Some(Square::D6));

        let pos = pos.with_uci_move_made("e5d6").unwrap();
        assert_eq!(pos.piece_at(Square::D5), None);
        assert_eq!(pos.piece_at(Square::D6), Some(Piece::new(Color::White, PieceKind::Pawn)));
        assert_eq!(pos.ep_square(), None);

        let pos = play("8/P6k/8/8/8/8/8/K7 w - - 0 1", &["a7a8n"]);
        assert_eq!(pos.piece_at(Square::A8), Some(Piece::new(Color::White, PieceKind::Knight)));
        assert!(pos.pieces(Color::White, PieceKind::Pawn).is_empty());
    }

    #[test]
    fn test_check_detection() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K2r w - - 0 1").unwrap();
        assert!(pos.is_in_check());
        assert!(!pos.is_color_in_check(Color::Black));

        let blocked = Position::from_fen("4k3/8/8/8/8/8/8/4KN1r w - - 0 1").unwrap();
        assert!(!blocked.is_in_check());
    }
}
