/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{anyhow, bail, Result};
use arrayvec::ArrayVec;

use super::{PieceKind, Position, Square, MAX_NUM_MOVES};

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = ArrayVec<Move, MAX_NUM_MOVES>;

/// The special-move flag of a [`Move`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum MoveKind {
    /// Any move not listed below, including captures and promotions.
    #[default]
    Normal,
    ShortCastle,
    LongCastle,
    EnPassant,
    PawnDoublePush,
}

impl MoveKind {
    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        matches!(self, Self::ShortCastle | Self::LongCastle)
    }
}

/// A single move of a piece, carrying enough information to be applied without consulting the board.
///
/// Castling is encoded as the King's two-square step (`e1g1`), never as "King takes Rook".
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    from: Square,
    to: Square,
    piece: PieceKind,
    captured: Option<PieceKind>,
    promotion: Option<PieceKind>,
    kind: MoveKind,
}

impl Move {
    /// Creates a new [`Move`].
    ///
    /// # Example
    /// ```
    /// # use newt::*;
    /// let e2e4 = Move::new(Square::E2, Square::E4, PieceKind::Pawn, None, None, MoveKind::PawnDoublePush);
    /// assert_eq!(e2e4.to_uci(), "e2e4");
    /// ```
    #[inline(always)]
    pub const fn new(
        from: Square,
        to: Square,
        piece: PieceKind,
        captured: Option<PieceKind>,
        promotion: Option<PieceKind>,
        kind: MoveKind,
    ) -> Self {
        Self {
            from,
            to,
            piece,
            captured,
            promotion,
            kind,
        }
    }

    /// A quiet move or capture with no special flag.
    #[inline(always)]
    pub const fn normal(from: Square, to: Square, piece: PieceKind, captured: Option<PieceKind>) -> Self {
        Self::new(from, to, piece, captured, None, MoveKind::Normal)
    }

    #[inline(always)]
    pub const fn from(&self) -> Square {
        self.from
    }

    #[inline(always)]
    pub const fn to(&self) -> Square {
        self.to
    }

    /// The kind of piece being moved (a Pawn, for promotions).
    #[inline(always)]
    pub const fn piece(&self) -> PieceKind {
        self.piece
    }

    /// The kind of piece removed from the board by this move, if any.
    ///
    /// For en passant this is the Pawn behind `to`, not the (empty) destination.
    #[inline(always)]
    pub const fn captured(&self) -> Option<PieceKind> {
        self.captured
    }

    #[inline(always)]
    pub const fn promotion(&self) -> Option<PieceKind> {
        self.promotion
    }

    #[inline(always)]
    pub const fn kind(&self) -> MoveKind {
        self.kind
    }

    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        self.kind.is_castle()
    }

    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        matches!(self.kind, MoveKind::EnPassant)
    }

    /// Finds the legal move in `position` described by `uci`, like `e2e4`, `e1g1` or `b7b8q`.
    ///
    /// The promotion letter is case-insensitive. Fails if the text is malformed or if no legal move matches.
    ///
    /// # Example
    /// ```
    /// # use newt::*;
    /// let pos = Position::default();
    /// let mv = Move::from_uci(&pos, "g1f3").unwrap();
    /// assert_eq!(mv.piece(), PieceKind::Knight);
    /// assert!(Move::from_uci(&pos, "e2e5").is_err());
    /// ```
    pub fn from_uci(position: &Position, uci: &str) -> Result<Self> {
        let (from, to, promotion) = Self::parse_uci(uci)?;

        position
            .legal_moves()
            .into_iter()
            .find(|mv| mv.from == from && mv.to == to && mv.promotion == promotion)
            .ok_or_else(|| anyhow!("{uci:?} is not a legal move in {position}"))
    }

    /// Splits `uci` into its origin, destination and optional promotion, without consulting a position.
    pub fn parse_uci(uci: &str) -> Result<(Square, Square, Option<PieceKind>)> {
        let from = uci
            .get(0..2)
            .ok_or_else(|| anyhow!("Move str must contain a `from` square. Got {uci:?}"))?;
        let to = uci
            .get(2..4)
            .ok_or_else(|| anyhow!("Move str must contain a `to` square. Got {uci:?}"))?;

        let from = Square::from_uci(from)?;
        let to = Square::from_uci(to)?;

        let promotion = match uci.get(4..) {
            None | Some("") => None,
            Some(p) if p.len() == 1 => {
                let kind = PieceKind::from_uci(p.as_bytes()[0] as char)?;
                if matches!(kind, PieceKind::Pawn | PieceKind::King) {
                    bail!("Cannot promote to a {}. Got {uci:?}", kind.name());
                }
                Some(kind)
            }
            Some(_) => bail!("Move str has trailing characters. Got {uci:?}"),
        };

        Ok((from, to, promotion))
    }

    /// Renders this move in coordinate notation, with a lowercase promotion letter if needed.
    pub fn to_uci(&self) -> String {
        match self.promotion {
            Some(promotion) => format!("{}{}{}", self.from, self.to, promotion.to_uci()),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {:?}", self.to_uci(), self.piece.name(), self.kind)?;
        if let Some(captured) = self.captured {
            write!(f, ", takes {}", captured.name())?;
        }
        write!(f, ")")
    }
}

impl PartialEq<&str> for Move {
    #[inline(always)]
    fn eq(&self, other: &&str) -> bool {
        self.to_uci() == *other
    }
}
