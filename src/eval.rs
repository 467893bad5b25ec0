/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{Color, PieceKind, Position, Psqt, Score};

/// Evaluates `position` from White's perspective.
///
/// Shorthand for `Evaluator::new(position).eval()`.
#[inline(always)]
pub fn evaluate(position: &Position) -> Score {
    Evaluator::new(position).eval()
}

/// Encapsulates the logic of scoring a chess position.
///
/// A high score is good for White, and a low score is good for Black, no matter whose turn it is.
#[derive(Debug, Clone)]
pub struct Evaluator<'a> {
    /// The position to evaluate.
    position: &'a Position,

    /// Whether the Kings should read their endgame table.
    endgame: bool,
}

impl<'a> Evaluator<'a> {
    /// Construct a new [`Evaluator`], computing any important metadata.
    #[inline(always)]
    pub fn new(position: &'a Position) -> Self {
        Self {
            position,
            endgame: is_endgame(position),
        }
    }

    /// Evaluate this position from White's perspective.
    ///
    /// If the side to move is checkmated, this is a flat `-`[`Score::MATE`] when White is mated and
    /// `+`[`Score::MATE`] when Black is mated, regardless of how the mate came about.
    ///
    /// # Example
    /// ```
    /// # use newt::*;
    /// assert_eq!(Evaluator::new(&Position::default()).eval(), Score::DRAW);
    /// ```
    pub fn eval(&self) -> Score {
        let stm = self.position.side_to_move();

        // Only a King in check can be mated, so skip move generation otherwise
        if self.position.is_in_check() && self.position.legal_moves().is_empty() {
            return Score::mated(stm, 0);
        }

        Score(self.eval_for(Color::White) - self.eval_for(Color::Black))
    }

    /// Whether this position counts as an endgame for the King tables.
    #[inline(always)]
    pub const fn is_endgame(&self) -> bool {
        self.endgame
    }

    /// Material plus positional bonus of all of `color`'s pieces.
    fn eval_for(&self, color: Color) -> i32 {
        PieceKind::all().into_iter().fold(0, |score, kind| {
            self.position
                .pieces(color, kind)
                .into_iter()
                .fold(score, |score, square| {
                    score + Psqt::eval(color, kind, square, self.endgame)
                })
        })
    }

    /// Material alone of all of `color`'s pieces, excluding the King.
    fn material_for(&self, color: Color) -> i32 {
        PieceKind::all()
            .into_iter()
            .filter(|&kind| kind != PieceKind::King)
            .fold(0, |score, kind| {
                score + self.position.pieces(color, kind).population() as i32 * kind.value()
            })
    }
}

impl fmt::Display for Evaluator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let score = self.eval();

        let winning_side = if score > Score::DRAW {
            Some(Color::White)
        } else if score < Score::DRAW {
            Some(Color::Black)
        } else {
            None
        };

        writeln!(f, "Endgame: {}", self.endgame)?;
        for color in Color::all() {
            writeln!(
                f,
                "{:<5} material: {:>5} total: {:>6}",
                color.name(),
                self.material_for(color),
                self.eval_for(color)
            )?;
        }
        writeln!(
            f,
            "Winning side: {}",
            winning_side.map(|c| c.name()).unwrap_or("N/A")
        )?;
        if score.is_mate() {
            write!(f, "Score: {score}")
        } else {
            write!(f, "Score: {score} ({:+.2} pawns)", score.normalize())
        }
    }
}

/// Returns `true` if neither side has a Queen, or every side with a Queen has at most one minor piece.
#[inline(always)]
fn is_endgame(position: &Position) -> bool {
    Color::all().into_iter().all(|color| {
        let queens = position.pieces(color, PieceKind::Queen);
        let minors =
            position.pieces(color, PieceKind::Knight) | position.pieces(color, PieceKind::Bishop);

        queens.is_empty() || minors.population() <= 1
    })
}
