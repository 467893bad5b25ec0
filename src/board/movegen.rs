/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{
    attacks::*, Bitboard, CastlingRights, Color, File, Move, MoveKind, MoveList, PieceKind, Position, Rank,
    Square,
};

/// Generates all legal moves for the side to move in `position`.
///
/// # Example
/// ```
/// # use newt::*;
/// assert_eq!(legal_moves(&Position::default()).len(), 20);
/// ```
#[inline(always)]
pub fn legal_moves(position: &Position) -> MoveList {
    position.legal_moves()
}

/// Generates all legal moves for `color` in `position`, whether or not it is their turn.
///
/// En passant is only ever available to the side to move.
#[inline(always)]
pub fn legal_moves_for(position: &Position, color: Color) -> MoveList {
    position.legal_moves_for(color)
}

impl Position {
    /// Generates all legal moves for the side to move.
    #[inline(always)]
    pub fn legal_moves(&self) -> MoveList {
        self.legal_moves_for(self.side_to_move())
    }

    /// Generates all legal moves for `color`.
    ///
    /// # Example
    /// ```
    /// # use newt::*;
    /// let pos = Position::default();
    /// assert_eq!(pos.legal_moves_for(Color::Black).len(), 20);
    /// ```
    pub fn legal_moves_for(&self, color: Color) -> MoveList {
        let mut moves = MoveList::default();
        let generator = MoveGenerator::new(self, color);

        match generator.checkers.population() {
            0 => generator.generate_all_moves::<false>(&mut moves),
            1 => generator.generate_all_moves::<true>(&mut moves),
            // In double check only the King can move
            _ => generator.generate_king_moves::<true>(&mut moves),
        }

        moves
    }

    /// Returns `true` if the side to move is in check and has no legal moves.
    #[inline(always)]
    pub fn is_checkmate(&self) -> bool {
        self.is_in_check() && self.legal_moves().is_empty()
    }

    /// Returns `true` if the side to move is not in check but has no legal moves.
    #[inline(always)]
    pub fn is_stalemate(&self) -> bool {
        !self.is_in_check() && self.legal_moves().is_empty()
    }
}

/// Legality metadata for one color, computed once per generation call.
struct MoveGenerator<'a> {
    position: &'a Position,

    color: Color,

    king_square: Square,

    /// Enemy pieces currently attacking our King.
    checkers: Bitboard,

    /// With no checkers, every square. Otherwise, the checkers plus every square between them and the King:
    /// a non-King move must capture or block.
    checkmask: Bitboard,

    /// Friendly pieces that are the sole blocker between our King and an enemy slider.
    pinned: Bitboard,

    /// Every square the enemy attacks, with our King removed from the blockers
    /// so he cannot step backwards along a checking ray.
    enemy_attacks: Bitboard,
}

impl<'a> MoveGenerator<'a> {
    fn new(position: &'a Position, color: Color) -> Self {
        let opponent = color.opponent();
        let occupied = position.occupied();
        let king_square = position.king_square(color);

        let mut checkers = knight_attacks(king_square) & position.pieces(opponent, PieceKind::Knight)
            | pawn_attacks(king_square, color) & position.pieces(opponent, PieceKind::Pawn);
        let mut pinned = Bitboard::EMPTY_BOARD;

        // Pretend our King is a slider to find every enemy slider aimed at him, regardless of blockers
        let sliders_aimed_at_king = rook_rays(king_square) & position.orthogonal_sliders(opponent)
            | bishop_rays(king_square) & position.diagonal_sliders(opponent);

        for attacker in sliders_aimed_at_king {
            let between = ray_between(king_square, attacker);

            match (between & occupied).population() {
                0 => checkers |= attacker,
                // Enemy pieces cannot be pinned
                1 => pinned |= between & position.color(color),
                _ => {}
            }
        }

        let checkmask = if checkers.is_empty() {
            Bitboard::FULL_BOARD
        } else {
            checkers
                .iter()
                .fold(checkers, |mask, checker| mask | ray_between(king_square, checker))
        };

        let enemy_attacks = position.attacks_by(opponent, occupied ^ king_square);

        Self {
            position,
            color,
            king_square,
            checkers,
            checkmask,
            pinned,
            enemy_attacks,
        }
    }

    fn generate_all_moves<const IN_CHECK: bool>(&self, moves: &mut MoveList) {
        self.generate_pawn_moves(moves);
        self.generate_piece_moves(PieceKind::Knight, moves);
        self.generate_piece_moves(PieceKind::Bishop, moves);
        self.generate_piece_moves(PieceKind::Rook, moves);
        self.generate_piece_moves(PieceKind::Queen, moves);
        self.generate_king_moves::<IN_CHECK>(moves);
    }

    /// Squares a piece on `square` may move to without exposing the King, ignoring its own movement rules.
    #[inline(always)]
    fn legal_mask(&self, square: Square) -> Bitboard {
        if self.pinned.intersects(square) {
            self.checkmask & ray_containing(square, self.king_square)
        } else {
            self.checkmask
        }
    }

    /// The kind of enemy piece on `square`, if any.
    #[inline(always)]
    fn victim(&self, square: Square) -> Option<PieceKind> {
        self.position
            .piece_at(square)
            .filter(|piece| piece.color() != self.color)
            .map(|piece| piece.kind())
    }

    /// Knight, Bishop, Rook and Queen moves.
    fn generate_piece_moves(&self, kind: PieceKind, moves: &mut MoveList) {
        let friendlies = self.position.color(self.color);
        let blockers = self.position.occupied();

        for from in self.position.pieces(self.color, kind) {
            let attacks = attacks_for(kind, self.color, from, blockers);

            for to in attacks & !friendlies & self.legal_mask(from) {
                moves.push(Move::normal(from, to, kind, self.victim(to)));
            }
        }
    }

    fn generate_pawn_moves(&self, moves: &mut MoveList) {
        let color = self.color;
        let empty = !self.position.occupied();
        let enemies = self.position.color(color.opponent());

        // En passant is only available to the side to move
        let ep_square = self
            .position
            .ep_square()
            .filter(|_| color == self.position.side_to_move());

        for from in self.position.pieces(color, PieceKind::Pawn) {
            let legal = self.legal_mask(from);

            if let Some(single) = from.forward_by(color, 1).filter(|&to| empty.intersects(to)) {
                if legal.intersects(single) {
                    self.push_pawn_move(from, single, None, moves);
                }

                if from.rank() == Rank::second(color) {
                    if let Some(double) = single.forward_by(color, 1).filter(|&to| empty.intersects(to)) {
                        if legal.intersects(double) {
                            moves.push(Move::new(
                                from,
                                double,
                                PieceKind::Pawn,
                                None,
                                None,
                                MoveKind::PawnDoublePush,
                            ));
                        }
                    }
                }
            }

            let attacks = pawn_attacks(from, color);
            for to in attacks & enemies & legal {
                self.push_pawn_move(from, to, self.victim(to), moves);
            }

            if let Some(ep) = ep_square.filter(|&ep| attacks.intersects(ep)) {
                if self.is_en_passant_legal(from, ep) {
                    moves.push(Move::new(
                        from,
                        ep,
                        PieceKind::Pawn,
                        Some(PieceKind::Pawn),
                        None,
                        MoveKind::EnPassant,
                    ));
                }
            }
        }
    }

    /// Pushes a pawn move, expanding it into all four promotions if it reaches the last rank.
    #[inline(always)]
    fn push_pawn_move(
        &self,
        from: Square,
        to: Square,
        captured: Option<PieceKind>,
        moves: &mut MoveList,
    ) {
        if to.rank() == Rank::eighth(self.color) {
            for promotion in PieceKind::promotions() {
                moves.push(Move::new(
                    from,
                    to,
                    PieceKind::Pawn,
                    captured,
                    Some(promotion),
                    MoveKind::Normal,
                ));
            }
        } else {
            moves.push(Move::normal(from, to, PieceKind::Pawn, captured));
        }
    }

    /// En passant removes two pieces from the same rank at once, so pins and checks are verified
    /// by replaying the capture on the occupancy instead of through the masks.
    fn is_en_passant_legal(&self, from: Square, ep: Square) -> bool {
        let Some(victim) = ep.backward_by(self.color, 1) else {
            return false;
        };

        let blockers = (self.position.occupied() ^ from ^ victim) | ep;
        let attackers = self
            .position
            .attackers_to(self.king_square, self.color.opponent(), blockers);

        // The captured pawn no longer attacks anything
        (attackers & !Bitboard::from_square(victim)).is_empty()
    }

    fn generate_king_moves<const IN_CHECK: bool>(&self, moves: &mut MoveList) {
        let from = self.king_square;
        let friendlies = self.position.color(self.color);

        for to in king_attacks(from) & !friendlies & !self.enemy_attacks {
            moves.push(Move::normal(from, to, PieceKind::King, self.victim(to)));
        }

        // Castling out of check is illegal
        if IN_CHECK {
            return;
        }

        let rights = self.position.castling_rights();
        let rank = Rank::first(self.color);

        if rights.contains(CastlingRights::short(self.color)) {
            self.push_castle(
                Square::new(File::H, rank),
                Square::new(File::G, rank),
                MoveKind::ShortCastle,
                moves,
            );
        }

        if rights.contains(CastlingRights::long(self.color)) {
            self.push_castle(
                Square::new(File::A, rank),
                Square::new(File::C, rank),
                MoveKind::LongCastle,
                moves,
            );
        }
    }

    /// Pushes a castling move if the King and Rook are home, the squares between them are empty,
    /// and the King does not pass through or land on an attacked square.
    fn push_castle(&self, rook_square: Square, king_dst: Square, kind: MoveKind, moves: &mut MoveList) {
        let from = self.king_square;
        let home = Square::new(File::E, Rank::first(self.color));

        if from != home || !self.position.pieces(self.color, PieceKind::Rook).intersects(rook_square) {
            return;
        }

        let must_be_empty = ray_between(from, rook_square);
        let must_be_safe = ray_between(from, king_dst) | king_dst;

        if (must_be_empty & self.position.occupied()).is_empty()
            && (must_be_safe & self.enemy_attacks).is_empty()
        {
            moves.push(Move::new(from, king_dst, PieceKind::King, None, None, kind));
        }
    }
}

/// Counts the leaf nodes reachable from `position` in exactly `depth` plies.
///
/// At depth 1 this counts the legal moves instead of making them.
/// If you do *not* want bulk counting, use [`perft_generic`].
///
/// # Example
/// ```
/// # use newt::*;
/// assert_eq!(perft(&Position::default(), 3), 8_902);
/// ```
#[inline(always)]
pub fn perft(position: &Position, depth: usize) -> u64 {
    perft_generic::<true, false>(position, depth)
}

/// Like [`perft`], but prints the node count beneath each root move before returning the total.
#[inline(always)]
pub fn splitperft(position: &Position, depth: usize) -> u64 {
    perft_generic::<true, true>(position, depth)
}

/// Generic version of `perft`.
///
/// If `BULK` is set, depth-1 nodes are counted without making their moves.
/// If `SPLIT` is set, the count for each root move is printed.
pub fn perft_generic<const BULK: bool, const SPLIT: bool>(position: &Position, depth: usize) -> u64 {
    if BULK && !SPLIT && depth == 1 {
        return position.legal_moves().len() as u64;
    } else if depth == 0 {
        return 1;
    }

    position.legal_moves().into_iter().fold(0, |nodes, mv| {
        let new_nodes = perft_generic::<BULK, false>(&position.with_move_made(mv), depth - 1);

        if SPLIT {
            println!("{mv}\t{new_nodes}");
        }

        nodes + new_nodes
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::FEN_KIWIPETE;

    fn moves_of(fen: &str) -> Vec<String> {
        let pos = Position::from_fen(fen).unwrap();
        let mut moves = pos.legal_moves().iter().map(Move::to_uci).collect::<Vec<_>>();
        moves.sort();
        moves
    }

    #[test]
    fn test_startpos_moves() {
        let pos = Position::default();
        assert_eq!(pos.legal_moves().len(), 20);
        assert_eq!(pos.legal_moves_for(Color::Black).len(), 20);
    }

    #[test]
    fn test_destinations_respect_attacks() {
        for fen in [FEN_KIWIPETE, "3r4/pR6/2p5/2kb1N2/8/2B5/qP3PPP/3R2K1 w - - 1 3"] {
            let pos = Position::from_fen(fen).unwrap();
            for color in Color::all() {
                let friendlies = pos.color(color);
                let enemy_attacks = pos.attacks_by(color.opponent(), pos.occupied() ^ pos.king_square(color));

                for mv in pos.legal_moves_for(color) {
                    assert!(!friendlies.intersects(mv.to()), "{mv:?} lands on a friendly piece in {fen}");
                    if mv.piece() == PieceKind::King {
                        assert!(!enemy_attacks.intersects(mv.to()), "{mv:?} walks into check in {fen}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_pinned_pieces_stay_on_pin_ray() {
        // The knight on d2 is pinned by the bishop on a5; the rook on e2 may only slide along the e-file
        let moves = moves_of("4r2k/8/8/b7/8/8/3NR3/4K3 w - - 0 1");
        assert!(!moves.iter().any(|m| m.starts_with("d2")), "Pinned knight moved: {moves:?}");
        assert!(moves.contains(&String::from("e2e8")));
        assert!(moves.contains(&String::from("e2e5")));
        assert!(!moves.contains(&String::from("e2d2")));
        assert!(!moves.contains(&String::from("e2f2")));
    }

    #[test]
    fn test_diagonal_pins_hold() {
        // The b4 pawn is pinned to e1 by the queen on a5 and may not capture off the diagonal
        let moves = moves_of("rnb1kbnr/pp1ppppp/8/q1p5/1P6/3P4/P1P1PPPP/RNBQKBNR w KQkq - 1 3");
        assert!(!moves.contains(&String::from("b4c5")));
        assert!(!moves.contains(&String::from("b4b5")));

        // A bishop pinned along the long diagonal may still slide along it
        let moves = moves_of("7k/8/8/8/8/2b5/1B6/K7 w - - 0 1");
        assert!(moves.contains(&String::from("b2c3")));
        assert!(!moves.contains(&String::from("b2a3")));
        assert!(!moves.contains(&String::from("b2c1")));
    }

    #[test]
    fn test_moves_never_leave_mover_in_check() {
        fn walk(pos: &Position, depth: usize) {
            let mover = pos.side_to_move();
            for mv in pos.legal_moves() {
                let next = pos.with_move_made(mv);
                assert!(
                    !next.is_color_in_check(mover),
                    "{mv:?} leaves {} in check in {}",
                    mover.name(),
                    pos.to_fen()
                );
                if depth > 1 {
                    walk(&next, depth - 1);
                }
            }
        }

        for fen in [
            crate::board::FEN_STARTPOS,
            FEN_KIWIPETE,
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            "rnb1kbnr/pp1ppppp/8/q1p5/1P6/3P4/P1P1PPPP/RNBQKBNR w KQkq - 1 3",
        ] {
            walk(&Position::from_fen(fen).unwrap(), 3);
        }
    }

    #[test]
    fn test_double_check_only_moves_king() {
        let pos = Position::from_fen("4k3/8/8/8/8/5n2/8/R3K2r w - - 0 1").unwrap();
        assert!(pos.legal_moves().iter().all(|mv| mv.piece() == PieceKind::King));
    }

    #[test]
    fn test_king_cannot_retreat_along_check_ray() {
        let moves = moves_of("4k3/8/8/8/8/8/8/r3K3 w - - 0 1");
        assert!(!moves.contains(&String::from("e1f1")));
        assert!(moves.contains(&String::from("e1e2")));
    }

    #[test]
    fn test_en_passant_horizontal_pin() {
        // Capturing en passant would expose the King to the rook along the fifth rank
        let moves = moves_of("8/8/8/K2pP2r/8/8/8/7k w - d6 0 1");
        assert!(!moves.contains(&String::from("e5d6")));

        let moves = moves_of("8/8/8/K2pP3/8/8/8/7k w - d6 0 1");
        assert!(moves.contains(&String::from("e5d6")));
    }

    #[test]
    fn test_en_passant_only_for_side_to_move() {
        let pos = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert!(pos.legal_moves().iter().any(Move::is_en_passant));
        assert!(!pos.legal_moves_for(Color::Black).iter().any(Move::is_en_passant));
    }

    #[test]
    fn test_castling_rules() {
        let moves = moves_of("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert!(moves.contains(&String::from("e1g1")));
        assert!(moves.contains(&String::from("e1c1")));

        // b1 may be attacked for a long castle; only the King's path matters
        let moves = moves_of("1r2k2r/8/8/8/8/8/8/R3K2R w KQk - 0 1");
        assert!(moves.contains(&String::from("e1c1")));

        // f1 attacked
        let moves = moves_of("r3kr2/8/8/8/8/8/8/R3K2R w KQq - 0 1");
        assert!(!moves.contains(&String::from("e1g1")));
        assert!(moves.contains(&String::from("e1c1")));

        // Blocked
        let moves = moves_of("r3k2r/8/8/8/8/8/8/RN2K1NR w KQkq - 0 1");
        assert!(!moves.contains(&String::from("e1g1")));
        assert!(!moves.contains(&String::from("e1c1")));

        // In check
        let moves = moves_of("r3k2r/8/8/8/8/8/4r3/R3K2R w KQq - 0 1");
        assert!(!moves.contains(&String::from("e1g1")));
        assert!(!moves.contains(&String::from("e1c1")));

        // The right is stale if the Rook is gone
        let moves = moves_of("r3k2r/8/8/8/8/8/8/4K2R w KQkq - 0 1");
        assert!(!moves.contains(&String::from("e1c1")));
    }

    #[test]
    fn test_promotions_expand_to_four_moves() {
        let moves = moves_of("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        for promo in ["a7a8n", "a7a8b", "a7a8r", "a7a8q", "a7b8n", "a7b8b", "a7b8r", "a7b8q"] {
            assert!(moves.contains(&String::from(promo)), "Missing {promo}");
        }
    }

    #[test]
    fn test_terminal_classification() {
        let mate = Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        assert!(mate.is_checkmate());
        assert!(!mate.is_stalemate());

        let stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(stalemate.is_stalemate());
        assert!(!stalemate.is_checkmate());
    }

    #[test]
    fn test_perft_shallow() {
        let pos = Position::default();
        assert_eq!(perft(&pos, 0), 1);
        assert_eq!(perft(&pos, 1), 20);
        assert_eq!(perft(&pos, 2), 400);
        assert_eq!(perft_generic::<false, false>(&pos, 2), 400);
        assert_eq!(perft(&pos, 4), 197281);
    }
}
