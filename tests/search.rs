/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use newt::{best_move, evaluate, Position, Score, FEN_KIWIPETE, FEN_STARTPOS};

/// Plain minimax with no pruning and no transposition table.
fn minimax(position: &Position, depth: usize, ply: i32) -> Score {
    if depth == 0 {
        return evaluate(position).absolute(ply);
    }

    let moves = position.legal_moves();
    if moves.is_empty() {
        return if position.is_in_check() {
            Score::mated(position.side_to_move(), ply)
        } else {
            Score::DRAW
        };
    }

    let scores = moves
        .into_iter()
        .map(|mv| minimax(&position.with_move_made(mv), depth - 1, ply + 1));

    if position.side_to_move().is_white() {
        scores.max().unwrap()
    } else {
        scores.min().unwrap()
    }
}

#[test]
fn test_finds_mate_in_two() {
    let pos = Position::from_fen("3r4/pR6/2p5/2kb1N2/8/2B5/qP3PPP/3R2K1 w - - 1 3").unwrap();
    let res = best_move(&pos, 4);

    // 1. Bd4+ Kc4 2. Ne3#
    assert_eq!(res.bestmove().unwrap(), "c3d4", "{res:#?}");
    assert_eq!(res.score, Score::MATE - 3, "{res:#?}");
    assert_eq!(res.score.moves_to_mate(), 2);
    assert_eq!(res.depth, 4);
}

#[test]
fn test_alpha_beta_matches_minimax() {
    let cases = [
        (FEN_STARTPOS, 4),
        (FEN_KIWIPETE, 3),
        ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 4),
        ("3r4/pR6/2p5/2kb1N2/8/2B5/qP3PPP/3R2K1 w - - 1 3", 3),
        ("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1", 3),
        ("k7/8/KQ6/8/8/8/8/8 w - - 0 1", 4),
        ("8/k1P5/8/1K6/8/8/8/8 w - - 0 1", 4),
        ("4k3/8/8/8/8/8/8/4K2R b K - 0 1", 4),
    ];

    for (fen, max_depth) in cases {
        let pos = Position::from_fen(fen).unwrap();

        for depth in 1..=max_depth {
            let res = best_move(&pos, depth);
            let expected = minimax(&pos, depth, 0);
            assert_eq!(
                res.score, expected,
                "Search disagreed with minimax at depth {depth} on {fen}"
            );
        }
    }
}

#[test]
fn test_line_starts_with_a_best_move() {
    let pos = Position::from_fen(FEN_KIWIPETE).unwrap();
    let res = best_move(&pos, 2);
    let bestmove = res.bestmove().unwrap();

    // The chosen move must be worth exactly what the search reported
    let child = pos.with_move_made(bestmove);
    assert_eq!(minimax(&child, 1, 1), res.score, "{bestmove} in {res:#?}");
}

#[test]
fn test_black_prefers_low_scores() {
    // Black to move can take an undefended Queen
    let pos = Position::from_fen("4k3/8/8/3q4/8/3Q4/8/4K3 b - - 0 1").unwrap();
    let res = best_move(&pos, 2);
    assert_eq!(res.bestmove().unwrap(), "d5d3", "{res:#?}");
    assert!(res.score < Score::DRAW, "{res:#?}");
}
