/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use anyhow::{bail, Result};
use arrayvec::ArrayVec;
use tracing::debug;
use uci_parser::{UciInfo, UciResponse, UciSearchOptions};

use crate::{evaluate, Bound, Move, Position, Score, TTable, TTableEntry};

/// Maximum depth that can be searched
pub const MAX_DEPTH: usize = u8::MAX as usize / 2;

/// Represents the best sequence of moves found during a search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrincipalVariation(ArrayVec<Move, MAX_DEPTH>);

impl PrincipalVariation {
    /// An empty PV.
    pub const EMPTY: Self = Self(ArrayVec::new_const());

    /// The first move of this line, if any.
    #[inline(always)]
    pub fn first(&self) -> Option<Move> {
        self.0.first().copied()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline(always)]
    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.0.iter()
    }

    /// Clears the moves of `self`.
    #[inline(always)]
    fn clear(&mut self) {
        self.0.clear();
    }

    /// Replaces the contents of `self` with `mv` followed by the contents of `other`.
    #[inline(always)]
    fn extend(&mut self, mv: Move, other: &Self) {
        self.clear();
        self.0.push(mv);
        self.0.extend(other.0.iter().take(MAX_DEPTH - 1).copied());
    }
}

impl Default for PrincipalVariation {
    #[inline(always)]
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for PrincipalVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.0.iter().map(Move::to_uci).collect::<Vec<_>>();
        write!(f, "{}", line.join(" "))
    }
}

/// Bounds within an alpha-beta search, always from White's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBounds {
    /// Lower bound.
    ///
    /// White is guaranteed a score that is AT LEAST `alpha`.
    pub alpha: Score,

    /// Upper bound.
    ///
    /// Black is guaranteed a score that is AT MOST `beta`.
    pub beta: Score,
}

impl SearchBounds {
    /// Create a new [`SearchBounds`] from the provided `alpha` and `beta` values.
    #[inline(always)]
    pub const fn new(alpha: Score, beta: Score) -> Self {
        Self { alpha, beta }
    }

    /// Returns `true` if no score can fall strictly inside these bounds anymore.
    #[inline(always)]
    fn is_closed(&self) -> bool {
        self.alpha >= self.beta
    }
}

impl Default for SearchBounds {
    /// The widest possible window.
    #[inline(always)]
    fn default() -> Self {
        Self::new(-Score::INF, Score::INF)
    }
}

/// The result of a search, containing the best line found, its score, and total nodes searched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchResult {
    /// Minimax score of the searched position, from White's point of view.
    pub score: Score,

    /// Best line found. Empty at depth 0 and when the root has no legal moves.
    pub pv: PrincipalVariation,

    /// Number of nodes searched, across every iteration.
    pub nodes: u64,

    /// The depth of the last completed iteration.
    pub depth: usize,
}

impl SearchResult {
    /// The first move of the best line, if there is one.
    #[inline(always)]
    pub fn bestmove(&self) -> Option<Move> {
        self.pv.first()
    }
}

/// Configuration variables for executing a [`Search`].
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Maximum depth to execute the search.
    pub max_depth: usize,

    /// Start time of the search.
    pub starttime: Instant,
}

impl SearchConfig {
    /// Constructs a new [`SearchConfig`] from the provided UCI options, falling back to `default_depth`.
    ///
    /// Options other than `depth` are accepted but have no effect.
    pub fn new(options: UciSearchOptions, default_depth: usize) -> Self {
        let max_depth = options
            .depth
            .map(|depth| depth as usize)
            .unwrap_or(default_depth)
            .min(MAX_DEPTH);

        Self {
            max_depth,
            starttime: Instant::now(),
        }
    }
}

impl Default for SearchConfig {
    #[inline(always)]
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            starttime: Instant::now(),
        }
    }
}

/// Searches `position` to exactly `depth` plies with a fresh transposition table, returning the best line found.
///
/// # Example
/// ```
/// # use newt::*;
/// let pos = Position::from_fen("k7/8/KQ6/8/8/8/8/8 w - - 0 1").unwrap();
/// let res = best_move(&pos, 2);
/// assert_eq!(res.score, Score::MATE - 1);
/// assert_eq!(res.pv.len(), 1);
/// ```
pub fn best_move(position: &Position, depth: usize) -> SearchResult {
    let mut ttable = TTable::new(TTable::MIN_SIZE);
    let is_searching = Arc::new(AtomicBool::new(true));
    let config = SearchConfig {
        max_depth: depth.min(MAX_DEPTH),
        ..Default::default()
    };

    Search::new(position, is_searching, config, &mut ttable).run()
}

/// Executes a search on the provided position at a specified depth.
pub struct Search<'a> {
    /// The position to search on.
    ///
    /// This position will be copied when moves are applied to it.
    position: &'a Position,

    /// Number of nodes visited so far.
    nodes: u64,

    /// An atomic flag to determine if the search should be cancelled at any time.
    ///
    /// If this is ever `false`, the search will exit as soon as possible.
    is_searching: Arc<AtomicBool>,

    /// Configuration variables for this instance of the search.
    config: SearchConfig,

    /// Transposition table shared between searches.
    ttable: &'a mut TTable,
}

impl<'a> Search<'a> {
    /// Construct a new [`Search`] instance to execute on the provided [`Position`].
    #[inline(always)]
    pub fn new(
        position: &'a Position,
        is_searching: Arc<AtomicBool>,
        config: SearchConfig,
        ttable: &'a mut TTable,
    ) -> Self {
        Self {
            position,
            nodes: 0,
            is_searching,
            config,
            ttable,
        }
    }

    /// Start the search, returning its results.
    ///
    /// This is the entrypoint used by the engine: it prints UCI `info` after every depth,
    /// concludes by sending the `bestmove` message, and lowers the `is_searching` flag.
    pub fn start(mut self) -> SearchResult {
        debug!(
            fen = %self.position,
            depth = self.config.max_depth,
            "starting search"
        );

        let res = self.iterative_deepening::<true>();

        debug!(
            hits = self.ttable.hits,
            accesses = self.ttable.accesses,
            "transposition table usage"
        );

        // Fall back to any legal move if not even depth 1 finished
        let bestmove = res
            .bestmove()
            .or_else(|| self.position.legal_moves().first().copied());

        let response = UciResponse::BestMove {
            bestmove,
            ponder: None,
        };
        println!("{response}");

        // Search has concluded, alert other threads that we are no longer searching
        self.is_searching.store(false, Ordering::Relaxed);

        res
    }

    /// Runs the search without producing any output.
    #[inline(always)]
    pub fn run(mut self) -> SearchResult {
        self.iterative_deepening::<false>()
    }

    /// Performs [iterative deepening](https://www.chessprogramming.org/Iterative_Deepening) (ID) on the Search's position.
    ///
    /// Each depth from 1 to the maximum is searched in turn. If one is cancelled partway,
    /// the result of the last completed depth is kept. If `UCI` is set, every completed depth is reported.
    fn iterative_deepening<const UCI: bool>(&mut self) -> SearchResult {
        // A search of depth 0 is just the static evaluation
        let mut result = SearchResult {
            score: evaluate(self.position),
            pv: PrincipalVariation::EMPTY,
            nodes: 0,
            depth: 0,
        };

        for depth in 1..=self.config.max_depth {
            let mut pv = PrincipalVariation::EMPTY;

            match self.alpha_beta(self.position, depth, 0, SearchBounds::default(), &mut pv) {
                Ok(score) => {
                    result = SearchResult {
                        score,
                        pv,
                        nodes: self.nodes,
                        depth,
                    };
                }
                Err(e) => {
                    debug!(depth, "search cancelled: {e}");
                    break;
                }
            }

            debug!(
                depth,
                nodes = self.nodes,
                score = result.score.0,
                pv = %result.pv,
                "completed depth"
            );

            if UCI {
                self.send_info(&result);
            }
        }

        result.nodes = self.nodes;
        result
    }

    /// Sends UCI info about a completed depth.
    #[inline(always)]
    fn send_info(&self, result: &SearchResult) {
        let elapsed = self.config.starttime.elapsed();
        let side = self.position.side_to_move();

        let info = UciInfo::new()
            .depth(result.depth)
            .nodes(self.nodes)
            .score(result.score.into_uci(side))
            .nps((self.nodes as f32 / elapsed.as_secs_f32()).trunc())
            .time(elapsed.as_millis())
            .pv(result.pv.iter().map(Move::to_uci));

        println!("{}", UciResponse::info(info));
    }

    /// Primary location of search logic.
    ///
    /// Plain [minimax](https://www.chessprogramming.org/Minimax) with [alpha-beta pruning](https://www.chessprogramming.org/Alpha-Beta):
    /// White maximizes, Black minimizes, and moves are tried in the order they are generated.
    fn alpha_beta(
        &mut self,
        position: &Position,
        depth: usize,
        ply: i32,
        mut bounds: SearchBounds,
        pv: &mut PrincipalVariation,
    ) -> Result<Score> {
        self.nodes += 1;
        pv.clear();

        // The search was stopped by an external factor, like the `stop` command
        if !self.is_searching.load(Ordering::Relaxed) {
            bail!("cancelled by external command");
        }

        // A mated leaf reads the flat mate sentinel, which is measured from here rather than the root
        if depth == 0 {
            return Ok(evaluate(position).absolute(ply));
        }

        let moves = position.legal_moves();
        let color = position.side_to_move();

        // If there are no legal moves, it's either mate or a draw.
        if moves.is_empty() {
            let score = if position.is_in_check() {
                // Prefer earlier mates
                Score::mated(color, ply)
            } else {
                Score::DRAW
            };

            return Ok(score);
        }

        let key = position.key();

        if ply > 0 {
            if let Some(entry) = self.ttable.get(&key).filter(|e| e.depth as usize >= depth) {
                let score = entry.score_at(ply);

                match entry.bound {
                    Bound::Exact => {
                        pv.extend(entry.bestmove, &PrincipalVariation::EMPTY);
                        return Ok(score);
                    }
                    Bound::Lower => bounds.alpha = bounds.alpha.max(score),
                    Bound::Upper => bounds.beta = bounds.beta.min(score),
                }

                if bounds.is_closed() {
                    pv.extend(entry.bestmove, &PrincipalVariation::EMPTY);
                    return Ok(score);
                }
            }
        }

        let original_bounds = bounds;
        let maximizing = color.is_white();
        let mut best = if maximizing { -Score::INF } else { Score::INF };
        let mut bestmove = moves[0];
        let mut local_pv = PrincipalVariation::EMPTY;

        for mv in moves {
            let child = position.with_move_made(mv);
            let score = self.alpha_beta(&child, depth - 1, ply + 1, bounds, &mut local_pv)?;

            if maximizing {
                if score > best {
                    best = score;
                    bestmove = mv;
                    pv.extend(mv, &local_pv);
                }
                bounds.alpha = bounds.alpha.max(best);
            } else {
                if score < best {
                    best = score;
                    bestmove = mv;
                    pv.extend(mv, &local_pv);
                }
                bounds.beta = bounds.beta.min(best);
            }

            if bounds.is_closed() {
                break;
            }
        }

        self.ttable.store(TTableEntry::new(
            key,
            bestmove,
            best,
            original_bounds,
            depth as u8,
            ply,
        ));

        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(fen: &str, depth: usize) -> SearchResult {
        best_move(&Position::from_fen(fen).unwrap(), depth)
    }

    #[test]
    fn test_white_mate_in_1() {
        let res = search("k7/8/KQ6/8/8/8/8/8 w - - 0 1", 2);
        assert!(res.score.is_mate(), "{res:#?}");
        assert_eq!(res.score.moves_to_mate(), 1, "{res:#?}");

        let mated = Position::from_fen("k7/8/KQ6/8/8/8/8/8 w - - 0 1")
            .unwrap()
            .with_move_made(res.pv.first().unwrap());
        assert!(mated.is_checkmate(), "{} did not mate", res.pv);
    }

    #[test]
    fn test_black_mated_in_1() {
        // Black to move, but every move runs into mate
        let res = search("1k6/8/KQ6/2Q5/8/8/8/8 b - - 0 1", 3);
        assert!(res.score.is_mate(), "{res:#?}");
        assert_eq!(res.score, Score::MATE - 2, "{res:#?}");
        assert_eq!(res.pv.len(), 2);
    }

    #[test]
    fn test_stalemate() {
        let res = search("k7/8/KQ6/8/8/8/8/8 b - - 0 1", 3);
        assert!(res.bestmove().is_none());
        assert_eq!(res.score, Score::DRAW);
    }

    #[test]
    fn test_depth_zero_is_static_eval() {
        let pos = Position::default().with_uci_move_made("e2e4").unwrap();
        let res = best_move(&pos, 0);
        assert_eq!(res.score, 40);
        assert!(res.pv.is_empty());
        assert_eq!(res.depth, 0);
    }

    #[test]
    fn test_mated_root_has_empty_line() {
        let res = search("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3", 3);
        assert_eq!(res.score, -Score::MATE);
        assert!(res.pv.is_empty());
    }

    #[test]
    fn test_prefers_shorter_mate() {
        // Qb7 mates at once; slower mates also exist at this depth
        let res = search("k7/8/KQ6/8/8/8/8/8 w - - 0 1", 4);
        assert_eq!(res.score, Score::MATE - 1);
        assert_eq!(res.pv.len(), 1);
    }

    #[test]
    fn test_cancelled_search_keeps_depth_zero_result() {
        let pos = Position::default();
        let mut ttable = TTable::from_capacity(1024);
        let is_searching = Arc::new(AtomicBool::new(false));
        let config = SearchConfig {
            max_depth: 4,
            ..Default::default()
        };

        let res = Search::new(&pos, is_searching, config, &mut ttable).run();
        assert_eq!(res.depth, 0);
        assert_eq!(res.score, Score::DRAW);
        assert!(res.pv.is_empty());
    }

    #[test]
    fn test_pv_is_playable() {
        let pos = Position::from_fen(crate::FEN_KIWIPETE).unwrap();
        let res = best_move(&pos, 3);
        assert_eq!(res.pv.len(), 3, "{res:#?}");

        let mut line = pos;
        for mv in res.pv.iter() {
            assert!(line.legal_moves().contains(mv), "{mv} is illegal in {line}");
            line = line.with_move_made(*mv);
        }
    }
}
