/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt, io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc, Mutex, MutexGuard, TryLockError,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info, warn};
use uci_parser::{UciCommand, UciInfo, UciOption, UciResponse};

use crate::{
    perft, splitperft, EngineCommand, Evaluator, Move, Position, Search, SearchConfig, SearchResult,
    Square, TTable, BENCHMARK_FENS, BENCH_DEPTH, MAX_DEPTH,
};

/// Default values of the engine's tunable settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Depth searched by `go` when no depth is given.
    pub depth: usize,

    /// Size of the transposition table, in megabytes.
    pub hash: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            depth: 5,
            hash: TTable::DEFAULT_SIZE,
        }
    }
}

/// The Newt chess engine.
#[derive(Debug)]
pub struct Engine {
    /// The current state of the chess board, as known to the engine.
    ///
    /// This is replaced whenever new positions are given,
    /// and is reset whenever the engine is told to start a new game.
    position: Position,

    /// Current values of the engine's settings.
    config: EngineConfig,

    /// Whether `debug on` was received.
    debug: bool,

    /// One half of a channel, responsible for sending commands to the engine to execute.
    sender: Sender<EngineCommand>,

    /// One half of a channel, responsible for receiving commands for the engine to execute.
    receiver: Receiver<EngineCommand>,

    /// Atomic flag to determine whether a search is currently running
    is_searching: Arc<AtomicBool>,

    /// Transposition table shared with the search thread.
    ttable: Arc<Mutex<TTable>>,

    /// Handle to the currently-running search thread, if one exists.
    search_thread: Option<JoinHandle<SearchResult>>,
}

impl Engine {
    /// Constructs a new [`Engine`] instance to be executed with [`Engine::run`].
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        let config = EngineConfig::default();

        Self {
            position: Position::default(),
            config,
            debug: false,
            sender,
            receiver,
            is_searching: Arc::default(),
            ttable: Arc::new(Mutex::new(TTable::new(config.hash))),
            search_thread: None,
        }
    }

    /// Returns a string of the engine's name and current version.
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Returns a string of all authors of this engine.
    pub fn authors(&self) -> String {
        // Split multiple authors by comma-space
        env!("CARGO_PKG_AUTHORS").replace(':', ", ")
    }

    /// Sends an [`EngineCommand`] to the engine to be executed.
    pub fn send_command(&self, command: EngineCommand) {
        // The receiver lives as long as `self`, so this can only fail while the engine is being dropped
        if self.sender.send(command).is_err() {
            warn!("engine is no longer receiving commands");
        }
    }

    /// Parses a single line of input and queues it for execution, reporting any parse error over UCI.
    pub fn send_input(&self, input: &str) {
        match input.parse() {
            Ok(cmd) => self.send_command(cmd),
            Err(e) => Self::send_string(e),
        }
    }

    /// Execute the main event loop for the engine.
    ///
    /// This function spawns a thread to handle input from `stdin` and waits on received commands.
    pub fn run(&mut self) -> Result<()> {
        // Spawn a separate thread for handling user input
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                info!("input handler thread stopping: {err:#}");
            }
        });

        self.event_loop();
        Ok(())
    }

    /// Executes commands until `stdin` closes or the engine is told to quit.
    ///
    /// Commands are handled strictly in the order they were received.
    fn event_loop(&mut self) {
        while let Ok(cmd) = self.receiver.recv() {
            debug!(?cmd, "received command");

            // Keep running, even on error
            match self.handle_command(cmd) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => Self::send_string(format!("{e:#}")),
            }
        }
    }

    /// Handles a single [`EngineCommand`], returning `false` if the engine should exit.
    fn handle_command(&mut self, cmd: EngineCommand) -> Result<bool> {
        match cmd {
            EngineCommand::Bench { depth, pretty } => self.bench(depth, pretty)?,

            EngineCommand::Display => self.display(),

            EngineCommand::Eval { pretty } => self.eval(pretty),

            EngineCommand::Fen => println!("{}", self.position.to_fen()),

            EngineCommand::HashInfo => self.hash_info(),

            EngineCommand::Moves { square, sort } => self.moves(square, sort),

            EngineCommand::Option { name } => {
                let name = name.join(" ");
                if let Some(value) = self.get_option(&name) {
                    println!("{name} := {value}");
                } else {
                    println!("{} has no option {name:?}", self.name());
                }
            }

            EngineCommand::Perft { depth } => println!("{}", perft(&self.position, depth)),

            EngineCommand::Splitperft { depth } => self.splitperft(depth),

            EngineCommand::Exit { cleanup } => {
                // If requested, await the completion of any ongoing search threads
                if cleanup {
                    self.await_search();
                } else {
                    self.stop_search();
                }

                return Ok(false);
            }

            EngineCommand::Uci { cmd } => return self.handle_uci_command(cmd),
        }

        Ok(true)
    }

    /// Handle the execution of a single [`UciCommand`], returning `false` if the engine should exit.
    fn handle_uci_command(&mut self, uci: UciCommand) -> Result<bool> {
        match uci {
            UciCommand::Uci => self.uci(),

            UciCommand::Debug(status) => self.debug = status,

            UciCommand::IsReady => println!("{}", UciResponse::<&str>::ReadyOk),

            UciCommand::SetOption { name, value } => self.set_option(&name, value)?,

            UciCommand::UciNewGame => self.new_game(),

            UciCommand::Position { fen, moves } => self.position(fen, moves)?,

            UciCommand::Go(options) => {
                if let Some(depth) = options.perft {
                    self.splitperft(depth as usize);
                    return Ok(true);
                }

                let config = SearchConfig::new(options, self.config.depth);

                // A rejected `go` must not drop the handle of the search that is still running
                if let Some(handle) = self.start_search(config) {
                    self.search_thread = Some(handle);
                }
            }

            UciCommand::Stop => self.stop_search(),

            UciCommand::Quit => {
                self.stop_search();
                return Ok(false);
            }

            _ => bail!("{} does not support UCI command {uci:?}", self.name()),
        }

        Ok(true)
    }

    /// Execute the `bench` command, running a fixed-depth search on a series of positions and displaying the results.
    fn bench(&mut self, depth: Option<usize>, pretty: bool) -> Result<()> {
        // Benchmarks run on their own, so finish whatever was running first
        self.stop_search();

        let max_depth = depth.unwrap_or(BENCH_DEPTH).min(MAX_DEPTH);
        let benches = BENCHMARK_FENS;
        let num_tests = benches.len();
        let mut nodes = 0;
        let starttime = Instant::now();

        let is_searching = Arc::new(AtomicBool::new(true));
        let mut ttable = TTable::new(self.config.hash);

        // Run a fixed search on each position
        for (i, fen) in benches.into_iter().enumerate() {
            if pretty {
                println!("Benchmark position {}/{num_tests}: {fen}", i + 1);
            }

            let position = fen.parse::<Position>()?;
            let config = SearchConfig {
                max_depth,
                starttime: Instant::now(),
            };

            ttable.clear();
            let res = Search::new(&position, Arc::clone(&is_searching), config, &mut ttable).run();
            nodes += res.nodes;
        }

        // Compute results
        let elapsed = starttime.elapsed();
        let nps = (nodes as f32 / elapsed.as_secs_f32()) as u64;
        let m_nps = nodes as f32 / elapsed.as_secs_f32() / 1_000_000.0;
        let ms = elapsed.as_millis();

        if pretty {
            // Display the results in a nice table
            println!();
            println!("+--- Benchmark Complete ---+");
            println!("| depth      : {max_depth:<12}|");
            println!("| time (ms)  : {ms:<12}|");
            println!("| nodes      : {nodes:<12}|");
            println!("| nps        : {nps:<12}|");
            println!("| Mnps       : {m_nps:<12.2}|");
            println!("+--------------------------+");
        } else {
            println!("{nodes} nodes {nps} nps");
        }

        Ok(())
    }

    /// Executes the `display` command, printing the current position.
    fn display(&self) {
        println!("FEN: {}", self.position.to_fen());
        println!("Side to move: {}", self.position.side_to_move().name());
        println!("Key: {}", self.position.key());
    }

    /// Executes the `eval` command, printing an evaluation of the current position.
    fn eval(&self, pretty: bool) {
        let evaluator = Evaluator::new(&self.position);
        if pretty {
            println!("{evaluator}");
        } else {
            println!("{}", evaluator.eval());
        }
    }

    /// Executes the `moves` command, printing the legal moves of the current position.
    fn moves(&self, square: Option<Square>, sort: bool) {
        let mut moves = self
            .position
            .legal_moves()
            .into_iter()
            .filter(|mv| square.map_or(true, |sq| mv.from() == sq))
            .map(|mv| mv.to_uci())
            .collect::<Vec<_>>();

        if sort {
            moves.sort();
        }

        // If there are none, print "(none)"
        if moves.is_empty() {
            println!("(none)");
        } else {
            println!("{}", moves.join(", "));
        }
    }

    /// Executes the `splitperft` command, printing the node count beneath each root move.
    fn splitperft(&self, depth: usize) {
        let starttime = Instant::now();
        let nodes = splitperft(&self.position, depth);
        let elapsed = starttime.elapsed();

        println!("\n{nodes}");
        debug!(depth, nodes, ms = elapsed.as_millis(), "splitperft complete");
    }

    /// Displays the current usage of the transposition table.
    ///
    /// The search thread holds the table while it runs, so this reports it as busy instead of waiting.
    fn hash_info(&self) {
        let ttable = match self.ttable.try_lock() {
            Ok(ttable) => ttable,
            Err(TryLockError::WouldBlock) => {
                return Self::send_string("TT is in use by the current search");
            }
            Err(TryLockError::Poisoned(_)) => {
                return Self::send_string("A thread holding the TTable panicked");
            }
        };

        let num = ttable.num_entries();
        let cap = ttable.capacity();
        let percent = num as f32 / cap as f32 * 100.0;
        println!("TT size: {}mb ({cap} entries)", ttable.size());
        println!("TT occupancy: {num}/{cap} ({percent:.2}%)");
    }

    /// Set the position to the supplied FEN string (defaults to the standard startpos if not supplied),
    /// and then apply `moves` one-by-one to the position.
    ///
    /// Nothing is changed if the FEN or any of the moves are invalid.
    fn position<T: AsRef<str>>(
        &mut self,
        fen: Option<T>,
        moves: impl IntoIterator<Item = T>,
    ) -> Result<()> {
        // The search thread owns a copy of the old position, so it must not outlive it
        self.stop_search();

        let mut position = match fen {
            Some(fen) => fen.as_ref().parse()?,
            None => Position::default(),
        };

        // Apply the provided moves
        for mv_str in moves {
            let mv = Move::from_uci(&position, mv_str.as_ref())
                .with_context(|| format!("Failed to apply moves to {position}"))?;
            position = position.with_move_made(mv);
        }

        self.position = position;
        Ok(())
    }

    /// Resets the engine's internal game state.
    ///
    /// This clears the transposition table and cancels any ongoing searches, ignoring their results.
    fn new_game(&mut self) {
        self.stop_search();
        self.position = Position::default();

        match self.ttable() {
            Ok(mut ttable) => ttable.clear(),
            Err(e) => Self::send_string(e),
        }
    }

    /// Sets the search flag to signal that the engine is starting/stopping a search.
    fn set_is_searching(&mut self, status: bool) {
        self.is_searching.store(status, Ordering::Relaxed);
    }

    /// Returns `true` if the engine is currently executing a searching.
    fn is_searching(&self) -> bool {
        self.is_searching.load(Ordering::Relaxed)
    }

    /// Starts a search on the current position, given the parameters in `config`.
    fn start_search(&mut self, config: SearchConfig) -> Option<JoinHandle<SearchResult>> {
        // Cannot start a search if one is already running
        if self.is_searching() {
            Self::send_string("A search is already running");
            return None;
        }

        // A finished search may not have been joined yet
        self.await_search();
        self.set_is_searching(true);

        // Clone the parameters that will be sent into the thread
        let position = self.position;
        let is_searching = Arc::clone(&self.is_searching);
        let ttable = Arc::clone(&self.ttable);

        info!(fen = %position, depth = config.max_depth, "starting search");

        // Spawn a thread to conduct the search
        let handle = thread::spawn(move || {
            // Only the search thread may touch the table while it runs. A poisoned lock still holds a usable table.
            let mut ttable = ttable.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

            Search::new(&position, is_searching, config, &mut ttable).start()
        });

        Some(handle)
    }

    /// Signals the current search to stop and waits for it to exit.
    fn stop_search(&mut self) {
        self.set_is_searching(false);
        self.await_search();
    }

    /// Awaits the current search thread, blocking until it finishes and returning its result.
    fn await_search(&mut self) -> Option<SearchResult> {
        // Can't stop a search if there aren't any threads searching!
        let handle = self.search_thread.take()?;

        // Attempt to join the thread handle to retrieve the result
        let id = handle.thread().id();
        let Ok(res) = handle.join() else {
            Self::send_string(format!("Failed to join on thread {id:?}"));
            return None;
        };

        // Flip the search flag so that any active threads will (hopefully) begin to clean themselves up.
        self.set_is_searching(false);
        info!(
            depth = res.depth,
            nodes = res.nodes,
            score = res.score.0,
            "search finished"
        );

        Some(res)
    }

    /// Called when the engine receives the `uci` command.
    ///
    /// Prints engine's ID, version, and authors, and lists all UCI options.
    fn uci(&self) {
        println!("id name {}\nid author {}\n", self.name(), self.authors());

        // Print all UCI options
        for opt in self.options() {
            println!("{}", UciResponse::Option(opt));
        }

        // We're ready to go!
        println!("{}", UciResponse::<&str>::UciOk)
    }

    /// Convenience function to return an iterator over all UCI options this engine supports.
    fn options(&self) -> impl Iterator<Item = UciOption> {
        let defaults = EngineConfig::default();
        [
            UciOption::button("Clear Hash"),
            UciOption::spin(
                "Hash",
                defaults.hash as i32,
                TTable::MIN_SIZE as i32,
                TTable::MAX_SIZE as i32,
            ),
            UciOption::spin("Depth", defaults.depth as i32, 1, MAX_DEPTH as i32),
        ]
        .into_iter()
    }

    /// Handles the `setoption` command, setting option `name` to `value`, or toggling it if `value` is None.
    ///
    /// Will return an error if `name` isn't a valid option or `value` is not a valid value for that option.
    fn set_option(&mut self, name: &str, value: Option<String>) -> Result<()> {
        match name {
            // Clear all hash tables
            "Clear Hash" => {
                // The search thread holds the table until it exits
                self.stop_search();
                self.ttable()?.clear();
            }

            // Re-size the hash table
            "Hash" => {
                let mb = parse_spin(name, value.as_deref(), TTable::MIN_SIZE, TTable::MAX_SIZE)?;

                // Resizing under a running search would block until it finished
                self.stop_search();
                *self.ttable()? = TTable::new(mb);
                self.config.hash = mb;
            }

            "Depth" => {
                self.config.depth = parse_spin(name, value.as_deref(), 1, MAX_DEPTH)?;
            }

            _ => {
                if let Some(value) = value.as_ref() {
                    bail!("Unrecognized option {name:?} with value {value:?}")
                } else {
                    bail!("Unrecognized option {name:?}")
                }
            }
        }

        if self.debug {
            let info = if let Some(value) = value.as_ref() {
                format!("Option {name} set to {value}")
            } else {
                format!("Option {name} toggled")
            };
            Self::send_string(info);
        }

        Ok(())
    }

    /// Returns the current value of the option `name`, if it exists on this engine.
    fn get_option(&self, name: &str) -> Option<String> {
        let value = match name {
            "Clear Hash" => String::default(),

            "Hash" => self.config.hash.to_string(),

            "Depth" => self.config.depth.to_string(),

            _ => return None,
        };

        Some(value)
    }

    /// Helper to send a [`UciInfo`] containing only a `string` message to `stdout`.
    #[inline(always)]
    fn send_string<T: fmt::Display>(info: T) {
        let resp = UciResponse::<String>::Info(Box::new(UciInfo::new().string(info)));
        println!("{resp}");
    }

    /// Helper function to fetch the TTable.
    ///
    /// Fails only if it is held by a search thread that panicked.
    #[inline(always)]
    fn ttable(&self) -> Result<MutexGuard<'_, TTable>> {
        self.ttable
            .lock()
            .map_err(|_| anyhow!("A thread holding the TTable panicked"))
    }
}

impl Default for Engine {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

/// Parses the value of a `spin` option, ensuring it is within `min..=max`.
fn parse_spin(name: &str, value: Option<&str>, min: usize, max: usize) -> Result<usize> {
    let Some(value) = value else {
        bail!("usage: setoption name {name} value <value>");
    };

    let Ok(n) = value.parse::<usize>() else {
        bail!("expected integer. got {value:?}");
    };

    if n < min {
        bail!("Minimum value for {name} is {min}");
    }
    if n > max {
        bail!("Maximum value for {name} is {max}");
    }

    Ok(n)
}

/// Loops endlessly to await input via `stdin`, sending all successfully-parsed commands through the supplied `sender`.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048);

    loop {
        // Clear the buffer, read input, and trim the trailing newline
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line when parsing UCI commands")?;

        // For ctrl + d
        if 0 == bytes {
            // Send the Quit command and exit this function
            sender
                .send(EngineCommand::Exit { cleanup: false })
                .context("Failed to send 'quit' command after receiving empty input")?;

            bail!("Engine received input of 0 bytes and is quitting");
        }

        // Trim any leading/trailing whitespace
        let buf = buffer.trim();

        // Ignore empty lines
        if buf.is_empty() {
            continue;
        }

        match buf.parse() {
            Ok(cmd) => sender
                .send(cmd)
                .context("Failed to send command to engine")?,

            // If an invalid command was received, just report it and continue running
            Err(err) => Engine::send_string(format!("{err:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(engine: &mut Engine, input: &str) -> bool {
        let cmd = input.parse().unwrap();
        engine.handle_command(cmd).unwrap()
    }

    #[test]
    fn test_position_command() {
        let mut engine = Engine::new();
        run(&mut engine, "position startpos moves e2e4 e7e5");
        assert_eq!(
            engine.position.to_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2"
        );

        run(&mut engine, "ucinewgame");
        assert_eq!(engine.position, Position::default());
    }

    #[test]
    fn test_invalid_position_keeps_previous() {
        let mut engine = Engine::new();
        run(&mut engine, "position startpos moves e2e4");
        let before = engine.position;

        let cmd = "position startpos moves e2e4 e2e4".parse().unwrap();
        assert!(engine.handle_command(cmd).is_err());
        assert_eq!(engine.position, before);
    }

    #[test]
    fn test_set_option() {
        let mut engine = Engine::new();
        run(&mut engine, "setoption name Hash value 2");
        assert_eq!(engine.get_option("Hash").as_deref(), Some("2"));

        run(&mut engine, "setoption name Depth value 3");
        assert_eq!(engine.config.depth, 3);

        let cmd = "setoption name Hash value 0".parse().unwrap();
        assert!(engine.handle_command(cmd).is_err());

        let cmd = "setoption name Threads value 4".parse().unwrap();
        assert!(engine.handle_command(cmd).is_err());
    }

    #[test]
    fn test_go_and_stop() {
        let mut engine = Engine::new();
        run(&mut engine, "position fen k7/8/KQ6/8/8/8/8/8 w - - 0 1");
        run(&mut engine, "go depth 2");

        let res = engine.await_search().unwrap();
        assert_eq!(res.depth, 2);
        assert!(res.score.is_mate());
        assert!(!engine.is_searching());
    }

    #[test]
    fn test_second_go_keeps_running_search() {
        let mut engine = Engine::new();
        run(&mut engine, "go depth 60");
        assert!(engine.search_thread.is_some());

        // Rejected, since a search is already running
        run(&mut engine, "go depth 1");
        assert!(engine.search_thread.is_some());
        assert!(engine.is_searching());

        run(&mut engine, "stop");
        assert!(engine.search_thread.is_none());
        assert!(!engine.is_searching());
    }

    #[test]
    fn test_table_commands_do_not_wait_on_search() {
        let mut engine = Engine::new();
        run(&mut engine, "go depth 60");
        run(&mut engine, "hashinfo");
        assert!(engine.is_searching());

        // Clearing the table ends the search first
        run(&mut engine, "setoption name Clear Hash");
        assert!(engine.search_thread.is_none());
        assert!(!engine.is_searching());
        assert_eq!(engine.ttable().unwrap().num_entries(), 0);
    }

    #[test]
    fn test_quit_ends_loop() {
        let mut engine = Engine::new();
        assert!(!run(&mut engine, "quit"));
        assert!(!run(&mut engine, "exit"));
        assert!(run(&mut engine, "isready"));
    }
}
