//! Command/response connection to a lean-gym REPL.
//!
//! Commands are pipelined: any number of them can be issued before a single
//! [`Connection::collect`] drains the responses. lean-gym answers commands in
//! arrival order with exactly one response line each, so the n-th decoded
//! response belongs to the n-th command issued since the last collect. Nothing
//! checks this pairing; it is the REPL's contract.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use crate::command::Command;
use crate::config::{expand_path, LeanGymConfig};
use crate::error::{Error, Result};
use crate::log::OutputLogReader;
use crate::response::{decode_line, ResponseRecord};
use crate::session::{Multiplexer, Screen, Session};

/// Lifecycle state of a connection. Transitions only from Open to Closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

/// Number of session names handed out so far by any factory in this process.
/// screen addresses sessions by name, so two factories must never reuse one.
static SESSIONS: AtomicU64 = AtomicU64::new(0);

/// Creates connections and hands out their session names.
pub struct ConnectionFactory {
    config: LeanGymConfig,
    multiplexer: Arc<dyn Multiplexer>,
}

impl ConnectionFactory {
    /// Create a factory launching sessions with GNU screen.
    pub fn new(config: LeanGymConfig) -> Self {
        let multiplexer = Arc::new(Screen::from_config(&config));
        Self::with_multiplexer(config, multiplexer)
    }

    /// Create a factory launching sessions with a custom multiplexer.
    pub fn with_multiplexer(config: LeanGymConfig, multiplexer: Arc<dyn Multiplexer>) -> Self {
        Self {
            config,
            multiplexer,
        }
    }

    /// The process-wide factory configured from the environment.
    pub fn global() -> &'static ConnectionFactory {
        static GLOBAL: OnceLock<ConnectionFactory> = OnceLock::new();
        GLOBAL.get_or_init(|| ConnectionFactory::new(LeanGymConfig::from_env()))
    }

    pub fn config(&self) -> &LeanGymConfig {
        &self.config
    }

    /// Allocate the next session name, `{prefix}{n}`.
    ///
    /// n starts at 1 and increases across all factories of the process.
    pub fn next_session_name(&self) -> String {
        let n = SESSIONS.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}{}", self.config.session_prefix, n)
    }

    /// Launch a REPL session rooted at the lean-gym directory `path`.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<Connection> {
        let path = path.as_ref();
        // Only UTF-8 paths can carry a `~` to expand.
        let working_dir = match path.to_str() {
            Some(s) => expand_path(s),
            None => path.to_path_buf(),
        };
        let session = Session::start(
            self.next_session_name(),
            &working_dir,
            &self.config,
            Arc::clone(&self.multiplexer),
        )?;
        Connection::attach(session, &self.config)
    }

    /// Run `f` with a fresh connection, closing it on every exit path.
    ///
    /// An error returned by `f` takes precedence over an error from closing.
    pub fn with_connection<T>(
        &self,
        path: impl AsRef<Path>,
        f: impl FnOnce(&mut Connection) -> Result<T>,
    ) -> Result<T> {
        let mut connection = self.open(path)?;
        let result = f(&mut connection);

        // Dropping closes too, which covers unwinding out of `f`.
        let closed = if connection.is_open() {
            connection.close()
        } else {
            Ok(())
        };

        match result {
            Ok(value) => closed.map(|()| value),
            Err(e) => {
                if let Err(close_err) = closed {
                    tracing::warn!(error = %close_err, "Failed to close lean-gym connection");
                }
                Err(e)
            }
        }
    }
}

impl Default for ConnectionFactory {
    fn default() -> Self {
        Self::new(LeanGymConfig::default())
    }
}

/// Run `f` with a connection from [`ConnectionFactory::global`], closing it
/// on every exit path.
pub fn invoke_lean<T>(
    path: impl AsRef<Path>,
    f: impl FnOnce(&mut Connection) -> Result<T>,
) -> Result<T> {
    ConnectionFactory::global().with_connection(path, f)
}

/// An open channel to one lean-gym REPL session.
#[derive(Debug)]
pub struct Connection {
    session: Session,
    /// None once closed.
    reader: Option<OutputLogReader>,
    /// Commands issued and not yet answered.
    outstanding: usize,
    state: ConnectionState,
    /// Responses decoded by a collect that timed out, in log order.
    collected: Vec<ResponseRecord>,
    poll_interval: Duration,
    timeout_ms: Option<u64>,
    verbose: bool,
}

impl Connection {
    fn attach(session: Session, config: &LeanGymConfig) -> Result<Self> {
        let reader = OutputLogReader::open(session.log_path())?;
        Ok(Self {
            session,
            reader: Some(reader),
            outstanding: 0,
            state: ConnectionState::Open,
            collected: Vec::new(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            timeout_ms: config.timeout_ms,
            verbose: config.verbose,
        })
    }

    /// Open a connection with the process-wide factory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        ConnectionFactory::global().open(path)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Number of issued commands whose responses have not been collected.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn session_name(&self) -> &str {
        self.session.name()
    }

    pub fn log_path(&self) -> &Path {
        self.session.log_path()
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        match self.state {
            ConnectionState::Open => Ok(()),
            ConnectionState::Closed => Err(Error::invalid_state(operation)),
        }
    }

    /// Send a command. Returning Ok means screen accepted the keystrokes,
    /// not that the REPL received them.
    pub fn submit(&mut self, command: &Command) -> Result<()> {
        self.ensure_open(command.name())?;

        let wire = command.to_wire()?;
        if self.verbose {
            tracing::debug!(session = %self.session.name(), "lean-gym request: {}", wire);
        }

        self.session.send(&wire)?;
        self.outstanding += 1;
        Ok(())
    }

    /// Start a search for the declaration `name`.
    ///
    /// `namespaces` is not forwarded: the REPL always receives an empty
    /// namespace argument.
    pub fn init_search(&mut self, name: &str, namespaces: &[&str]) -> Result<()> {
        if !namespaces.is_empty() {
            tracing::debug!(?namespaces, "Open namespaces are not sent with init_search");
        }
        self.submit(&Command::init_search(name))
    }

    /// Run `tactic` in a tactic state of a search.
    pub fn run_tac(&mut self, search_id: u64, tactic_state_id: u64, tactic: &str) -> Result<()> {
        self.submit(&Command::run_tac(search_id, tactic_state_id, tactic))
    }

    /// Drop a search.
    pub fn clear_search(&mut self, search_id: u64) -> Result<()> {
        self.submit(&Command::clear_search(search_id))
    }

    /// Wait until every outstanding command is answered and return the
    /// responses in log order.
    ///
    /// A response line that fails to decode still answers one command and
    /// shows up as an empty record. On timeout the responses read so far are
    /// kept and returned ahead of later ones by the next collect.
    pub fn collect(&mut self) -> Result<Vec<ResponseRecord>> {
        self.ensure_open("collect")?;
        let Some(reader) = self.reader.as_mut() else {
            return Err(Error::invalid_state("collect"));
        };

        let start = Instant::now();
        while self.outstanding > 0 {
            // Checked on every pass so a stream of noise cannot outlast the deadline.
            if let Some(timeout_ms) = self.timeout_ms {
                if start.elapsed() >= Duration::from_millis(timeout_ms) {
                    tracing::debug!(
                        outstanding = self.outstanding,
                        "Timed out waiting for lean-gym responses"
                    );
                    return Err(Error::timeout(timeout_ms));
                }
            }

            let Some(line) = reader.next_line()? else {
                std::thread::sleep(self.poll_interval);
                continue;
            };

            match decode_line(&line) {
                Some(record) => {
                    if self.verbose {
                        tracing::debug!(session = %self.session.name(), "lean-gym response: {}", line);
                    }
                    if record.is_empty() {
                        tracing::warn!(line = %line, "Undecodable lean-gym response");
                    }
                    self.collected.push(record);
                    self.outstanding -= 1;
                }
                None => tracing::trace!(line = %line, "Ignoring REPL output"),
            }
        }

        Ok(std::mem::take(&mut self.collected))
    }

    /// Quit the session and delete its log.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open("close")?;
        self.state = ConnectionState::Closed;

        // Quitting is best effort; the log is removed regardless.
        if let Err(e) = self.session.terminate() {
            tracing::warn!(session = %self.session.name(), error = %e, "Failed to quit lean-gym session");
        }
        if self.outstanding > 0 {
            tracing::debug!(
                outstanding = self.outstanding,
                "Closing lean-gym connection with unanswered commands"
            );
        }

        self.reader = None;
        self.session.remove_log()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.is_open() {
            let _ = self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::RecordingMultiplexer;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use tempfile::{tempdir, TempDir};

    /// Answers commands the way lean-gym does, after a line of noise.
    fn lean_gym_responder(keys: &str) -> Vec<String> {
        let (name, args): (String, Vec<String>) = serde_json::from_str(keys.trim_end()).unwrap();
        let response = match name.as_str() {
            "init_search" => r#"{"error":null,"proof_steps":[],"search_id":"0","tactic_state":"⊢ true","tactic_state_id":"0"}"#.to_string(),
            "run_tac" => {
                let next_state: u64 = args[1].parse::<u64>().unwrap() + 1;
                format!(
                    r#"{{"error":null,"proof_steps":["{tac}"],"search_id":"{sid}","tactic_state":"{tac}","tactic_state_id":"{next_state}"}}"#,
                    tac = args[2],
                    sid = args[0],
                )
            }
            "clear_search" => r#"{"error":null,"proof_steps":[],"search_id":null,"tactic_state":null,"tactic_state_id":null}"#.to_string(),
            other => panic!("unexpected command {other}"),
        };
        vec![format!("> {}", keys.trim_end()), response]
    }

    fn fast_config() -> LeanGymConfig {
        LeanGymConfig::default().with_poll_interval(1).with_timeout(2_000)
    }

    fn setup(mux: RecordingMultiplexer) -> (TempDir, Arc<RecordingMultiplexer>, ConnectionFactory) {
        let dir = tempdir().unwrap();
        let mux = Arc::new(mux);
        let factory = ConnectionFactory::with_multiplexer(fast_config(), mux.clone());
        (dir, mux, factory)
    }

    #[test]
    fn test_open_starts_in_open_state() {
        let (dir, mux, factory) = setup(RecordingMultiplexer::new());
        let conn = factory.open(dir.path()).unwrap();

        assert_eq!(conn.state(), ConnectionState::Open);
        assert_eq!(conn.outstanding(), 0);
        assert!(conn.session_name().starts_with("lean_repl"));
        assert!(conn.log_path().exists());
        assert_eq!(mux.launched(), vec![conn.session_name().to_string()]);
    }

    #[test]
    fn test_session_names_increment_per_factory() {
        let (dir, _mux, factory) = setup(RecordingMultiplexer::new());
        let first = factory.open(dir.path()).unwrap();
        let second = factory.open(dir.path()).unwrap();

        let index = |name: &str| name["lean_repl".len()..].parse::<u64>().unwrap();
        assert!(index(first.session_name()) >= 1);
        assert!(index(second.session_name()) > index(first.session_name()));
    }

    #[test]
    fn test_session_names_unique_across_factories() {
        let injected = ConnectionFactory::with_multiplexer(
            LeanGymConfig::default(),
            Arc::new(RecordingMultiplexer::new()),
        );
        let default = ConnectionFactory::default();
        let global = ConnectionFactory::global();

        let names: HashSet<String> = [
            injected.next_session_name(),
            default.next_session_name(),
            global.next_session_name(),
            injected.next_session_name(),
        ]
        .into_iter()
        .collect();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_open_expands_tilde_in_working_dir() {
        let Some(home) = std::env::var_os("HOME").map(std::path::PathBuf::from) else {
            return;
        };
        if !home.is_dir() {
            return;
        }
        let (_dir, mux, factory) = setup(RecordingMultiplexer::new());
        let conn = factory.open("~").unwrap();
        assert_eq!(mux.launched(), vec![conn.session_name().to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_open_keeps_non_utf8_working_dir() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let odd = dir.path().join(OsStr::from_bytes(b"gym-\xff"));
        if std::fs::create_dir(&odd).is_err() {
            // Some filesystems reject non-UTF-8 names.
            return;
        }
        let mux = Arc::new(RecordingMultiplexer::new());
        let factory = ConnectionFactory::with_multiplexer(fast_config(), mux.clone());

        let conn = factory.open(&odd).unwrap();
        assert_eq!(mux.launched(), vec![conn.session_name().to_string()]);
    }

    #[test]
    fn test_session_names_unique_across_threads() {
        let factory = Arc::new(ConnectionFactory::with_multiplexer(
            LeanGymConfig::default(),
            Arc::new(RecordingMultiplexer::new()),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let factory = Arc::clone(&factory);
                std::thread::spawn(move || {
                    (0..50)
                        .map(|_| factory.next_session_name())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let names: HashSet<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(names.len(), 400);
    }

    #[test]
    fn test_wire_lines_sent_to_session() {
        let (dir, mux, factory) = setup(RecordingMultiplexer::new());
        let mut conn = factory.open(dir.path()).unwrap();

        conn.init_search("nat.zero_add", &["nat"]).unwrap();
        conn.run_tac(0, 0, "intro n,\nsimp").unwrap();
        conn.clear_search(0).unwrap();

        let sent: Vec<String> = mux.sent().into_iter().map(|(_, keys)| keys).collect();
        assert_eq!(
            sent,
            vec![
                "[\"init_search\",[\"nat.zero_add\",\"\"]]\n".to_string(),
                "[\"run_tac\",[\"0\",\"0\",\"intro n,\\\\nsimp\"]]\n".to_string(),
                "[\"clear_search\",[\"0\"]]\n".to_string(),
            ]
        );
        assert_eq!(conn.outstanding(), 3);
    }

    #[test]
    fn test_collect_returns_responses_in_order() {
        let (dir, _mux, factory) = setup(RecordingMultiplexer::responding(lean_gym_responder));
        let mut conn = factory.open(dir.path()).unwrap();

        conn.init_search("foo", &[]).unwrap();
        conn.run_tac(0, 0, "simp").unwrap();
        conn.run_tac(0, 1, "refl").unwrap();
        conn.clear_search(0).unwrap();
        assert_eq!(conn.outstanding(), 4);

        let records = conn.collect().unwrap();
        assert_eq!(conn.outstanding(), 0);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].tactic_state(), Some("⊢ true"));
        assert_eq!(records[1].tactic_state_id(), Some(1));
        assert_eq!(records[1].proof_steps(), Some(&["simp".to_string()][..]));
        assert_eq!(records[2].tactic_state_id(), Some(2));
        assert_eq!(records[3].search_id(), None);
        assert!(records[3].is_null("search_id"));
    }

    #[test]
    fn test_collect_with_nothing_outstanding_is_empty() {
        let (dir, _mux, factory) = setup(RecordingMultiplexer::new());
        let mut conn = factory.open(dir.path()).unwrap();
        assert!(conn.collect().unwrap().is_empty());
    }

    #[test]
    fn test_consecutive_collects_do_not_repeat_records() {
        let (dir, _mux, factory) = setup(RecordingMultiplexer::responding(lean_gym_responder));
        let mut conn = factory.open(dir.path()).unwrap();

        conn.init_search("foo", &[]).unwrap();
        assert_eq!(conn.collect().unwrap().len(), 1);

        conn.run_tac(0, 0, "simp").unwrap();
        let records = conn.collect().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tactic_state_id(), Some(1));
    }

    #[test]
    fn test_multiline_tactic_round_trips() {
        let (dir, _mux, factory) = setup(RecordingMultiplexer::responding(lean_gym_responder));
        let mut conn = factory.open(dir.path()).unwrap();

        let tactic = "induction n,\n{ refl },\n{ simp }";
        conn.run_tac(0, 0, tactic).unwrap();
        let records = conn.collect().unwrap();
        assert_eq!(records[0].tactic_state(), Some(tactic));
    }

    #[test]
    fn test_noise_lines_are_skipped() {
        let (dir, mux, factory) = setup(RecordingMultiplexer::new());
        let mut conn = factory.open(dir.path()).unwrap();
        let name = conn.session_name().to_string();

        conn.clear_search(0).unwrap();
        mux.write_log(&name, "Lean (version 3.42.1)\n  {\"indented\":\"1\"}\n\n");
        mux.write_log(&name, "{\"error\":null}\n");

        let records = conn.collect().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_null("error"));
        assert_eq!(conn.outstanding(), 0);
    }

    #[test]
    fn test_malformed_response_consumes_a_slot() {
        let (dir, mux, factory) = setup(RecordingMultiplexer::new());
        let mut conn = factory.open(dir.path()).unwrap();
        let name = conn.session_name().to_string();

        conn.clear_search(0).unwrap();
        conn.clear_search(1).unwrap();
        mux.write_log(&name, "{garbled\n{\"search_id\":\"1\"}\n");

        let records = conn.collect().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].is_empty());
        assert_eq!(records[1].search_id(), Some(1));
    }

    #[test]
    fn test_partial_response_line_waits() {
        let (dir, mux, factory) = setup(RecordingMultiplexer::new());
        let mut conn = factory.open(dir.path()).unwrap();
        let name = conn.session_name().to_string();

        conn.clear_search(0).unwrap();
        mux.write_log(&name, "{\"search_id\":");

        let writer_mux = Arc::clone(&mux);
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            writer_mux.write_log(&name, "\"5\"}\n");
        });

        let records = conn.collect().unwrap();
        writer.join().unwrap();
        assert_eq!(records[0].search_id(), Some(5));
    }

    #[test]
    fn test_collect_timeout_keeps_partial_results() {
        let dir = tempdir().unwrap();
        let mux = Arc::new(RecordingMultiplexer::new());
        let config = LeanGymConfig::default().with_poll_interval(1).with_timeout(30);
        let factory = ConnectionFactory::with_multiplexer(config, mux.clone());
        let mut conn = factory.open(dir.path()).unwrap();
        let name = conn.session_name().to_string();

        conn.clear_search(1).unwrap();
        conn.clear_search(2).unwrap();
        mux.write_log(&name, "{\"search_id\":\"1\"}\n");

        let err = conn.collect().unwrap_err();
        assert!(matches!(err, Error::Timeout { duration_ms: 30 }));
        assert_eq!(conn.outstanding(), 1);

        mux.write_log(&name, "{\"search_id\":\"2\"}\n");
        let records = conn.collect().unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.search_id()).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_collect_times_out_while_noise_keeps_arriving() {
        let dir = tempdir().unwrap();
        let mux = Arc::new(RecordingMultiplexer::new());
        let config = LeanGymConfig::default().with_poll_interval(1).with_timeout(50);
        let factory = ConnectionFactory::with_multiplexer(config, mux.clone());
        let mut conn = factory.open(dir.path()).unwrap();
        let name = conn.session_name().to_string();

        conn.clear_search(0).unwrap();
        let noise = "lean-gym: still elaborating\n".repeat(200_000);
        mux.write_log(&name, &noise);

        let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let writer = {
            let (mux, name, stop) = (Arc::clone(&mux), name.clone(), Arc::clone(&stop));
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    mux.write_log(&name, "error: unknown tactic\n");
                }
            })
        };

        let start = Instant::now();
        let err = conn.collect().unwrap_err();
        let elapsed = start.elapsed();
        stop.store(true, Ordering::Relaxed);
        writer.join().unwrap();

        assert!(matches!(err, Error::Timeout { duration_ms: 50 }));
        assert!(elapsed < Duration::from_millis(1_000), "collect took {elapsed:?}");
        assert_eq!(conn.outstanding(), 1);
    }

    #[test]
    fn test_close_quits_session_and_removes_log() {
        let (dir, mux, factory) = setup(RecordingMultiplexer::new());
        let mut conn = factory.open(dir.path()).unwrap();
        let log = conn.log_path().to_path_buf();

        conn.close().unwrap();
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(!log.exists());
        assert_eq!(mux.quit_sessions(), vec![conn.session_name().to_string()]);
    }

    #[test]
    fn test_operations_after_close_fail() {
        let (dir, mux, factory) = setup(RecordingMultiplexer::new());
        let mut conn = factory.open(dir.path()).unwrap();
        conn.close().unwrap();

        assert!(conn.init_search("foo", &[]).unwrap_err().is_invalid_state());
        assert!(conn.run_tac(0, 0, "simp").unwrap_err().is_invalid_state());
        assert!(conn.clear_search(0).unwrap_err().is_invalid_state());
        assert!(conn.collect().unwrap_err().is_invalid_state());
        assert!(conn.close().unwrap_err().is_invalid_state());

        assert!(mux.sent().is_empty());
        assert_eq!(mux.quit_sessions().len(), 1);
    }

    #[test]
    fn test_drop_closes_open_connection() {
        let (dir, mux, factory) = setup(RecordingMultiplexer::new());
        let conn = factory.open(dir.path()).unwrap();
        let log = conn.log_path().to_path_buf();

        drop(conn);
        assert!(!log.exists());
        assert_eq!(mux.quit_sessions().len(), 1);
    }

    #[test]
    fn test_with_connection_closes_on_success() {
        let (dir, mux, factory) = setup(RecordingMultiplexer::responding(lean_gym_responder));

        let (log, records) = factory
            .with_connection(dir.path(), |conn| {
                conn.init_search("foo", &[])?;
                Ok((conn.log_path().to_path_buf(), conn.collect()?))
            })
            .unwrap();

        assert_eq!(records.len(), 1);
        assert!(!log.exists());
        assert_eq!(mux.quit_sessions(), mux.launched());
    }

    #[test]
    fn test_with_connection_closes_on_error() {
        let (dir, mux, factory) = setup(RecordingMultiplexer::new());
        let mut log = None;

        let result: Result<()> = factory.with_connection(dir.path(), |conn| {
            log = Some(conn.log_path().to_path_buf());
            Err(Error::SubprocessComm("search aborted".to_string()))
        });

        assert!(matches!(result, Err(Error::SubprocessComm(ref m)) if m == "search aborted"));
        assert!(!log.unwrap().exists());
        assert_eq!(mux.quit_sessions().len(), 1);
    }

    #[test]
    fn test_with_connection_tolerates_early_close() {
        let (dir, mux, factory) = setup(RecordingMultiplexer::new());
        let value = factory
            .with_connection(dir.path(), |conn| {
                conn.close()?;
                Ok(7)
            })
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(mux.quit_sessions().len(), 1);
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let (dir, mux, factory) = setup(RecordingMultiplexer::new());
        let err = factory.open(dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(mux.launched().is_empty());
    }

    #[test]
    fn test_open_without_screen_is_config_error() {
        let dir = tempdir().unwrap();
        let config = LeanGymConfig::default().with_multiplexer(dir.path().join("screen"));
        let factory = ConnectionFactory::new(config);
        let err = factory.open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    #[ignore = "requires lean-gym and GNU screen installed (set LEAN_GYM_PATH)"]
    fn test_lean_gym_search() {
        let path = std::env::var("LEAN_GYM_PATH").unwrap();
        let records = invoke_lean(path, |conn| {
            conn.init_search("int.prime.dvd_mul", &[])?;
            let init = conn.collect()?;
            let search_id = init[0].search_id().unwrap();
            let state_id = init[0].tactic_state_id().unwrap();

            conn.run_tac(search_id, state_id, "intros")?;
            conn.clear_search(search_id)?;
            conn.collect()
        })
        .unwrap();

        assert_eq!(records.len(), 2);
    }
}
