use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use log::{debug, info, warn};

use crate::error::EngineError;
use crate::game::config::EngineSettings;
use crate::game::moves::Move;

/// Runs an external UCI engine binary, one child process per search.
#[derive(Debug, Clone)]
pub struct UciEngine {
    path: PathBuf,
    args: Vec<String>,
}

impl UciEngine {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        UciEngine {
            path: path.into(),
            args: Vec::new(),
        }
    }

    /// Extra command-line arguments passed to the engine binary.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Search `fen` and return the engine's preferred move, or `None` when it
    /// has nothing to play.
    pub fn best_move(&self, fen: &str, settings: &EngineSettings) -> Result<Option<Move>, EngineError> {
        let mut child = Command::new(&self.path)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| EngineError::Unavailable(format!("{}: {}", self.path.display(), e)))?;

        let result = Self::search(&mut child, fen, settings);
        if let Err(e) = child.kill() {
            debug!("Engine process already gone: {}", e);
        }
        if let Err(e) = child.wait() {
            debug!("Could not reap engine process: {}", e);
        }
        result
    }

    /// The whole script, `quit` included, is written before any output is
    /// read, so an engine that stays silent on `go` still exits and the read
    /// ends at EOF.
    fn search(child: &mut Child, fen: &str, settings: &EngineSettings) -> Result<Option<Move>, EngineError> {
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine stdout not captured".into()))?;

        let script = command_script(fen, settings);
        for command in &script {
            debug!("uci <- {}", command);
        }
        stdin.write_all(script.join("\n").as_bytes())?;
        stdin.write_all(b"\n")?;
        stdin.flush()?;
        drop(stdin);

        let mut handshake = false;
        for line in BufReader::new(stdout).lines() {
            let line = line?;
            debug!("uci -> {}", line);
            if line.trim() == "uciok" {
                handshake = true;
            }
            if let Some(parsed) = parse_bestmove(&line) {
                let mv = parsed?;
                info!("Engine suggests {:?} for {}", mv.map(|m| m.to_string()), fen);
                return Ok(mv);
            }
        }

        if !handshake {
            return Err(EngineError::Protocol("engine never answered uciok".into()));
        }
        warn!("Engine exited without a bestmove line for {}", fen);
        Ok(None)
    }
}

/// Commands sent to the engine for one search, in order.
pub fn command_script(fen: &str, settings: &EngineSettings) -> Vec<String> {
    let mut script = vec!["uci".to_string()];
    if let Some(level) = settings.target_strength {
        script.push(format!("setoption name Skill Level value {}", level));
    }
    script.push("isready".to_string());
    script.push(format!("position fen {}", fen));
    script.push(format!("go depth {}", settings.search_depth));
    script.push("quit".to_string());
    script
}

/// Interpret one line of engine output. Returns `None` for anything that is
/// not a `bestmove` line.
pub fn parse_bestmove(line: &str) -> Option<Result<Option<Move>, EngineError>> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("bestmove") {
        return None;
    }
    Some(match tokens.next() {
        None | Some("(none)") | Some("0000") => Ok(None),
        Some(text) => text
            .parse::<Move>()
            .map(Some)
            .map_err(|_| EngineError::BadMove(text.to_string())),
    })
}
