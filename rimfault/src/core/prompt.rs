// SPDX-License-Identifier: MIT

//! Interactive yes/no capability used by the `ask` repair policy.
//!
//! The host picks the implementation: a terminal prompt for userspace tools, a fixed
//! answer where no operator exists (in-kernel style mounts), or a script in tests.
//! A prompt blocks the calling thread until answered. Concurrent `ask` negotiations
//! on independent threads must be serialized by the caller or prompts interleave.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

pub trait Prompt: Send + Sync {
    /// Asks `question` and blocks until a yes/no answer.
    fn ask_yes_no(&self, question: &str) -> bool;
}

/// Always gives the same answer without asking anyone.
#[derive(Debug, Clone, Copy)]
pub struct AutoPrompt {
    answer: bool,
}

impl AutoPrompt {
    pub const fn new(answer: bool) -> Self {
        Self { answer }
    }
}

impl Default for AutoPrompt {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Prompt for AutoPrompt {
    fn ask_yes_no(&self, question: &str) -> bool {
        log::trace!("auto-answering {:?} with {}", question, self.answer);
        self.answer
    }
}

/// Replays a fixed sequence of answers and records every question asked.
///
/// Answers `no` once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<bool>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().len()
    }
}

impl Prompt for ScriptedPrompt {
    fn ask_yes_no(&self, question: &str) -> bool {
        self.asked.lock().push(question.to_string());
        self.answers.lock().pop_front().unwrap_or(false)
    }
}

/// Line-oriented terminal prompt: writes `"<question> (y,n) "`, reads one line.
///
/// Anything starting with `y`/`Y` is a yes. End of input or a read error is a no.
pub struct LinePrompt<R, W> {
    io: Mutex<(R, W)>,
}

pub type StdinPrompt = LinePrompt<BufReader<Stdin>, Stdout>;

impl StdinPrompt {
    pub fn stdin() -> Self {
        LinePrompt::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }

    pub fn into_inner(self) -> (R, W) {
        self.io.into_inner()
    }

    fn ask_locked(reader: &mut R, writer: &mut W, question: &str) -> io::Result<bool> {
        write!(writer, "{question} (y,n) ")?;
        writer.flush()?;
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(false);
        }
        Ok(matches!(line.trim_start().chars().next(), Some('y' | 'Y')))
    }
}

impl<R: BufRead + Send, W: Write + Send> Prompt for LinePrompt<R, W> {
    fn ask_yes_no(&self, question: &str) -> bool {
        let mut guard = self.io.lock();
        let (reader, writer) = &mut *guard;
        match Self::ask_locked(reader, writer, question) {
            Ok(answer) => answer,
            Err(e) => {
                log::warn!("prompt failed, answering no: {e}");
                false
            }
        }
    }
}
