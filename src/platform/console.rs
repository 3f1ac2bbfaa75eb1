// Line-oriented console prompting

use crate::platform::signal::InterruptFlag;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

/// How often a waiting prompt checks for Ctrl-C
const INTERRUPT_POLL: Duration = Duration::from_millis(100);

pub trait Prompter {
    /// Show `prompt` and read one line. `None` means input is closed.
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}

/// Prompts on stdout, reads from stdin.
///
/// Lines are read on a helper thread so a raised interrupt can end the wait
/// without the blocked read returning.
pub struct StdinPrompter {
    lines: Receiver<String>,
    interrupt: InterruptFlag,
}

impl StdinPrompter {
    pub fn new(interrupt: InterruptFlag) -> Self {
        Self::from_reader(BufReader::new(std::io::stdin()), interrupt)
    }

    pub fn from_reader<R>(reader: R, interrupt: InterruptFlag) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, lines) = mpsc::channel();
        std::thread::spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::error!("Failed to read from stdin: {}", e);
                        break;
                    }
                }
            }
        });
        Self { lines, interrupt }
    }
}

impl Prompter for StdinPrompter {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        if let Err(e) = std::io::stdout().flush() {
            log::warn!("Failed to flush stdout: {}", e);
        }

        loop {
            if self.interrupt.is_raised() {
                return None;
            }
            match self.lines.recv_timeout(INTERRUPT_POLL) {
                Ok(line) => return Some(line.trim_end_matches('\r').to_string()),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

/// Answers prompts from a fixed script; input closes when the script runs out
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    /// Every prompt shown so far, in order
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front()
    }
}
