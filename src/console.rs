use std::{
    collections::VecDeque,
    io::{self, stdin, stdout, BufRead, IsTerminal, Write},
};

use console::Term;

/// The machine's view of the outside world, reached through address 0.
pub trait Console {
    /// Block until a line of input is available. `None` once input is exhausted.
    fn read_line(&mut self) -> io::Result<Option<String>>;
    /// Print one accumulator value.
    fn write_line(&mut self, value: &str) -> io::Result<()>;
}

/// Process stdin/stdout. Prompts on an interactive terminal.
pub struct Terminal {
    interactive: bool,
}

impl Terminal {
    pub fn new() -> Self {
        Terminal {
            interactive: stdin().is_terminal(),
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for Terminal {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        if self.interactive {
            let term = Term::stdout();
            term.write_str("> ")?;
            return term.read_line().map(Some);
        }
        let mut buf = String::new();
        if stdin().lock().read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn write_line(&mut self, value: &str) -> io::Result<()> {
        let mut out = stdout().lock();
        writeln!(out, "{value}")?;
        out.flush()
    }
}

/// Console fed from a fixed list of lines, capturing everything written.
#[derive(Clone, Debug, Default)]
pub struct Scripted {
    input: VecDeque<String>,
    /// Every value written, in order
    pub output: Vec<String>,
    /// Echo written values to stdout as well
    echo: bool,
}

impl Scripted {
    pub fn new<I, S>(input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Scripted {
            input: input.into_iter().map(Into::into).collect(),
            output: Vec::new(),
            echo: false,
        }
    }

    /// Input taken from the lines of `text`.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines())
    }

    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }
}

impl Console for Scripted {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.input.pop_front())
    }

    fn write_line(&mut self, value: &str) -> io::Result<()> {
        if self.echo {
            println!("{value}");
        }
        self.output.push(value.to_string());
        Ok(())
    }
}
