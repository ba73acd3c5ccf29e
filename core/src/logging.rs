//! # Terminal Logging
//!
//! A [`WriteSolverLog`] implementation writing coloured progress lines with
//! CPU timestamps.

use std::{fmt, io::Write, time::Duration};

use cpu_time::ProcessTime;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::{oracle::SolveResult, Phase, WriteSolverLog};

/// Which events a [`TermLogger`] writes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoggerConfig {
    pub log_models: bool,
    pub log_oracle_calls: bool,
    pub log_cores: bool,
    pub log_bounds: bool,
    pub log_aggregates: bool,
    /// Depth up to which routines are logged
    pub log_routines: usize,
    pub log_messages: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            log_models: true,
            log_oracle_calls: false,
            log_cores: false,
            log_bounds: true,
            log_aggregates: false,
            log_routines: 0,
            log_messages: true,
        }
    }
}

impl LoggerConfig {
    /// Logs everything
    pub fn all() -> Self {
        LoggerConfig {
            log_models: true,
            log_oracle_calls: true,
            log_cores: true,
            log_bounds: true,
            log_aggregates: true,
            log_routines: usize::MAX,
            log_messages: true,
        }
    }
}

/// Logger writing to a terminal or any other coloured writer
pub struct TermLogger<W = StandardStream> {
    out: W,
    config: LoggerConfig,
    routine_stack: Vec<(&'static str, ProcessTime)>,
}

impl TermLogger<StandardStream> {
    /// Creates a logger writing to standard output
    pub fn stdout(color: ColorChoice, config: LoggerConfig) -> Self {
        Self::new(StandardStream::stdout(color), config)
    }
}

impl<W: WriteColor> TermLogger<W> {
    pub fn new(out: W, config: LoggerConfig) -> Self {
        TermLogger {
            out,
            config,
            routine_stack: vec![],
        }
    }

    /// Gets the underlying writer
    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, color: Color, key: &str, args: fmt::Arguments) -> anyhow::Result<()> {
        self.out.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(self.out, "{key}")?;
        self.out.reset()?;
        writeln!(self.out, ": {args}")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: WriteColor> WriteSolverLog for TermLogger<W> {
    fn log_model(&mut self, cost: u64, phase: Phase) -> anyhow::Result<()> {
        if self.config.log_models {
            self.write_line(
                Color::Magenta,
                "model",
                format_args!(
                    "cost: {}; phase: {}; cpu-time: {}",
                    cost,
                    phase,
                    DurPrinter::new(ProcessTime::now().as_duration()),
                ),
            )?;
        }
        Ok(())
    }

    fn log_oracle_call(&mut self, result: SolveResult) -> anyhow::Result<()> {
        if self.config.log_oracle_calls {
            self.write_line(
                Color::Magenta,
                "oracle call",
                format_args!(
                    "result: {}; cpu-time: {}",
                    result,
                    DurPrinter::new(ProcessTime::now().as_duration()),
                ),
            )?;
        }
        Ok(())
    }

    fn log_core(&mut self, weight: u64, len: usize) -> anyhow::Result<()> {
        if self.config.log_cores {
            self.write_line(
                Color::Magenta,
                "extracted core",
                format_args!("weight: {}; len: {}", weight, len),
            )?;
        }
        Ok(())
    }

    fn log_bounds(&mut self, lower: u64, upper: u64) -> anyhow::Result<()> {
        if self.config.log_bounds {
            self.write_line(
                Color::Cyan,
                "bounds",
                format_args!(
                    "lb: {}; ub: {}; cpu-time: {}",
                    lower,
                    BoundPrinter::new(upper),
                    DurPrinter::new(ProcessTime::now().as_duration()),
                ),
            )?;
        }
        Ok(())
    }

    fn log_aggregate(&mut self, bound: u64) -> anyhow::Result<()> {
        if self.config.log_aggregates {
            self.write_line(Color::Cyan, "aggregate", format_args!("bound: {}", bound))?;
        }
        Ok(())
    }

    fn log_routine_start(&mut self, desc: &'static str) -> anyhow::Result<()> {
        self.routine_stack.push((desc, ProcessTime::now()));

        if self.config.log_routines >= self.routine_stack.len() {
            self.write_line(Color::Green, ">>> routine start", format_args!("{}", desc))?;
        }
        Ok(())
    }

    fn log_routine_end(&mut self) -> anyhow::Result<()> {
        let Some((desc, start)) = self.routine_stack.pop() else {
            anyhow::bail!("routine stack out of sync");
        };

        if self.config.log_routines > self.routine_stack.len() {
            let duration = ProcessTime::now().duration_since(start);
            self.write_line(
                Color::Red,
                "<<< routine end",
                format_args!("{}; duration: {}", desc, DurPrinter::new(duration)),
            )?;
        }
        Ok(())
    }

    fn log_end_solve(&mut self) -> anyhow::Result<()> {
        while !self.routine_stack.is_empty() {
            self.log_routine_end()?;
        }
        Ok(())
    }

    fn log_message(&mut self, msg: &str) -> anyhow::Result<()> {
        if self.config.log_messages {
            self.write_line(Color::Yellow, "message", format_args!("{}", msg))?;
        }
        Ok(())
    }
}

struct BoundPrinter {
    bound: u64,
}

impl BoundPrinter {
    fn new(bound: u64) -> Self {
        BoundPrinter { bound }
    }
}

impl fmt::Display for BoundPrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bound == u64::MAX {
            write!(f, "inf")
        } else {
            write!(f, "{}", self.bound)
        }
    }
}

struct DurPrinter {
    dur: Duration,
}

impl DurPrinter {
    fn new(dur: Duration) -> Self {
        Self { dur }
    }
}

impl fmt::Display for DurPrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.dur)
    }
}
