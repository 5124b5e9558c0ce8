//! Command execution against a session's registry.
//!
//! An [`Interpreter`] owns one [`Registry`] and one codec. Nothing is global:
//! two interpreters never see each other's images, which is what lets the CLI
//! run several scripts side by side.
//!
//! ## Error policy
//!
//! A failing line never takes the process down. Under
//! [`ErrorPolicy::Skip`] the failure is recorded and the next line runs;
//! under [`ErrorPolicy::Abort`] the script stops at the first failure. Either
//! way the caller gets a [`ScriptReport`] listing every failure with its
//! 1-based line number.
//!
//! ## Nested scripts
//!
//! `run <script>` executes another file in the same session with the same
//! policy. Its failures are merged into the outer report, an abort or a
//! `quit` inside it stops the outer script too, and nesting is capped by
//! [`InterpreterSettings::max_script_depth`].

use crate::codec::RasterCodec;
use crate::command::{Command, CommandError, Region, decode_line, parse_line};
use crate::error::ErrorKind;
use crate::mask::{apply_mask, split_view};
use crate::ops::{self, ColorCorrection, Percent};
use crate::raster::Raster;
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What a script does after a failing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Report the failure and carry on with the next line.
    #[default]
    Skip,
    /// Stop at the first failure.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterSettings {
    pub on_error: ErrorPolicy,
    /// Deepest allowed chain of `run` commands, counting the outermost
    /// script file.
    pub max_script_depth: usize,
    pub color_correction: ColorCorrection,
}

impl InterpreterSettings {
    pub const DEFAULT_MAX_SCRIPT_DEPTH: usize = 8;
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            on_error: ErrorPolicy::Skip,
            max_script_depth: Self::DEFAULT_MAX_SCRIPT_DEPTH,
            color_correction: ColorCorrection::default(),
        }
    }
}

/// Geometry of a registered raster, as reported by `info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub max_value: u32,
}

/// Result of one successfully executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Rasters written to the registry, in operand order.
    Stored(Vec<String>),
    Saved { name: String, path: PathBuf },
    Removed(String),
    Info(RasterInfo),
    Listed(Vec<String>),
    Ran(ScriptReport),
    Quit,
}

impl Outcome {
    /// True for `quit`, and for a nested `run` that reached a `quit`.
    pub fn ends_session(&self) -> bool {
        match self {
            Outcome::Quit => true,
            Outcome::Ran(report) => report.quit,
            _ => false,
        }
    }
}

/// One failing line of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFailure {
    pub origin: String,
    /// 1-based.
    pub line: usize,
    pub text: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Summary of one script run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptReport {
    pub origin: String,
    /// Commands that completed, not counting blank and comment lines.
    pub executed: usize,
    pub failures: Vec<LineFailure>,
    /// Stopped early by [`ErrorPolicy::Abort`].
    pub aborted: bool,
    /// Stopped early by `quit`.
    pub quit: bool,
}

impl ScriptReport {
    fn new(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Streamed to the caller as each line finishes.
#[derive(Debug, Clone, Copy)]
pub enum LineEvent<'a> {
    Completed {
        origin: &'a str,
        line: usize,
        outcome: &'a Outcome,
    },
    Failed(&'a LineFailure),
}

pub struct Interpreter<C: RasterCodec> {
    registry: Registry,
    codec: C,
    settings: InterpreterSettings,
    depth: usize,
}

impl<C: RasterCodec> Interpreter<C> {
    pub fn new(codec: C, settings: InterpreterSettings) -> Self {
        Self {
            registry: Registry::new(),
            codec,
            settings,
            depth: 0,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn settings(&self) -> &InterpreterSettings {
        &self.settings
    }

    /// Execute one command. Nested `run` uses the configured error policy.
    pub fn execute(&mut self, command: Command) -> Result<Outcome, CommandError> {
        self.execute_with(command, self.settings.on_error, &mut |_| {})
    }

    /// Parse and execute one line. `Ok(None)` for blank and comment lines.
    ///
    /// Events from a nested `run` are passed to `sink` as they happen.
    pub fn execute_line(
        &mut self,
        line: &str,
        sink: &mut dyn FnMut(LineEvent<'_>),
    ) -> Result<Option<Outcome>, CommandError> {
        match parse_line(line)? {
            Some(command) => self
                .execute_with(command, self.settings.on_error, sink)
                .map(Some),
            None => Ok(None),
        }
    }

    /// Run a script file with the configured error policy.
    pub fn run_script(
        &mut self,
        path: &Path,
        sink: &mut dyn FnMut(LineEvent<'_>),
    ) -> Result<ScriptReport, CommandError> {
        self.run_file(path, self.settings.on_error, sink)
    }

    /// Run every line of `reader` until it ends, the policy aborts, or a
    /// `quit` is reached.
    ///
    /// Only a failure to read the stream itself is returned as `Err`; command
    /// failures end up in the report.
    pub fn run_lines<R: BufRead>(
        &mut self,
        origin: &str,
        mut reader: R,
        policy: ErrorPolicy,
        sink: &mut dyn FnMut(LineEvent<'_>),
    ) -> Result<ScriptReport, CommandError> {
        info!(origin, ?policy, "running script");
        let mut report = ScriptReport::new(origin);
        let mut bytes = Vec::new();
        let mut line = 0;

        while next_line(&mut reader, &mut bytes)? {
            line += 1;
            let text = String::from_utf8_lossy(&bytes);

            let result = match decode_line(&bytes).and_then(parse_line) {
                Ok(Some(command)) => self.execute_with(command, policy, sink),
                Ok(None) => continue,
                Err(e) => Err(e),
            };

            match result {
                Ok(outcome) => {
                    report.executed += 1;
                    sink(LineEvent::Completed {
                        origin,
                        line,
                        outcome: &outcome,
                    });
                    match outcome {
                        Outcome::Ran(nested) => {
                            report.failures.extend(nested.failures);
                            if nested.aborted {
                                report.aborted = true;
                                break;
                            }
                            if nested.quit {
                                report.quit = true;
                                break;
                            }
                        }
                        Outcome::Quit => {
                            report.quit = true;
                            break;
                        }
                        _ => {}
                    }
                }
                Err(error) => {
                    warn!(origin, line, error = %error, "command failed");
                    let failure = LineFailure {
                        origin: origin.to_string(),
                        line,
                        text: text.trim().to_string(),
                        kind: error.kind(),
                        message: error.to_string(),
                    };
                    sink(LineEvent::Failed(&failure));
                    report.failures.push(failure);
                    if policy == ErrorPolicy::Abort {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        info!(
            origin,
            executed = report.executed,
            failures = report.failures.len(),
            aborted = report.aborted,
            "script finished"
        );
        Ok(report)
    }

    fn run_file(
        &mut self,
        path: &Path,
        policy: ErrorPolicy,
        sink: &mut dyn FnMut(LineEvent<'_>),
    ) -> Result<ScriptReport, CommandError> {
        if self.depth >= self.settings.max_script_depth {
            return Err(CommandError::InvalidArgument(format!(
                "cannot run {}: scripts nested deeper than {} levels",
                path.display(),
                self.settings.max_script_depth
            )));
        }
        let file = File::open(path)
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", path.display())))?;

        self.depth += 1;
        let report = self.run_lines(
            &path.display().to_string(),
            BufReader::new(file),
            policy,
            sink,
        );
        self.depth -= 1;
        report
    }

    fn execute_with(
        &mut self,
        command: Command,
        policy: ErrorPolicy,
        sink: &mut dyn FnMut(LineEvent<'_>),
    ) -> Result<Outcome, CommandError> {
        debug!(command = %command.name(), "executing");
        match command {
            Command::Load { path, dest } => {
                let raster = self.codec.load(&path)?;
                Ok(self.store(dest, raster))
            }
            Command::Save { path, src } => {
                self.codec.save(self.registry.get(&src)?, &path)?;
                Ok(Outcome::Saved { name: src, path })
            }
            Command::Brighten { amount, src, dest } => {
                let result = ops::brighten(self.registry.get(&src)?, amount)?;
                Ok(self.store(dest, result))
            }
            Command::FlipHorizontal { src, dest } => {
                let result = ops::flip_horizontal(self.registry.get(&src)?)?;
                Ok(self.store(dest, result))
            }
            Command::FlipVertical { src, dest } => {
                let result = ops::flip_vertical(self.registry.get(&src)?)?;
                Ok(self.store(dest, result))
            }
            Command::Apply {
                op,
                src,
                dest,
                region,
            } => {
                let image = self.registry.get(&src)?;
                let result = match region {
                    Region::Full => op.apply(image)?,
                    Region::Mask(mask) => apply_mask(image, self.registry.get(&mask)?, op)?,
                    Region::Split(percent) => split_view(image, &op.apply(image)?, percent)?,
                };
                Ok(self.store(dest, result))
            }
            Command::SplitChannels { src, dests } => {
                let rasters = ops::split_channels(self.registry.get(&src)?)?;
                for (name, raster) in dests.iter().zip(rasters) {
                    self.registry.put(name.clone(), raster);
                }
                Ok(Outcome::Stored(dests.to_vec()))
            }
            Command::Combine { sources, dest } => {
                let [r, g, b] = &sources;
                let result = ops::combine(
                    self.registry.get(r)?,
                    self.registry.get(g)?,
                    self.registry.get(b)?,
                )?;
                Ok(self.store(dest, result))
            }
            Command::Downscale {
                width,
                height,
                src,
                dest,
            } => {
                let result = ops::downscale(self.registry.get(&src)?, width, height)?;
                Ok(self.store(dest, result))
            }
            Command::Compress { ratio, src, dest } => {
                let result = ops::compress(self.registry.get(&src)?, ratio)?;
                Ok(self.store(dest, result))
            }
            Command::ColorCorrect { src, dest, split } => {
                let image = self.registry.get(&src)?;
                let corrected = ops::color_correct(image, self.settings.color_correction)?;
                let result = with_split(image, corrected, split)?;
                Ok(self.store(dest, result))
            }
            Command::AdjustLevels {
                levels,
                src,
                dest,
                split,
            } => {
                let image = self.registry.get(&src)?;
                let adjusted = ops::adjust_levels(image, levels)?;
                let result = with_split(image, adjusted, split)?;
                Ok(self.store(dest, result))
            }
            Command::Histogram { src, dest } => {
                let result = ops::histogram(self.registry.get(&src)?)?;
                Ok(self.store(dest, result))
            }
            Command::Info { name } => {
                let raster = self.registry.get(&name)?;
                Ok(Outcome::Info(RasterInfo {
                    width: raster.width(),
                    height: raster.height(),
                    max_value: raster.max_value(),
                    name,
                }))
            }
            Command::Remove { name } => {
                self.registry.remove(&name)?;
                Ok(Outcome::Removed(name))
            }
            Command::List => Ok(Outcome::Listed(self.registry.names())),
            Command::Run { path } => self.run_file(&path, policy, sink).map(Outcome::Ran),
            Command::Quit => Ok(Outcome::Quit),
        }
    }

    fn store(&mut self, dest: String, raster: Raster) -> Outcome {
        self.registry.put(dest.clone(), raster);
        Outcome::Stored(vec![dest])
    }
}

fn with_split(
    original: &Raster,
    transformed: Raster,
    split: Option<Percent>,
) -> Result<Raster, CommandError> {
    match split {
        Some(percent) => Ok(split_view(original, &transformed, percent)?),
        None => Ok(transformed),
    }
}

/// Read the next raw line into `buf`. `false` at end of input.
///
/// Lines are read as bytes so that one undecodable line fails on its own
/// instead of ending the whole stream.
fn next_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    Ok(reader.read_until(b'\n', buf)? > 0)
}

/// Parse every line of a script without executing anything.
///
/// The report's `executed` field counts the commands that parsed.
pub fn check_script<R: BufRead>(
    origin: &str,
    mut reader: R,
) -> Result<ScriptReport, CommandError> {
    let mut report = ScriptReport::new(origin);
    let mut bytes = Vec::new();
    let mut line = 0;
    while next_line(&mut reader, &mut bytes)? {
        line += 1;
        match decode_line(&bytes).and_then(parse_line) {
            Ok(Some(_)) => report.executed += 1,
            Ok(None) => {}
            Err(error) => report.failures.push(LineFailure {
                origin: origin.to_string(),
                line,
                text: String::from_utf8_lossy(&bytes).trim().to_string(),
                kind: error.kind(),
                message: error.to_string(),
            }),
        }
    }
    Ok(report)
}
