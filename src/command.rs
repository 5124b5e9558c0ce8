//! The textual command protocol.
//!
//! One command per line, whitespace separated. The first token names the
//! command (case-insensitive), the rest are operands in a fixed order, and the
//! destination name comes last. [`parse_line`] turns a line into a typed
//! [`Command`]; executing it is the interpreter's job.
//!
//! ```text
//! load photo.png photo
//! brighten 30 photo bright
//! blur bright mask soft            # masked: blur only where mask is black
//! sepia photo preview split 50     # left half sepia, right half original
//! levels-adjust 20 128 230 photo leveled
//! save out.png leveled
//! ```
//!
//! Blank lines and lines starting with `#` parse to `None`.

use crate::codec::CodecError;
use crate::error::{ErrorKind, OpError};
use crate::mask::MaskableOp;
use crate::ops::{Levels, Percent};
use crate::registry::RegistryError;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Unsupported command: {0}")]
    UnsupportedOption(String),
    #[error(transparent)]
    NotFound(#[from] RegistryError),
    #[error(transparent)]
    Operation(#[from] OpError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CommandError::UnsupportedOption(_) => ErrorKind::UnsupportedOption,
            CommandError::NotFound(e) => e.kind(),
            CommandError::Operation(e) => e.kind(),
            CommandError::Codec(e) => e.kind(),
            CommandError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Where a previewable operation takes effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    /// Every pixel.
    Full,
    /// Pixels where the named mask raster is pure black.
    Mask(String),
    /// Columns left of the given share of the width.
    Split(Percent),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load {
        path: PathBuf,
        dest: String,
    },
    Save {
        path: PathBuf,
        src: String,
    },
    Brighten {
        amount: i64,
        src: String,
        dest: String,
    },
    FlipHorizontal {
        src: String,
        dest: String,
    },
    FlipVertical {
        src: String,
        dest: String,
    },
    /// Blur, sharpen, sepia or a component extraction.
    Apply {
        op: MaskableOp,
        src: String,
        dest: String,
        region: Region,
    },
    SplitChannels {
        src: String,
        dests: [String; 3],
    },
    Combine {
        sources: [String; 3],
        dest: String,
    },
    Downscale {
        width: u32,
        height: u32,
        src: String,
        dest: String,
    },
    Compress {
        ratio: Percent,
        src: String,
        dest: String,
    },
    ColorCorrect {
        src: String,
        dest: String,
        split: Option<Percent>,
    },
    AdjustLevels {
        levels: Levels,
        src: String,
        dest: String,
        split: Option<Percent>,
    },
    Histogram {
        src: String,
        dest: String,
    },
    Info {
        name: String,
    },
    Remove {
        name: String,
    },
    List,
    Run {
        path: PathBuf,
    },
    Quit,
}

impl Command {
    /// The command word this was parsed from.
    pub fn name(&self) -> String {
        match self {
            Command::Load { .. } => "load".into(),
            Command::Save { .. } => "save".into(),
            Command::Brighten { .. } => "brighten".into(),
            Command::FlipHorizontal { .. } => "horizontal-flip".into(),
            Command::FlipVertical { .. } => "vertical-flip".into(),
            Command::Apply { op, .. } => op.name(),
            Command::SplitChannels { .. } => "rgb-split".into(),
            Command::Combine { .. } => "rgb-combine".into(),
            Command::Downscale { .. } => "downscale".into(),
            Command::Compress { .. } => "compress".into(),
            Command::ColorCorrect { .. } => "color-correct".into(),
            Command::AdjustLevels { .. } => "levels-adjust".into(),
            Command::Histogram { .. } => "histogram".into(),
            Command::Info { .. } => "info".into(),
            Command::Remove { .. } => "remove".into(),
            Command::List => "list".into(),
            Command::Run { .. } => "run".into(),
            Command::Quit => "quit".into(),
        }
    }
}

/// Every command word with its operand layout.
pub const USAGE: &[(&str, &str)] = &[
    ("load", "load <path> <dest>"),
    ("save", "save <path> <src>"),
    ("brighten", "brighten <amount> <src> <dest>"),
    ("horizontal-flip", "horizontal-flip <src> <dest>"),
    ("vertical-flip", "vertical-flip <src> <dest>"),
    ("<component>-component", "<component>-component <src> [<mask>] <dest> [split <p>]"),
    ("blur", "blur <src> [<mask>] <dest> [split <p>]"),
    ("sharpen", "sharpen <src> [<mask>] <dest> [split <p>]"),
    ("sepia", "sepia <src> [<mask>] <dest> [split <p>]"),
    ("rgb-split", "rgb-split <src> <dest-red> <dest-green> <dest-blue>"),
    ("rgb-combine", "rgb-combine <red> <green> <blue> <dest>"),
    ("downscale", "downscale <width> <height> <src> <dest>"),
    ("compress", "compress <percent> <src> <dest>"),
    ("color-correct", "color-correct <src> <dest> [split <p>]"),
    ("levels-adjust", "levels-adjust <black> <mid> <white> <src> <dest> [split <p>]"),
    ("histogram", "histogram <src> <dest>"),
    ("info", "info <name>"),
    ("remove", "remove <name>"),
    ("list", "list"),
    ("run", "run <script>"),
    ("quit", "quit | exit | q"),
];

fn usage(word: &str) -> &'static str {
    USAGE
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, usage)| *usage)
        .unwrap_or("see the command table")
}

/// View a raw input line as text. Bytes that are not UTF-8 are an
/// `InvalidArgument` for that line alone.
pub fn decode_line(bytes: &[u8]) -> Result<&str, CommandError> {
    std::str::from_utf8(bytes)
        .map_err(|e| CommandError::InvalidArgument(format!("line is not valid UTF-8: {e}")))
}

/// Parse one line. `Ok(None)` for blank lines and `#` comments.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let word = tokens[0].to_ascii_lowercase();
    parse_tokens(&word, &tokens[1..]).map(Some)
}

fn parse_tokens(word: &str, args: &[&str]) -> Result<Command, CommandError> {
    let command = match word {
        "load" => {
            let [path, dest] = operands(word, args)?;
            Command::Load {
                path: PathBuf::from(path),
                dest: dest.to_string(),
            }
        }
        "save" => {
            let [path, src] = operands(word, args)?;
            Command::Save {
                path: PathBuf::from(path),
                src: src.to_string(),
            }
        }
        "brighten" => {
            let [amount, src, dest] = operands(word, args)?;
            Command::Brighten {
                amount: number(word, "amount", amount)?,
                src: src.to_string(),
                dest: dest.to_string(),
            }
        }
        "horizontal-flip" => {
            let [src, dest] = operands(word, args)?;
            Command::FlipHorizontal {
                src: src.to_string(),
                dest: dest.to_string(),
            }
        }
        "vertical-flip" => {
            let [src, dest] = operands(word, args)?;
            Command::FlipVertical {
                src: src.to_string(),
                dest: dest.to_string(),
            }
        }
        "rgb-split" => {
            let [src, r, g, b] = operands(word, args)?;
            Command::SplitChannels {
                src: src.to_string(),
                dests: [r, g, b].map(str::to_string),
            }
        }
        "rgb-combine" => {
            let [r, g, b, dest] = operands(word, args)?;
            Command::Combine {
                sources: [r, g, b].map(str::to_string),
                dest: dest.to_string(),
            }
        }
        "downscale" => {
            let [width, height, src, dest] = operands(word, args)?;
            Command::Downscale {
                width: number(word, "width", width)?,
                height: number(word, "height", height)?,
                src: src.to_string(),
                dest: dest.to_string(),
            }
        }
        "compress" => {
            let [ratio, src, dest] = operands(word, args)?;
            Command::Compress {
                ratio: Percent::new(number(word, "percent", ratio)?)?,
                src: src.to_string(),
                dest: dest.to_string(),
            }
        }
        "color-correct" => {
            let (args, split) = split_clause(word, args)?;
            let [src, dest] = operands(word, args)?;
            Command::ColorCorrect {
                src: src.to_string(),
                dest: dest.to_string(),
                split,
            }
        }
        "levels-adjust" => {
            let (args, split) = split_clause(word, args)?;
            let [black, mid, white, src, dest] = operands(word, args)?;
            Command::AdjustLevels {
                levels: Levels::new(
                    number(word, "black", black)?,
                    number(word, "mid", mid)?,
                    number(word, "white", white)?,
                ),
                src: src.to_string(),
                dest: dest.to_string(),
                split,
            }
        }
        "histogram" => {
            let [src, dest] = operands(word, args)?;
            Command::Histogram {
                src: src.to_string(),
                dest: dest.to_string(),
            }
        }
        "info" => {
            let [name] = operands(word, args)?;
            Command::Info {
                name: name.to_string(),
            }
        }
        "remove" => {
            let [name] = operands(word, args)?;
            Command::Remove {
                name: name.to_string(),
            }
        }
        "list" => {
            operands::<0>(word, args)?;
            Command::List
        }
        "run" => {
            let [path] = operands(word, args)?;
            Command::Run {
                path: PathBuf::from(path),
            }
        }
        "quit" | "exit" | "q" => Command::Quit,
        other => {
            let op = MaskableOp::from_name(other).map_err(|_| {
                CommandError::UnsupportedOption(format!("unknown command '{other}'"))
            })?;
            parse_previewable(op, args)?
        }
    };
    Ok(command)
}

/// `<op> <src> [<mask>] <dest> [split <p>]`
fn parse_previewable(op: MaskableOp, args: &[&str]) -> Result<Command, CommandError> {
    let word = op.name();
    let (args, split) = split_clause(&word, args)?;
    let (src, dest, region) = match (args, split) {
        ([src, dest], None) => (src, dest, Region::Full),
        ([src, dest], Some(p)) => (src, dest, Region::Split(p)),
        ([src, mask, dest], None) => (src, dest, Region::Mask(mask.to_string())),
        ([_, _, _], Some(_)) => {
            return Err(CommandError::InvalidArgument(format!(
                "{word}: a mask and a split cannot be combined"
            )));
        }
        _ => {
            return Err(CommandError::InvalidArgument(format!(
                "{word}: expected `{}`",
                usage_for_previewable(op)
            )));
        }
    };
    Ok(Command::Apply {
        op,
        src: src.to_string(),
        dest: dest.to_string(),
        region,
    })
}

fn usage_for_previewable(op: MaskableOp) -> &'static str {
    match op {
        MaskableOp::Component(_) => usage("<component>-component"),
        other => usage(&other.name()),
    }
}

/// Strip a trailing `split <p>` clause.
fn split_clause<'a, 'b>(
    word: &str,
    args: &'a [&'b str],
) -> Result<(&'a [&'b str], Option<Percent>), CommandError> {
    match args {
        [rest @ .., keyword, value] if keyword.eq_ignore_ascii_case("split") => {
            let percent = Percent::new(number(word, "split", value)?)?;
            Ok((rest, Some(percent)))
        }
        _ => Ok((args, None)),
    }
}

/// Require exactly `N` operands.
fn operands<'a, const N: usize>(
    word: &str,
    args: &[&'a str],
) -> Result<[&'a str; N], CommandError> {
    <[&'a str; N]>::try_from(args).map_err(|_| {
        CommandError::InvalidArgument(format!(
            "{word} takes {N} operand(s), got {}: expected `{}`",
            args.len(),
            usage(word)
        ))
    })
}

fn number<T: FromStr>(word: &str, what: &str, token: &str) -> Result<T, CommandError> {
    token.parse().map_err(|_| {
        CommandError::InvalidArgument(format!("{word}: {what} '{token}' is not a valid number"))
    })
}
