//! AST Adapter: normalizes `dockerfile_parser` output into the shapes the
//! rest of the core works with (byte ranges -> `Location`, instruction kind
//! strings, raw source text).
//!
//! `dockerfile_parser::Dockerfile` is parsed once by the caller and handed
//! in by reference everywhere downstream; the semantic model borrows from
//! it rather than copying, per the dual-ownership design note.

use dockerfile_parser::{Dockerfile, Instruction, Stages};

use crate::error::LintError;
use crate::source_map::{Location, SourceMap};

pub use dockerfile_parser::{ArgInstruction, EnvInstruction, FromInstruction, Stage, StageParent};

/// Parses raw Dockerfile bytes into the external parser's AST.
///
/// This is the only place the core calls into `dockerfile_parser` directly;
/// everything else works against the re-exported types above.
pub fn parse(file: &str, content: &str) -> Result<Dockerfile, LintError> {
    Dockerfile::parse(content).map_err(|source| LintError::Parse {
        file: file.to_string(),
        source,
    })
}

/// Bundles a parsed `Dockerfile` with derived views the rest of the
/// pipeline needs: its stage split, its pre-`FROM` meta-args, and the
/// source map used to turn byte spans into line/column positions.
pub struct ParseResult<'a> {
    pub file: String,
    pub dockerfile: &'a Dockerfile,
    pub stages: Stages<'a>,
    pub source: SourceMap,
    /// Non-fatal notes from the parser itself (currently always empty;
    /// `dockerfile_parser` fails fast rather than producing warnings, but
    /// the slot exists so a future parser can populate it).
    pub warnings: Vec<String>,
}

impl<'a> ParseResult<'a> {
    pub fn new(file: impl Into<String>, dockerfile: &'a Dockerfile) -> Self {
        let file = file.into();
        ParseResult {
            stages: dockerfile.stages(),
            source: SourceMap::new(dockerfile.content.clone()),
            warnings: Vec::new(),
            file,
            dockerfile,
        }
    }

    pub fn meta_args(&self) -> &[ArgInstruction] {
        &self.dockerfile.global_args
    }
}

/// Returns the byte span `(start, end)` backing an instruction, regardless
/// of variant.
pub fn span_of(ins: &Instruction) -> (usize, usize) {
    let span = match ins {
        Instruction::From(f) => &f.span,
        Instruction::Run(r) => &r.span,
        Instruction::Cmd(c) => &c.span,
        Instruction::Label(l) => &l.span,
        Instruction::Env(e) => &e.span,
        Instruction::Copy(c) => &c.span,
        Instruction::Entrypoint(e) => &e.span,
        Instruction::Arg(a) => &a.span,
        Instruction::Misc(m) => &m.span,
    };
    (span.start, span.end)
}

/// Builds a `Location` for an instruction using the given source map.
pub fn location_of(file: &str, sm: &SourceMap, ins: &Instruction) -> Location {
    let (start, end) = span_of(ins);
    Location::range(file, sm.position_for_offset(start), sm.position_for_offset(end))
}

/// The 1-based line an instruction starts on, the unit most rules and
/// directives reason about.
pub fn start_line(sm: &SourceMap, ins: &Instruction) -> i64 {
    let (start, _) = span_of(ins);
    sm.position_for_offset(start).line
}

/// The instruction's keyword, uppercased (`FROM`, `RUN`, a `MISC` variant's
/// own keyword, …).
pub fn instruction_kind(ins: &Instruction) -> String {
    match ins {
        Instruction::From(_) => "FROM".to_string(),
        Instruction::Arg(_) => "ARG".to_string(),
        Instruction::Label(_) => "LABEL".to_string(),
        Instruction::Run(_) => "RUN".to_string(),
        Instruction::Entrypoint(_) => "ENTRYPOINT".to_string(),
        Instruction::Cmd(_) => "CMD".to_string(),
        Instruction::Copy(_) => "COPY".to_string(),
        Instruction::Env(_) => "ENV".to_string(),
        Instruction::Misc(m) => m.instruction.content.to_ascii_uppercase(),
    }
}

/// The raw source text of an instruction, spanning all of its lines
/// (multi-line continuations included).
pub fn raw_text<'a>(content: &'a str, ins: &Instruction) -> &'a str {
    let (start, end) = span_of(ins);
    &content[start..end.min(content.len())]
}
