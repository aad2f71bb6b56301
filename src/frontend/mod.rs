use std::path::PathBuf;

use colored::Colorize;

use self::lexer::Span;

pub mod ast;
pub mod lexer;
pub mod parser;

#[derive(Debug)]
pub struct SourceFile {
    pub contents: String,
    pub origin: SourceFileOrigin,
}

impl SourceFile {
    pub fn from_memory(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            origin: SourceFileOrigin::Memory,
        }
    }

    pub fn value_of_span(&self, span: Span) -> &str {
        &self.contents[span.start..span.end]
    }

    /// 1-based line of a byte offset
    pub fn row_for_position(&self, position: usize) -> usize {
        self.contents[..position.min(self.contents.len())]
            .bytes()
            .filter(|b| *b == b'\n')
            .count()
            + 1
    }

    /// 1-based column of a byte offset
    pub fn column_for_position(&self, position: usize) -> usize {
        let position = position.min(self.contents.len());
        let line_start = self.contents[..position]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);

        position - line_start + 1
    }

    /// The offending line of `span` with the span underlined below it
    pub fn highlight_span(&self, span: Span) -> String {
        let start = span.start.min(self.contents.len());
        let line_start = self.contents[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line_end = self.contents[start..]
            .find('\n')
            .map(|i| start + i)
            .unwrap_or(self.contents.len());

        let line = &self.contents[line_start..line_end];
        let width = span.end.min(line_end).saturating_sub(start).max(1);
        let gutter = self.row_for_position(start).to_string();

        format!(
            "{} {} {}\n{} {} {}{}",
            gutter.blue(),
            "|".blue(),
            line,
            " ".repeat(gutter.len()),
            "|".blue(),
            " ".repeat(self.contents[line_start..start].chars().count()),
            "^".repeat(width).red()
        )
    }

    /// The name of the class generated for this file: the file stem, or
    /// `Main` for in-memory sources.
    pub fn class_name(&self) -> String {
        match &self.origin {
            SourceFileOrigin::Memory => String::from("Main"),
            SourceFileOrigin::File(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| String::from("Main")),
        }
    }
}

#[derive(Debug)]
pub enum SourceFileOrigin {
    Memory,
    File(PathBuf),
}

impl core::fmt::Display for SourceFileOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFileOrigin::Memory => f.write_str("<memory>"),
            SourceFileOrigin::File(path) => f.write_fmt(format_args!("{}", path.display())),
        }
    }
}
