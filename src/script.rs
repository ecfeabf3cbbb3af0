//! `%script` batch files.
//!
//! One command per non-blank line, quoted like a shell command line:
//!
//! ```text
//! -q 'context:bush' -o bush.txt
//! --query "longest-mention:Bill\ Clinton"
//! ```
//!
//! Only the query and output switches are accepted; every other setting comes
//! from the surrounding run.

use crate::dispatch::QueryTool;
use crate::error::{LqtError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// One parsed script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub query: String,
    /// Redirect target for this line only
    pub output: Option<PathBuf>,
}

impl ScriptLine {
    /// Parse a line; the error is the message without file and line prefix
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let args = shell_words::split(line).map_err(|e| format!("cannot parse line: {}", e))?;

        let mut query = None;
        let mut output = None;
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-q" | "-query" | "--query" => {
                    let value = iter.next().ok_or_else(|| format!("{} requires an argument", arg))?;
                    if value.starts_with('%') {
                        return Err("script does not support % queries".to_string());
                    }
                    query = Some(value);
                }
                "-o" | "-output" | "--output" => {
                    let value = iter.next().ok_or_else(|| format!("{} requires an argument", arg))?;
                    output = Some(PathBuf::from(value));
                }
                _ => return Err("script supports only -q and -o".to_string()),
            }
        }

        let query = query.ok_or_else(|| "script line requires -q".to_string())?;
        Ok(Self { query, output })
    }
}

/// Run every line of the script at `path` in order; the first failure aborts.
///
/// Lines without `-o` write to `out`, which stays open. A redirected line
/// truncates its target and closes it before the next line starts.
pub fn run_script(tool: &QueryTool<'_>, path: &Path, out: &mut dyn Write) -> Result<()> {
    let file = File::open(path).map_err(|e| LqtError::file(path, e))?;
    let reader = BufReader::new(file);

    for (index, line) in reader.lines().enumerate() {
        let lineno = index + 1;
        let line = line.map_err(|e| LqtError::file(path, e))?;
        if line.trim().is_empty() {
            continue;
        }

        let command = ScriptLine::parse(&line).map_err(|msg| LqtError::script(path, lineno, msg))?;
        let _span = tracing::info_span!("script_line", line = lineno, query = %command.query).entered();

        let printed = match &command.output {
            Some(target) => {
                let file = File::create(target).map_err(|e| LqtError::file(target, e))?;
                let mut sink = BufWriter::new(file);
                let printed = tool.run_query(Some(command.query.as_str()), &mut sink)?;
                sink.flush().map_err(|e| LqtError::file(target, e))?;
                printed
            }
            None => tool.run_query(Some(command.query.as_str()), out)?,
        };
        tracing::debug!(printed, "script line done");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_and_output() {
        let line = ScriptLine::parse(r#"-q 'longest-mention:Bill\ Clinton' -o out.txt"#).unwrap();
        assert_eq!(line.query, r"longest-mention:Bill\ Clinton");
        assert_eq!(line.output, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn test_long_switch_spellings() {
        let line = ScriptLine::parse(r#"--query "context:bush" -output x"#).unwrap();
        assert_eq!(line.query, "context:bush");
        assert_eq!(line.output, Some(PathBuf::from("x")));
        assert!(ScriptLine::parse("-query a:b").unwrap().output.is_none());
    }

    #[test]
    fn test_line_errors() {
        assert_eq!(
            ScriptLine::parse("-q %all").unwrap_err(),
            "script does not support % queries"
        );
        assert_eq!(
            ScriptLine::parse("-q a:b --fields x").unwrap_err(),
            "script supports only -q and -o"
        );
        assert_eq!(ScriptLine::parse("-o out.txt").unwrap_err(), "script line requires -q");
        assert_eq!(ScriptLine::parse("-q").unwrap_err(), "-q requires an argument");
        assert!(ScriptLine::parse("-q 'open").is_err());
    }
}
