//! The interactive chat session loop.

use crate::query::QueryProcessor;
use std::io::{self, BufRead, Write};

/// Typing this (any letter case) ends the session.
pub const EXIT_KEYWORD: &str = "quit";

/// Whether an input line is the exit keyword.
pub fn is_exit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_KEYWORD)
}

/// Read queries from `input` until the exit keyword or end of input.
///
/// Answers go to `out`; the prompt and per-query errors go to `err`. A failed
/// query is reported and the loop moves on to the next prompt. Returns the
/// number of queries that were processed successfully.
pub async fn chat_loop<R, W, E>(
    processor: &QueryProcessor,
    mut input: R,
    out: &mut W,
    err: &mut E,
) -> io::Result<usize>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    let mut answered = 0;

    loop {
        write!(err, "\nQuery: ")?;
        err.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(err)?;
            break;
        }

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_exit(query) {
            break;
        }

        match processor.process(query).await {
            Ok(answer) => {
                writeln!(out, "\n{answer}")?;
                out.flush()?;
                answered += 1;
            }
            Err(e) => {
                tracing::error!("Query failed: {e}");
                writeln!(err, "\nError: {e}")?;
            }
        }
    }

    Ok(answered)
}
