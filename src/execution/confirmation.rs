use std::io::{self, BufRead, Write};

use crate::execution::errors::ExecutionError;

/// Summary shown to the operator before an irreversible submission.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Preview {
    pub title: String,
    pub details: Vec<(String, String)>,
    pub question: String,
}

impl Preview {
    pub fn new(title: impl Into<String>, question: impl Into<String>) -> Self {
        Self { title: title.into(), details: Vec::new(), question: question.into() }
    }

    pub fn detail(mut self, label: impl Into<String>, value: impl ToString) -> Self {
        self.details
            .push((label.into(), value.to_string()));
        self
    }
}

/// Gate between an assembled transaction and its submission.
pub trait Confirmation {
    /// Shows the preview and returns whether the operator agreed to proceed.
    fn confirm(&mut self, preview: &Preview) -> Result<bool, ExecutionError>;

    /// Shows a notice and blocks until the operator acknowledges it.
    fn acknowledge(&mut self, notice: &str) -> Result<(), ExecutionError>;
}

/// Only a literal `y` (ignoring surrounding whitespace and case) counts as consent.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().to_lowercase() == "y"
}

/// Line-based prompt over any reader/writer pair.
pub struct ConsolePrompt<R, W> {
    reader: R,
    writer: W,
}

impl ConsolePrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self { reader: io::stdin().lock(), writer: io::stdout() }
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Reads one line. `None` means the input is exhausted.
    fn read_answer(&mut self) -> Result<Option<String>, ExecutionError> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        Ok((read > 0).then_some(line))
    }
}

impl<R: BufRead, W: Write> Confirmation for ConsolePrompt<R, W> {
    fn confirm(&mut self, preview: &Preview) -> Result<bool, ExecutionError> {
        writeln!(self.writer, "\n{}:", preview.title)?;
        for (label, value) in preview.details.iter() {
            writeln!(self.writer, "{}: {}", label, value)?;
        }
        write!(self.writer, "\n{} (y/n): ", preview.question)?;
        self.writer.flush()?;

        let confirmed = self
            .read_answer()?
            .is_some_and(|answer| is_affirmative(&answer));
        if !confirmed {
            writeln!(self.writer, "Transaction cancelled.")?;
        }
        Ok(confirmed)
    }

    fn acknowledge(&mut self, notice: &str) -> Result<(), ExecutionError> {
        writeln!(self.writer, "\n{}", notice)?;
        write!(self.writer, "Press Enter to continue...")?;
        self.writer.flush()?;
        match self.read_answer()? {
            Some(_) => Ok(()),
            None => Err(ExecutionError::FatalError(
                "Input closed before the notice was acknowledged".to_string(),
            )),
        }
    }
}

/// Accepts every preview without asking. Backs the `--yes` flag.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoConfirm;

impl Confirmation for AutoConfirm {
    fn confirm(&mut self, _preview: &Preview) -> Result<bool, ExecutionError> {
        Ok(true)
    }

    fn acknowledge(&mut self, _notice: &str) -> Result<(), ExecutionError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    fn preview() -> Preview {
        Preview::new("POOL INITIALIZATION DETAILS", "Proceed with pool initialization?")
            .detail("Pool", "0xc86B26d3ae2DBBc210dFe01771BFAc79c8132595")
            .detail("Gas Limit", 1_000_000u64)
    }

    #[rstest]
    #[case::lower("y\n", true)]
    #[case::upper("Y\n", true)]
    #[case::padded("  y  \n", true)]
    #[case::no("n\n", false)]
    #[case::yes_word("yes\n", false)]
    #[case::empty_line("\n", false)]
    #[case::eof("", false)]
    #[case::garbage("sure\n", false)]
    fn test_confirm(#[case] input: &str, #[case] expected: bool) {
        let mut prompt = ConsolePrompt::new(Cursor::new(input.as_bytes()), Vec::new());
        assert_eq!(prompt.confirm(&preview()).unwrap(), expected);
    }

    #[test]
    fn test_confirm_renders_preview() {
        let mut prompt = ConsolePrompt::new(Cursor::new(&b"n\n"[..]), Vec::new());
        prompt.confirm(&preview()).unwrap();
        let output = String::from_utf8(prompt.into_writer()).unwrap();

        assert!(output.contains("POOL INITIALIZATION DETAILS:"));
        assert!(output.contains("Pool: 0xc86B26d3ae2DBBc210dFe01771BFAc79c8132595"));
        assert!(output.contains("Gas Limit: 1000000"));
        assert!(output.contains("Proceed with pool initialization? (y/n): "));
        assert!(output.ends_with("Transaction cancelled.\n"));
    }

    #[test]
    fn test_acknowledge() {
        let mut prompt = ConsolePrompt::new(Cursor::new(&b"\n"[..]), Vec::new());
        assert!(prompt
            .acknowledge("Big blocks must be enabled")
            .is_ok());

        let mut closed = ConsolePrompt::new(Cursor::new(&b""[..]), Vec::new());
        assert!(matches!(closed.acknowledge("Big blocks"), Err(ExecutionError::FatalError(_))));
    }

    #[test]
    fn test_auto_confirm() {
        assert!(AutoConfirm
            .confirm(&preview())
            .unwrap());
    }
}
