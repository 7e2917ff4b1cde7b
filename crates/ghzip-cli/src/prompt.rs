use std::io::{BufRead, Write};

use ghzip::{CredentialError, TokenPrompt};

/// Reads a token from a line-oriented reader, printing the question to
/// stderr so stdout stays clean.
pub struct LinePrompt<R> {
    reader: R,
}

impl<R: BufRead> LinePrompt<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl LinePrompt<std::io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(std::io::stdin().lock())
    }
}

impl<R: BufRead> TokenPrompt for LinePrompt<R> {
    fn ask(&mut self) -> Result<Option<String>, CredentialError> {
        eprint!("GitHub access token: ");
        std::io::stderr().flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            eprintln!();
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    fn rejected(&mut self, reason: &CredentialError) {
        eprintln!("error: {reason}");
    }
}
