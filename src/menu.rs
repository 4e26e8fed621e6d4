//! Numbered menu prompt for the interactive mode.

use std::io::{BufRead, Write};

use colored::Colorize;

/// What the user picked, or that they want out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Item(usize),
    Quit,
}

/// Print a numbered menu and read one selection. `q`, `0` and EOF all
/// quit; anything unparseable or out of range re-prompts.
pub fn prompt_choice(
    title: &str,
    items: &[&str],
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> std::io::Result<Choice> {
    loop {
        writeln!(output)?;
        writeln!(output, "{}", title.bold())?;
        for (i, item) in items.iter().enumerate() {
            writeln!(output, "  {}. {}", i + 1, item)?;
        }
        writeln!(output, "  q. Quit")?;
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(Choice::Quit);
        }
        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") || answer == "0" {
            return Ok(Choice::Quit);
        }
        match answer.parse::<usize>() {
            Ok(n) if n >= 1 && n <= items.len() => return Ok(Choice::Item(n - 1)),
            _ => {
                writeln!(output, "Please enter a number between 1 and {}.", items.len())?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick(input: &str) -> Choice {
        let mut reader = input.as_bytes();
        let mut sink = Vec::new();
        prompt_choice("Menu", &["one", "two", "three"], &mut reader, &mut sink).unwrap()
    }

    #[test]
    fn test_valid_selection() {
        assert_eq!(pick("2\n"), Choice::Item(1));
    }

    #[test]
    fn test_quit_on_q_and_zero() {
        assert_eq!(pick("q\n"), Choice::Quit);
        assert_eq!(pick("0\n"), Choice::Quit);
    }

    #[test]
    fn test_eof_quits() {
        assert_eq!(pick(""), Choice::Quit);
    }

    #[test]
    fn test_invalid_input_reprompts() {
        assert_eq!(pick("banana\n7\n3\n"), Choice::Item(2));
    }
}
