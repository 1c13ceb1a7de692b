use std::borrow::Cow;
use std::collections::HashSet;
use std::marker::PhantomData;

use anstyle::Style;
use clap::{Command, CommandFactory};
use rustyline::{
    completion::Completer,
    highlight::Highlighter,
    hint::Hinter,
    validate::{ValidationContext, ValidationResult, Validator},
    Context,
};
use rustyline_derive::Helper;

/// Rustyline helper, that handles interactive completion, highlighting and hinting.
#[derive(Helper, Debug)]
pub(crate) struct RunHelper<T: CommandFactory> {
    app: PhantomData<T>,
}

impl<T: CommandFactory> RunHelper<T> {
    pub fn new() -> Self {
        RunHelper { app: PhantomData }
    }
}

fn paint(style: Style, text: &str) -> String {
    format!("{}{text}{}", style.render(), style.render_reset())
}

/// Split the line up to the cursor in words. A trailing blank starts a new, empty word.
fn words_before(line: &str, pos: usize) -> Option<Vec<String>> {
    let line = &line[..pos];
    let complete = matches!(line.bytes().last(), Some(b' ' | b'\t'));
    let mut words = shell_words::split(line).ok()?;
    if complete {
        words.push(String::new());
    }
    Some(words)
}

fn suggest(command: &Command, input: &[String]) -> (usize, HashSet<String>) {
    // Wasted work when we are past the first word, but keeps the recursion simple
    let mut suggestions: HashSet<_> = command
        .get_subcommands()
        .flat_map(|cmd| {
            std::iter::once(cmd.get_name().to_string())
                .chain(cmd.get_visible_aliases().map(ToString::to_string))
        })
        .collect();

    if command.has_subcommands() {
        suggestions.insert("help".to_string());
    }

    let index = input.len().saturating_sub(1);

    if let Some(arg) = command.get_positionals().nth(index) {
        let additional: Vec<&str> = match arg.get_id().as_str() {
            "register" => vec!["v0", "vf"],
            "address" => vec!["pc", "i", "sp"],
            "target" => vec!["pc", "i", "dt", "st", "v0", "vf"],
            "state" => vec!["down", "up"],
            _ => Vec::new(),
        };

        suggestions.extend(additional.into_iter().map(String::from));
    }

    match input {
        [last] => (
            last.len(),
            suggestions
                .into_iter()
                .filter(|alias| alias.starts_with(last))
                .collect(),
        ),

        [head, tail @ ..] => command
            .find_subcommand(head)
            .map(|sub: &Command| suggest(sub, tail))
            .unwrap_or_default(),

        [] => (0, suggestions),
    }
}

impl<T: CommandFactory> Completer for RunHelper<T> {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let Some(words) = words_before(line, pos) else {
            return Ok((0, Vec::new()));
        };

        let (offset, candidates) = suggest(&T::command(), words.as_slice());
        Ok((pos - offset, candidates.into_iter().collect()))
    }
}

impl<T: CommandFactory> Highlighter for RunHelper<T> {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(paint(Style::new().dimmed(), hint))
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        Cow::Owned(paint(Style::new().bold(), prompt))
    }
}

impl<T: CommandFactory> Hinter for RunHelper<T> {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let words = words_before(line, pos)?;
        let (offset, candidates) = suggest(&T::command(), words.as_slice());

        if candidates.len() == 1 {
            candidates
                .into_iter()
                .next()
                .map(|candidate| candidate[offset..].to_string())
        } else {
            None
        }
    }
}

impl<T: CommandFactory> Validator for RunHelper<T> {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        if shell_words::split(ctx.input()).is_err() {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser, Debug)]
    #[command(no_binary_name = true)]
    enum Sample {
        Step,
        Set { target: String },
        Screen,
    }

    fn words(line: &str) -> Vec<String> {
        words_before(line, line.len()).unwrap()
    }

    #[test]
    fn suggest_subcommand_test() {
        let (offset, candidates) = suggest(&Sample::command(), &words("s"));
        assert_eq!(offset, 1);
        let mut candidates: Vec<_> = candidates.into_iter().collect();
        candidates.sort();
        assert_eq!(candidates, vec!["screen", "set", "step"]);
    }

    #[test]
    fn suggest_positional_test() {
        let (offset, candidates) = suggest(&Sample::command(), &words("set d"));
        assert_eq!(offset, 1);
        assert_eq!(candidates.into_iter().collect::<Vec<_>>(), vec!["dt"]);
    }
}
