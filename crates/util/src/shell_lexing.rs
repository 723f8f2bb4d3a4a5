//! # Shell-like Lexing Utilities
//!
//! Tokenizes shell-like input, supporting single and double quotes,
//! backslash escapes and position tracking. The same quoting rules are used
//! for whole command lines and for splitting array values on a custom
//! separator.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),
}

/// Token with original byte positions.
///
/// `text` keeps any quotes and escapes exactly as typed; use [`unquote`] to
/// obtain the logical value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexToken<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Tokenize input using a simple, shell-like lexer.
///
/// # Example
/// ```rust
/// use befall_util::shell_lexing::lex_shell_like;
///
/// let tokens = lex_shell_like("apiexec.exec route=getUser 'name=a b'");
/// assert_eq!(tokens, vec!["apiexec.exec", "route=getUser", "'name=a b'"]);
/// ```
pub fn lex_shell_like(input: &str) -> Vec<String> {
    lex_shell_like_ranged(input)
        .into_iter()
        .map(|token| token.text.to_string())
        .collect()
}

/// Tokenize input returning borrowed slices and byte ranges.
///
/// An unterminated quote extends the token to the end of input; callers that
/// must reject such input use [`split_quoted`] instead.
pub fn lex_shell_like_ranged(input: &str) -> Vec<LexToken<'_>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let mut quote: Option<char> = None;
        let mut end = input.len();
        while let Some((index, ch)) = chars.next() {
            match ch {
                '\\' if quote != Some('\'') => {
                    chars.next();
                }
                '\'' | '"' if quote.is_none() => quote = Some(ch),
                c if quote == Some(c) => quote = None,
                c if quote.is_none() && c.is_whitespace() => {
                    end = index;
                    break;
                }
                _ => {}
            }
        }

        tokens.push(LexToken {
            text: &input[start..end],
            start,
            end,
        });
    }

    tokens
}

/// Strips quotes and resolves backslash escapes from a single token.
///
/// Inside single quotes backslashes are literal; everywhere else a backslash
/// escapes the next character.
pub fn unquote(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut quote: Option<char> = None;
    let mut chars = token.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if quote != Some('\'') => {
                if let Some(next) = chars.next() {
                    out.push(next);
                } else {
                    out.push('\\');
                }
            }
            '\'' | '"' if quote.is_none() => quote = Some(ch),
            c if quote == Some(c) => quote = None,
            c => out.push(c),
        }
    }

    out
}

/// Splits `input` on `separator`, ignoring separators inside quoted or
/// escaped text, and returns the unquoted pieces.
///
/// Empty input yields no elements. An unterminated quote is an error.
///
/// # Example
/// ```rust
/// use befall_util::shell_lexing::split_quoted;
///
/// let parts = split_quoted(r#"a,"b,c",d"#, ',').unwrap();
/// assert_eq!(parts, vec!["a", "b,c", "d"]);
/// ```
pub fn split_quoted(input: &str, separator: char) -> Result<Vec<String>, LexError> {
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(next) => current.push(next),
                None => current.push('\\'),
            },
            '\'' | '"' if quote.is_none() => quote = Some(ch),
            c if quote == Some(c) => quote = None,
            c if quote.is_none() && c == separator => parts.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }

    if let Some(open) = quote {
        return Err(LexError::UnterminatedQuote(open));
    }
    parts.push(current);
    Ok(parts)
}

/// Lexes a command line into unquoted words.
///
/// Unlike [`lex_shell_like`], an unterminated quote is an error.
pub fn lex_words(input: &str) -> Result<Vec<String>, LexError> {
    lex_shell_like_ranged(input)
        .into_iter()
        .map(|token| {
            check_quotes(token.text)?;
            Ok(unquote(token.text))
        })
        .collect()
}

/// Splits a line into commands on `;` outside quotes. Segments keep their
/// quoting; blank segments are dropped.
pub fn split_commands(input: &str) -> Result<Vec<&str>, LexError> {
    let mut commands = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut chars = input.char_indices();

    while let Some((index, ch)) = chars.next() {
        match ch {
            '\\' if quote != Some('\'') => {
                chars.next();
            }
            '\'' | '"' if quote.is_none() => quote = Some(ch),
            c if quote == Some(c) => quote = None,
            ';' if quote.is_none() => {
                commands.push(&input[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }

    if let Some(open) = quote {
        return Err(LexError::UnterminatedQuote(open));
    }
    commands.push(&input[start..]);
    Ok(commands.into_iter().map(str::trim).filter(|command| !command.is_empty()).collect())
}

fn check_quotes(token: &str) -> Result<(), LexError> {
    let mut quote: Option<char> = None;
    let mut chars = token.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if quote != Some('\'') => {
                chars.next();
            }
            '\'' | '"' if quote.is_none() => quote = Some(ch),
            c if quote == Some(c) => quote = None,
            _ => {}
        }
    }
    match quote {
        Some(open) => Err(LexError::UnterminatedQuote(open)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokenization() {
        assert_eq!(lex_shell_like("hello world"), vec!["hello", "world"]);
        assert_eq!(lex_shell_like("   \t  \n  "), Vec::<String>::new());
    }

    #[test]
    fn test_quoted_tokens_keep_their_quotes() {
        assert_eq!(lex_shell_like("cmd 'arg with spaces'"), vec!["cmd", "'arg with spaces'"]);
        assert_eq!(lex_shell_like("k=\"a b\" x"), vec!["k=\"a b\"", "x"]);
        assert_eq!(lex_shell_like("path\\ with\\ spaces"), vec!["path\\ with\\ spaces"]);
    }

    #[test]
    fn test_ranged_tokenization() {
        let input = "cmd 'arg with spaces' é";
        let tokens = lex_shell_like_ranged(input);
        assert_eq!(tokens.len(), 3);
        assert_eq!((tokens[0].start, tokens[0].end), (0, 3));
        assert_eq!(tokens[1].text, "'arg with spaces'");
        assert_eq!(tokens[2].end, input.len());
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'a b'"), "a b");
        assert_eq!(unquote("name=\"Alice Smith\""), "name=Alice Smith");
        assert_eq!(unquote(r"a\ b"), "a b");
        assert_eq!(unquote(r"'a\b'"), r"a\b");
    }

    #[test]
    fn split_respects_quotes_and_escapes() {
        assert_eq!(split_quoted("a,'b,c',d", ',').unwrap(), vec!["a", "b,c", "d"]);
        assert_eq!(split_quoted(r"a\,b,c", ',').unwrap(), vec!["a,b", "c"]);
        assert_eq!(split_quoted("1;2;;3", ';').unwrap(), vec!["1", "2", "", "3"]);
    }

    #[test]
    fn split_empty_and_unterminated() {
        assert!(split_quoted("", ',').unwrap().is_empty());
        assert_eq!(split_quoted("a,\"b", ','), Err(LexError::UnterminatedQuote('"')));
    }

    #[test]
    fn words_are_unquoted_and_unterminated_quotes_rejected() {
        assert_eq!(lex_words("exec 'name=a b' x").unwrap(), vec!["exec", "name=a b", "x"]);
        assert_eq!(lex_words("exec \"oops"), Err(LexError::UnterminatedQuote('"')));
    }

    #[test]
    fn commands_split_outside_quotes() {
        assert_eq!(
            split_commands("showstate; apiexec.exec route=x 'a=b;c' ;").unwrap(),
            vec!["showstate", "apiexec.exec route=x 'a=b;c'"]
        );
        assert_eq!(split_commands(r"a\;b").unwrap(), vec![r"a\;b"]);
        assert!(split_commands("a 'b;").is_err());
    }
}
