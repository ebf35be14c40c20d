use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Extended command (contents between `%` delimiters, one per `*`).
    /// Example: `"FSLAX24Y24"`, `"ADD10C,0.020"`, `"MOIN"`
    Extended(String),
    /// A word command terminated by `*`.
    /// Example: `"D10"`, `"X100Y200D01"`, `"G01"`, `"M02"`
    Word(String),
}

/// A token and the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

#[derive(Debug, Default)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub errors: Vec<ParseError>,
}

/// Tokenize a Gerber file.
///
/// `*` terminates a statement and `%...*%` wraps extended commands. `G04`
/// comments are dropped. Lexing never fails outright; an extended block left
/// open at end of input is reported and whatever it held is still emitted.
pub fn tokenize(input: &str) -> Lexed {
    let mut out = Lexed::default();
    let mut chars = input.chars().peekable();
    let mut line = 1;

    while let Some(&ch) = chars.peek() {
        match ch {
            '%' => {
                chars.next();
                let block_line = line;
                let mut start = line;
                let mut block = String::new();
                loop {
                    match chars.next() {
                        Some('%') => {
                            push(&mut out.tokens, &block, start, TokenKind::Extended);
                            break;
                        }
                        Some('*') => {
                            push(&mut out.tokens, &block, start, TokenKind::Extended);
                            block.clear();
                            start = line;
                        }
                        Some('\n') => line += 1,
                        Some('\r') => {}
                        Some(c) => {
                            if block.trim().is_empty() {
                                start = line;
                            }
                            block.push(c);
                        }
                        None => {
                            push(&mut out.tokens, &block, start, TokenKind::Extended);
                            out.errors.push(ParseError::Unterminated { line: block_line });
                            break;
                        }
                    }
                }
            }
            '\n' => {
                line += 1;
                chars.next();
            }
            '\r' | ' ' | '\t' => {
                chars.next();
            }
            _ => {
                let start = line;
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '%' {
                        break;
                    }
                    chars.next();
                    match c {
                        '*' => break,
                        '\n' => line += 1,
                        '\r' => {}
                        _ => word.push(c),
                    }
                }
                push(&mut out.tokens, &word, start, TokenKind::Word);
            }
        }
    }

    out
}

fn push(tokens: &mut Vec<Token>, raw: &str, line: usize, make: fn(String) -> TokenKind) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && !is_comment(trimmed) {
        tokens.push(Token {
            kind: make(trimmed.to_string()),
            line,
        });
    }
}

/// Check if a command is a G04 comment.
fn is_comment(s: &str) -> bool {
    s.starts_with("G04") || s.starts_with("G4 ") || s == "G4"
}
