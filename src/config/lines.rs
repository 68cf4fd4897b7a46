//! Line parsing internals
// (c) 2024 Ross Younger

use super::{
    document::{Blank, Comment, KeyValue, LineEnding},
    errors::{Error, Result},
};

#[derive(Debug, PartialEq)]
/// A physical line we read from an ssh config file, split into its parts
pub(super) enum Line {
    Empty(Blank),
    Comment(Comment),
    Directive(KeyValue),
}

/// Whitespace as understood by the config format
const WHITESPACE: [char; 2] = [' ', '\t'];

///////////////////////////////////////////////////////////////////////////////////////

/// Walks an argument region, honouring quotes (single or double) and simple escapes (\\, \", \').
///
/// Returns the unquoted tokens, and the byte offset at which the last token ends.
/// Anything beyond that offset is trailing whitespace or a comment.
/// A `#` only introduces a comment at the start of a token.
fn scan_args(input: &str) -> std::result::Result<(Vec<String>, usize), &'static str> {
    let mut output = Vec::<String>::new();
    let mut end = 0;
    let mut chars = input.char_indices().peekable();
    loop {
        while let Some(&(_, ' ' | '\t')) = chars.peek() {
            let _ = chars.next();
        }
        match chars.peek() {
            None | Some(&(_, '#')) => break,
            Some(_) => (),
        }

        // We're at the start of a real token
        let mut current_arg = String::new();
        let mut quote_state: Option<char> = None;

        while let Some(&(i, ch)) = chars.peek() {
            match (ch, quote_state) {
                (' ' | '\t', None) => break, // end of token
                ('\\', _) => {
                    // It might be an escape
                    let _ = chars.next();
                    if let Some(&(j, nn @ ('\'' | '"' | '\\'))) = chars.peek() {
                        current_arg.push(nn);
                        end = j + 1;
                        let _ = chars.next();
                    } else {
                        // Unrecognised escapes are kept as written
                        current_arg.push(ch);
                        end = i + 1;
                    }
                    continue;
                }
                (q @ ('\'' | '"'), None) => quote_state = Some(q),
                (c, Some(q)) if c == q => quote_state = None,
                (c, _) => current_arg.push(c),
            }
            end = i + ch.len_utf8();
            let _ = chars.next();
        }

        if quote_state.is_some() {
            return Err("unterminated quote");
        }
        output.push(current_arg);
    }
    Ok((output, end))
}

/// Splits a string into a list of arguments.
/// Arguments are delimited by whitespace, subject to quoting (single or double quotes), and simple escapes (\\, \", \').
///
/// An unquoted `#` at the start of an argument begins a comment, which is discarded.
pub fn split_args(input: &str) -> std::result::Result<Vec<String>, &'static str> {
    scan_args(input).map(|(args, _)| args)
}

///////////////////////////////////////////////////////////////////////////////////////

/// Marks a directive hidden in a comment, for tools that extend the format.
/// Plain ssh ignores such lines.
const EXTENDED_PREFIX: &str = "#!!";

/// Splits one physical line (including its terminator, if any) into its component parts.
///
/// Nothing is discarded: the parts of the result concatenate back to `input`.
pub(super) fn split_line(input: &str, line_number: usize) -> Result<Line> {
    let (body, ending) = LineEnding::split(input);
    let rest = body.trim_start_matches(WHITESPACE);
    let indent = &body[..body.len() - rest.len()];

    if rest.is_empty() {
        return Ok(Line::Empty(Blank {
            whitespace: indent.to_string(),
            ending,
        }));
    }
    if rest.starts_with('#') {
        if let Some(kv) = extended_directive(body, rest, line_number, ending) {
            return Ok(Line::Directive(kv));
        }
        return Ok(Line::Comment(Comment {
            indent: indent.to_string(),
            text: rest.to_string(),
            ending,
        }));
    }
    directive(indent, rest, line_number, ending).map(Line::Directive)
}

/// Recognises `#!! Keyword value`. The marker is kept as part of the indent.
///
/// Block and include keywords are not honoured here; nor is anything that doesn't
/// tokenize. Those lines remain comments.
fn extended_directive(
    body: &str,
    rest: &str,
    line_number: usize,
    ending: LineEnding,
) -> Option<KeyValue> {
    let after = rest.strip_prefix(EXTENDED_PREFIX)?;
    let inner = after.trim_start_matches(WHITESPACE);
    if inner.len() == after.len() || inner.is_empty() || inner.starts_with('#') {
        return None;
    }
    let indent = &body[..body.len() - inner.len()];
    let kv = directive(indent, inner, line_number, ending).ok()?;
    if kv.is("host") || kv.is("match") || kv.is("include") {
        return None;
    }
    Some(kv)
}

/// Splits `Keyword value...`; `rest` starts at the keyword
fn directive(
    indent: &str,
    rest: &str,
    line_number: usize,
    ending: LineEnding,
) -> Result<KeyValue> {
    // extract keyword, which may be delimited by whitespace (Key Value) OR equals (Key=Value)
    let keyword_len = rest.find([' ', '\t', '=']).unwrap_or(rest.len());
    if keyword_len == 0 {
        return Err(Error::syntax(line_number, "missing keyword"));
    }
    let (keyword, after) = rest.split_at(keyword_len);

    let unpadded = after.trim_start_matches(WHITESPACE);
    let unpadded = unpadded
        .strip_prefix('=')
        .map_or(unpadded, |s| s.trim_start_matches(WHITESPACE));
    let separator = &after[..after.len() - unpadded.len()];

    // A keyword with no arguments is allowed; its value is empty.
    let (args, value_len) = scan_args(unpadded).map_err(|e| Error::syntax(line_number, e))?;
    let (value, trailer) = unpadded.split_at(value_len);

    Ok(KeyValue {
        line_number,
        indent: indent.to_string(),
        keyword: keyword.to_string(),
        separator: separator.to_string(),
        value: value.to_string(),
        args,
        trailer: trailer.to_string(),
        ending,
    })
}

///////////////////////////////////////////////////////////////////////////////////////
