use std::collections::HashMap;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::space0,
    combinator::{eof, opt},
    error::{Error, ErrorKind},
    multi::many0,
    sequence::{preceded, terminated, tuple},
    IResult,
};

use crate::types::*;

/// Split a message, or a MIME part, into its header block and its body.
///
/// ```text
/// Subject: Daily\r\n
/// Content-Type: multipart/alternative;\r\n
///  boundary="b1"\r\n      <- folded, unfolded as `multipart/alternative; boundary="b1"`
/// \r\n                    <- end of the header block
/// body...
/// ```
///
/// Reaching the end of the input inside the header block is accepted,
/// the body is then empty.
pub fn parse_message(input: &[u8]) -> Result<(Headers, &[u8]), MimeError> {
    let (rest, fields) = many0(field)(input).map_err(|_| malformed_header(input))?;

    if rest.is_empty() {
        return Ok((Headers(fields), rest));
    }

    match line_ending(rest) {
        Ok((body, _)) => Ok((Headers(fields), body)),
        Err(_) => Err(malformed_header(rest)),
    }
}

/// Parse a `Content-Type` value: `type/subtype *( ";" name "=" value )`.
pub fn content_type(value: &str) -> Result<ContentType, MimeError> {
    let mut parser = tuple((
        space0,
        media_type,
        many0(preceded(tuple((space0, tag(b";"), space0)), parameter)),
        space0,
        opt(tag(b";")),
        space0,
        eof,
    ));

    let (_, (_, media_type, params, _, _, _, _)) = parser(value.as_bytes())
        .map_err(|_| MimeError::MalformedContentType(value.to_string()))?;

    Ok(ContentType {
        media_type,
        params: params.into_iter().collect::<HashMap<_, _>>(),
    })
}

// ---------------------

fn malformed_header(input: &[u8]) -> MimeError {
    let line = input
        .split(|c| *c == b'\n')
        .next()
        .unwrap_or_default();
    MimeError::MalformedHeader(String::from_utf8_lossy(line).trim_end().to_string())
}

fn line_ending(input: &[u8]) -> IResult<&[u8], &[u8]> {
    alt((tag(b"\r\n"), tag(b"\n")))(input)
}

fn end_of_line(input: &[u8]) -> IResult<&[u8], &[u8]> {
    alt((tag(b"\n"), eof))(input)
}

/// Everything up to the next `\n`, without the `\r` of a CRLF. A lone
/// `\r` elsewhere is part of the line.
fn line_content(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, line) = take_while(|c: u8| c != b'\n')(input)?;
    Ok((input, line.strip_suffix(b"\r").unwrap_or(line)))
}

fn is_field_name_char(c: u8) -> bool {
    c > 0x20 && c < 0x7f && c != b':'
}

fn is_wsp(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

fn continuation(input: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(take_while1(is_wsp), terminated(line_content, end_of_line))(input)
}

fn field(input: &[u8]) -> IResult<&[u8], (String, String)> {
    let (input, (name, _, first, _)) = tuple((
        take_while1(is_field_name_char),
        tag(b":"),
        line_content,
        end_of_line,
    ))(input)?;
    let (input, folded) = many0(continuation)(input)?;

    let value = std::iter::once(first)
        .chain(folded)
        .map(|line| String::from_utf8_lossy(line).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok((input, (String::from_utf8_lossy(name).to_string(), value)))
}

fn is_token_char(c: u8) -> bool {
    c > 0x20 && c < 0x7f && !b"()<>@,;:\\\"/[]?=".contains(&c)
}

// Unquoted parameter values are read leniently: `boundary=----=_Part_0`
// shows up in the wild even though `=` is not a token character.
fn is_bare_value_char(c: u8) -> bool {
    c > 0x20 && c < 0x7f && c != b';' && c != b'"'
}

fn media_type(input: &[u8]) -> IResult<&[u8], String> {
    let (input, (kind, _, subtype)) =
        tuple((take_while1(is_token_char), tag(b"/"), take_while1(is_token_char)))(input)?;

    let media_type = format!(
        "{}/{}",
        String::from_utf8_lossy(kind),
        String::from_utf8_lossy(subtype)
    );
    Ok((input, media_type.to_ascii_lowercase()))
}

fn parameter(input: &[u8]) -> IResult<&[u8], (String, String)> {
    let (input, (name, _, _, _, value)) = tuple((
        take_while1(is_token_char),
        space0,
        tag(b"="),
        space0,
        alt((quoted_string, bare_value)),
    ))(input)?;

    Ok((
        input,
        (String::from_utf8_lossy(name).to_ascii_lowercase(), value),
    ))
}

fn bare_value(input: &[u8]) -> IResult<&[u8], String> {
    let (input, value) = take_while(is_bare_value_char)(input)?;
    if value.is_empty() {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::TakeWhile1)));
    }
    Ok((input, String::from_utf8_lossy(value).to_string()))
}

fn quoted_string(input: &[u8]) -> IResult<&[u8], String> {
    let (mut rest, _) = tag(b"\"")(input)?;
    let mut value = Vec::new();

    loop {
        match rest {
            [b'"', tail @ ..] => return Ok((tail, String::from_utf8_lossy(&value).to_string())),
            [b'\\', c, tail @ ..] | [c, tail @ ..] => {
                value.push(*c);
                rest = tail;
            }
            [] => return Err(nom::Err::Error(Error::new(rest, ErrorKind::Char))),
        }
    }
}
