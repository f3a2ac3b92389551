//! nom-based query parser. One grammar serves all three search types
//! (Path/Contents/Tags) -- what differs between them is which field the
//! resulting [`Query`] gets matched against, which is a property of the
//! `SearchType` the caller passes to the searcher, not of the grammar
//! itself. §9 fixed a case-insensitive-Tags bug in the older design that
//! wired this the other way around and needed three near-duplicate parsers;
//! a single parser is simpler and cannot drift out of sync with itself.

use crate::core::error::{Error, ErrorKind, Result};
use crate::query::ast::Query;
use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_while1};
use nom::character::complete::{char, multispace0, multispace1};
use nom::combinator::{map, opt, value};
use nom::multi::separated_list1;
use nom::sequence::{delimited, preceded, terminated};
use nom::IResult;

fn is_term_char(c: char) -> bool {
    !c.is_whitespace() && !"()\"".contains(c)
}

fn raw_term(input: &str) -> IResult<&str, &str> {
    take_while1(is_term_char)(input)
}

fn term(input: &str) -> IResult<&str, Query> {
    map(raw_term, |s: &str| Query::Term(s.to_string()))(input)
}

fn is_field_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `field:` prefix of a field-scoped term (§4.4), e.g. `Path:` in
/// `Path:main.rs`. Requires at least one field-name character before the
/// colon so a bare leading `:` (or a Windows drive-letter path typed as a
/// plain term) isn't misparsed as a field scope.
fn field_prefix(input: &str) -> IResult<&str, &str> {
    terminated(take_while1(is_field_name_char), char(':'))(input)
}

/// A field-scoped primary: `field:term`, `field:"phrase"` or `field:(...)`.
/// Falls back to an unscoped [`primary`] when no `field:` prefix is present.
fn scoped_primary(input: &str) -> IResult<&str, Query> {
    let (input, field) = opt(field_prefix)(input)?;
    let (input, inner) = primary(input)?;
    Ok((
        input,
        match field {
            Some(name) => Query::Field(name.to_string(), Box::new(inner)),
            None => inner,
        },
    ))
}

fn phrase_word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != '"' && !c.is_whitespace())(input)
}

fn phrase(input: &str) -> IResult<&str, Query> {
    map(
        delimited(
            char('"'),
            separated_list1(multispace1, phrase_word),
            char('"'),
        ),
        |words: Vec<&str>| Query::Phrase(words.into_iter().map(String::from).collect()),
    )(input)
}

fn group(input: &str) -> IResult<&str, Query> {
    delimited(
        terminated(char('('), multispace0),
        or_expr,
        preceded(multispace0, char(')')),
    )(input)
}

fn primary(input: &str) -> IResult<&str, Query> {
    alt((group, phrase, term))(input)
}

fn not_expr(input: &str) -> IResult<&str, Query> {
    let (input, negated) = map(
        opt(alt((
            value((), terminated(tag_no_case("NOT"), multispace1)),
            value((), terminated(char('-'), multispace0)),
        ))),
        |n| n.is_some(),
    )(input)?;
    let (input, inner) = scoped_primary(input)?;
    Ok((
        input,
        if negated { Query::Not(Box::new(inner)) } else { inner },
    ))
}

fn and_expr(input: &str) -> IResult<&str, Query> {
    map(
        separated_list1(
            alt((
                value((), delimited(multispace1, tag_no_case("AND"), multispace1)),
                value((), multispace1),
            )),
            not_expr,
        ),
        |mut terms| {
            if terms.len() == 1 {
                terms.remove(0)
            } else {
                Query::And(terms)
            }
        },
    )(input)
}

fn or_expr(input: &str) -> IResult<&str, Query> {
    map(
        separated_list1(
            delimited(multispace0, alt((tag_no_case("OR"), tag("|"))), multispace0),
            and_expr,
        ),
        |mut terms| {
            if terms.len() == 1 {
                terms.remove(0)
            } else {
                Query::Or(terms)
            }
        },
    )(input)
}

/// Parses a full query string. Leading/trailing whitespace is tolerated;
/// trailing unparsed input (a stray unmatched paren, say) is an error.
pub fn parse(input: &str) -> Result<Query> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::new(ErrorKind::Parse, "empty query"));
    }
    let (rest, query) = delimited(multispace0, or_expr, multispace0)(trimmed)
        .map_err(|e| Error::new(ErrorKind::Parse, format!("invalid query: {}", e)))?;
    if !rest.is_empty() {
        return Err(Error::new(
            ErrorKind::Parse,
            format!("unexpected trailing input: '{}'", rest),
        ));
    }
    Ok(query)
}

/// Boolean validator of §7: reports whether `input` parses as a query
/// without exposing the parsed tree or running it against an index.
pub fn is_valid_query(input: &str) -> bool {
    parse(input).is_ok()
}
