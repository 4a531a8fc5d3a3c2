//! Provide implementation of parsing to data structures.

use std::str::FromStr;

use nom::Parser;

use crate::parser::ds::*;
use crate::parser::Error;

/// Separator between the exon fields of an event identifier.
pub const EXON_SEPARATOR: char = '@';

/// Separator between alternative choices of one coordinate.
pub const ALTERNATIVE_SEPARATOR: char = '|';

/// nom grammar for exon fields and BED sequence names.
mod grammar {
    use nom::{
        bytes::complete::take_till1,
        character::complete::{char, digit1, one_of},
        combinator::eof,
        multi::many0,
        sequence::preceded,
        IResult, Parser,
    };

    /// An exon field before numeric conversion.
    #[derive(Debug, PartialEq)]
    pub struct RawExon<'a> {
        pub chrom: &'a str,
        pub start: Vec<&'a str>,
        pub end: Vec<&'a str>,
        pub strand: char,
    }

    fn chrom_name(input: &str) -> IResult<&str, &str> {
        take_till1(|c: char| c == ':').parse(input)
    }

    fn coordinate_token(input: &str) -> IResult<&str, &str> {
        take_till1(|c: char| c == ':' || c == '-' || c == super::ALTERNATIVE_SEPARATOR).parse(input)
    }

    /// `coord` or `coord|altcoord|...`
    pub fn coordinate_choices(input: &str) -> IResult<&str, Vec<&str>> {
        let (rest, (first, others)) = (
            coordinate_token,
            many0(preceded(char(super::ALTERNATIVE_SEPARATOR), coordinate_token)),
        )
            .parse(input)?;
        let mut choices = Vec::with_capacity(1 + others.len());
        choices.push(first);
        choices.extend(others);
        Ok((rest, choices))
    }

    /// `chrom:start:end:strand` or `chrom:start-end:strand`.
    pub fn exon(input: &str) -> IResult<&str, RawExon<'_>> {
        let (rest, (chrom, _, start, _, end, _, strand, _)) = (
            chrom_name,
            char(':'),
            coordinate_choices,
            one_of(":-"),
            coordinate_choices,
            char(':'),
            one_of("+-"),
            eof,
        )
            .parse(input)?;
        Ok((
            rest,
            RawExon {
                chrom,
                start,
                end,
                strand,
            },
        ))
    }

    /// `chrom:start-end(strand)` as written by BED sequence extraction.
    pub fn sequence_name(input: &str) -> IResult<&str, (&str, &str, &str, char)> {
        let (rest, (chrom, _, start, _, end, _, strand, _, _)) = (
            chrom_name,
            char(':'),
            digit1,
            char('-'),
            digit1,
            char('('),
            one_of("+-"),
            char(')'),
            eof,
        )
            .parse(input)?;
        Ok((rest, (chrom, start, end, strand)))
    }
}

/// Resolve a list of alternative coordinates to the first one.
fn resolve_coordinate(field: &str, choices: &[&str]) -> Result<u64, Error> {
    let first = choices.first().ok_or_else(|| {
        Error::MalformedIdentifier(field.to_string(), "missing coordinate".to_string())
    })?;
    match first.parse::<u64>() {
        Ok(0) => Err(Error::MalformedIdentifier(
            field.to_string(),
            "coordinates are 1-based, found 0".to_string(),
        )),
        Ok(value) => Ok(value),
        Err(_) => Err(Error::MalformedIdentifier(
            field.to_string(),
            format!("coordinate {first:?} is not numeric"),
        )),
    }
}

impl ExonSpec {
    /// Parse a single exon field, taking the first of any alternative coordinates.
    pub fn parse(field: &str) -> Result<Self, Error> {
        let (_, raw) = grammar::exon.parse(field).map_err(|_e| {
            Error::MalformedIdentifier(
                field.to_string(),
                "expected chrom:start:end:strand or chrom:start-end:strand".to_string(),
            )
        })?;
        Ok(Self {
            chrom: raw.chrom.to_string(),
            start: resolve_coordinate(field, &raw.start)?,
            end: resolve_coordinate(field, &raw.end)?,
            strand: Strand::from_symbol(raw.strand)
                .expect("should not happen; grammar only accepts + and -"),
        })
    }
}

impl FromStr for ExonSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl EventId {
    /// Parse an identifier of the given splice type.
    ///
    /// Fails if the number of exon fields does not match the splice type.
    pub fn parse(id: &str, splice_type: SpliceType) -> Result<Self, Error> {
        let n_fields = id.split(EXON_SEPARATOR).count();
        if n_fields != splice_type.n_exons() {
            return Err(Error::MalformedIdentifier(
                id.to_string(),
                format!(
                    "{} identifiers have {} exons, found {}",
                    splice_type.name(),
                    splice_type.n_exons(),
                    n_fields
                ),
            ));
        }
        Self::parse_unchecked(id)
    }

    /// Parse an identifier with any number of exon fields.
    pub fn parse_unchecked(id: &str) -> Result<Self, Error> {
        let exons = id
            .split(EXON_SEPARATOR)
            .map(|field| {
                ExonSpec::parse(field).map_err(|e| match e {
                    Error::MalformedIdentifier(_, reason) => {
                        Error::MalformedIdentifier(id.to_string(), reason)
                    }
                    e => e,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: id.to_string(),
            exons,
        })
    }
}

impl FromStr for SpliceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SE" => Ok(SpliceType::SkippedExon),
            "MXE" => Ok(SpliceType::MutuallyExclusiveExon),
            _ => Err(Error::UnknownSpliceType(s.to_string())),
        }
    }
}

/// Convert an identifier to the feature store ids of all its exons.
///
/// ```
/// use splice_annotator::parser::exon_ids;
///
/// assert_eq!(
///     exon_ids("chr15:42565276:42565087|42565161:-@chr15:42564261:42564321:-").unwrap(),
///     vec!["exon:chr15:42565276-42565087:-", "exon:chr15:42564261-42564321:-"],
/// );
/// ```
pub fn exon_ids(id: &str) -> Result<Vec<String>, Error> {
    Ok(EventId::parse_unchecked(id)?.exon_ids())
}

/// Convert a BED sequence name back to an exon id.
///
/// The name carries a 0-based start, e.g., `chr1:99-200(+)` becomes
/// `exon:chr1:100-200:+`.
pub fn seq_name_to_exon_id(name: &str) -> Result<String, Error> {
    let (_, (chrom, start, end, strand)) = grammar::sequence_name
        .parse(name)
        .map_err(|_e| Error::MalformedSequenceName(name.to_string()))?;
    let start = start
        .parse::<u64>()
        .map_err(|_e| Error::MalformedSequenceName(name.to_string()))?;
    Ok(format!("exon:{}:{}-{}:{}", chrom, start + 1, end, strand))
}
