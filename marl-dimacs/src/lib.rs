//! DIMACS CNF parser and writer for the marl SAT solver.

use std::{io, mem};

use marl_formula::{CnfFormula, Lit, Var};

use anyhow::Error;
use thiserror::Error;

/// Errors from parsing DIMACS CNF input.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("line {line}: unexpected character '{unexpected}' in DIMACS CNF input")]
    UnexpectedInput { line: usize, unexpected: char },
    #[error("line {line}: literal magnitude out of range: {literal}")]
    LiteralTooLarge { line: usize, literal: String },
    #[error("line {line}: not a valid DIMACS CNF header: {header}")]
    InvalidHeader { line: usize, header: String },
    #[error("line {line}: last clause is missing its terminating zero")]
    UnterminatedClause { line: usize },
    #[error("header announced {announced} variables but the formula has {found}")]
    VarCount { found: usize, announced: usize },
    #[error("header announced {announced} clauses but the formula has {found}")]
    ClauseCount { found: usize, announced: usize },
    #[error("parser invoked after a previous error")]
    PreviousError,
}

/// Counts announced by a DIMACS CNF header line.
#[derive(Copy, Clone, Debug)]
pub struct DimacsHeader {
    pub var_count: usize,
    pub clause_count: usize,
}

/// Incremental parser for DIMACS CNF input.
///
/// Input can be fed in arbitrary chunks and the clauses parsed so far can be
/// taken out between chunks. Internally the parser works line by line: a line
/// starting with `c` is a comment, a line starting with `p` is the header,
/// and every other line is split into whitespace-separated literal tokens,
/// with a zero token closing the current clause. Clauses may span lines and
/// share them.
///
/// The header is `p`, a format token (accepted but not interpreted) and the
/// variable and clause counts.
#[derive(Default)]
pub struct DimacsParser {
    formula: CnfFormula,
    partial_clause: Vec<Lit>,
    header: Option<DimacsHeader>,
    clause_count: usize,
    /// Tail of the previous chunk, up to the next line break.
    pending_line: Vec<u8>,
    line_number: usize,
    failed: bool,
}

impl DimacsParser {
    /// A fresh parser that has consumed no input.
    pub fn new() -> DimacsParser {
        DimacsParser {
            line_number: 1,
            ..DimacsParser::default()
        }
    }

    /// Parse the given input into a single formula and check its header if
    /// present.
    ///
    /// For incremental parsing use [`parse_chunk`](DimacsParser::parse_chunk).
    pub fn parse(mut input: impl io::Read) -> Result<CnfFormula, Error> {
        use io::Read;

        let mut bytes = vec![];
        input.read_to_end(&mut bytes)?;

        let mut parser = DimacsParser::new();
        parser.parse_chunk(&bytes)?;
        parser.eof()?;
        parser.check_header()?;

        Ok(parser.take_formula())
    }

    /// Consume the next chunk of input.
    ///
    /// After the last chunk call the [`eof`](DimacsParser::eof) method. If
    /// this method returns an error, the parser cannot parse further chunks.
    pub fn parse_chunk(&mut self, chunk: &[u8]) -> Result<(), ParserError> {
        if self.failed {
            return Err(ParserError::PreviousError);
        }

        let mut rest = chunk;
        while let Some(end) = rest.iter().position(|&byte| byte == b'\n') {
            let (line, tail) = rest.split_at(end);
            rest = &tail[1..];

            let result = if self.pending_line.is_empty() {
                self.handle_line(line)
            } else {
                let mut full_line = mem::take(&mut self.pending_line);
                full_line.extend_from_slice(line);
                self.handle_line(&full_line)
            };

            if let Err(err) = result {
                self.failed = true;
                return Err(err);
            }
            self.line_number += 1;
        }

        self.pending_line.extend_from_slice(rest);
        Ok(())
    }

    /// Tell the parser the input is complete.
    ///
    /// Whether the header counts were accurate is a separate question,
    /// answered by [`check_header`](DimacsParser::check_header).
    pub fn eof(&mut self) -> Result<(), ParserError> {
        if self.failed {
            return Err(ParserError::PreviousError);
        }

        if !self.pending_line.is_empty() {
            let last_line = mem::take(&mut self.pending_line);
            if let Err(err) = self.handle_line(&last_line) {
                self.failed = true;
                return Err(err);
            }
        }

        if !self.partial_clause.is_empty() {
            self.failed = true;
            return Err(ParserError::UnterminatedClause {
                line: self.line_number,
            });
        }

        Ok(())
    }

    /// Check the parsed formula against the header counts.
    ///
    /// Without a header there is nothing to check.
    pub fn check_header(&self) -> Result<(), ParserError> {
        let header = match self.header {
            Some(header) => header,
            None => return Ok(()),
        };

        if header.var_count != self.formula.var_count() {
            Err(ParserError::VarCount {
                found: self.formula.var_count(),
                announced: header.var_count,
            })
        } else if header.clause_count != self.clause_count {
            Err(ParserError::ClauseCount {
                found: self.clause_count,
                announced: header.clause_count,
            })
        } else {
            Ok(())
        }
    }

    /// Take everything parsed since the last call to this method.
    ///
    /// To parse the whole input into a single formula, call this once after
    /// [`eof`](DimacsParser::eof); to process the input incrementally, call
    /// it after each [`parse_chunk`](DimacsParser::parse_chunk). The variable
    /// count carries over, covering the header and all clauses seen so far.
    pub fn take_formula(&mut self) -> CnfFormula {
        let taken = mem::take(&mut self.formula);
        self.formula.set_var_count(taken.var_count());
        taken
    }

    /// The DIMACS CNF header data, if one was seen.
    pub fn header(&self) -> Option<DimacsHeader> {
        self.header
    }

    /// How many clauses were closed so far.
    pub fn clause_count(&self) -> usize {
        self.clause_count
    }

    /// Variable count of the formula parsed so far.
    pub fn var_count(&self) -> usize {
        self.formula.var_count()
    }

    fn handle_line(&mut self, line: &[u8]) -> Result<(), ParserError> {
        let line = match line.split_last() {
            Some((&b'\r', body)) => body,
            _ => line,
        };

        match line.first() {
            None => Ok(()),
            Some(&b'c') => Ok(()),
            Some(&b'p') => self.handle_header_line(line),
            Some(_) => self.handle_clause_line(line),
        }
    }

    fn handle_header_line(&mut self, line: &[u8]) -> Result<(), ParserError> {
        if self.header.is_some() {
            return Err(self.unexpected(b'p'));
        }

        let text = String::from_utf8_lossy(line);
        let mut tokens = text.split_ascii_whitespace();

        // "p", a format token that is not interpreted, then the two counts
        if tokens.next() != Some("p") || tokens.next().is_none() {
            return Err(self.invalid_header(&text));
        }

        let var_count: usize = match tokens.next().and_then(|token| token.parse().ok()) {
            Some(count) => count,
            None => return Err(self.invalid_header(&text)),
        };
        if var_count > Var::max_count() {
            return Err(ParserError::LiteralTooLarge {
                line: self.line_number,
                literal: var_count.to_string(),
            });
        }

        let clause_count: usize = match tokens.next().and_then(|token| token.parse().ok()) {
            Some(count) => count,
            None => return Err(self.invalid_header(&text)),
        };

        if tokens.next().is_some() {
            return Err(self.invalid_header(&text));
        }

        self.formula.set_var_count(var_count);
        self.header = Some(DimacsHeader {
            var_count,
            clause_count,
        });
        Ok(())
    }

    fn handle_clause_line(&mut self, line: &[u8]) -> Result<(), ParserError> {
        let tokens = line
            .split(|byte: &u8| byte.is_ascii_whitespace())
            .filter(|token| !token.is_empty());

        for token in tokens {
            self.push_literal_token(token)?;
        }
        Ok(())
    }

    /// Parse one token: a signed literal, or a zero closing the current
    /// clause.
    fn push_literal_token(&mut self, token: &[u8]) -> Result<(), ParserError> {
        let (digits, negative) = match token.split_first() {
            Some((&b'-', digits)) => (digits, true),
            _ => (token, false),
        };

        if digits.is_empty() {
            return Err(self.unexpected(b'-'));
        }

        let mut magnitude = 0usize;
        for &byte in digits.iter() {
            if !byte.is_ascii_digit() {
                return Err(self.unexpected(byte));
            }
            // Saturation pushes overlong tokens past the range check below
            magnitude = magnitude
                .saturating_mul(10)
                .saturating_add((byte - b'0') as usize);
        }

        if magnitude > Var::max_count() {
            return Err(ParserError::LiteralTooLarge {
                line: self.line_number,
                literal: String::from_utf8_lossy(token).into_owned(),
            });
        }

        if magnitude == 0 {
            self.formula.add_clause(&self.partial_clause);
            self.partial_clause.clear();
            self.clause_count += 1;
        } else {
            self.partial_clause
                .push(Var::from_dimacs(magnitude as isize).lit(!negative));
        }
        Ok(())
    }

    fn unexpected(&self, byte: u8) -> ParserError {
        ParserError::UnexpectedInput {
            line: self.line_number,
            unexpected: byte as char,
        }
    }

    fn invalid_header(&self, text: &str) -> ParserError {
        ParserError::InvalidHeader {
            line: self.line_number,
            header: text.to_string(),
        }
    }
}

/// Write the header line for the given counts.
///
/// Together with [`write_dimacs_clauses`] this allows incremental writing.
pub fn write_dimacs_header(target: &mut impl io::Write, header: DimacsHeader) -> io::Result<()> {
    writeln!(target, "p cnf {} {}", header.var_count, header.clause_count)
}

/// Write clauses in DIMACS CNF syntax, one per line, without a header.
///
/// Together with [`write_dimacs_header`] this allows incremental writing.
pub fn write_dimacs_clauses<'a>(
    target: &mut impl io::Write,
    clauses: impl IntoIterator<Item = &'a [Lit]>,
) -> io::Result<()> {
    for clause in clauses {
        for lit in clause.iter() {
            itoa::write(&mut *target, lit.to_dimacs())?;
            target.write_all(b" ")?;
        }
        target.write_all(b"0\n")?;
    }
    Ok(())
}

/// Write a whole formula, header included, as DIMACS CNF.
pub fn write_dimacs(target: &mut impl io::Write, formula: &CnfFormula) -> io::Result<()> {
    let header = DimacsHeader {
        var_count: formula.var_count(),
        clause_count: formula.len(),
    };
    write_dimacs_header(&mut *target, header)?;
    write_dimacs_clauses(&mut *target, formula.iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::{prelude::*, test_runner::TestCaseError};

    use marl_formula::{cnf::strategy, cnf_formula};

    fn parse_error(input: &[u8]) -> ParserError {
        match DimacsParser::parse(input) {
            Ok(formula) => panic!("expected an error, parsed {:?}", formula),
            Err(err) => match err.downcast::<ParserError>() {
                Ok(err) => err,
                Err(err) => panic!("unexpected error type: {:?}", err),
            },
        }
    }

    #[test]
    fn clauses_can_span_and_share_lines() -> Result<(), Error> {
        let parsed = DimacsParser::parse(
            &b"p  cnf  4   3  \n  1  \n 2\t3\n0 -4 0 2\nc comment\n\n0\n\n"[..],
        )?;

        let expected = cnf_formula![
            1, 2, 3;
            -4;
            2;
        ];

        assert_eq!(parsed, expected);

        Ok(())
    }

    #[test]
    fn format_token_is_ignored() -> Result<(), Error> {
        let parsed = DimacsParser::parse(&b"p frm 2 1\n1 -2 0\n"[..])?;

        assert_eq!(
            parsed,
            cnf_formula![
                1, -2;
            ]
        );

        Ok(())
    }

    #[test]
    fn input_without_a_header_is_accepted() -> Result<(), Error> {
        let parsed = DimacsParser::parse(&b"1 2 0\n-1 0\n"[..])?;

        assert_eq!(
            parsed,
            cnf_formula![
                1, 2;
                -1;
            ]
        );

        Ok(())
    }

    #[test]
    fn invalid_headers() {
        for &input in [
            &b"pcnf 1 3"[..],
            &b"p cnf 1"[..],
            &b"p cnf 1 2 3"[..],
            &b"p cnf foo bar"[..],
            &b"p cnf -3 -6"[..],
            &b"p cnf 4 18446744073709551616"[..],
        ]
        .iter()
        {
            assert!(matches!(
                parse_error(input),
                ParserError::InvalidHeader { .. }
            ));
        }

        assert!(matches!(
            parse_error(format!("p cnf {} 4", Var::max_count() + 1).as_bytes()),
            ParserError::LiteralTooLarge { .. }
        ));
        DimacsParser::parse(format!("p cnf {} 0", Var::max_count()).as_bytes()).unwrap();

        assert!(matches!(
            parse_error(b"p cnf 1 2\np cnf 1 2\n"),
            ParserError::UnexpectedInput { unexpected: 'p', .. }
        ));
    }

    #[test]
    fn header_count_mismatches() {
        match parse_error(b"p cnf 1 1\n 2 0") {
            ParserError::VarCount {
                found: 2,
                announced: 1,
            } => (),
            err => panic!("unexpected error {:?}", err),
        }

        match parse_error(b"p cnf 10 1\n 1 0 0") {
            ParserError::ClauseCount {
                found: 2,
                announced: 1,
            } => (),
            err => panic!("unexpected error {:?}", err),
        }

        match parse_error(b"p cnf 10 4\n 1 0") {
            ParserError::ClauseCount {
                found: 1,
                announced: 4,
            } => (),
            err => panic!("unexpected error {:?}", err),
        }
    }

    #[test]
    fn syntax_errors() {
        for &(input, unexpected) in [
            (&b"1 2 ?foo"[..], '?'),
            (&b"1 2 - 3 0"[..], '-'),
            (&b"1 2 --3 0"[..], '-'),
            (&b"1 2-3 0"[..], '-'),
            (&b" c no comment\n"[..], 'c'),
        ]
        .iter()
        {
            match parse_error(input) {
                ParserError::UnexpectedInput { unexpected: found, .. } => {
                    assert_eq!(found, unexpected)
                }
                err => panic!("unexpected error {:?}", err),
            }
        }
    }

    #[test]
    fn unterminated_clause() {
        assert!(matches!(
            parse_error(b"1 2 3"),
            ParserError::UnterminatedClause { .. }
        ));
    }

    #[test]
    fn literal_too_large() {
        assert!(matches!(
            parse_error(format!("1 {} 2 0", Var::max_count() + 1).as_bytes()),
            ParserError::LiteralTooLarge { .. }
        ));

        DimacsParser::parse(format!("1 {} 2 0", Var::max_count()).as_bytes()).unwrap();
    }

    #[test]
    fn chunk_boundaries_do_not_matter() -> Result<(), Error> {
        let input = b"p cnf 3 2\n1 -2 3 0\n-1 2 0\n";

        let whole = DimacsParser::parse(&input[..])?;

        for split_at in 0..input.len() {
            let mut parser = DimacsParser::new();
            parser.parse_chunk(&input[..split_at])?;
            parser.parse_chunk(&input[split_at..])?;
            parser.eof()?;
            parser.check_header()?;

            assert_eq!(parser.take_formula(), whole);
        }

        Ok(())
    }

    proptest! {
        #[test]
        fn roundtrip(input in strategy::cnf_formula(1..100usize, 0..1000, 0..10)) {
            let mut buf = vec![];

            write_dimacs(&mut buf, &input)?;

            let parsed = DimacsParser::parse(&buf[..]).map_err(|e| TestCaseError::fail(e.to_string()))?;

            prop_assert_eq!(parsed, input);
        }
    }
}
