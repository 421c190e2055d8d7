use std::io::BufRead;

use chrono::NaiveDate;
use fallible_iterator::FallibleIterator;
use fancy_regex::Regex;
use lazy_static::lazy_static;
use thiserror::Error;

use crate::model::Protein;

lazy_static! {
    static ref TAXONOMY_ID_REGEX: Regex = Regex::new(r".*=(?P<id>\d+)").unwrap();
    static ref NAME_REGEX: Regex = Regex::new(r"Full=(?P<name>.*?)(\{|;)").unwrap();
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s").unwrap();
    static ref SERIAL_WHITESPACE_REGEX: Regex = Regex::new(r"\s{2,}").unwrap();
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("line {line}: i/o error: {source}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Streams [`Protein`] records out of a UniProt flat-format file.
///
/// Modelled as a pull iterator (via [`FallibleIterator`]) rather than a
/// blanket `Iterator<Item = Result<...>>`, since a malformed record should
/// stop iteration rather than be silently skipped and the two traits are
/// easy to conflate otherwise.
pub struct ProteinReader<R> {
    lines: std::io::Lines<R>,
    current_line: usize,
}

impl<R: BufRead> ProteinReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            current_line: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, ParseError> {
        match self.lines.next() {
            Some(Ok(line)) => {
                self.current_line += 1;
                Ok(Some(line))
            }
            Some(Err(source)) => Err(ParseError::Io {
                line: self.current_line + 1,
                source,
            }),
            None => Ok(None),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Malformed {
            line: self.current_line,
            message: message.into(),
        }
    }
}

impl<R: BufRead> FallibleIterator for ProteinReader<R> {
    type Item = Protein;
    type Error = ParseError;

    fn next(&mut self) -> Result<Option<Protein>, ParseError> {
        let mut entry_name = String::new();
        let mut name = String::new();
        let mut is_reviewed = false;
        let mut accessions: Vec<String> = Vec::new();
        let mut taxonomy_id: Option<i64> = None;
        let mut proteome_id: Option<String> = None;
        let mut sequence = String::new();
        let mut updated_at: Option<i64> = None;
        let mut seen_any_line = false;

        loop {
            let line = match self.next_line()? {
                Some(line) => line,
                None => {
                    if seen_any_line {
                        return Err(self.error("unexpected end of file inside a record"));
                    }
                    return Ok(None);
                }
            };
            seen_any_line = true;

            if let Some(rest) = line.strip_prefix("ID") {
                let (parsed_name, reviewed) = parse_id_line(rest.trim_start(), self.current_line)?;
                entry_name = parsed_name;
                is_reviewed = reviewed;
            } else if let Some(rest) = line.strip_prefix("AC") {
                accessions.extend(parse_ac_line(rest.trim_start()));
            } else if let Some(rest) = line.strip_prefix("DT") {
                if updated_at.is_none() {
                    updated_at = parse_dt_line(rest.trim_start());
                }
            } else if let Some(rest) = line.strip_prefix("OX") {
                taxonomy_id = parse_ox_line(rest.trim_start());
            } else if let Some(rest) = line.strip_prefix("DR") {
                let rest = rest.trim_start();
                if let Some(id) = rest.strip_prefix("Proteomes;") {
                    proteome_id = parse_dr_proteomes_line(id.trim_start());
                }
            } else if let Some(rest) = line.strip_prefix("DE") {
                if name.is_empty() {
                    let rest = rest.trim_start();
                    if rest.starts_with("RecName") || rest.starts_with("AltName") || rest.starts_with("Sub") {
                        name = parse_de_name_line(rest);
                    }
                }
            } else if line.starts_with("  ") {
                sequence.push_str(&WHITESPACE_REGEX.replace_all(&line, ""));
            } else if line.starts_with("//") {
                if accessions.is_empty() {
                    return Err(self.error("record has no AC line"));
                }
                let accession = accessions.remove(0);
                return Ok(Some(Protein::new(
                    accession,
                    accessions,
                    entry_name,
                    name,
                    sequence.to_ascii_uppercase(),
                    taxonomy_id,
                    proteome_id,
                    is_reviewed,
                    updated_at.unwrap_or(0),
                )));
            }
        }
    }
}

fn parse_id_line(line: &str, current_line: usize) -> Result<(String, bool), ParseError> {
    let parts: Vec<&str> = SERIAL_WHITESPACE_REGEX.split(line).collect();
    let entry_name = parts
        .first()
        .ok_or_else(|| ParseError::Malformed {
            line: current_line,
            message: "ID line missing entry name".to_string(),
        })?
        .to_string();
    let is_reviewed = parts.get(1).map(|s| *s == "Reviewed;").unwrap_or(false);
    Ok((entry_name, is_reviewed))
}

fn parse_ac_line(line: &str) -> Vec<String> {
    line.split_whitespace()
        .map(|token| token.trim_end_matches(';').to_string())
        .collect()
}

fn parse_dt_line(line: &str) -> Option<i64> {
    let date_token = line.split(',').next()?.trim();
    NaiveDate::parse_from_str(date_token, "%d-%b-%Y")
        .ok()
        .map(|date| date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp())
}

fn parse_ox_line(line: &str) -> Option<i64> {
    let captures = TAXONOMY_ID_REGEX.captures(line).ok()??;
    captures.name("id")?.as_str().parse().ok()
}

fn parse_dr_proteomes_line(line: &str) -> Option<String> {
    line.split_whitespace()
        .nth(0)
        .map(|token| token.trim_end_matches(';').to_string())
}

fn parse_de_name_line(line: &str) -> String {
    match NAME_REGEX.captures(line) {
        Ok(Some(captures)) => captures
            .name("name")
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LEPTIN_RECORD: &str = "ID   LEP_HUMAN               Reviewed;         167 AA.\nAC   P41159; Q13643;\nDT   01-FEB-1996, integrated into UniProtKB/Swiss-Prot.\nDE   RecName: Full=Leptin;\nOX   NCBI_TaxID=9606;\nDR   Proteomes; UP000005640;\n     VTGLDFIPGL HPLLSLSK\n//\n";

    #[test]
    fn parses_a_single_record() {
        let mut reader = ProteinReader::new(Cursor::new(LEPTIN_RECORD));
        let protein = reader.next().unwrap().unwrap();
        assert_eq!(protein.accession, "P41159");
        assert_eq!(protein.secondary_accessions, vec!["Q13643"]);
        assert_eq!(protein.entry_name, "LEP_HUMAN");
        assert_eq!(protein.name, "Leptin");
        assert!(protein.is_reviewed);
        assert_eq!(protein.taxonomy_id, Some(9606));
        assert_eq!(protein.proteome_id.as_deref(), Some("UP000005640"));
        assert_eq!(protein.sequence, "VTGLDFIPGLHPLLSLSK");
        assert!(protein.updated_at > 0);
        assert!(reader.next().unwrap().is_none());
    }

    #[test]
    fn unreviewed_entry_is_detected() {
        let record = LEPTIN_RECORD.replacen("Reviewed;", "Unreviewed;", 1);
        let mut reader = ProteinReader::new(Cursor::new(record));
        let protein = reader.next().unwrap().unwrap();
        assert!(!protein.is_reviewed);
    }

    #[test]
    fn truncated_record_is_an_error() {
        let truncated = "ID   LEP_HUMAN               Reviewed;         167 AA.\nAC   P41159;\n";
        let mut reader = ProteinReader::new(Cursor::new(truncated));
        assert!(reader.next().is_err());
    }
}
