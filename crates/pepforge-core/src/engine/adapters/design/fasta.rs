use std::fmt::Write;

/// One FASTA entry; multi-line sequences are joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub header: String,
    pub sequence: String,
}

impl FastaRecord {
    pub fn new(header: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            sequence: sequence.into(),
        }
    }
}

/// Parses FASTA text. Lines before the first header are ignored.
pub fn parse_fasta(text: &str) -> Vec<FastaRecord> {
    let mut records: Vec<FastaRecord> = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(header) = line.strip_prefix('>') {
            records.push(FastaRecord::new(header.trim(), String::new()));
        } else if let Some(current) = records.last_mut() {
            current.sequence.push_str(line);
        }
    }
    records
}

pub fn format_fasta(records: &[FastaRecord]) -> String {
    let mut out = String::new();
    for record in records {
        // Writing into a String cannot fail.
        let _ = writeln!(out, ">{}\n{}", record.header, record.sequence);
    }
    out
}

/// Value of a `key=value` field in a comma-separated header such as
/// `T=0.1, sample=1, score=0.83, global_score=0.91`.
pub fn header_field<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    header.split(',').map(str::trim).find_map(|field| {
        field
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .map(str::trim)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_line_sequences_are_joined() {
        let records = parse_fasta("junk\n>first\nACD\nEFG\n\n>second\nKK\n");
        assert_eq!(
            records,
            vec![FastaRecord::new("first", "ACDEFG"), FastaRecord::new("second", "KK")]
        );
    }

    #[test]
    fn header_field_does_not_confuse_prefixed_keys() {
        let header = "T=0.1, sample=1, global_score=1.5, score=0.83";
        assert_eq!(header_field(header, "score"), Some("0.83"));
        assert_eq!(header_field(header, "global_score"), Some("1.5"));
        assert_eq!(header_field(header, "seq_recovery"), None);
    }

    #[test]
    fn formatted_records_parse_back() {
        let records = vec![FastaRecord::new("a, score=1", "WK")];
        assert_eq!(parse_fasta(&format_fasta(&records)), records);
    }
}
