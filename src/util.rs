use std::io::{self, Write};

use fest_index::{Diagnostic, NormalizedEvent};
use tabwriter::TabWriter;

/// Write the given search results to the given writer as an aligned table.
///
/// Results are numbered from `1`. Fields absent from an event are shown as
/// `N/A`.
pub fn write_tsv<W: io::Write>(
    wtr: W,
    results: &[NormalizedEvent],
) -> anyhow::Result<()> {
    let mut wtr = TabWriter::new(wtr).minwidth(4);
    writeln!(wtr, "#\tcategory\tid\tdates\tevent\tcollege\tcity\ttype")?;
    for (i, ev) in results.iter().enumerate() {
        let record = ev.record();
        writeln!(
            wtr,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            i + 1,
            ev.category(),
            ev.id(),
            ev.friendly_dates(),
            or_na(&record.event_name),
            or_na(&record.college_name),
            or_na(&record.city_or_location),
            or_na(&record.event_type),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the given date diagnostics to the given writer as an aligned table.
pub fn write_diagnostics<W: io::Write>(
    wtr: W,
    diagnostics: &[Diagnostic],
) -> anyhow::Result<()> {
    let mut wtr = TabWriter::new(wtr).minwidth(4);
    writeln!(wtr, "id\tdates\tproblem")?;
    for d in diagnostics {
        writeln!(wtr, "{}\t{:?}\t{}", d.id, d.text, d.message)?;
    }
    wtr.flush()?;
    Ok(())
}

fn or_na(field: &Option<String>) -> &str {
    match field.as_ref().map(|s| s.trim()) {
        None | Some("") => "N/A",
        Some(s) => s,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use fest_index::{search, EventRecord};

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 12).unwrap()
    }

    fn lines(out: Vec<u8>) -> Vec<String> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect()
    }

    #[test]
    fn table() {
        let records = vec![
            EventRecord::new("mood", "20th to 23rd Dec 25")
                .event("Mood Indigo")
                .college("IIT Bombay")
                .city("Mumbai")
                .kind("Cultural"),
            EventRecord::new("bare", "12th Dec 25"),
        ];
        let results = search(&records, "", today());

        let mut out = vec![];
        write_tsv(&mut out, &results).unwrap();
        assert_eq!(
            lines(out),
            vec![
                "# category id dates event college city type",
                "1 current bare Dec 12, 2025 N/A N/A N/A N/A",
                "2 upcoming mood 20–23 Dec 2025 Mood Indigo IIT Bombay \
                 Mumbai Cultural",
            ],
        );
    }

    #[test]
    fn diagnostics() {
        let diag = Diagnostic {
            id: "tba".to_string(),
            text: "TBA".to_string(),
            message: "unrecognized date or date range: 'TBA'".to_string(),
        };
        let mut out = vec![];
        write_diagnostics(&mut out, &[diag]).unwrap();
        assert_eq!(
            lines(out),
            vec![
                "id dates problem",
                "tba \"TBA\" unrecognized date or date range: 'TBA'",
            ],
        );
    }
}
