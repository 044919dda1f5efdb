//! Line-oriented text input: `eventId fiberType fiberId x y z t0 t1 ...`.

use std::io::BufRead;

use crate::error::InputError;

/// One parsed input line: the fiber's geometry plus its photon arrival times.
#[derive(Debug, Clone, PartialEq)]
pub struct FiberRecord {
    pub event_id: i64,
    pub fiber_type: String,
    pub fiber_id: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub photon_times: Vec<f64>,
}

/// A source of `FiberRecord`s. The one thing every caller needs from "input
/// parsing of photon-arrival text files" without committing this crate to
/// any particular file format beyond the line format implemented here.
pub trait PhotonSource {
    fn next_record(&mut self) -> Result<Option<FiberRecord>, InputError>;
}

/// Reads the line format described in the external interfaces section:
/// whitespace-separated fields, blank lines skipped, one fiber per line.
pub struct LineRecordReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> LineRecordReader<R> {
    pub fn new(reader: R) -> Self {
        LineRecordReader {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> PhotonSource for LineRecordReader<R> {
    fn next_record(&mut self) -> Result<Option<FiberRecord>, InputError> {
        loop {
            let line = match self.lines.next() {
                None => return Ok(None),
                Some(line) => line.map_err(|e| InputError::Io(e.to_string()))?,
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return parse_line(&line, self.line_no).map(Some);
        }
    }
}

fn parse_line(line: &str, line_no: usize) -> Result<FiberRecord, InputError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 7 {
        return Err(InputError::TooFewFields {
            line: line_no,
            found: fields.len(),
        });
    }

    let parse_i64 = |name: &str, s: &str| -> Result<i64, InputError> {
        s.parse::<i64>().map_err(|_| InputError::BadNumber {
            line: line_no,
            field: name.to_string(),
        })
    };
    let parse_f64 = |name: &str, s: &str| -> Result<f64, InputError> {
        s.parse::<f64>().map_err(|_| InputError::BadNumber {
            line: line_no,
            field: name.to_string(),
        })
    };

    let event_id = parse_i64("eventId", fields[0])?;
    let fiber_type = fields[1].to_string();
    let fiber_id = parse_i64("fiberId", fields[2])?;
    let x = parse_f64("x", fields[3])?;
    let y = parse_f64("y", fields[4])?;
    let z = parse_f64("z", fields[5])?;

    let mut photon_times = Vec::with_capacity(fields.len() - 6);
    for (i, field) in fields[6..].iter().enumerate() {
        photon_times.push(parse_f64(&format!("t{i}"), field)?);
    }

    Ok(FiberRecord {
        event_id,
        fiber_type,
        fiber_id,
        x,
        y,
        z,
        photon_times,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_a_well_formed_multi_line_fixture() {
        let text = "1 Scin 10 0.1 0.2 0.3 20.0 21.5\n\n2 Cher 11 0.4 0.5 0.6 19.9\n";
        let mut reader = LineRecordReader::new(Cursor::new(text));

        let first = reader.next_record().unwrap().unwrap();
        assert_eq!(first.event_id, 1);
        assert_eq!(first.fiber_type, "Scin");
        assert_eq!(first.fiber_id, 10);
        assert_eq!(first.photon_times, vec![20.0, 21.5]);

        let second = reader.next_record().unwrap().unwrap();
        assert_eq!(second.event_id, 2);
        assert_eq!(second.photon_times, vec![19.9]);

        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn reports_the_line_number_of_a_malformed_record() {
        let text = "1 Scin 10 0.1 0.2 0.3 20.0\nbad line here\n";
        let mut reader = LineRecordReader::new(Cursor::new(text));
        reader.next_record().unwrap().unwrap();
        let err = reader.next_record().unwrap_err();
        assert_eq!(
            err,
            InputError::TooFewFields {
                line: 2,
                found: 3,
            }
        );
    }

    #[test]
    fn reports_bad_number_with_field_name() {
        let text = "1 Scin 10 0.1 0.2 0.3 notanumber\n";
        let mut reader = LineRecordReader::new(Cursor::new(text));
        let err = reader.next_record().unwrap_err();
        assert_eq!(
            err,
            InputError::BadNumber {
                line: 1,
                field: "t0".to_string(),
            }
        );
    }
}
