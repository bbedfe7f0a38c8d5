//! Log text → typed sample series

use crate::error::SaliencyError;
use crate::log::format::{
    parse_quat, parse_scalar, parse_tuple, parse_vec3, FIELD_SEPARATOR, INITIAL_ROTATION_KEY,
    STARTING_TIMESTAMP_KEY,
};
use crate::types::{LogHeader, LogLayout, LogSample, Uv};

/// Output of [`LogParser::parse`]
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLog {
    pub name: String,
    pub layout: LogLayout,
    pub header: LogHeader,
    pub samples: Vec<LogSample>,
}

/// Parser for one log layout
///
/// The layout is chosen once per run; the parser never inspects the file
/// to guess it.
#[derive(Debug, Clone, Copy)]
pub struct LogParser {
    layout: LogLayout,
}

impl LogParser {
    pub fn new(layout: LogLayout) -> Self {
        Self { layout }
    }

    /// Parse the full text of a log named `name`
    pub fn parse(&self, name: &str, text: &str) -> Result<ParsedLog, SaliencyError> {
        let mut lines: Vec<&str> = text.split('\n').map(|l| l.trim_end_matches('\r')).collect();

        // Every log ends with "\n", leaving an empty final segment
        if lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }

        let data_start = self.layout.data_start_line();
        if lines.len() < data_start {
            return Err(SaliencyError::parse(
                name,
                lines.len() + 1,
                format!("expected {} header lines", data_start),
            ));
        }

        let header = self.parse_header(name, &lines[..data_start])?;

        let mut samples: Vec<LogSample> = Vec::with_capacity(lines.len() - data_start);
        for (idx, line) in lines.iter().enumerate().skip(data_start) {
            let line_num = idx + 1;
            let sample = self
                .parse_data_line(line)
                .map_err(|reason| SaliencyError::parse(name, line_num, reason))?;

            if let Some(prev) = samples.last() {
                // Millisecond clocks can log the same timestamp twice
                if sample.timestamp < prev.timestamp {
                    return Err(SaliencyError::parse(
                        name,
                        line_num,
                        format!(
                            "timestamp {} goes back from {}",
                            sample.timestamp, prev.timestamp
                        ),
                    ));
                }
            }
            samples.push(sample);
        }

        if samples.is_empty() {
            return Err(SaliencyError::parse(name, data_start + 1, "log has no data lines"));
        }

        Ok(ParsedLog {
            name: name.to_string(),
            layout: self.layout,
            header,
            samples,
        })
    }

    fn parse_header(&self, name: &str, lines: &[&str]) -> Result<LogHeader, SaliencyError> {
        let mut header = LogHeader::default();

        for (idx, line) in lines.iter().enumerate() {
            let mut fields = line.split(FIELD_SEPARATOR);
            let key = fields.next().unwrap_or("").trim();
            let value = fields.next().unwrap_or("");

            match key {
                STARTING_TIMESTAMP_KEY => {
                    header.starting_timestamp = Some(
                        parse_scalar(value)
                            .map_err(|reason| SaliencyError::parse(name, idx + 1, reason))?,
                    );
                }
                INITIAL_ROTATION_KEY if self.layout == LogLayout::Head => {
                    header.initial_rotation = Some(
                        parse_quat(value)
                            .map_err(|reason| SaliencyError::parse(name, idx + 1, reason))?,
                    );
                }
                _ => {}
            }
        }

        Ok(header)
    }

    fn parse_data_line(&self, line: &str) -> Result<LogSample, String> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let required = if self.layout.has_confidence() { 6 } else { 5 };
        if fields.len() < required {
            return Err(format!(
                "expected at least {} fields, found {}",
                required,
                fields.len()
            ));
        }

        let timestamp = parse_scalar(fields[0])?;
        let euler = parse_vec3(fields[1])?;
        let rotation = parse_quat(fields[2])?;
        let direction = parse_vec3(fields[3])?;
        let [u, v] = parse_tuple::<2>(fields[4])?;
        let confidence = if self.layout.has_confidence() {
            Some(parse_scalar(fields[5])?)
        } else {
            None
        };

        Ok(LogSample {
            timestamp,
            euler,
            rotation,
            direction,
            uv: Uv::new(u, v),
            confidence,
        })
    }
}
