use super::StudentRecord;
use std::io::Read;

pub(crate) const IDENTIFIER_COLUMN: &str = "Matric Number";
pub(crate) const FULL_NAME_COLUMN: &str = "Fullname";
pub(crate) const DEPARTMENT_COLUMN: &str = "Dept";
pub(crate) const RESULT_COLUMN: &str = "RESULT";

const REQUIRED_COLUMNS: [&str; 4] = [
    IDENTIFIER_COLUMN,
    FULL_NAME_COLUMN,
    DEPARTMENT_COLUMN,
    RESULT_COLUMN,
];

#[derive(Debug)]
pub(crate) enum ParseFailure {
    Csv(csv::Error),
    MissingColumns(Vec<&'static str>),
}

impl From<csv::Error> for ParseFailure {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Column positions resolved from the header row.
struct ColumnIndex {
    identifier: usize,
    full_name: usize,
    department: usize,
    result: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, ParseFailure> {
        let names: Vec<String> = headers.iter().map(normalize_header).collect();
        let position = |column: &str| names.iter().position(|name| name == column);

        let missing: Vec<&'static str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| position(column).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ParseFailure::MissingColumns(missing));
        }

        match (
            position(IDENTIFIER_COLUMN),
            position(FULL_NAME_COLUMN),
            position(DEPARTMENT_COLUMN),
            position(RESULT_COLUMN),
        ) {
            (Some(identifier), Some(full_name), Some(department), Some(result)) => Ok(Self {
                identifier,
                full_name,
                department,
                result,
            }),
            _ => Err(ParseFailure::MissingColumns(REQUIRED_COLUMNS.to_vec())),
        }
    }

    fn read(&self, row: &csv::StringRecord) -> StudentRecord {
        let cell = |index: usize| row.get(index).unwrap_or_default().to_string();
        StudentRecord {
            identifier: cell(self.identifier),
            full_name: cell(self.full_name),
            department: cell(self.department),
            result: cell(self.result),
        }
    }
}

/// Header names lose a leading byte-order mark and surrounding whitespace;
/// cell values are never touched.
fn normalize_header(value: &str) -> String {
    value.replace('\u{feff}', "").trim().to_string()
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<StudentRecord>, ParseFailure> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::None)
        .flexible(false)
        .from_reader(reader);

    let columns = ColumnIndex::resolve(csv_reader.headers()?)?;
    let mut records = Vec::new();

    for row in csv_reader.records() {
        let row = row?;
        records.push(columns.read(&row));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_normalization_strips_bom_and_padding() {
        assert_eq!(normalize_header("\u{feff}Matric Number"), "Matric Number");
        assert_eq!(normalize_header("  RESULT "), "RESULT");
    }

    #[test]
    fn columns_may_appear_in_any_order_with_extras() {
        let csv = "S/N,RESULT,Dept,Fullname,Matric Number\n1,Negative,CS,Jane Doe,S1001\n";
        let records = parse_records(Cursor::new(csv)).expect("parse");
        assert_eq!(
            records,
            vec![StudentRecord {
                identifier: "S1001".to_string(),
                full_name: "Jane Doe".to_string(),
                department: "CS".to_string(),
                result: "Negative".to_string(),
            }]
        );
    }

    #[test]
    fn cell_values_keep_their_whitespace() {
        let csv = "Matric Number,Fullname,Dept,RESULT\n S1001 ,Jane Doe,CS,Negative\n";
        let records = parse_records(Cursor::new(csv)).expect("parse");
        assert_eq!(records[0].identifier, " S1001 ");
    }

    #[test]
    fn reports_every_missing_column() {
        let csv = "Matric Number,Fullname\nS1001,Jane Doe\n";
        match parse_records(Cursor::new(csv)) {
            Err(ParseFailure::MissingColumns(missing)) => {
                assert_eq!(missing, vec![DEPARTMENT_COLUMN, RESULT_COLUMN]);
            }
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let csv = "Matric Number,Fullname,Dept,RESULT\nS1001,Jane Doe,CS\n";
        assert!(matches!(
            parse_records(Cursor::new(csv)),
            Err(ParseFailure::Csv(_))
        ));
    }
}
