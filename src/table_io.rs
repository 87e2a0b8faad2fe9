//! CSV reader for feature tables and writer for prediction tables

use crate::error::{PredictError, Result};
use crate::types::prediction::PredictionTable;
use crate::types::table::{Column, ColumnData, FeatureTable};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// Read a header-row CSV into a feature table in one pass.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<FeatureTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PredictError::io(path, e))?;
    let table = read_table_from(BufReader::new(file))?;
    debug!(path = %path.display(), rows = table.n_rows(), "Read input table");
    Ok(table)
}

/// Read a header-row CSV from any reader.
pub fn read_table_from<R: Read>(reader: R) -> Result<FeatureTable> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record = record?;
        for (column, value) in cells.iter_mut().zip(record.iter()) {
            column.push(value.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, ColumnData::infer(values)))
        .collect();
    FeatureTable::new(columns)
}

/// Write a prediction table as CSV without a row-index column.
pub fn write_predictions<P: AsRef<Path>>(path: P, table: &PredictionTable) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| PredictError::io(path, e))?;
    write_predictions_to(BufWriter::new(file), table)?;
    debug!(path = %path.display(), rows = table.n_rows(), "Wrote prediction table");
    Ok(())
}

/// Write a prediction table to any writer.
pub fn write_predictions_to<W: Write>(writer: W, table: &PredictionTable) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(table.headers())?;
    for row in 0..table.n_rows() {
        writer.write_record(table.row(row))?;
    }
    writer.flush().map_err(|e| PredictError::io("<output>", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::prepare_features;
    use crate::models::scaler::Scaler;
    use crate::types::prediction::{Label, ModelOutput};

    #[test]
    fn test_read_infers_column_types() {
        let csv = "id,age,income,city\n1,30,1000.5,Paris\n2,40,,Lyon\n";
        let table = read_table_from(csv.as_bytes()).unwrap();

        assert_eq!(table.shape(), (2, 4));
        assert_eq!(table.column_names(), vec!["id", "age", "income", "city"]);
        assert_eq!(table.numeric_column_names(), vec!["id", "age", "income"]);
        assert!(matches!(table.column("city").unwrap().data, ColumnData::Text(_)));
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let csv = "a,b\n1,2\n3\n";
        assert!(matches!(read_table_from(csv.as_bytes()), Err(PredictError::Csv(_))));
    }

    #[test]
    fn test_header_only_table() {
        let table = read_table_from("a,city\n".as_bytes()).unwrap();
        assert_eq!(table.shape(), (0, 2));
        assert!(table.numeric_column_names().is_empty());

        let scaler = Scaler::Standard {
            mean: None,
            scale: None,
            feature_names_in: None,
        };
        assert!(matches!(
            prepare_features(&table, Some(&scaler), &[]),
            Err(PredictError::NoNumericColumns)
        ));
    }

    #[test]
    fn test_missing_value_markers_keep_columns_numeric() {
        let table = read_table_from("a,b\n1,NA\n2,3\n".as_bytes()).unwrap();
        assert_eq!(table.numeric_column_names(), vec!["a", "b"]);

        let scaler = Scaler::Standard {
            mean: Some(vec![1.0, 3.0]),
            scale: Some(vec![1.0, 1.0]),
            feature_names_in: None,
        };
        let aligned = prepare_features(&table, Some(&scaler), &[]).unwrap();
        match &aligned.column("b").unwrap().data {
            ColumnData::Float(v) => {
                assert!(v[0].is_nan());
                assert_eq!(v[1], 0.0);
            }
            other => panic!("expected float column, got {:?}", other),
        }
    }

    #[test]
    fn test_write_without_index() {
        let table = PredictionTable::new(
            None,
            vec![ModelOutput {
                prefix: "LR".to_string(),
                labels: vec![Label::Int(1), Label::Int(0)],
                probabilities: None,
            }],
            2,
        );

        let mut buf = Vec::new();
        write_predictions_to(&mut buf, &table).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "LR_PRED,LR_PROB\n1,\n0,\n");
    }
}
