//! CSV dataset loading and augmentation.
//!
//! Datasets arrive as CSV exports (one row per URL, optional keyword
//! column) and travel through the pipeline as Arrow RecordBatches. The URL
//! column is the one literally named `URL`, falling back to the first
//! column; the keyword column is `Keyword`, falling back to the second.
//! After categorization the batches are rebuilt with a `Category` column
//! appended and written back out as CSV.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use arrow::array::{Array, LargeStringArray, StringArray, StringBuilder};
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tracing::debug;

use sitecat_core::Classification;

const URL_COLUMN: &str = "URL";
const KEYWORD_COLUMN: &str = "Keyword";
const CATEGORY_COLUMN: &str = "Category";

/// One loaded CSV dataset (client or competitor).
pub struct Dataset {
    /// Display name, from the file stem.
    pub name: String,
    pub batches: Vec<RecordBatch>,
    url_column: usize,
    /// URLs in row order, with null/empty cells skipped.
    pub urls: Vec<String>,
    /// Total comma-separated terms across the keyword column, if any.
    pub keyword_terms: usize,
}

impl Dataset {
    /// Load a CSV file, inferring its schema from the content.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut file =
            File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let (schema, _) = Format::default()
            .with_header(true)
            .infer_schema(&mut file, None)
            .with_context(|| format!("inferring schema of {}", path.display()))?;

        anyhow::ensure!(
            !schema.fields().is_empty(),
            "{} has no columns",
            path.display()
        );

        let file =
            File::open(path).with_context(|| format!("reopening {}", path.display()))?;
        let reader = ReaderBuilder::new(Arc::new(schema))
            .with_header(true)
            .build(file)
            .with_context(|| format!("reading {}", path.display()))?;

        let batches: Vec<RecordBatch> = reader
            .collect::<Result<_, _>>()
            .with_context(|| format!("decoding {}", path.display()))?;

        Self::from_batches(name, batches)
    }

    /// Build a dataset from already-decoded batches.
    pub fn from_batches(name: String, batches: Vec<RecordBatch>) -> anyhow::Result<Self> {
        let schema = batches
            .first()
            .map(|b| b.schema())
            .ok_or_else(|| anyhow::anyhow!("dataset {name} is empty"))?;

        // "URL" if present, else the first column.
        let url_column = schema.index_of(URL_COLUMN).unwrap_or(0);

        let mut urls = Vec::new();
        for batch in &batches {
            let col = batch.column(url_column);
            for row in 0..batch.num_rows() {
                if let Some(url) = get_string(col.as_ref(), row)
                    && !url.trim().is_empty()
                {
                    urls.push(url);
                }
            }
        }

        // "Keyword" if present, else the second column when there is one.
        let keyword_column = schema
            .index_of(KEYWORD_COLUMN)
            .ok()
            .or_else(|| (schema.fields().len() > 1).then_some(1))
            .filter(|&idx| idx != url_column);

        let mut keyword_terms = 0;
        if let Some(idx) = keyword_column {
            for batch in &batches {
                let col = batch.column(idx);
                for row in 0..batch.num_rows() {
                    if let Some(cell) = get_string(col.as_ref(), row) {
                        keyword_terms += cell
                            .split(',')
                            .filter(|term| !term.trim().is_empty())
                            .count();
                    }
                }
            }
        }

        debug!(
            name,
            urls = urls.len(),
            keyword_terms,
            "loaded dataset"
        );

        Ok(Self {
            name,
            batches,
            url_column,
            urls,
            keyword_terms,
        })
    }

    /// Rebuild every batch with a `Category` column appended, mapping each
    /// row's URL to its classification. Rows without a classification (null
    /// or empty URL cells) get a null category.
    pub fn augment(&self, results: &[Classification]) -> anyhow::Result<Vec<RecordBatch>> {
        let by_url: HashMap<&str, &str> = results
            .iter()
            .map(|r| (r.url.as_str(), r.category.as_str()))
            .collect();

        let source_schema = self.batches[0].schema();
        let mut fields: Vec<Field> = source_schema
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        fields.push(Field::new(CATEGORY_COLUMN, DataType::Utf8, true));
        let schema = Arc::new(Schema::new(fields));

        let mut out = Vec::with_capacity(self.batches.len());
        for batch in &self.batches {
            let url_col = batch.column(self.url_column);

            let mut builder = StringBuilder::new();
            for row in 0..batch.num_rows() {
                let category = get_string(url_col.as_ref(), row)
                    .and_then(|url| by_url.get(url.as_str()).copied());
                builder.append_option(category);
            }

            let mut columns: Vec<Arc<dyn Array>> = batch.columns().to_vec();
            columns.push(Arc::new(builder.finish()));
            out.push(RecordBatch::try_new(schema.clone(), columns)?);
        }

        Ok(out)
    }
}

/// Write batches out as a CSV file with headers.
pub fn write_csv(path: &Path, batches: &[RecordBatch]) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    for batch in batches {
        writer
            .write(batch)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

/// Extract a string cell from an Arrow column (handles Utf8 and LargeUtf8).
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}
