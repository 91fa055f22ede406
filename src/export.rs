//! Spreadsheet export of the product list.
//!
//! Produces a CSV table (quoted only where needed, CRLF line endings) that opens directly in
//! any spreadsheet program. Missing optional values are shown as a dash.

use crate::{
    config::ExportConfig,
    core::{CategoryFilter, Product},
    errors::{Error, Result},
};
use chrono::{
    NaiveDate,
    format::{Item, StrftimeItems},
};
use tracing::info;

/// Column headers, in output order
pub const HEADERS: [&str; 8] = [
    "ID",
    "Name",
    "Category",
    "Quantity",
    "Supplier",
    "Arrival Date",
    "Description",
    "Creation Date",
];

/// Shown in place of a missing value
pub const PLACEHOLDER: &str = "—";

/// Narrows an export to one category and/or one supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportFilter {
    /// Category restriction
    pub category: CategoryFilter,
    /// Exact supplier name, if restricted
    pub supplier: Option<String>,
}

impl ExportFilter {
    /// Builds a filter from optional user input; blank input means "any".
    #[must_use]
    pub fn from_input(category: Option<&str>, supplier: Option<&str>) -> Self {
        Self {
            category: CategoryFilter::from_input(category),
            supplier: supplier
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string),
        }
    }

    /// Whether `product` passes both restrictions
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.category.matches(product)
            && self
                .supplier
                .as_deref()
                .is_none_or(|supplier| product.supplier.as_deref() == Some(supplier))
    }
}

/// A rendered table: one header row plus one row per product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    rows: Vec<[String; HEADERS.len()]>,
}

impl ExportTable {
    /// Builds the table for `products`, keeping their order.
    ///
    /// # Errors
    /// - `Error::NothingToExport` if `products` is empty
    /// - `Error::Config` if the configured date format is invalid
    pub fn from_products(products: &[Product], config: &ExportConfig) -> Result<Self> {
        if products.is_empty() {
            return Err(Error::NothingToExport);
        }
        let items = date_items(&config.date_format)?;
        let date = |value: Option<NaiveDate>| {
            value.map_or_else(
                || PLACEHOLDER.to_string(),
                |d| d.format_with_items(items.iter()).to_string(),
            )
        };

        let rows = products
            .iter()
            .map(|p| {
                [
                    p.id.clone(),
                    p.name.clone(),
                    text_or_placeholder(p.category.as_deref()),
                    p.quantity.to_string(),
                    text_or_placeholder(p.supplier.as_deref()),
                    date(p.arrival_date),
                    text_or_placeholder(p.notes.as_deref()),
                    date(p.created_at.map(|t| t.date_naive())),
                ]
            })
            .collect();
        Ok(Self { rows })
    }

    /// Data rows, without the header
    #[must_use]
    pub fn rows(&self) -> &[[String; HEADERS.len()]] {
        &self.rows
    }

    /// Renders the header and every row as CSV.
    ///
    /// # Errors
    /// Returns `Error::Csv` or `Error::Io` if a row can't be written.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(Vec::new());
        writer.write_record(HEADERS)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.into_inner().map_err(|e| Error::Io(e.into_error()))
    }
}

/// A finished export, ready to be attached or saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// Suggested file name
    pub name: String,
    /// CSV bytes (UTF-8)
    pub contents: Vec<u8>,
    /// Number of data rows
    pub row_count: usize,
}

/// `<prefix>_<YYYY-MM-DD>.csv`
#[must_use]
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}_{}.csv", date.format("%Y-%m-%d"))
}

/// Exports the products passing `filter` as a CSV file dated `today`.
///
/// # Errors
/// - `Error::NothingToExport` if no product passes the filter
/// - `Error::Config` if the configured date format is invalid
/// - `Error::Csv` if the table can't be written
pub fn export_products(
    products: &[Product],
    filter: &ExportFilter,
    config: &ExportConfig,
    today: NaiveDate,
) -> Result<ExportFile> {
    let selected: Vec<Product> = products
        .iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect();
    let table = ExportTable::from_products(&selected, config)?;

    let file = ExportFile {
        name: export_file_name(&config.file_prefix, today),
        contents: table.to_csv()?,
        row_count: table.rows().len(),
    };
    info!(file = %file.name, rows = file.row_count, "Products exported");
    Ok(file)
}

fn date_items(format: &str) -> Result<Vec<Item<'_>>> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(Error::Config {
            message: format!("Invalid export date format: {format}"),
        });
    }
    Ok(items)
}

fn text_or_placeholder(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(PLACEHOLDER)
        .to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::sample_product;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_input_is_nothing_to_export() {
        let result = ExportTable::from_products(&[], &ExportConfig::default());
        assert!(matches!(result, Err(Error::NothingToExport)));

        let filtered = export_products(
            &[sample_product("a", None, Some("Reagents"))],
            &ExportFilter::from_input(Some("Glassware"), None),
            &ExportConfig::default(),
            day(2025, 3, 1),
        );
        assert!(matches!(filtered, Err(Error::NothingToExport)));
    }

    #[test]
    fn test_row_count_and_placeholders() -> Result<()> {
        let mut full = sample_product("p1", Some("2025-01-10T08:30:00Z"), Some("Reagents"));
        full.name = "Ethanol".to_string();
        full.quantity = 4;
        full.supplier = Some("Acme".to_string());
        full.arrival_date = Some(day(2025, 1, 9));
        full.notes = Some("96%".to_string());
        let bare = sample_product("p2", None, None);

        let table = ExportTable::from_products(&[full, bare], &ExportConfig::default())?;
        assert_eq!(table.rows().len(), 2);
        assert_eq!(
            table.rows()[0],
            ["p1", "Ethanol", "Reagents", "4", "Acme", "09.01.2025", "96%", "10.01.2025"]
                .map(String::from)
        );
        assert_eq!(
            table.rows()[1],
            ["p2", "Product p2", "—", "1", "—", "—", "—", "—"].map(String::from)
        );

        let text = String::from_utf8(table.to_csv()?).unwrap();
        assert_eq!(text.matches("\r\n").count(), 3);
        assert!(text.starts_with(
            "ID,Name,Category,Quantity,Supplier,Arrival Date,Description,Creation Date\r\n"
        ));
        Ok(())
    }

    #[test]
    fn test_csv_quoting() -> Result<()> {
        let mut product = sample_product("p1", None, None);
        product.name = "Tips, 200 µl".to_string();
        product.notes = Some("say \"fragile\"\nsecond line".to_string());

        let table = ExportTable::from_products(&[product], &ExportConfig::default())?;
        let text = String::from_utf8(table.to_csv()?).unwrap();
        assert!(text.contains("\r\np1,\"Tips, 200 µl\",—,1,"));
        assert!(text.ends_with(",\"say \"\"fragile\"\"\nsecond line\",—\r\n"));

        // A spreadsheet reader gets the original cells back
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let record = reader.records().next().unwrap()?;
        assert_eq!(&record[1], "Tips, 200 µl");
        assert_eq!(&record[6], "say \"fragile\"\nsecond line");
        Ok(())
    }

    #[test]
    fn test_configured_date_format() -> Result<()> {
        let mut product = sample_product("p1", None, None);
        product.arrival_date = Some(day(2025, 2, 14));
        let config = ExportConfig {
            date_format: "%Y/%m/%d".to_string(),
            ..ExportConfig::default()
        };

        let table = ExportTable::from_products(&[product.clone()], &config)?;
        assert_eq!(table.rows()[0][5], "2025/02/14");

        let broken = ExportConfig {
            date_format: "%Q".to_string(),
            ..ExportConfig::default()
        };
        assert!(matches!(
            ExportTable::from_products(&[product], &broken),
            Err(Error::Config { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_filtered_export() -> Result<()> {
        let mut a = sample_product("a", None, Some("Reagents"));
        a.supplier = Some("Acme".to_string());
        let mut b = sample_product("b", None, Some("Reagents"));
        b.supplier = Some("Globex".to_string());
        let c = sample_product("c", None, Some("Glassware"));
        let products = [a, b, c];

        let file = export_products(
            &products,
            &ExportFilter::from_input(Some("Reagents"), Some(" Acme ")),
            &ExportConfig::default(),
            day(2025, 3, 1),
        )?;
        assert_eq!(file.row_count, 1);
        assert_eq!(file.name, "warehouse_data_2025-03-01.csv");
        assert!(String::from_utf8(file.contents).unwrap().contains("\r\na,Product a,"));

        let all = export_products(
            &products,
            &ExportFilter::from_input(Some("all"), None),
            &ExportConfig::default(),
            day(2025, 3, 1),
        )?;
        assert_eq!(all.row_count, 3);
        Ok(())
    }
}
