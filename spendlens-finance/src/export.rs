//! Spreadsheet export of a categorized summary.
//!
//! Layout (one sheet, "Expense Report"):
//!   Date | Description | Amount (AED) | Category
//!   <category> - Total: AED <total>            (merged A:D, bold)
//!   <date> | <description> | <amount> | <category>
//!   ...
//!   (blank row between categories)
//!   TOTAL EXPENSES: | | <sum>
//!
//! Categories are written in summary order; the summary is already sorted.

use chrono::{DateTime, TimeZone};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use spendlens_core::CategorizedSummary;

use crate::error::ExportError;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADERS: [&str; 4] = ["Date", "Description", "Amount (AED)", "Category"];
const COLUMN_WIDTHS: [f64; 4] = [12.0, 50.0, 15.0, 20.0];
const CURRENCY_FORMAT: &str = "#,##0.00";

/// Renders a summary into a downloadable document.
pub trait ReportWriter: Send + Sync {
    fn render(&self, summary: &CategorizedSummary) -> Result<Vec<u8>, ExportError>;

    fn content_type(&self) -> &'static str;

    fn file_extension(&self) -> &'static str;
}

/// One logical spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportRow {
    Header,
    CategoryHeader(String),
    Transaction {
        date: String,
        description: String,
        amount: f64,
        category: String,
    },
    Blank,
    Total(f64),
}

/// Row-by-row layout of the report, independent of the file format.
pub fn layout(summary: &CategorizedSummary) -> Vec<ReportRow> {
    let mut rows = vec![ReportRow::Header];
    let mut total = 0.0;

    for (category, group) in &summary.categories {
        rows.push(ReportRow::CategoryHeader(format!(
            "{} - Total: AED {:.2}",
            category, group.total
        )));
        for txn in &group.transactions {
            total += txn.amount;
            rows.push(ReportRow::Transaction {
                date: txn.date.clone(),
                description: txn.description.clone(),
                amount: txn.amount,
                category: category.to_string(),
            });
        }
        rows.push(ReportRow::Blank);
    }

    rows.push(ReportRow::Blank);
    rows.push(ReportRow::Total(total));
    rows
}

/// `expense_report_<YYYYmmdd_HHMMSS>.<ext>`
pub fn report_filename<Tz: TimeZone>(at: &DateTime<Tz>, extension: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("expense_report_{}.{}", at.format("%Y%m%d_%H%M%S"), extension)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxReportWriter;

impl ReportWriter for XlsxReportWriter {
    fn render(&self, summary: &CategorizedSummary) -> Result<Vec<u8>, ExportError> {
        let border = FormatBorder::Thin;
        let header_fmt = Format::new()
            .set_bold()
            .set_font_size(11)
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(0x1E293B))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(border);
        let category_fmt = Format::new()
            .set_bold()
            .set_font_size(11)
            .set_background_color(Color::RGB(0xF1F5F9))
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(border);
        let date_fmt = Format::new().set_border(border).set_align(FormatAlign::Center);
        let text_fmt = Format::new().set_border(border);
        let amount_fmt = Format::new()
            .set_border(border)
            .set_num_format(CURRENCY_FORMAT)
            .set_align(FormatAlign::Right);
        let label_fmt = Format::new().set_border(border).set_align(FormatAlign::Left);
        let total_label_fmt = Format::new().set_bold().set_font_size(12);
        let total_amount_fmt = Format::new()
            .set_bold()
            .set_font_size(12)
            .set_num_format(CURRENCY_FORMAT);

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Expense Report")?;
        for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
            sheet.set_column_width(col as u16, *width)?;
        }

        for (row, item) in layout(summary).into_iter().enumerate() {
            let row = row as u32;
            match item {
                ReportRow::Header => {
                    for (col, title) in HEADERS.iter().enumerate() {
                        sheet.write_string_with_format(row, col as u16, *title, &header_fmt)?;
                    }
                }
                ReportRow::CategoryHeader(label) => {
                    sheet.merge_range(row, 0, row, 3, &label, &category_fmt)?;
                }
                ReportRow::Transaction {
                    date,
                    description,
                    amount,
                    category,
                } => {
                    sheet.write_string_with_format(row, 0, &date, &date_fmt)?;
                    sheet.write_string_with_format(row, 1, &description, &text_fmt)?;
                    sheet.write_number_with_format(row, 2, amount, &amount_fmt)?;
                    sheet.write_string_with_format(row, 3, &category, &label_fmt)?;
                }
                ReportRow::Blank => {}
                ReportRow::Total(total) => {
                    sheet.merge_range(row, 0, row, 1, "TOTAL EXPENSES:", &total_label_fmt)?;
                    sheet.write_number_with_format(row, 2, total, &total_amount_fmt)?;
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }

    fn content_type(&self) -> &'static str {
        XLSX_CONTENT_TYPE
    }

    fn file_extension(&self) -> &'static str {
        "xlsx"
    }
}
