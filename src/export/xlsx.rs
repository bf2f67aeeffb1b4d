use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use super::ensure_not_empty;
use crate::quiz::{Quiz, QuizMode};

const SHEET_NAME: &str = "Quiz";

const MCQ_COLUMNS: &[(&str, f64)] = &[
    ("#", 4.0),
    ("Question", 80.0),
    ("Option A", 30.0),
    ("Option B", 30.0),
    ("Option C", 30.0),
    ("Option D", 30.0),
    ("Answer", 12.0),
    ("Difficulty", 12.0),
];

const SHORT_COLUMNS: &[(&str, f64)] = &[
    ("#", 4.0),
    ("Question", 80.0),
    ("Answer", 60.0),
    ("Difficulty", 12.0),
];

/// Render the quiz as an `.xlsx` workbook with one row per question
pub fn render(quiz: &Quiz) -> Result<Vec<u8>> {
    ensure_not_empty(quiz)?;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    fill_sheet(sheet, quiz).context("Failed to build quiz worksheet")?;

    workbook
        .save_to_buffer()
        .context("Failed to serialize quiz workbook")
}

fn fill_sheet(sheet: &mut Worksheet, quiz: &Quiz) -> Result<(), XlsxError> {
    sheet.set_name(SHEET_NAME)?;

    let columns = match quiz.mode {
        QuizMode::Mcq => MCQ_COLUMNS,
        QuizMode::Short => SHORT_COLUMNS,
    };

    let header = Format::new().set_bold();
    for (col, (title, width)) in columns.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, &header)?;
        sheet.set_column_width(col, *width)?;
    }
    sheet.set_freeze_panes(1, 0)?;

    for (idx, item) in quiz.items.iter().enumerate() {
        let row = idx as u32 + 1;
        let difficulty = item.difficulty.map(|d| d.as_str()).unwrap_or_default();
        let answer = item.answer.as_deref().unwrap_or_default();

        sheet.write_number(row, 0, row)?;
        sheet.write_string(row, 1, item.question.as_str())?;

        match quiz.mode {
            QuizMode::Mcq => {
                for slot in 0..4 {
                    let option = item.options.get(slot).map(String::as_str).unwrap_or_default();
                    sheet.write_string(row, 2 + slot as u16, option)?;
                }
                sheet.write_string(row, 6, answer)?;
                sheet.write_string(row, 7, difficulty)?;
            }
            QuizMode::Short => {
                sheet.write_string(row, 2, answer)?;
                sheet.write_string(row, 3, difficulty)?;
            }
        }
    }

    Ok(())
}
