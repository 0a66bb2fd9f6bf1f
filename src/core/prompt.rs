use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 表一欄位 (GP 慢性病管理計畫)
pub const PRIMARY_COLUMNS: [&str; 4] = [
    "Patient problems/needs/relevant conditions",
    "Goals – changes to be achieved",
    "Required treatments and services including patient actions",
    "Arrangements for treatments/services (when, who, contact details)",
];

/// 表二欄位 (聯合健康專業人員安排)
pub const ALLIED_COLUMNS: [&str; 3] = [
    "Goals – changes to be achieved",
    "Required treatments and services including patient actions",
    "Arrangements for treatments/services (when, who, contact details)",
];

pub const PLAN_TITLE: &str = "GP Chronic Condition Management Plan";
pub const ALLIED_TITLE: &str = "Allied Health Professional Arrangements";

const PRIMARY_ROWS: &str = "2-4";
const ALLIED_ROWS: &str = "3-5";

// 每一列的儲存格提示，順序對應上面的欄位
const PRIMARY_CELLS: [&[&str]; 4] = [
    &["[Condition Name]"],
    &["[SMART goal with 3-6 month timeframe]"],
    &[
        "[Treatment/intervention 1]",
        "[Treatment/intervention 2]",
        "[Patient education/actions]",
        "[Lifestyle modifications]",
    ],
    &[
        "[Referral to provider type]",
        "[Follow-up schedule]",
        "[Monitoring arrangements]",
    ],
];

const ALLIED_CELLS: [&[&str]; 3] = [
    &["[SMART allied health goal]"],
    &[
        "[Specific intervention]",
        "[Patient responsibilities]",
        "[Expected outcomes]",
    ],
    &[
        "[Provider type]",
        "[Frequency and duration]",
        "[Review schedule]",
    ],
];

const REQUIREMENTS: [&str; 8] = [
    "Generate complete, evidence-based medical content",
    "Use SMART goals with specific 3-6 month timeframes",
    "Refer to providers by generic title only (e.g. \"Accredited Practising Dietitian\", \"Practice Nurse\")",
    "Do not invent names, phone numbers, addresses or email addresses for any provider",
    "Add specific follow-up schedules and monitoring plans",
    "Ensure MBS chronic condition management compliance",
    "Use professional medical terminology appropriate for GPs",
    "Return only the requested tables, with no commentary before or after them",
];

const DISCLAIMER: &str = "This is a clinical decision support tool. All generated content must be reviewed and finalised by the treating practitioner.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// 帶 class 的 HTML 表格
    #[default]
    Html,
    /// inline style 的 HTML，方便貼到病歷系統或 email
    InlineHtml,
    /// Markdown 表格，方便貼到 Word
    WordMarkdown,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::InlineHtml => "inline-html",
            OutputFormat::WordMarkdown => "word-markdown",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            OutputFormat::Html => {
                "clean, professional HTML tables optimised for both desktop and mobile viewing"
            }
            OutputFormat::InlineHtml => {
                "self-contained HTML tables that use inline style attributes only (no classes, no <style> blocks) so they survive pasting into clinical software and email"
            }
            OutputFormat::WordMarkdown => {
                "Markdown pipe tables that can be pasted directly into Microsoft Word"
            }
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "inline-html" | "inline_html" => Ok(OutputFormat::InlineHtml),
            "word-markdown" | "word_markdown" | "markdown" | "md" => Ok(OutputFormat::WordMarkdown),
            other => Err(format!(
                "Unknown output format '{}'. Valid formats: html, inline-html, word-markdown",
                other
            )),
        }
    }
}

/// 以病患狀況與日期組出完整 prompt
///
/// `conditions` 原樣附在最後一行，不做任何跳脫。
pub fn render_prompt(conditions: &str, date: NaiveDate, format: OutputFormat) -> String {
    let date_text = date.format("%d/%m/%Y").to_string();
    let mut prompt = String::with_capacity(4096 + conditions.len());

    prompt.push_str(
        "Act as an experienced Australian General Practitioner creating a GP Chronic Condition Management Plan (GPCCMP) under the current MBS guidelines (effective from July 1, 2025).\n\n",
    );
    prompt.push_str(&format!("Generate {}:\n\n", format.describe()));

    let body = match format {
        OutputFormat::Html => html_document(&date_text),
        OutputFormat::InlineHtml => inline_html_document(&date_text),
        OutputFormat::WordMarkdown => markdown_document(&date_text),
    };
    prompt.push_str(&body);

    prompt.push_str("\nRequirements:\n");
    for requirement in REQUIREMENTS {
        prompt.push_str("- ");
        prompt.push_str(requirement);
        prompt.push('\n');
    }

    prompt.push_str("\nPatient conditions: ");
    prompt.push_str(conditions);
    prompt
}

fn html_document(date_text: &str) -> String {
    let mut doc = String::new();
    doc.push_str("<div class=\"care-plan-document\">\n<div class=\"header-section\">\n");
    doc.push_str(&format!("<h2>{}</h2>\n", PLAN_TITLE));
    doc.push_str(&format!("<p class=\"date-stamp\">{}</p>\n</div>\n\n", date_text));

    doc.push_str(&html_table(
        &format!("📋 Table 1: {}", PLAN_TITLE),
        &PRIMARY_COLUMNS,
        &PRIMARY_CELLS,
        PRIMARY_ROWS,
        "rows based on the conditions",
        |_| "class=\"care-plan-table\"".to_string(),
    ));
    doc.push_str(&html_table(
        &format!("📋 Table 2: {}", ALLIED_TITLE),
        &ALLIED_COLUMNS,
        &ALLIED_CELLS,
        ALLIED_ROWS,
        "allied health goals",
        |_| "class=\"care-plan-table\"".to_string(),
    ));

    doc.push_str("<div class=\"footer-section\">\n");
    doc.push_str("<p><strong>Generated under MBS Guidelines effective July 1, 2025</strong></p>\n");
    doc.push_str(&format!("<p><em>{}</em></p>\n</div>\n</div>\n", DISCLAIMER));
    doc
}

fn inline_html_document(date_text: &str) -> String {
    let mut doc = String::new();
    doc.push_str("<div style=\"font-family: Arial, sans-serif; color: #222;\">\n");
    doc.push_str(&format!(
        "<h2 style=\"margin: 0 0 4px 0;\">{}</h2>\n<p style=\"margin: 0 0 16px 0; color: #555;\">{}</p>\n\n",
        PLAN_TITLE, date_text
    ));

    let table_style = |_: usize| {
        "style=\"width: 100%; border-collapse: collapse; border: 1px solid #999; margin-bottom: 16px;\""
            .to_string()
    };
    doc.push_str(&html_table(
        &format!("Table 1: {}", PLAN_TITLE),
        &PRIMARY_COLUMNS,
        &PRIMARY_CELLS,
        PRIMARY_ROWS,
        "rows based on the conditions",
        table_style,
    ));
    doc.push_str(&html_table(
        &format!("Table 2: {}", ALLIED_TITLE),
        &ALLIED_COLUMNS,
        &ALLIED_CELLS,
        ALLIED_ROWS,
        "allied health goals",
        table_style,
    ));

    doc.push_str(&format!(
        "<p style=\"font-size: 12px; color: #555;\"><em>{}</em></p>\n</div>\n",
        DISCLAIMER
    ));
    doc.push_str(
        "\nEvery <th> must carry style=\"border: 1px solid #999; padding: 6px; background: #f0f4f8; text-align: left;\" and every <td> must carry style=\"border: 1px solid #999; padding: 6px; vertical-align: top;\".\n",
    );
    doc
}

fn html_table<F>(
    heading: &str,
    columns: &[&str],
    cells: &[&[&str]],
    rows: &str,
    row_hint: &str,
    table_attrs: F,
) -> String
where
    F: Fn(usize) -> String,
{
    let mut table = String::new();
    table.push_str(&format!("<h3>{}</h3>\n", heading));
    table.push_str(&format!("<table {}>\n<thead>\n<tr>\n", table_attrs(columns.len())));
    for column in columns {
        table.push_str(&format!("<th>{}</th>\n", column));
    }
    table.push_str("</tr>\n</thead>\n<tbody>\n\n");

    table.push_str(&format!("Generate {} {}, using this format:\n<tr>\n", rows, row_hint));
    for cell in cells {
        if cell.len() == 1 {
            table.push_str(&format!("<td>{}</td>\n", cell[0]));
        } else {
            table.push_str("<td>\n<ul>\n");
            for item in cell.iter() {
                table.push_str(&format!("<li>{}</li>\n", item));
            }
            table.push_str("</ul>\n</td>\n");
        }
    }
    table.push_str("</tr>\n\n</tbody>\n</table>\n\n");
    table
}

fn markdown_document(date_text: &str) -> String {
    let mut doc = String::new();
    doc.push_str(&format!("## {}\n\n", PLAN_TITLE));
    doc.push_str(&format!("**Date:** {}\n\n", date_text));

    doc.push_str(&markdown_table(
        &format!("Table 1: {}", PLAN_TITLE),
        &PRIMARY_COLUMNS,
        &PRIMARY_CELLS,
        PRIMARY_ROWS,
        "rows based on the conditions",
    ));
    doc.push_str(&markdown_table(
        &format!("Table 2: {}", ALLIED_TITLE),
        &ALLIED_COLUMNS,
        &ALLIED_CELLS,
        ALLIED_ROWS,
        "allied health goals",
    ));

    doc.push_str("**Generated under MBS Guidelines effective July 1, 2025**\n\n");
    doc.push_str(&format!("*{}*\n\n", DISCLAIMER));
    doc.push_str(
        "Keep each row on a single line; separate list items inside a cell with <br>. Do not use HTML tables or code fences.\n",
    );
    doc
}

fn markdown_table(
    heading: &str,
    columns: &[&str],
    cells: &[&[&str]],
    rows: &str,
    row_hint: &str,
) -> String {
    let mut table = String::new();
    table.push_str(&format!("### {}\n\n", heading));
    table.push_str(&format!("| {} |\n", columns.join(" | ")));
    table.push_str(&format!("|{}\n", "---|".repeat(columns.len())));

    table.push_str(&format!("\nGenerate {} {}, using this format:\n", rows, row_hint));
    let row: Vec<String> = cells
        .iter()
        .map(|cell| {
            if cell.len() == 1 {
                cell[0].to_string()
            } else {
                cell.iter()
                    .map(|item| format!("• {}", item))
                    .collect::<Vec<_>>()
                    .join("<br>")
            }
        })
        .collect();
    table.push_str(&format!("| {} |\n\n", row.join(" | ")));
    table
}
