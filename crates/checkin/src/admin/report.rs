//! PDF registration report.
//!
//! An A4 document with a title, then one table row per registration under a
//! shaded header row. Cells wrap onto extra lines instead of being cut, so a
//! row is as tall as its longest cell. Rows spill onto further pages, each
//! repeating the header. Text uses the built-in Helvetica faces with `WinAnsiEncoding`, so
//! no font is embedded.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::error::Result;
use crate::registration::CompletedRegistration;

/// Column headings, in row order.
pub const HEADERS: [&str; 6] = [
    "Nombre y Apellido",
    "Empresa",
    "DNI",
    "Celular",
    "Email",
    "Fecha Registro",
];

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 40;
const TITLE_SIZE: i64 = 16;
const TEXT_SIZE: i64 = 8;
const ROW_HEIGHT: i64 = 16;
/// Extra height for each wrapped line after the first.
const LINE_HEIGHT: i64 = 10;
const CELL_PADDING: i64 = 3;
/// Average Helvetica glyph width at `TEXT_SIZE`, rounded up.
const CHAR_WIDTH: i64 = 5;
const COLUMN_WIDTHS: [i64; 6] = [100, 85, 55, 65, 100, 110];

/// Rows may not extend below this line; the page footer sits under it.
const TABLE_BOTTOM: i64 = MARGIN + ROW_HEIGHT;

/// The wrapped lines of each cell in a row.
type Cells = [Vec<String>; 6];

fn table_top(first: bool) -> i64 {
    if first {
        PAGE_HEIGHT - MARGIN - 30
    } else {
        PAGE_HEIGHT - MARGIN
    }
}

/// Render `registrations` as a PDF document.
///
/// # Errors
///
/// Returns an error if the document cannot be assembled or serialized.
pub fn render(title: &str, registrations: &[CompletedRegistration]) -> Result<Vec<u8>> {
    let rows: Vec<Cells> = registrations
        .iter()
        .map(|registration| wrap_row(&registration.report_row()))
        .collect();
    let pages = paginate(&rows);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(font("Helvetica"));
    let bold = doc.add_object(font("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let total = pages.len();
    let mut kids: Vec<Object> = Vec::with_capacity(total);
    for (index, chunk) in pages.iter().enumerate() {
        let content = page_content(title, chunk, index, total);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(total).unwrap_or(i64::MAX);
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        }),
    );
    let catalog_id: ObjectId = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Split rows into per-page chunks by height; always at least one (possibly
/// empty) page. A row taller than a whole page still gets a page of its own.
fn paginate(rows: &[Cells]) -> Vec<&[Cells]> {
    let mut pages = Vec::new();
    let mut start = 0;
    let mut top = table_top(true) - ROW_HEIGHT;
    for (index, cells) in rows.iter().enumerate() {
        let height = row_height(cells);
        if top - height < TABLE_BOTTOM && index > start {
            pages.push(&rows[start..index]);
            start = index;
            top = table_top(false) - ROW_HEIGHT;
        }
        top -= height;
    }
    pages.push(&rows[start..]);
    pages
}

fn row_height(cells: &Cells) -> i64 {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
    ROW_HEIGHT + LINE_HEIGHT * i64::try_from(lines - 1).unwrap_or(0)
}

fn page_content(title: &str, rows: &[Cells], index: usize, total: usize) -> Content {
    let mut ops = Vec::new();
    let first = index == 0;

    if first {
        text(&mut ops, "F2", TITLE_SIZE, MARGIN, PAGE_HEIGHT - MARGIN - TITLE_SIZE, title);
    }

    let mut top = table_top(first);
    let header = wrap_row(&HEADERS);
    let header_height = row_height(&header);
    ops.push(Operation::new(
        "rg",
        vec![Object::Real(0.85), Object::Real(0.85), Object::Real(0.85)],
    ));
    ops.push(Operation::new(
        "re",
        vec![
            Object::Integer(MARGIN),
            Object::Integer(top - header_height),
            Object::Integer(COLUMN_WIDTHS.iter().sum()),
            Object::Integer(header_height),
        ],
    ));
    ops.push(Operation::new("f", vec![]));
    ops.push(Operation::new(
        "rg",
        vec![Object::Real(0.0), Object::Real(0.0), Object::Real(0.0)],
    ));
    row(&mut ops, "F2", top, &header);
    top -= header_height;

    for cells in rows {
        row(&mut ops, "F1", top, cells);
        top -= row_height(cells);
        rule(&mut ops, top);
    }

    let footer = format!("Página {} de {}", index + 1, total);
    text(&mut ops, "F1", TEXT_SIZE, MARGIN, MARGIN / 2, &footer);

    Content { operations: ops }
}

fn row(ops: &mut Vec<Operation>, font: &str, top: i64, cells: &Cells) {
    let first_baseline = top - ROW_HEIGHT + (ROW_HEIGHT - TEXT_SIZE) / 2 + 2;
    let mut x = MARGIN;
    for (lines, width) in cells.iter().zip(COLUMN_WIDTHS) {
        let mut baseline = first_baseline;
        for line in lines {
            text(ops, font, TEXT_SIZE, x + CELL_PADDING, baseline, line);
            baseline -= LINE_HEIGHT;
        }
        x += width;
    }
}

fn rule(ops: &mut Vec<Operation>, y: i64) {
    ops.push(Operation::new(
        "RG",
        vec![Object::Real(0.8), Object::Real(0.8), Object::Real(0.8)],
    ));
    ops.push(Operation::new("w", vec![Object::Real(0.5)]));
    ops.push(Operation::new("m", vec![Object::Integer(MARGIN), Object::Integer(y)]));
    ops.push(Operation::new(
        "l",
        vec![
            Object::Integer(MARGIN + COLUMN_WIDTHS.iter().sum::<i64>()),
            Object::Integer(y),
        ],
    ));
    ops.push(Operation::new("S", vec![]));
}

fn text(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, value: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)],
    ));
    ops.push(Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(win_ansi(value), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn wrap_row(cells: &[&str; 6]) -> Cells {
    std::array::from_fn(|column| wrap(cells[column], COLUMN_WIDTHS[column]))
}

/// Characters that fit on one line of a column `width` points wide.
fn line_capacity(width: i64) -> usize {
    usize::try_from((width - 2 * CELL_PADDING) / CHAR_WIDTH)
        .unwrap_or(1)
        .max(1)
}

/// Break `value` into lines that fit a column `width` points wide.
///
/// Lines break after spaces, which stay at the end of their line, so the
/// lines concatenate back to `value`. A word longer than a whole line is
/// split wherever it runs out of room.
fn wrap(value: &str, width: i64) -> Vec<String> {
    let max = line_capacity(width);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in value.split_inclusive(' ') {
        let visible = word.trim_end_matches(' ');
        let visible_len = visible.chars().count();
        if !line.is_empty() && line.chars().count() + visible_len > max {
            lines.push(std::mem::take(&mut line));
        }
        if visible_len > max {
            let chars: Vec<char> = visible.chars().collect();
            let mut pieces = chars.chunks(max);
            if let Some(last) = pieces.next_back() {
                lines.extend(pieces.map(|piece| piece.iter().collect::<String>()));
                line = last.iter().collect();
                line.push_str(&word[visible.len()..]);
            }
        } else {
            line.push_str(word);
        }
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// Encode `value` for a `WinAnsiEncoding` font; unmappable characters become `?`.
fn win_ansi(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| match c {
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '–' => 0x96,
            '—' => 0x97,
            c if u32::from(c) < 0x80 || (0xA0..=0xFF).contains(&u32::from(c)) => {
                u8::try_from(u32::from(c)).unwrap_or(b'?')
            }
            _ => b'?',
        })
        .collect()
}
