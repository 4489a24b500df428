//! services/api/src/adapters/notes_render.rs
//!
//! Renders generated notes into downloadable PDF (`lopdf`) and Word
//! (`docx-rs`) files. It implements the `NotesRenderer` port.

use classmate_core::domain::{NotesDocument, NotesFormat};
use classmate_core::ports::{NotesRenderer, PortError, PortResult};
use docx_rs::{Docx, Paragraph, Run};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;

// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 56;
const FONT_SIZE: i64 = 11;
const TITLE_SIZE: i64 = 18;
const LEADING: i64 = 15;
const WRAP_COLUMNS: usize = 90;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

#[derive(Clone, Default)]
pub struct LocalNotesRenderer;

impl LocalNotesRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl NotesRenderer for LocalNotesRenderer {
    fn render(&self, notes: &NotesDocument, format: NotesFormat) -> PortResult<Vec<u8>> {
        match format {
            NotesFormat::Pdf => render_pdf(notes),
            NotesFormat::Docx => render_docx(notes),
        }
    }
}

fn header_line(notes: &NotesDocument) -> String {
    format!(
        "Subject: {}    Date: {}",
        notes.subject,
        notes.date.format("%Y-%m-%d")
    )
}

/// The standard PDF fonts only cover WinAnsi; everything else is approximated.
fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '•' | '–' | '—' | '−' => b'-',
            '‘' | '’' => b'\'',
            '“' | '”' => b'"',
            c if (c as u32) < 0x100 => c as u8,
            _ => b'?',
        })
        .collect()
}

fn wrap(line: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > columns {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    lines.push(current);
    lines
}

fn page_content(lines: &[String], with_title: Option<&str>) -> PortResult<Vec<u8>> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("TL", vec![Object::Integer(LEADING)]),
        Operation::new(
            "Td",
            vec![Object::Integer(MARGIN), Object::Integer(PAGE_HEIGHT - MARGIN)],
        ),
    ];
    if let Some(title) = with_title {
        operations.push(Operation::new("Tf", vec!["F2".into(), Object::Integer(TITLE_SIZE)]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(to_win_ansi(title))]));
        operations.push(Operation::new("T*", vec![]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("Tf", vec!["F1".into(), Object::Integer(FONT_SIZE)]));
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(to_win_ansi(line))]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    Content { operations }
        .encode()
        .map_err(|e| PortError::Unexpected(format!("Failed to encode PDF content: {}", e)))
}

pub fn render_pdf(notes: &NotesDocument) -> PortResult<Vec<u8>> {
    let mut lines = vec![header_line(notes), String::new()];
    for line in notes.notes.lines() {
        lines.extend(wrap(line, WRAP_COLUMNS));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    // The first page gives two lines to the title.
    let mut chunks: Vec<&[String]> = Vec::new();
    let first = lines.len().min(LINES_PER_PAGE - 2);
    chunks.push(&lines[..first]);
    chunks.extend(lines[first..].chunks(LINES_PER_PAGE));

    let mut kids = Vec::new();
    for (index, chunk) in chunks.iter().enumerate() {
        let title = (index == 0).then_some(notes.title.as_str());
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(chunk, title)?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(page_count),
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| PortError::Unexpected(format!("Failed to write PDF: {}", e)))?;
    Ok(bytes)
}

pub fn render_docx(notes: &NotesDocument) -> PortResult<Vec<u8>> {
    let mut docx = Docx::new()
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(&notes.title).bold().size(36)))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(header_line(notes)).italic()));

    for line in notes.notes.lines() {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
    }

    let mut cursor = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut cursor)
        .map_err(|e| PortError::Unexpected(format!("Failed to write Word document: {}", e)))?;
    Ok(cursor.into_inner())
}
