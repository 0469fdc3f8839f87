//! Markdown → PDF rendering.
//!
//! The markdown event stream is reduced to a small set of blocks (headings,
//! paragraphs, list items, tables, rules) which are laid out top to bottom on
//! A4 pages using the standard Helvetica fonts. Pages break automatically.
//! Text widths are estimated from an average glyph width, which is close
//! enough for wrapping chat-generated plans.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

use crate::error::ExportError;

use super::html::markdown_options;

/// Page geometry and type sizes, in PDF points.
#[derive(Debug, Clone)]
pub struct PdfLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub body_size: f32,
    pub table_size: f32,
    pub line_spacing: f32,
}

impl Default for PdfLayout {
    fn default() -> Self {
        // A4 portrait
        Self {
            page_width: 595.0,
            page_height: 842.0,
            margin: 50.0,
            body_size: 10.5,
            table_size: 8.5,
            line_spacing: 1.35,
        }
    }
}

impl PdfLayout {
    fn usable_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    ListItem { marker: String, depth: usize, text: String },
    Table { rows: Vec<Vec<String>>, header_rows: usize },
    Rule,
}

#[derive(Default)]
struct TableBuilder {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    header_rows: usize,
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn parse_blocks(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut text = String::new();
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut open_item: Option<(String, usize)> = None;
    let mut table: Option<TableBuilder> = None;

    for event in Parser::new_ext(markdown, markdown_options()) {
        match event {
            Event::Start(Tag::Heading { .. }) | Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Heading(level)) => {
                blocks.push(Block::Heading {
                    level: heading_level(level),
                    text: std::mem::take(&mut text).trim().to_string(),
                });
            }
            Event::End(TagEnd::Paragraph) => {
                if lists.is_empty() {
                    let para = std::mem::take(&mut text);
                    if !para.trim().is_empty() {
                        blocks.push(Block::Paragraph(para.trim().to_string()));
                    }
                } else {
                    text.push(' ');
                }
            }
            Event::Start(Tag::List(start)) => lists.push(start),
            Event::End(TagEnd::List(_)) => {
                lists.pop();
            }
            Event::Start(Tag::Item) => {
                // A nested list starts inside its parent item; emit the parent first.
                if let Some((marker, depth)) = open_item.take() {
                    blocks.push(Block::ListItem {
                        marker,
                        depth,
                        text: std::mem::take(&mut text).trim().to_string(),
                    });
                }
                let marker = match lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}.");
                        *n += 1;
                        marker
                    }
                    _ => "•".to_string(),
                };
                open_item = Some((marker, lists.len().saturating_sub(1)));
            }
            Event::End(TagEnd::Item) => {
                let rest = std::mem::take(&mut text).trim().to_string();
                match open_item.take() {
                    Some((marker, depth)) => blocks.push(Block::ListItem { marker, depth, text: rest }),
                    None if !rest.is_empty() => blocks.push(Block::ListItem {
                        marker: String::new(),
                        depth: lists.len().saturating_sub(1),
                        text: rest,
                    }),
                    None => {}
                }
            }
            Event::Start(Tag::Table(_)) => table = Some(TableBuilder::default()),
            Event::End(TagEnd::TableCell) => {
                if let Some(t) = table.as_mut() {
                    t.row.push(std::mem::take(&mut text).trim().to_string());
                }
            }
            Event::End(TagEnd::TableHead) => {
                if let Some(t) = table.as_mut() {
                    let row = std::mem::take(&mut t.row);
                    t.rows.push(row);
                    t.header_rows = t.rows.len();
                }
            }
            Event::End(TagEnd::TableRow) => {
                if let Some(t) = table.as_mut() {
                    let row = std::mem::take(&mut t.row);
                    t.rows.push(row);
                }
            }
            Event::End(TagEnd::Table) => {
                if let Some(t) = table.take() {
                    blocks.push(Block::Table {
                        rows: t.rows,
                        header_rows: t.header_rows,
                    });
                }
            }
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::InlineHtml(html) | Event::Html(html) => {
                if html.trim().to_ascii_lowercase().starts_with("<br") {
                    text.push(' ');
                }
            }
            Event::TaskListMarker(checked) => text.push_str(if checked { "[x] " } else { "[ ] " }),
            Event::Rule => blocks.push(Block::Rule),
            _ => {}
        }
    }

    if !text.trim().is_empty() {
        blocks.push(Block::Paragraph(text.trim().to_string()));
    }
    blocks
}

/// Encode text for a WinAnsi-encoded standard font.
///
/// Latin-1 passes through, common typographic punctuation is mapped, other
/// letters become `?` and remaining symbols (emoji) are dropped.
fn encode_text(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\u{2018}' | '\u{2019}' => out.push(b'\''),
            '\u{201C}' | '\u{201D}' => out.push(b'"'),
            '\u{2013}' => out.push(0x96),
            '\u{2014}' => out.push(0x97),
            '\u{2022}' => out.push(0x95),
            '\u{2026}' => out.push(0x85),
            '\t' | '\n' | '\r' => out.push(b' '),
            c if (c as u32) < 0x20 => {}
            c if (c as u32) <= 0x7E || (0xA0..=0xFF).contains(&(c as u32)) => out.push(c as u8),
            c if c.is_alphanumeric() => out.push(b'?'),
            _ => {}
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }

    /// Average glyph width as a fraction of the font size.
    fn glyph_width(self) -> f32 {
        match self {
            Self::Regular => 0.5,
            Self::Bold => 0.55,
        }
    }
}

/// Greedy word wrap on encoded bytes. Overlong words are split.
fn wrap(text: &[u8], max_width: f32, size: f32, font: Font) -> Vec<Vec<u8>> {
    let max_chars = ((max_width / (size * font.glyph_width())).floor() as usize).max(1);
    let mut lines = Vec::new();
    let mut line: Vec<u8> = Vec::new();

    for word in text.split(|b| *b == b' ').filter(|w| !w.is_empty()) {
        let needed = if line.is_empty() { word.len() } else { line.len() + 1 + word.len() };
        if needed <= max_chars {
            if !line.is_empty() {
                line.push(b' ');
            }
            line.extend_from_slice(word);
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        let mut rest = word;
        while rest.len() > max_chars {
            let (head, tail) = rest.split_at(max_chars);
            lines.push(head.to_vec());
            rest = tail;
        }
        line.extend_from_slice(rest);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Accumulates drawing operations and splits them into pages.
struct PageWriter<'a> {
    layout: &'a PdfLayout,
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    y: f32,
}

impl<'a> PageWriter<'a> {
    fn new(layout: &'a PdfLayout) -> Self {
        Self {
            layout,
            pages: Vec::new(),
            ops: Vec::new(),
            y: layout.page_height - layout.margin,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.ops));
        self.y = self.layout.page_height - self.layout.margin;
    }

    /// Break the page if fewer than `height` points remain. Returns whether
    /// a break happened.
    fn ensure_space(&mut self, height: f32) -> bool {
        let at_top = self.y >= self.layout.page_height - self.layout.margin;
        if self.y - height < self.layout.margin && !at_top {
            self.new_page();
            return true;
        }
        false
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    /// Draw one line of text with its baseline at `baseline`.
    fn text_at(&mut self, x: f32, baseline: f32, font: Font, size: f32, text: Vec<u8>) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new("Tf", vec![font.resource().into(), size.into()]));
        self.ops.push(Operation::new("Td", vec![x.into(), baseline.into()]));
        self.ops.push(Operation::new("Tj", vec![Object::string_literal(text)]));
        self.ops.push(Operation::new("ET", vec![]));
    }

    /// Write wrapped lines starting at the cursor, breaking pages as needed.
    fn lines(&mut self, x: f32, lines: Vec<Vec<u8>>, font: Font, size: f32) {
        let leading = size * self.layout.line_spacing;
        for line in lines {
            self.ensure_space(leading);
            self.y -= leading;
            let baseline = self.y + (leading - size);
            self.text_at(x, baseline, font, size, line);
        }
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(Operation::new("RG", vec![0.75_f32.into(), 0.75_f32.into(), 0.75_f32.into()]));
        self.ops.push(Operation::new("w", vec![0.5_f32.into()]));
        self.ops.push(Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn hline(&mut self) {
        let left = self.layout.margin;
        let right = self.layout.page_width - self.layout.margin;
        self.ops.push(Operation::new("RG", vec![0.75_f32.into(), 0.75_f32.into(), 0.75_f32.into()]));
        self.ops.push(Operation::new("w", vec![0.5_f32.into()]));
        self.ops.push(Operation::new("m", vec![left.into(), self.y.into()]));
        self.ops.push(Operation::new("l", vec![right.into(), self.y.into()]));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(self.ops);
        }
        self.pages
    }
}

fn heading_size(layout: &PdfLayout, level: u8) -> f32 {
    let scale = match level {
        1 => 1.8,
        2 => 1.5,
        3 => 1.3,
        _ => 1.15,
    };
    layout.body_size * scale
}

fn draw_table(w: &mut PageWriter<'_>, rows: &[Vec<String>], header_rows: usize) {
    let layout = w.layout;
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return;
    }
    let size = layout.table_size;
    let leading = size * layout.line_spacing;
    let pad = 3.0;
    let col_width = layout.usable_width() / columns as f32;

    let prepared: Vec<(Font, Vec<Vec<Vec<u8>>>, f32)> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let font = if i < header_rows { Font::Bold } else { Font::Regular };
            let cells: Vec<Vec<Vec<u8>>> = (0..columns)
                .map(|c| {
                    let cell = row.get(c).map(String::as_str).unwrap_or("");
                    wrap(&encode_text(cell), col_width - 2.0 * pad, size, font)
                })
                .collect();
            let line_count = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
            (font, cells, line_count as f32 * leading + 2.0 * pad)
        })
        .collect();

    let draw_row = |w: &mut PageWriter<'_>, (font, cells, height): &(Font, Vec<Vec<Vec<u8>>>, f32)| {
        let top = w.y;
        for (c, lines) in cells.iter().enumerate() {
            let x = layout.margin + c as f32 * col_width;
            w.stroke_rect(x, top - height, col_width, *height);
            for (l, line) in lines.iter().enumerate() {
                let baseline = top - pad - (l as f32 + 1.0) * leading + (leading - size);
                w.text_at(x + pad, baseline, *font, size, line.clone());
            }
        }
        w.y -= height;
    };

    for (i, row) in prepared.iter().enumerate() {
        if w.ensure_space(row.2) && i >= header_rows {
            // Repeat the header on every page the table spans.
            for header in &prepared[..header_rows] {
                draw_row(w, header);
            }
        }
        draw_row(w, row);
    }
}

fn layout_blocks(blocks: &[Block], layout: &PdfLayout) -> Vec<Vec<Operation>> {
    let mut w = PageWriter::new(layout);
    let body = layout.body_size;

    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let size = heading_size(layout, *level);
                w.gap(size * 0.4);
                // Keep a heading together with the start of what follows it.
                w.ensure_space(size * layout.line_spacing + body * layout.line_spacing * 2.0);
                let lines = wrap(&encode_text(text), layout.usable_width(), size, Font::Bold);
                w.lines(layout.margin, lines, Font::Bold, size);
                w.gap(size * 0.3);
            }
            Block::Paragraph(text) => {
                let lines = wrap(&encode_text(text), layout.usable_width(), body, Font::Regular);
                w.lines(layout.margin, lines, Font::Regular, body);
                w.gap(body * 0.6);
            }
            Block::ListItem { marker, depth, text } => {
                let indent = 14.0 * (*depth as f32 + 1.0);
                let text_x = layout.margin + indent + 8.0;
                let lines = wrap(
                    &encode_text(text),
                    layout.usable_width() - indent - 8.0,
                    body,
                    Font::Regular,
                );
                let leading = body * layout.line_spacing;
                w.ensure_space(leading);
                let marker_baseline = w.y - leading + (leading - body);
                let marker_x = layout.margin + indent - body * 0.6;
                w.text_at(marker_x, marker_baseline, Font::Regular, body, encode_text(marker));
                w.lines(text_x, lines, Font::Regular, body);
                w.gap(body * 0.2);
            }
            Block::Table { rows, header_rows } => {
                w.gap(body * 0.4);
                draw_table(&mut w, rows, *header_rows);
                w.gap(body * 0.8);
            }
            Block::Rule => {
                w.gap(body * 0.5);
                w.ensure_space(body);
                w.hline();
                w.gap(body * 0.5);
            }
        }
    }
    w.finish()
}

/// Render markdown-like text into PDF bytes.
pub fn render_pdf(markdown: &str, title: &str, layout: &PdfLayout) -> Result<Vec<u8>, ExportError> {
    let blocks = parse_blocks(markdown);
    let pages = layout_blocks(&blocks, layout);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            Font::Regular.resource() => regular_id,
            Font::Bold.resource() => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let media_box: Vec<Object> = vec![
        0_i64.into(),
        0_i64.into(),
        layout.page_width.into(),
        layout.page_height.into(),
    ];
    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(encode_text(title)),
        "Producer" => Object::string_literal(concat!("wellness-planner ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
