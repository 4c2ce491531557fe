use pdf_writer::Content;
use pdf_writer::Finish;
use pdf_writer::Name;
use pdf_writer::Pdf;
use pdf_writer::Rect;
use pdf_writer::Ref;
use pdf_writer::Str;
use pdf_writer::TextStr;

use super::PdfSettings;
use super::metrics::Face;
use super::metrics::encode;
use super::metrics::text_width;
use super::paginate::Page;
use crate::DiagnosticEvent;
use crate::EngineLogger;
use crate::Severity;
use crate::diagnostics::subsystem;

const PRODUCER: &str = concat!("gmd ", env!("CARGO_PKG_VERSION"));

/// Serialize laid out pages. Every page shares the same five font objects
/// and carries a centered `n / total` footer.
pub fn write_pdf(
	pages: &[Page],
	settings: &PdfSettings,
	title: Option<&str>,
	logger: &dyn EngineLogger,
) -> Vec<u8> {
	let (width, height) = settings.page_size.dimensions();
	let total = pages.len().max(1);

	let mut next = Ref::new(1);
	let mut alloc = || next.bump();
	let catalog_id = alloc();
	let tree_id = alloc();
	let info_id = alloc();
	let font_ids: Vec<(Face, Ref)> = Face::ALL.iter().map(|face| (*face, alloc())).collect();
	let page_ids: Vec<(Ref, Ref)> = (0..total).map(|_| (alloc(), alloc())).collect();

	let mut pdf = Pdf::new();
	pdf.catalog(catalog_id).pages(tree_id);
	pdf.pages(tree_id)
		.kids(page_ids.iter().map(|(page_id, _)| *page_id))
		.count(total as i32);

	let mut replaced = 0;
	let empty = Page::default();
	for (index, (page_id, content_id)) in page_ids.iter().enumerate() {
		let mut page = pdf.page(*page_id);
		page.media_box(Rect::new(0.0, 0.0, width, height));
		page.parent(tree_id);
		page.contents(*content_id);
		{
			let mut resources = page.resources();
			let mut fonts = resources.fonts();
			for (face, font_id) in &font_ids {
				fonts.pair(Name(face.resource_name()), *font_id);
			}
		}
		page.finish();

		let source = pages.get(index).unwrap_or(&empty);
		let mut content = Content::new();
		for text in &source.texts {
			replaced += show(&mut content, text.face, text.size, text.x, text.baseline, &text.text);
		}
		if !source.rules.is_empty() {
			content.set_line_width(0.75);
			for rule in &source.rules {
				content.move_to(rule.from, rule.y);
				content.line_to(rule.to, rule.y);
				content.stroke();
			}
		}

		let footer = format!("{} / {total}", index + 1);
		let footer_size = settings.font_size * 0.8;
		let footer_x = (width - text_width(Face::Regular, &footer, footer_size)) / 2.0;
		show(
			&mut content,
			Face::Regular,
			footer_size,
			footer_x,
			settings.margin / 2.0,
			&footer,
		);

		pdf.stream(*content_id, &content.finish());
	}

	for (face, font_id) in &font_ids {
		pdf.type1_font(*font_id)
			.base_font(Name(face.base_font()))
			.encoding_predefined(Name(b"WinAnsiEncoding"));
	}

	{
		let mut info = pdf.document_info(info_id);
		info.producer(TextStr(PRODUCER));
		if let Some(title) = title {
			info.title(TextStr(title));
		}
	}

	if replaced > 0 {
		logger.log(DiagnosticEvent::new(
			subsystem::RENDER,
			Severity::Warning,
			format!("{replaced} character(s) outside WinAnsi replaced with `?`"),
		));
	}

	pdf.finish()
}

/// Write one text run. Returns the number of characters that could not be
/// encoded.
fn show(content: &mut Content, face: Face, size: f32, x: f32, y: f32, text: &str) -> usize {
	let (bytes, replaced) = encode(text);
	content.begin_text();
	content.set_font(Name(face.resource_name()), size);
	content.next_line(x, y);
	content.show(Str(&bytes));
	content.end_text();
	replaced
}
