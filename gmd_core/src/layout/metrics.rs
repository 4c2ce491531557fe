//! Glyph widths of the PDF base-14 fonts the engine uses and the WinAnsi
//! encoding they are written with.

/// One of the five fonts registered on every page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Face {
	#[default]
	Regular,
	Bold,
	Italic,
	BoldItalic,
	Mono,
}

impl Face {
	pub const ALL: [Face; 5] = [
		Self::Regular,
		Self::Bold,
		Self::Italic,
		Self::BoldItalic,
		Self::Mono,
	];

	/// Pick the face for the given inline style.
	pub fn styled(bold: bool, italic: bool, mono: bool) -> Self {
		match (mono, bold, italic) {
			(true, ..) => Self::Mono,
			(false, true, true) => Self::BoldItalic,
			(false, true, false) => Self::Bold,
			(false, false, true) => Self::Italic,
			(false, false, false) => Self::Regular,
		}
	}

	/// Resource name used in page content streams.
	pub fn resource_name(self) -> &'static [u8] {
		match self {
			Self::Regular => b"F1",
			Self::Bold => b"F2",
			Self::Italic => b"F3",
			Self::BoldItalic => b"F4",
			Self::Mono => b"F5",
		}
	}

	/// PostScript name of the base-14 font.
	pub fn base_font(self) -> &'static [u8] {
		match self {
			Self::Regular => b"Helvetica",
			Self::Bold => b"Helvetica-Bold",
			Self::Italic => b"Helvetica-Oblique",
			Self::BoldItalic => b"Helvetica-BoldOblique",
			Self::Mono => b"Courier",
		}
	}

	fn is_bold(self) -> bool {
		matches!(self, Self::Bold | Self::BoldItalic)
	}
}

/// Advance widths of Helvetica for `' '..='~'`, in thousandths of an em.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
	278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
	556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
	1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
	667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
	333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
	556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Advance widths of Helvetica-Bold for `' '..='~'`.
#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
	278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
	556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
	975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
	667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
	333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
	611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const COURIER: u16 = 600;
const FALLBACK: u16 = 556;

/// Width of `ch` in thousandths of an em. Characters that can't be encoded
/// measure as the `?` they are replaced with.
pub fn char_width(face: Face, ch: char) -> u16 {
	if face == Face::Mono {
		return COURIER;
	}

	let code = encode_char(ch).unwrap_or(b'?');
	let table = if face.is_bold() {
		&HELVETICA_BOLD
	} else {
		&HELVETICA
	};
	match code {
		b' '..=b'~' => table[usize::from(code - b' ')],
		0xA0 => table[0],
		_ => FALLBACK,
	}
}

/// Width of `text` set in `face` at `size` points.
pub fn text_width(face: Face, text: &str, size: f32) -> f32 {
	let units: u32 = text.chars().map(|ch| u32::from(char_width(face, ch))).sum();
	units as f32 * size / 1000.0
}

/// Map a character to its WinAnsi code, if it has one.
pub fn encode_char(ch: char) -> Option<u8> {
	let code = match ch {
		'\t' => b' ',
		' '..='~' | '\u{A0}'..='\u{FF}' => u8::try_from(u32::from(ch)).ok()?,
		'€' => 0x80,
		'‚' => 0x82,
		'ƒ' => 0x83,
		'„' => 0x84,
		'…' => 0x85,
		'†' => 0x86,
		'‡' => 0x87,
		'ˆ' => 0x88,
		'‰' => 0x89,
		'Š' => 0x8A,
		'‹' => 0x8B,
		'Œ' => 0x8C,
		'Ž' => 0x8E,
		'‘' => 0x91,
		'’' => 0x92,
		'“' => 0x93,
		'”' => 0x94,
		'•' => 0x95,
		'–' => 0x96,
		'—' => 0x97,
		'˜' => 0x98,
		'™' => 0x99,
		'š' => 0x9A,
		'›' => 0x9B,
		'œ' => 0x9C,
		'ž' => 0x9E,
		'Ÿ' => 0x9F,
		_ => return None,
	};
	Some(code)
}

/// Encode `text` as WinAnsi bytes. Returns the bytes and the number of
/// characters replaced with `?`.
pub fn encode(text: &str) -> (Vec<u8>, usize) {
	let mut replaced = 0;
	let bytes = text
		.chars()
		.map(|ch| {
			encode_char(ch).unwrap_or_else(|| {
				replaced += 1;
				b'?'
			})
		})
		.collect();
	(bytes, replaced)
}
