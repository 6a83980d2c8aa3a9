//! A small drawing surface over `lopdf`.
//!
//! Coordinates are PDF points with the origin at the bottom-left of the page.
//! Every page shares one resources dictionary holding the four Helvetica faces and
//! any embedded images.

use anyhow::{bail, Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::contract::font_metrics::FontFace;

pub const LETTER_WIDTH: f32 = 612.0;
pub const LETTER_HEIGHT: f32 = 792.0;

/// A baseline JPEG ready to be embedded with `DCTDecode`.
#[derive(Debug, Clone)]
pub struct JpegImage {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    components: u8,
}

impl JpegImage {
    /// Reads the frame header to learn the pixel size. The bytes are embedded as-is.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let (width, height, components) =
            jpeg_frame_info(&data).context("Not a JPEG file or frame header missing")?;
        if width == 0 || height == 0 {
            bail!("JPEG has zero width or height");
        }
        Ok(Self {
            data,
            width,
            height,
            components,
        })
    }

    fn color_space(&self) -> &'static str {
        match self.components {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        }
    }
}

/// `(width, height, components)` from the first SOF marker.
fn jpeg_frame_info(data: &[u8]) -> Option<(u32, u32, u8)> {
    if data.get(0..2)? != [0xFF, 0xD8] {
        return None;
    }
    let mut i = 2;
    while i + 4 <= data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        // Fill bytes and standalone markers carry no length.
        if marker == 0xFF {
            i += 1;
            continue;
        }
        if marker == 0x01 || (0xD0..=0xD8).contains(&marker) {
            i += 2;
            continue;
        }
        let len = usize::from(u16::from_be_bytes([data[i + 2], data[i + 3]]));
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            let segment = data.get(i + 4..i + 2 + len)?;
            if segment.len() < 6 {
                return None;
            }
            let height = u16::from_be_bytes([segment[1], segment[2]]);
            let width = u16::from_be_bytes([segment[3], segment[4]]);
            return Some((u32::from(width), u32::from(height), segment[5]));
        }
        i += 2 + len;
    }
    None
}

pub struct Canvas {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    fonts: Dictionary,
    xobjects: Dictionary,
    operations: Vec<Operation>,
    face: FontFace,
    size: f32,
    width: f32,
    height: f32,
}

impl Canvas {
    pub fn letter() -> Self {
        Self::new(LETTER_WIDTH, LETTER_HEIGHT)
    }

    pub fn new(width: f32, height: f32) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for face in FontFace::ALL {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => face.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(face.resource_name(), font_id);
        }

        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            fonts,
            xobjects: Dictionary::new(),
            operations: Vec::new(),
            face: FontFace::Helvetica,
            size: 12.0,
            width,
            height,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn set_font(&mut self, face: FontFace, size: f32) {
        self.face = face;
        self.size = size;
    }

    /// Draws `text` with its baseline starting at `(x, y)`.
    pub fn draw_string(&mut self, x: f32, y: f32, text: &str) {
        self.operations.push(Operation::new("BT", vec![]));
        self.operations.push(Operation::new(
            "Tf",
            vec![
                Object::Name(self.face.resource_name().as_bytes().to_vec()),
                self.size.into(),
            ],
        ));
        self.operations
            .push(Operation::new("Td", vec![x.into(), y.into()]));
        self.operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(text))],
        ));
        self.operations.push(Operation::new("ET", vec![]));
    }

    /// Draws `text` so that it ends at `x_right`.
    pub fn draw_right_string(&mut self, x_right: f32, y: f32, text: &str) {
        let w = self.face.metrics().measure_pt(text, self.size);
        self.draw_string(x_right - w, y, text);
    }

    /// Draws `text` centred on `x_center`.
    pub fn draw_centred_string(&mut self, x_center: f32, y: f32, text: &str) {
        let w = self.face.metrics().measure_pt(text, self.size);
        self.draw_string(x_center - w / 2.0, y, text);
    }

    /// Draws pre-wrapped lines as a block whose bottom edge sits at `y_bottom`.
    /// The first baseline is one font size below the block top.
    pub fn draw_lines(&mut self, x: f32, y_bottom: f32, leading: f32, lines: &[String]) {
        let block_top = y_bottom + leading * lines.len() as f32;
        let mut baseline = block_top - self.size;
        for line in lines {
            self.draw_string(x, baseline, line);
            baseline -= leading;
        }
    }

    /// Places `image` with its bottom-left corner at `(x, y)`, scaled to `w`×`h` points.
    pub fn draw_image(&mut self, image: &JpegImage, x: f32, y: f32, w: f32, h: f32) {
        let name = format!("Im{}", self.xobjects.len() + 1);
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(image.width),
                "Height" => i64::from(image.height),
                "ColorSpace" => image.color_space(),
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            image.data.clone(),
        );
        let image_id = self.doc.add_object(stream);
        self.xobjects.set(name.as_bytes().to_vec(), image_id);

        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new(
            "cm",
            vec![w.into(), 0_i64.into(), 0_i64.into(), h.into(), x.into(), y.into()],
        ));
        self.operations
            .push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        self.operations.push(Operation::new("Q", vec![]));
    }

    /// Closes the current page and starts a new, empty one.
    pub fn show_page(&mut self) -> Result<()> {
        let content = Content {
            operations: std::mem::take(&mut self.operations),
        };
        let bytes = content.encode().context("Failed to encode page content")?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), bytes));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    /// Writes the page tree and returns the serialized document.
    /// Drawing done after the last `show_page` is discarded.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.page_ids.is_empty() {
            bail!("Document has no pages");
        }

        let resources_id = self.doc.add_object(dictionary! {
            "Font" => self.fonts,
            "XObject" => self.xobjects,
        });
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    self.width.into(),
                    self.height.into(),
                ],
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .context("Failed to serialize PDF")?;
        Ok(buffer)
    }
}

/// Encodes text for a WinAnsi simple font. Unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
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
            _ => b'?',
        })
        .collect()
}
