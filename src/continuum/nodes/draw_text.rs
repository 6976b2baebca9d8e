// SPDX-License-Identifier: MIT

//! Text overlay
//!
//! Lays out multi-line text, rasterizes it into a coverage mask and
//! composites it, with an optional blurred drop shadow, onto every image of a
//! batch. The font arrives as raw bytes; finding and reading font files is up
//! to the host.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use ttf_parser::{Face, OutlineBuilder};

use super::image::ImageBatch;
use crate::continuum::config::PackConfig;
use crate::runtime::{ContinuumError, ExecutionContext, Inputs, Node, NodeOutput};

/// Samples per pixel along each axis
const SUPERSAMPLE: usize = 4;
/// Line segments used to flatten one curve piece
const CURVE_STEPS: usize = 8;

/// Glyph outline in font units, y pointing up from the baseline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyph {
    pub advance: f32,
    pub contours: Vec<Vec<(f32, f32)>>,
}

/// Glyph shapes and vertical metrics, all in font units
pub trait GlyphSource {
    fn units_per_em(&self) -> f32;
    fn ascender(&self) -> f32;
    /// Distance below the baseline, negative for most fonts
    fn descender(&self) -> f32;
    fn line_gap(&self) -> f32;
    fn glyph(&self, c: char) -> Option<Glyph>;
}

/// TrueType or OpenType font parsed from memory
pub struct TtfFont<'a> {
    face: Face<'a>,
}

impl<'a> TtfFont<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, String> {
        Face::parse(data, 0)
            .map(|face| Self { face })
            .map_err(|e| format!("unreadable font: {}", e))
    }
}

impl GlyphSource for TtfFont<'_> {
    fn units_per_em(&self) -> f32 {
        self.face.units_per_em() as f32
    }

    fn ascender(&self) -> f32 {
        self.face.ascender() as f32
    }

    fn descender(&self) -> f32 {
        self.face.descender() as f32
    }

    fn line_gap(&self) -> f32 {
        self.face.line_gap() as f32
    }

    fn glyph(&self, c: char) -> Option<Glyph> {
        let id = self.face.glyph_index(c)?;
        let mut outline = OutlineCollector::default();
        // Blank glyphs have no outline but still advance
        self.face.outline_glyph(id, &mut outline);
        Some(Glyph {
            advance: self.face.glyph_hor_advance(id).unwrap_or(0) as f32,
            contours: outline.finish(),
        })
    }
}

/// Flattens glyph outlines into closed polygons
#[derive(Default)]
struct OutlineCollector {
    contours: Vec<Vec<(f32, f32)>>,
    current: Vec<(f32, f32)>,
}

impl OutlineCollector {
    fn last(&self) -> (f32, f32) {
        self.current.last().copied().unwrap_or((0.0, 0.0))
    }

    fn finish(mut self) -> Vec<Vec<(f32, f32)>> {
        self.close();
        self.contours
    }
}

impl OutlineBuilder for OutlineCollector {
    fn move_to(&mut self, x: f32, y: f32) {
        self.close();
        self.current.push((x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.current.push((x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x0, y0) = self.last();
        for step in 1..=CURVE_STEPS {
            let t = step as f32 / CURVE_STEPS as f32;
            let mt = 1.0 - t;
            self.current.push((
                mt * mt * x0 + 2.0 * mt * t * x1 + t * t * x,
                mt * mt * y0 + 2.0 * mt * t * y1 + t * t * y,
            ));
        }
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x0, y0) = self.last();
        for step in 1..=CURVE_STEPS {
            let t = step as f32 / CURVE_STEPS as f32;
            let mt = 1.0 - t;
            let (a, b, c, d) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
            self.current.push((
                a * x0 + b * x1 + c * x2 + d * x,
                a * y0 + b * y1 + c * y2 + d * y,
            ));
        }
    }

    fn close(&mut self) {
        if self.current.len() > 2 {
            self.contours.push(std::mem::take(&mut self.current));
        } else {
            self.current.clear();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

impl FromStr for HorizontalAlign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(HorizontalAlign::Left),
            "center" => Ok(HorizontalAlign::Center),
            "right" => Ok(HorizontalAlign::Right),
            other => Err(format!("unknown alignment '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    Center,
    Bottom,
}

impl FromStr for VerticalAlign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(VerticalAlign::Top),
            "center" => Ok(VerticalAlign::Center),
            "bottom" => Ok(VerticalAlign::Bottom),
            other => Err(format!("unknown vertical alignment '{}'", other)),
        }
    }
}

/// `#RRGGBB` to linear 0..1 components
pub fn parse_hex_color(s: &str) -> Result<[f32; 3], String> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(format!("color '{}' is not #RRGGBB", s));
    }
    let mut rgb = [0.0; 3];
    for (i, component) in rgb.iter_mut().enumerate() {
        let byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|_| format!("color '{}' is not #RRGGBB", s))?;
        *component = byte as f32 / 255.0;
    }
    Ok(rgb)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    pub offset_x: i64,
    pub offset_y: i64,
    /// Box blur radius in pixels
    pub blur: usize,
    pub color: [f32; 3],
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Em size in pixels
    pub font_size: f32,
    pub color: [f32; 3],
    pub opacity: f32,
    pub align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
    pub padding: f32,
    /// Multiplier on the font's natural line height
    pub line_spacing: f32,
    pub shadow: Option<Shadow>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 48.0,
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            align: HorizontalAlign::Center,
            vertical_align: VerticalAlign::Center,
            padding: 16.0,
            line_spacing: 1.0,
            shadow: None,
        }
    }
}

/// Per-pixel coverage in 0..1
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub coverage: Vec<f32>,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            coverage: vec![0.0; width * height],
        }
    }

    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.coverage[y * self.width + x]
    }

    /// Fill polygons given in pixel coordinates with the non-zero rule
    pub fn fill_polygons(&mut self, contours: &[Vec<(f32, f32)>]) {
        let edges: Vec<((f32, f32), (f32, f32))> = contours
            .iter()
            .flat_map(|contour| {
                contour
                    .iter()
                    .zip(contour.iter().cycle().skip(1))
                    .map(|(a, b)| (*a, *b))
            })
            .filter(|((_, y0), (_, y1))| y0 != y1)
            .collect();
        if edges.is_empty() {
            return;
        }

        let step = 1.0 / SUPERSAMPLE as f32;
        let weight = step * step;
        let mut crossings: Vec<(f32, i32)> = Vec::new();
        for py in 0..self.height {
            for sy in 0..SUPERSAMPLE {
                let y = py as f32 + (sy as f32 + 0.5) * step;
                crossings.clear();
                for &((x0, y0), (x1, y1)) in &edges {
                    let (low, high) = if y0 < y1 { (y0, y1) } else { (y1, y0) };
                    if y < low || y >= high {
                        continue;
                    }
                    let x = x0 + (y - y0) / (y1 - y0) * (x1 - x0);
                    crossings.push((x, if y1 > y0 { 1 } else { -1 }));
                }
                crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut winding = 0;
                for pair in crossings.windows(2) {
                    winding += pair[0].1;
                    if winding != 0 {
                        self.cover_span(py, pair[0].0, pair[1].0, weight);
                    }
                }
            }
        }

        for value in &mut self.coverage {
            *value = value.min(1.0);
        }
    }

    /// Add `weight` for every sub-sample column whose centre lies in `[x0, x1)`
    fn cover_span(&mut self, py: usize, x0: f32, x1: f32, weight: f32) {
        let samples = (self.width * SUPERSAMPLE) as f32;
        let first = (x0 * SUPERSAMPLE as f32 - 0.5).ceil().clamp(0.0, samples) as usize;
        let last = (x1 * SUPERSAMPLE as f32 - 0.5).ceil().clamp(0.0, samples) as usize;
        let row = py * self.width;
        for sample in first..last {
            self.coverage[row + sample / SUPERSAMPLE] += weight;
        }
    }

    /// Move the mask by whole pixels; uncovered pixels become 0
    pub fn shifted(&self, dx: i64, dy: i64) -> Mask {
        let mut out = Mask::new(self.width, self.height);
        for y in 0..self.height {
            let Some(sy) = offset(y, dy, self.height) else {
                continue;
            };
            for x in 0..self.width {
                if let Some(sx) = offset(x, dx, self.width) {
                    out.coverage[y * self.width + x] = self.at(sx, sy);
                }
            }
        }
        out
    }

    /// Separable box blur; samples outside the mask count as 0
    pub fn box_blur(&self, radius: usize) -> Mask {
        if radius == 0 {
            return self.clone();
        }
        let norm = 1.0 / (2 * radius + 1) as f32;
        let mut horizontal = Mask::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let from = x.saturating_sub(radius);
                let to = (x + radius).min(self.width - 1);
                let sum: f32 = (from..=to).map(|sx| self.at(sx, y)).sum();
                horizontal.coverage[y * self.width + x] = sum * norm;
            }
        }

        let mut out = Mask::new(self.width, self.height);
        for y in 0..self.height {
            let from = y.saturating_sub(radius);
            let to = (y + radius).min(self.height - 1);
            for x in 0..self.width {
                let sum: f32 = (from..=to).map(|sy| horizontal.at(x, sy)).sum();
                out.coverage[y * self.width + x] = sum * norm;
            }
        }
        out
    }
}

/// Source index for `index` after moving by `delta`, if it lands inside `len`
fn offset(index: usize, delta: i64, len: usize) -> Option<usize> {
    let source = index as i64 - delta;
    (0..len as i64).contains(&source).then_some(source as usize)
}

/// Lay out `text` on a `width x height` canvas and rasterize it
pub fn render_text<G: GlyphSource + ?Sized>(
    font: &G,
    text: &str,
    style: &TextStyle,
    width: usize,
    height: usize,
) -> Mask {
    let mut mask = Mask::new(width, height);
    let units_per_em = font.units_per_em();
    if text.is_empty() || units_per_em <= 0.0 {
        return mask;
    }

    let scale = style.font_size / units_per_em;
    let ascent = font.ascender() * scale;
    let descent = font.descender() * scale;
    let line_height =
        (font.ascender() - font.descender() + font.line_gap()) * scale * style.line_spacing;

    let lines: Vec<Vec<Glyph>> = text
        .split('\n')
        .map(|line| {
            line.trim_end_matches('\r')
                .chars()
                .filter_map(|c| {
                    let glyph = font.glyph(c);
                    if glyph.is_none() {
                        log::debug!("Font has no glyph for {:?}", c);
                    }
                    glyph
                })
                .collect()
        })
        .collect();

    let (width_px, height_px) = (width as f32, height as f32);
    let block_height = (lines.len() - 1) as f32 * line_height + ascent - descent;
    let top = match style.vertical_align {
        VerticalAlign::Top => style.padding,
        VerticalAlign::Center => (height_px - block_height) / 2.0,
        VerticalAlign::Bottom => height_px - style.padding - block_height,
    };

    let mut contours = Vec::new();
    for (row, glyphs) in lines.iter().enumerate() {
        let line_width: f32 = glyphs.iter().map(|g| g.advance * scale).sum();
        let mut pen = match style.align {
            HorizontalAlign::Left => style.padding,
            HorizontalAlign::Center => (width_px - line_width) / 2.0,
            HorizontalAlign::Right => width_px - style.padding - line_width,
        };
        let baseline = top + ascent + row as f32 * line_height;
        for glyph in glyphs {
            for contour in &glyph.contours {
                contours.push(
                    contour
                        .iter()
                        .map(|&(x, y)| (pen + x * scale, baseline - y * scale))
                        .collect(),
                );
            }
            pen += glyph.advance * scale;
        }
    }

    mask.fill_polygons(&contours);
    mask
}

/// Draw `text` onto every image in the batch
pub fn draw_text<G: GlyphSource + ?Sized>(
    image: &ImageBatch,
    font: &G,
    text: &str,
    style: &TextStyle,
) -> Result<ImageBatch, String> {
    image.check_shape()?;
    let mask = render_text(font, text, style, image.width, image.height);
    let shadow = style
        .shadow
        .as_ref()
        .filter(|shadow| shadow.opacity > 0.0)
        .map(|shadow| {
            let moved = mask.shifted(shadow.offset_x, shadow.offset_y);
            (moved.box_blur(shadow.blur), shadow)
        });

    let mut out = image.clone();
    let pixels = image.width * image.height;
    for b in 0..image.batch {
        for p in 0..pixels {
            let start = (b * pixels + p) * image.channels;
            let pixel = &mut out.data[start..start + image.channels];
            if let Some((shadow_mask, shadow)) = &shadow {
                blend(pixel, shadow.color, shadow_mask.coverage[p] * shadow.opacity);
            }
            blend(pixel, style.color, mask.coverage[p] * style.opacity);
        }
    }
    Ok(out)
}

/// Source-over; a fourth channel is treated as alpha, one channel as luma
fn blend(pixel: &mut [f32], color: [f32; 3], alpha: f32) {
    if alpha <= 0.0 {
        return;
    }
    let alpha = alpha.min(1.0);
    let luma = 0.299 * color[0] + 0.587 * color[1] + 0.114 * color[2];
    let grey = pixel.len() < 3;
    for (channel, value) in pixel.iter_mut().enumerate() {
        let source = match channel {
            _ if grey => luma,
            0..=2 => color[channel],
            3 => 1.0,
            _ => *value,
        };
        *value = *value * (1.0 - alpha) + source * alpha;
    }
}

static DRAW_TEXT_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "image": { "x-type": "IMAGE" },
            "text": { "type": "string", "default": "", "multiline": true },
            "font": { "x-type": "FONT_BYTES", "description": "Raw TrueType/OpenType font file" },
            "font_size": { "type": "integer", "default": 48, "minimum": 1, "maximum": 1024 },
            "font_color": { "type": "string", "default": "#FFFFFF" },
            "opacity": { "type": "number", "default": 1.0, "minimum": 0.0, "maximum": 1.0 },
            "alignment": { "enum": ["left", "center", "right"], "default": "center" },
            "vertical_alignment": { "enum": ["top", "center", "bottom"], "default": "center" },
            "padding": { "type": "integer", "default": 16, "minimum": 0, "maximum": 4096 },
            "line_spacing": { "type": "number", "default": 1.0, "minimum": 0.5, "maximum": 4.0 },
            "shadow_color": { "type": "string", "default": "#000000" },
            "shadow_opacity": { "type": "number", "default": 0.0, "minimum": 0.0, "maximum": 1.0 },
            "shadow_offset_x": { "type": "integer", "default": 4, "minimum": -256, "maximum": 256 },
            "shadow_offset_y": { "type": "integer", "default": 4, "minimum": -256, "maximum": 256 },
            "shadow_blur": { "type": "integer", "default": 4, "minimum": 0, "maximum": 64 }
        },
        "required": ["image", "font"],
        "output": "IMAGE"
    })
});

pub struct ConfigurableDrawText {
    category: String,
}

impl ConfigurableDrawText {
    pub fn new(config: &PackConfig) -> Self {
        Self {
            category: config.category("Image"),
        }
    }

    fn style(fields: &Inputs<'_>) -> Result<TextStyle, ContinuumError> {
        let font_size = fields.i64_or("font_size", 48)?;
        if !(1..=1024).contains(&font_size) {
            return Err(fields.invalid("font_size must be between 1 and 1024"));
        }
        let padding = fields.i64_or("padding", 16)?;
        if padding < 0 {
            return Err(fields.invalid("padding must not be negative"));
        }
        let color = |key: &str, default: &str| -> Result<[f32; 3], ContinuumError> {
            parse_hex_color(fields.str_or(key, default)?).map_err(|e| fields.invalid(e))
        };

        let shadow = Shadow {
            offset_x: fields.i64_or("shadow_offset_x", 4)?,
            offset_y: fields.i64_or("shadow_offset_y", 4)?,
            blur: fields.i64_or("shadow_blur", 4)?.clamp(0, 64) as usize,
            color: color("shadow_color", "#000000")?,
            opacity: fields.f64_or("shadow_opacity", 0.0)?.clamp(0.0, 1.0) as f32,
        };

        Ok(TextStyle {
            font_size: font_size as f32,
            color: color("font_color", "#FFFFFF")?,
            opacity: fields.f64_or("opacity", 1.0)?.clamp(0.0, 1.0) as f32,
            align: fields
                .str_or("alignment", "center")?
                .parse()
                .map_err(|e: String| fields.invalid(e))?,
            vertical_align: fields
                .str_or("vertical_alignment", "center")?
                .parse()
                .map_err(|e: String| fields.invalid(e))?,
            padding: padding as f32,
            line_spacing: fields.f64_or("line_spacing", 1.0)?.clamp(0.5, 4.0) as f32,
            shadow: (shadow.opacity > 0.0).then_some(shadow),
        })
    }
}

#[async_trait]
impl Node for ConfigurableDrawText {
    fn class_name(&self) -> &str {
        "ConfigurableDrawText"
    }

    fn display_name(&self) -> &str {
        "Draw Text"
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn description(&self) -> &str {
        "Draws multi-line text with alignment, padding and an optional drop shadow onto each image."
    }

    fn schema(&self) -> &Value {
        &DRAW_TEXT_SCHEMA
    }

    async fn execute(
        &self,
        inputs: Value,
        _ctx: &ExecutionContext,
    ) -> Result<NodeOutput, ContinuumError> {
        let fields = Inputs::new(self.class_name(), &inputs);
        let image = ImageBatch::deserialize(fields.required("image")?)
            .map_err(|e| fields.invalid(e.to_string()))?;
        let font_bytes = Vec::<u8>::deserialize(fields.required("font")?)
            .map_err(|e| fields.invalid(format!("font must be a byte array: {}", e)))?;
        let font = TtfFont::parse(&font_bytes).map_err(|e| fields.invalid(e))?;
        let text = fields.str_or("text", "")?;
        let style = Self::style(&fields)?;

        let drawn = draw_text(&image, &font, text, &style).map_err(|e| fields.invalid(e))?;
        log::debug!(
            "Drew {} line(s) of text on {} image(s)",
            text.split('\n').count(),
            drawn.batch
        );
        Ok(NodeOutput::single(serde_json::to_value(drawn)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character except space is a 8x8 block inside a 10 unit advance
    struct BlockFont;

    impl GlyphSource for BlockFont {
        fn units_per_em(&self) -> f32 {
            10.0
        }

        fn ascender(&self) -> f32 {
            8.0
        }

        fn descender(&self) -> f32 {
            -2.0
        }

        fn line_gap(&self) -> f32 {
            0.0
        }

        fn glyph(&self, c: char) -> Option<Glyph> {
            match c {
                '\u{fffd}' => None,
                ' ' => Some(Glyph {
                    advance: 10.0,
                    contours: Vec::new(),
                }),
                _ => Some(Glyph {
                    advance: 10.0,
                    contours: vec![vec![(1.0, 0.0), (9.0, 0.0), (9.0, 8.0), (1.0, 8.0)]],
                }),
            }
        }
    }

    fn style(align: HorizontalAlign, vertical_align: VerticalAlign, padding: f32) -> TextStyle {
        TextStyle {
            font_size: 10.0,
            align,
            vertical_align,
            padding,
            ..TextStyle::default()
        }
    }

    #[test]
    fn test_top_left_block() {
        let style = style(HorizontalAlign::Left, VerticalAlign::Top, 0.0);
        let mask = render_text(&BlockFont, "a", &style, 20, 20);

        assert_eq!(mask.at(1, 0), 1.0);
        assert_eq!(mask.at(8, 7), 1.0);
        assert_eq!(mask.at(0, 0), 0.0);
        assert_eq!(mask.at(9, 0), 0.0);
        assert_eq!(mask.at(1, 8), 0.0);
    }

    #[test]
    fn test_right_and_vertical_center() {
        let style = style(HorizontalAlign::Right, VerticalAlign::Center, 2.0);
        let mask = render_text(&BlockFont, "a", &style, 30, 30);

        // block is 10 high, so the top sits at 10 and the glyph spans 10..18
        assert_eq!(mask.at(19, 10), 1.0);
        assert_eq!(mask.at(26, 17), 1.0);
        assert_eq!(mask.at(18, 12), 0.0);
        assert_eq!(mask.at(27, 12), 0.0);
        assert_eq!(mask.at(20, 9), 0.0);
        assert_eq!(mask.at(20, 18), 0.0);
    }

    #[test]
    fn test_lines_and_missing_glyphs() {
        let style = style(HorizontalAlign::Left, VerticalAlign::Top, 0.0);
        let mask = render_text(&BlockFont, "\u{fffd}a\r\n a", &style, 30, 30);

        assert_eq!(mask.at(4, 4), 1.0);
        assert_eq!(mask.at(4, 12), 0.0);
        assert_eq!(mask.at(14, 12), 1.0);
        assert_eq!(mask.at(14, 9), 0.0);
    }

    #[test]
    fn test_half_covered_pixel() {
        let mut mask = Mask::new(2, 1);
        mask.fill_polygons(&[vec![(0.0, 0.0), (1.5, 0.0), (1.5, 1.0), (0.0, 1.0)]]);
        assert_eq!(mask.at(0, 0), 1.0);
        assert_eq!(mask.at(1, 0), 0.5);
    }

    #[test]
    fn test_shift_and_blur() {
        let mut mask = Mask::new(5, 5);
        mask.coverage[2 * 5 + 2] = 1.0;

        let shifted = mask.shifted(1, -1);
        assert_eq!(shifted.at(3, 1), 1.0);
        assert_eq!(shifted.at(2, 2), 0.0);

        let blurred = mask.box_blur(1);
        assert!((blurred.at(2, 2) - 1.0 / 9.0).abs() < 1e-6);
        assert!((blurred.at(1, 3) - 1.0 / 9.0).abs() < 1e-6);
        assert_eq!(blurred.at(0, 0), 0.0);
        assert_eq!(mask.box_blur(0), mask);
    }

    #[test]
    fn test_draw_with_shadow() {
        let image = ImageBatch::new(2, 20, 20, 3, vec![0.5; 2 * 20 * 20 * 3]).unwrap();
        let mut style = style(HorizontalAlign::Left, VerticalAlign::Top, 0.0);
        style.shadow = Some(Shadow {
            offset_x: 10,
            offset_y: 0,
            blur: 0,
            color: [0.0, 0.0, 0.0],
            opacity: 1.0,
        });

        let out = draw_text(&image, &BlockFont, "a", &style).unwrap();
        let pixel = |b: usize, x: usize, y: usize| {
            let start = ((b * 20 + y) * 20 + x) * 3;
            out.data[start..start + 3].to_vec()
        };
        assert_eq!(pixel(0, 4, 4), vec![1.0, 1.0, 1.0]);
        assert_eq!(pixel(1, 4, 4), vec![1.0, 1.0, 1.0]);
        assert_eq!(pixel(0, 12, 4), vec![0.0, 0.0, 0.0]);
        assert_eq!(pixel(1, 15, 15), vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_blend_alpha_and_grey_channels() {
        let mut rgba = [0.0, 0.0, 0.0, 0.0];
        blend(&mut rgba, [1.0, 0.0, 0.0], 1.0);
        assert_eq!(rgba, [1.0, 0.0, 0.0, 1.0]);

        let mut grey = [0.0];
        blend(&mut grey, [1.0, 1.0, 1.0], 0.5);
        assert!((grey[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF0000").unwrap(), [1.0, 0.0, 0.0]);
        assert_eq!(parse_hex_color("00ff00").unwrap(), [0.0, 1.0, 0.0]);
        assert!(parse_hex_color("#FFF").is_err());
        assert!(parse_hex_color("#GG0000").is_err());
    }

    #[test]
    fn test_alignment_from_str() {
        assert_eq!("right".parse::<HorizontalAlign>(), Ok(HorizontalAlign::Right));
        assert_eq!("bottom".parse::<VerticalAlign>(), Ok(VerticalAlign::Bottom));
        assert!("Left".parse::<HorizontalAlign>().is_err());
    }

    #[test]
    fn test_style_from_inputs() {
        let raw = json!({
            "font_size": 24,
            "alignment": "left",
            "shadow_opacity": 0.8,
            "shadow_color": "#202020"
        });
        let fields = Inputs::new("ConfigurableDrawText", &raw);
        let style = ConfigurableDrawText::style(&fields).unwrap();
        assert_eq!(style.font_size, 24.0);
        assert_eq!(style.align, HorizontalAlign::Left);
        assert_eq!(style.vertical_align, VerticalAlign::Center);
        let shadow = style.shadow.unwrap();
        assert_eq!((shadow.offset_x, shadow.blur), (4, 4));

        let no_shadow = json!({});
        let fields = Inputs::new("ConfigurableDrawText", &no_shadow);
        assert!(ConfigurableDrawText::style(&fields).unwrap().shadow.is_none());
    }

    #[tokio::test]
    async fn test_node_rejects_bad_inputs() {
        let node = ConfigurableDrawText::new(&PackConfig::default());
        let image = ImageBatch::new(1, 2, 2, 3, vec![0.0; 12]).unwrap();
        let ctx = ExecutionContext::default();

        for inputs in [
            json!({"image": image, "text": "hi"}),
            json!({"image": image, "text": "hi", "font": [0, 1, 2, 3]}),
            json!({"image": image, "text": "hi", "font": "Arial"}),
        ] {
            let result = node.execute(inputs, &ctx).await;
            assert!(matches!(result, Err(ContinuumError::InvalidInput { .. })));
        }
        assert_eq!(node.category(), "Flux-Continuum/Image");
    }
}
