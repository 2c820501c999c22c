use serde::{Deserialize, Serialize};
use std::fmt;

/// Default font size applied to freshly created fields.
pub const DEFAULT_FONT_SIZE: u32 = 20;

/// Axis-aligned rectangle in image pixel space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Rectangle with its top-left corner at `(x, y)`.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from two opposite corners given in any order.
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        let (x1, x2) = (a.0.min(b.0), a.0.max(b.0));
        let (y1, y2) = (a.1.min(b.1), a.1.max(b.1));
        Self {
            x: x1,
            y: y1,
            width: x1.abs_diff(x2),
            height: y1.abs_diff(y2),
        }
    }

    /// Exclusive right edge, saturating at `i32::MAX`.
    pub fn right(&self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    /// Exclusive bottom edge, saturating at `i32::MAX`.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }
}

/// Raster surface a field paints onto.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardSide {
    #[default]
    Front,
    Rear,
}

impl CardSide {
    /// Label used in output file names.
    pub fn file_label(&self) -> &'static str {
        match self {
            CardSide::Front => "front",
            CardSide::Rear => "back",
        }
    }
}

impl fmt::Display for CardSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardSide::Front => write!(f, "Front"),
            CardSide::Rear => write!(f, "Back"),
        }
    }
}

/// What a field renders.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Image,
}

/// Horizontal placement of each wrapped line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    #[default]
    Left,
    Right,
    Center,
    /// Justified text: inter-word spacing stretched to the field width.
    Block,
}

/// Vertical placement of the wrapped block. `Bottom` is accepted but is
/// currently positioned like `Top`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Face variant a field asks for; see [`FontStyle::suffix`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    #[default]
    Plain,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    /// Suffix appended to a family name when looking up a styled face.
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            FontStyle::Plain => None,
            FontStyle::Bold => Some("Bold"),
            FontStyle::Italic => Some("Italic"),
            FontStyle::BoldItalic => Some("Bold Italic"),
        }
    }
}

/// Where a field's value comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", content = "template", rename_all = "snake_case")]
pub enum ValueSource {
    /// Looked up from the CSV column mapped to the field.
    #[default]
    Mapped,
    /// Expanded from a `{column}` template over the current row.
    Calculated(String),
}

/// A rectangular placement region on one card side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    pub rect: Rect,
    #[serde(default)]
    pub side: CardSide,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub horizontal_align: HorizontalAlign,
    #[serde(default)]
    pub vertical_align: VerticalAlign,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default)]
    pub style: FontStyle,
    /// Name of the overflow successor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_field: Option<String>,
    #[serde(default)]
    pub link_depth: u32,
    #[serde(default = "default_true")]
    pub indented: bool,
    #[serde(default)]
    pub resize_text: bool,
    #[serde(default = "default_outline")]
    pub color: [u8; 4],
    #[serde(default = "default_text_color")]
    pub text_color: [u8; 4],
    #[serde(default)]
    pub source: ValueSource,
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

fn default_true() -> bool {
    true
}

fn default_outline() -> [u8; 4] {
    [0xd0, 0x20, 0x20, 0xff]
}

fn default_text_color() -> [u8; 4] {
    [0x00, 0x00, 0x00, 0xff]
}

impl Field {
    /// Create a text field spanning the two given corners.
    pub fn new<S: Into<String>>(name: S, a: (i32, i32), b: (i32, i32), side: CardSide) -> Self {
        Self {
            name: name.into(),
            rect: Rect::from_corners(a, b),
            side,
            kind: FieldKind::Text,
            horizontal_align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Top,
            font_family: None,
            font_size: DEFAULT_FONT_SIZE,
            style: FontStyle::Plain,
            linked_field: None,
            link_depth: 0,
            indented: true,
            resize_text: false,
            color: default_outline(),
            text_color: default_text_color(),
            source: ValueSource::Mapped,
        }
    }

    /// Replace the field's rectangle.
    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Set the horizontal alignment.
    pub fn with_align(mut self, align: HorizontalAlign) -> Self {
        self.horizontal_align = align;
        self
    }

    /// Set the vertical alignment.
    pub fn with_vertical_align(mut self, align: VerticalAlign) -> Self {
        self.vertical_align = align;
        self
    }

    /// Set family, size and style. `None` defers the family to the package default.
    pub fn with_font(mut self, family: Option<&str>, size: u32, style: FontStyle) -> Self {
        self.font_family = family.map(str::to_string);
        self.font_size = size;
        self.style = style;
        self
    }

    /// Switch between a text and an image field.
    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether each paragraph starts with a tab indent.
    pub fn indented(mut self, indented: bool) -> Self {
        self.indented = indented;
        self
    }

    /// Whether the font shrinks until each paragraph fits on one line.
    pub fn resize_text(mut self, resize: bool) -> Self {
        self.resize_text = resize;
        self
    }

    /// Take the value from a `{column}` template instead of a mapped column.
    pub fn calculated<S: Into<String>>(mut self, template: S) -> Self {
        self.source = ValueSource::Calculated(template.into());
        self
    }

    /// Move the left edge, keeping the width.
    pub fn set_x(&mut self, x: i32) {
        self.rect.x = x;
    }

    /// Move the top edge, keeping the height.
    pub fn set_y(&mut self, y: i32) {
        self.rect.y = y;
    }

    /// Resize horizontally from the left edge.
    pub fn set_width(&mut self, width: u32) {
        self.rect.width = width;
    }

    /// Resize vertically from the top edge.
    pub fn set_height(&mut self, height: u32) {
        self.rect.height = height;
    }

    /// True when text overflowing this field continues in a successor.
    pub fn has_linked_field(&self) -> bool {
        self.linked_field.is_some()
    }

    /// True for fields filled from a template rather than the CSV mapping.
    pub fn is_calculated(&self) -> bool {
        matches!(self.source, ValueSource::Calculated(_))
    }

    /// Name shown on the outline nameplate; chain members carry their depth.
    pub fn display_name(&self) -> String {
        if self.linked_field.is_some() || self.link_depth > 0 {
            format!("{} {}", self.name, self.link_depth)
        } else {
            self.name.clone()
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.name, self.link_depth, self.side)
    }
}
