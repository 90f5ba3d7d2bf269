//! Outputs and modes as reported by `xrandr --query`.
//!
//! [`parse`] turns the textual query output into a list of [`Output`]s, each
//! owning the [`Mode`]s listed underneath its header line.  Modes keep a
//! shared handle on their output's [`OutputHeader`] so DPI and "current
//! mode" can be computed without a back-pointer into the owning list.
//!
//! # Input format
//!
//! ```text
//! eDP-1 connected primary 1920x1080+0+0 (normal left inverted right) 340mm x 190mm
//!    1920x1080     60.02*+  59.93
//!    1680x1050     59.95    59.88
//! HDMI-1 disconnected (normal left inverted right x axis y axis)
//! ```

use log::debug;
use regex::Regex;
use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>\S+) (?P<connected>connected|disconnected) (?P<primary>primary *)?(?:(?P<width>\d+)x(?P<height>\d+)\+(?P<x>\d+)\+(?P<y>\d+))?",
    )
    .expect("header pattern is valid")
});

static PHYSICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<width>\d+)mm x (?P<height>\d+)mm").expect("physical size pattern is valid")
});

static MODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(?P<width>\d+)x(?P<height>\d+)").expect("mode pattern is valid")
});

/// Anything with a pixel width and height that a [`Mode`] can be compared
/// against.
pub trait Dimensions {
    fn dimensions(&self) -> (u32, u32);
}

impl Dimensions for (u32, u32) {
    fn dimensions(&self) -> (u32, u32) {
        *self
    }
}

/// Active position and size of an output on the virtual screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Physical panel size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalSize {
    pub width_mm: u32,
    pub height_mm: u32,
}

/// Errors from computations that need data the query did not report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("output {0} does not report a physical size")]
    MissingPhysicalSize(String),
}

/// Everything the header line says about an output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputHeader {
    /// Connector name, e.g. `"HDMI-1"`.
    pub name: String,
    pub connected: bool,
    pub primary: bool,
    /// Present iff the output is currently on.
    pub geometry: Option<Geometry>,
    /// Present iff the panel size is known.
    pub physical_size: Option<PhysicalSize>,
}

impl OutputHeader {
    /// Whether the output is connected and currently displaying something.
    pub fn is_on(&self) -> bool {
        self.connected && self.geometry.is_some()
    }

    fn icon(&self) -> &'static str {
        if !self.connected {
            "\u{f1424}"
        } else if self.primary {
            "\u{f03a4}"
        } else if self.is_on() {
            "\u{f085}"
        } else {
            "\u{f084}"
        }
    }
}

impl fmt::Display for OutputHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.icon(), self.name)?;
        if let Some(g) = self.geometry {
            write!(f, " ({}x{})", g.width, g.height)?;
        }
        Ok(())
    }
}

/// Relative placement flag understood by `xrandr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    SameAs,
    LeftOf,
    RightOf,
    Above,
    Below,
}

impl RelationKind {
    /// The command-line flag for this relation.
    pub fn flag(self) -> &'static str {
        match self {
            RelationKind::SameAs => "--same-as",
            RelationKind::LeftOf => "--left-of",
            RelationKind::RightOf => "--right-of",
            RelationKind::Above => "--above",
            RelationKind::Below => "--below",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::SameAs => write!(f, "same as"),
            RelationKind::LeftOf => write!(f, "left of"),
            RelationKind::RightOf => write!(f, "right of"),
            RelationKind::Above => write!(f, "above"),
            RelationKind::Below => write!(f, "below"),
        }
    }
}

/// A placement of one mode relative to another output.
#[derive(Debug, Clone)]
pub struct Relation {
    pub kind: RelationKind,
    pub output: Rc<OutputHeader>,
}

/// A resolution an output supports.
///
/// Two modes compare equal when their dimensions match, regardless of which
/// output they belong to or which relation they carry.
#[derive(Debug, Clone)]
pub struct Mode {
    pub width: u32,
    pub height: u32,
    /// The query line this mode was parsed from.
    pub raw_spec: String,
    output: Rc<OutputHeader>,
    relation: Option<Relation>,
}

impl Mode {
    pub fn new(width: u32, height: u32, raw_spec: impl Into<String>, output: Rc<OutputHeader>) -> Self {
        Self {
            width,
            height,
            raw_spec: raw_spec.into(),
            output,
            relation: None,
        }
    }

    /// Header of the output this mode belongs to.
    pub fn output(&self) -> &Rc<OutputHeader> {
        &self.output
    }

    pub fn relation(&self) -> Option<&Relation> {
        self.relation.as_ref()
    }

    /// Horizontal and vertical DPI on the owning output.
    pub fn dpi(&self) -> Result<(f64, f64), ModelError> {
        let size = self
            .output
            .physical_size
            .ok_or_else(|| ModelError::MissingPhysicalSize(self.output.name.clone()))?;
        Ok((
            f64::from(self.width) / (f64::from(size.width_mm) / 25.4),
            f64::from(self.height) / (f64::from(size.height_mm) / 25.4),
        ))
    }

    /// Whether the mode has (nearly) square pixels.
    pub fn is_square(&self) -> Result<bool, ModelError> {
        let (dx, dy) = self.dpi()?;
        Ok((dx - dy).abs() < 1.0)
    }

    /// Whether `xrandr` marked this mode as preferred (`+`).
    pub fn is_preferred(&self) -> bool {
        let prefix = format!("{}x{}", self.width, self.height);
        match self.raw_spec.find(&prefix) {
            Some(at) => self.raw_spec[at + prefix.len()..].contains('+'),
            None => self.raw_spec.contains('+'),
        }
    }

    /// Whether the owning output is currently running at this resolution.
    pub fn is_current(&self) -> bool {
        self.output
            .geometry
            .is_some_and(|g| g.width == self.width && g.height == self.height)
    }

    /// Rectilinear distance `|Δw| + |Δh|` to `other`.
    pub fn distance(&self, other: &impl Dimensions) -> u64 {
        let (w, h) = other.dimensions();
        u64::from(self.width.abs_diff(w)) + u64::from(self.height.abs_diff(h))
    }

    /// Copy of this mode placed `kind` relative to `output`.
    pub fn with_relation(&self, kind: RelationKind, output: &Rc<OutputHeader>) -> Mode {
        Mode {
            relation: Some(Relation {
                kind,
                output: Rc::clone(output),
            }),
            ..self.clone()
        }
    }

    /// `xrandr` arguments that activate this mode.
    pub fn xrandr_args(&self) -> Vec<String> {
        let mut args = vec![
            "--output".to_string(),
            self.output.name.clone(),
            "--mode".to_string(),
            format!("{}x{}", self.width, self.height),
        ];
        if let Some(rel) = &self.relation {
            args.push(rel.kind.flag().to_string());
            args.push(rel.output.name.clone());
        }
        args
    }
}

impl Dimensions for Mode {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl PartialEq for Mode {
    fn eq(&self, other: &Mode) -> bool {
        self.distance(other) == 0
    }
}

impl PartialEq<(u32, u32)> for Mode {
    fn eq(&self, other: &(u32, u32)) -> bool {
        self.distance(other) == 0
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = if self.is_current() { '*' } else { ' ' };
        let preferred = if self.is_preferred() { '!' } else { ' ' };
        write!(f, "{}{} {:>4}x{:<4}", current, preferred, self.width, self.height)?;
        match self.dpi() {
            Ok((dx, dy)) => {
                let square = if (dx - dy).abs() < 1.0 { '■' } else { ' ' };
                write!(f, " {} ({:2.0}x{:2.0} dpi)", square, dx, dy)
            }
            Err(_) => write!(f, "   (unknown dpi)"),
        }
    }
}

/// One connector and the modes it supports.
#[derive(Debug, Clone)]
pub struct Output {
    header: Rc<OutputHeader>,
    modes: Vec<Mode>,
}

impl Output {
    pub fn new(header: OutputHeader) -> Self {
        Self {
            header: Rc::new(header),
            modes: Vec::new(),
        }
    }

    pub fn header(&self) -> &Rc<OutputHeader> {
        &self.header
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn connected(&self) -> bool {
        self.header.connected
    }

    pub fn primary(&self) -> bool {
        self.header.primary
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.header.geometry
    }

    pub fn physical_size(&self) -> Option<PhysicalSize> {
        self.header.physical_size
    }

    pub fn is_on(&self) -> bool {
        self.header.is_on()
    }

    /// Modes in the order the query listed them.
    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    /// Append a mode parsed from `raw_spec`.
    pub fn push_mode(&mut self, width: u32, height: u32, raw_spec: impl Into<String>) {
        let mode = Mode::new(width, height, raw_spec, Rc::clone(&self.header));
        self.modes.push(mode);
    }
}

impl PartialEq for Output {
    fn eq(&self, other: &Output) -> bool {
        self.header == other.header
            && self.modes.len() == other.modes.len()
            && self
                .modes
                .iter()
                .zip(&other.modes)
                .all(|(a, b)| a == b && a.is_preferred() == b.is_preferred())
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.header.fmt(f)
    }
}

fn parse_header(line: &str) -> Option<OutputHeader> {
    let caps = HEADER_RE.captures(line)?;
    let number = |key: &str| caps.name(key).and_then(|m| m.as_str().parse::<u32>().ok());

    let position = |key: &str| number(key).and_then(|v| i32::try_from(v).ok());
    let geometry = match (number("width"), number("height"), position("x"), position("y")) {
        (Some(width), Some(height), Some(x), Some(y)) => Some(Geometry {
            x,
            y,
            width,
            height,
        }),
        _ => None,
    };

    // xrandr reports 0mm x 0mm for projectors and virtual outputs.
    let physical_size = PHYSICAL_RE.captures(line).and_then(|p| {
        let width_mm = p["width"].parse::<u32>().ok()?;
        let height_mm = p["height"].parse::<u32>().ok()?;
        (width_mm > 0 && height_mm > 0).then_some(PhysicalSize {
            width_mm,
            height_mm,
        })
    });

    Some(OutputHeader {
        name: caps["name"].to_string(),
        connected: &caps["connected"] == "connected",
        primary: caps.name("primary").is_some(),
        geometry,
        physical_size,
    })
}

/// Parse the output of `xrandr --query`.
///
/// Lines that are neither output headers nor mode lines are skipped.  A mode
/// line that appears before the first header has no output to attach to and
/// is dropped.
pub fn parse(raw: &str) -> Vec<Output> {
    let mut outputs: Vec<Output> = Vec::new();
    for line in raw.lines() {
        if let Some(header) = parse_header(line) {
            debug!("output {} (connected: {})", header.name, header.connected);
            outputs.push(Output::new(header));
        } else if let Some(caps) = MODE_RE.captures(line) {
            let (Ok(width), Ok(height)) = (caps["width"].parse(), caps["height"].parse()) else {
                continue;
            };
            match outputs.last_mut() {
                Some(output) => output.push_mode(width, height, line),
                None => debug!("dropping mode line before any output: {:?}", line),
            }
        }
    }
    outputs
}

/// Render outputs back into `xrandr --query` form.
///
/// Only what [`parse`] reads is written, so parsing the result yields an
/// equal model.
pub fn format_query(outputs: &[Output]) -> String {
    let mut text = String::new();
    for output in outputs {
        let h = output.header();
        text.push_str(&h.name);
        text.push_str(if h.connected { " connected " } else { " disconnected " });
        if h.primary {
            text.push_str("primary ");
        }
        if let Some(g) = h.geometry {
            text.push_str(&format!("{}x{}+{}+{} ", g.width, g.height, g.x, g.y));
        }
        text.push_str("(normal left inverted right x axis y axis)");
        if let Some(p) = h.physical_size {
            text.push_str(&format!(" {}mm x {}mm", p.width_mm, p.height_mm));
        }
        text.push('\n');
        for mode in output.modes() {
            let marker = if mode.is_preferred() { " +" } else { "" };
            text.push_str(&format!("   {}x{}{}\n", mode.width, mode.height, marker));
        }
    }
    text
}
