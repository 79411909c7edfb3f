//! Static style tables: entity colors, icon glyphs, line and head types.

/// Default node text color.
pub const DEFAULT_TEXT_COLOR: &str = "#000";
/// Default node background.
pub const DEFAULT_BACKGROUND_COLOR: &str = "#fff";
/// Default node border and edge color.
pub const DEFAULT_STROKE_COLOR: &str = "#2B7CE9";
/// Edge label text color.
pub const EDGE_LABEL_COLOR: &str = "#444";
/// Edge label halo color.
pub const EDGE_LABEL_HALO: &str = "#fff";

/// Visual style of one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationStyle {
    /// Entity label, e.g. "gene".
    pub label: &'static str,
    /// Primary color, used for text.
    pub color: &'static str,
    /// Icon glyph drawn instead of a box.
    pub icon_code: Option<&'static str>,
    /// Border override.
    pub border: Option<&'static str>,
    /// Background override.
    pub background: Option<&'static str>,
    /// Text color override.
    pub text: Option<&'static str>,
}

impl AnnotationStyle {
    const fn plain(label: &'static str, color: &'static str) -> Self {
        Self {
            label,
            color,
            icon_code: None,
            border: None,
            background: None,
            text: None,
        }
    }

    const fn icon(label: &'static str, color: &'static str, code: &'static str) -> Self {
        Self {
            icon_code: Some(code),
            ..Self::plain(label, color)
        }
    }

    const fn relation(label: &'static str, color: &'static str) -> Self {
        Self {
            border: Some(color),
            background: Some(color),
            text: Some("#000"),
            ..Self::plain(label, color)
        }
    }
}

const RELATION: &str = "#d7d9f8";

/// Styles of the known entity types.
pub const ANNOTATION_STYLES: &[AnnotationStyle] = &[
    AnnotationStyle::plain("gene", "#673ab7"),
    AnnotationStyle::plain("disease", "#ff9800"),
    AnnotationStyle::plain("chemical", "#4caf50"),
    AnnotationStyle::plain("compound", "#4caf50"),
    AnnotationStyle::plain("mutation", "#5d4037"),
    AnnotationStyle::plain("species", "#3177b8"),
    AnnotationStyle::plain("company", "#d62728"),
    AnnotationStyle::plain("study", "#17becf"),
    AnnotationStyle::plain("protein", "#bcbd22"),
    AnnotationStyle::plain("pathway", "#e377c2"),
    AnnotationStyle::plain("phenomena", "#edc949"),
    AnnotationStyle::plain("phenotype", "#edc949"),
    AnnotationStyle::plain("food", "#8eff69"),
    AnnotationStyle::plain("anatomy", "#0202bd"),
    AnnotationStyle::plain("lab sample", "#f71698"),
    AnnotationStyle::plain("lab strain", "#f71698"),
    AnnotationStyle::icon("link", "#669999", icons::LINK),
    AnnotationStyle::plain("entity", "#7f7f7f"),
    AnnotationStyle::icon("map", "#0277bd", icons::MAP),
    AnnotationStyle::icon("note", "#edc949", icons::NOTE),
    AnnotationStyle::relation("correlation", RELATION),
    AnnotationStyle::relation("cause", RELATION),
    AnnotationStyle::relation("effect", RELATION),
    AnnotationStyle::relation("observation", RELATION),
    AnnotationStyle::relation("association", RELATION),
];

/// Look up the style of an entity type.
#[must_use]
pub fn annotation_style(label: &str) -> Option<&'static AnnotationStyle> {
    ANNOTATION_STYLES.iter().find(|s| s.label == label)
}

/// Icon glyph code points.
pub mod icons {
    /// Chain link.
    pub const LINK: &str = "\u{f0c1}";
    /// Sticky note.
    pub const NOTE: &str = "\u{f249}";
    /// Folded map.
    pub const MAP: &str = "\u{f542}";
    /// Table.
    pub const ENRICHMENT_TABLE: &str = "\u{f0ce}";
    /// PDF file.
    pub const PDF: &str = "\u{f1c1}";
    /// Generic document.
    pub const BIOC: &str = "\u{f15b}";
    /// Envelope.
    pub const MAIL: &str = "\u{f0e0}";
    /// Project.
    pub const PROJECT: &str = "\u{f5fd}";
    /// Sankey graph (custom kit).
    pub const GRAPH: &str = "\u{e000}";
    /// Spreadsheet (custom kit).
    pub const EXCEL: &str = "\u{e001}";
    /// Word document (custom kit).
    pub const WORD: &str = "\u{e002}";
    /// Slides (custom kit).
    pub const POWERPOINT: &str = "\u{e003}";
    /// Cytoscape session (custom kit).
    pub const CYTOSCAPE: &str = "\u{e004}";

    /// Glyphs that only exist in the custom icon kit.
    pub const CUSTOM: [&str; 5] = [GRAPH, EXCEL, WORD, POWERPOINT, CYTOSCAPE];
}

/// Icon font for stock glyphs.
pub const ICON_FONT: &str = "\"Font Awesome 5 Pro\"";
/// Icon font for custom kit glyphs.
pub const CUSTOM_ICON_FONT: &str = "\"Font Awesome Kit\"";

/// Icon font family that contains `code`.
#[must_use]
pub fn icon_font_family(code: &str) -> &'static str {
    if icons::CUSTOM.contains(&code) {
        CUSTOM_ICON_FONT
    } else {
        ICON_FONT
    }
}

/// A file type with its own icon and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIcon {
    /// Glyph code point.
    pub code: &'static str,
    /// Brand color, used in place of the node color.
    pub color: &'static str,
}

/// Icon for a linked file, chosen by the extension of its name.
#[must_use]
pub fn file_icon(name: &str) -> Option<FileIcon> {
    let name = name.trim();
    let has_ext = |exts: &[&str]| exts.iter().any(|ext| name.ends_with(ext));
    if has_ext(&[".docx", ".doc"]) {
        Some(FileIcon {
            code: icons::WORD,
            color: "#0d47a1",
        })
    } else if has_ext(&[".xlsx", ".xls"]) {
        Some(FileIcon {
            code: icons::EXCEL,
            color: "#2e7d32",
        })
    } else if has_ext(&[".pptx", ".ppt"]) {
        Some(FileIcon {
            code: icons::POWERPOINT,
            color: "#e64a19",
        })
    } else if has_ext(&[".cys"]) {
        Some(FileIcon {
            code: icons::CYTOSCAPE,
            color: "#ea9123",
        })
    } else {
        None
    }
}

/// Background of detail boxes by node label.
#[must_use]
pub fn detail_background(label: &str) -> Option<&'static str> {
    match label {
        "note" => Some("#FFF6D5"),
        "link" => Some("#DCF1F1"),
        _ => None,
    }
}

/// Stroke pattern of a named line type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinePattern {
    /// Draw nothing.
    None,
    /// Continuous stroke.
    Solid,
    /// Alternating dash and gap lengths.
    Dashed(&'static [f64]),
}

/// Named line types, in menu order.
pub const LINE_TYPES: &[(&str, LinePattern)] = &[
    ("none", LinePattern::None),
    ("blank", LinePattern::None),
    ("solid", LinePattern::Solid),
    ("dashed", LinePattern::Dashed(&[10.0, 10.0])),
    ("long-dashed", LinePattern::Dashed(&[25.0, 10.0])),
    ("dotted", LinePattern::Dashed(&[1.0, 2.0])),
    ("two-dashed", LinePattern::Dashed(&[4.0, 8.0, 20.0, 8.0])),
];

/// Pattern for a line type name; unknown names are solid.
#[must_use]
pub fn line_pattern(name: &str) -> LinePattern {
    LINE_TYPES
        .iter()
        .find(|(n, _)| *n == name)
        .map_or(LinePattern::Solid, |(_, pattern)| *pattern)
}

/// Named line heads and their descriptors.
///
/// A descriptor lists head tokens from the line body towards the endpoint.
pub const LINE_HEAD_TYPES: &[(&str, &str)] = &[
    ("none", "none"),
    ("arrow", "arrow"),
    ("circle", "circle"),
    ("diamond", "diamond"),
    ("square", "square"),
    ("cross-axis", "cross-axis"),
    ("circle-arrow", "circle,arrow"),
    ("square-arrow", "square,arrow"),
    ("cross-axis-arrow", "cross-axis,arrow"),
    ("double-cross-axis", "cross-axis,cross-axis"),
];

/// Descriptor of a named line head.
#[must_use]
pub fn line_head_descriptor(name: &str) -> Option<&'static str> {
    LINE_HEAD_TYPES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, descriptor)| *descriptor)
}

/// Fill behind selected entities.
pub const SELECTION_FILL: &str = "rgba(0, 0, 0, 0.075)";
/// Outline around highlighted nodes.
pub const HIGHLIGHT_STROKE: &str = "rgba(255, 0, 0, 255)";

/// Band drawn under highlighted edges.
#[must_use]
pub fn edge_highlight_color(strong: bool) -> &'static str {
    if strong {
        "rgba(255, 0, 0, 0.4)"
    } else {
        "rgba(255, 0, 0, 0.2)"
    }
}
