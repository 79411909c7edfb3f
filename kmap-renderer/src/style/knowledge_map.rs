use kmap_core::{is_detail_label, Edge, EntityData, Node, NodeStyle};
use url::Url;

use super::palette::{
    annotation_style, detail_background, file_icon, icon_font_family, icons,
    line_head_descriptor, line_pattern, LinePattern, DEFAULT_BACKGROUND_COLOR,
    DEFAULT_STROKE_COLOR, DEFAULT_TEXT_COLOR, EDGE_LABEL_COLOR, EDGE_LABEL_HALO,
};
use super::{EdgeEnds, IconGlyph, NodeShape, PlacementOptions, RenderStyle, StyleConfig};
use crate::backend::{Font, TextMeasurer};
use crate::line::Line;
use crate::line_head::{
    Arrowhead, CircleHead, CompoundLineHead, CrossAxisLineHead, DiamondHead, EmptyLineHead,
    HeadPaint, LineHead, RectangleHead,
};
use crate::placed::{FontIconNode, ImageNode, LineEdge, PlacedNode, RectangleNode};
use crate::text::{Insets, TextAlignment, TextElement};

const DETAIL_INSET: f64 = 5.0;
const DETAIL_TEXT_COLOR: &str = "#000";
const EMPHASIZED_BORDER_SCALE: f64 = 1.3;
const DEFAULT_IMAGE_SIZE: f64 = 100.0;
const IMAGE_BORDER_COLOR: &str = "white";
const EDGE_LABEL_HALO_WIDTH: f64 = 3.0;
const SPACER_FACTOR: f64 = 0.3;
const DEFAULT_TARGET_HEAD: &str = "arrow";

/// Colors of a node after the entity type and the node's own style apply.
struct NodeColors<'a> {
    text: &'a str,
    background: &'a str,
    stroke: &'a str,
}

/// The knowledge-map look: entity-type colors, icons for notes, links and
/// maps, detail boxes for notes, dashed annotation edges.
#[derive(Debug, Clone)]
pub struct KnowledgeMapStyle {
    config: StyleConfig,
    base_url: Option<Url>,
}

impl Default for KnowledgeMapStyle {
    fn default() -> Self {
        Self::new(StyleConfig::default())
    }
}

impl KnowledgeMapStyle {
    /// Create a style. An unparsable base URL only affects relative links.
    #[must_use]
    pub fn new(config: StyleConfig) -> Self {
        let base_url = match Url::parse(&config.base_url) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Invalid base URL {:?}: {}", config.base_url, e);
                None
            }
        };
        Self { config, base_url }
    }

    /// The style settings.
    #[must_use]
    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// Decide which shape `node` is drawn as.
    #[must_use]
    pub fn classify<'a>(&self, node: &'a Node) -> NodeShape<'a> {
        let show_detail = node
            .style
            .as_ref()
            .and_then(|s| s.show_detail)
            .unwrap_or(self.config.show_detail_by_default);

        if is_detail_label(&node.label) && show_detail {
            return NodeShape::Detail;
        }
        if let Some(code) = annotation_style(&node.label).and_then(|a| a.icon_code) {
            let glyph = if node.label == "link" {
                self.link_icon(&node.data.entity, code)
            } else {
                IconGlyph::plain(code)
            };
            return NodeShape::Icon(glyph);
        }
        match node.image_id.as_deref() {
            Some(image_id) => NodeShape::Image { image_id },
            None => NodeShape::Plain,
        }
    }

    /// Pick a context icon for a link node from where its links point.
    ///
    /// Links inside a project pick the icon of the document type they open.
    /// Links to uploaded files of a known type keep looking, so a later
    /// project link still wins.
    #[must_use]
    pub fn link_icon(&self, entity: &EntityData, default_code: &'static str) -> IconGlyph {
        let mut glyph = IconGlyph::plain(default_code);

        for (link, domain) in entity.links() {
            let Some(url) = self.resolve_url(link) else {
                tracing::trace!("Skipping unparsable link {:?}", link);
                continue;
            };
            let segments: Vec<&str> = url
                .path_segments()
                .map(Iterator::collect)
                .unwrap_or_default();

            let project_icon = match segments.as_slice() {
                ["projects", project, kind, _, ..] if !project.is_empty() => match *kind {
                    "bioc" => Some(icons::BIOC),
                    "enrichment-table" => Some(icons::ENRICHMENT_TABLE),
                    "maps" => Some(icons::MAP),
                    "sankey" => Some(icons::GRAPH),
                    "files" => Some(icons::PDF),
                    _ => None,
                },
                ["projects", project] | ["projects", project, ""] if !project.is_empty() => {
                    Some(icons::PROJECT)
                }
                _ => None,
            };

            if let Some(code) = project_icon {
                return IconGlyph::plain(code);
            }
            if url.scheme().eq_ignore_ascii_case("mailto") {
                return IconGlyph::plain(icons::MAIL);
            }
            if matches!(segments.as_slice(), ["files", _, ..]) {
                if let Some(file) = file_icon(domain) {
                    glyph = IconGlyph {
                        code: file.code,
                        special_color: Some(file.color),
                    };
                }
            }
        }

        glyph
    }

    /// A stroke for a named line type; `None` for no line.
    #[must_use]
    pub fn create_line(line_type: &str, width: f64, color: &str) -> Option<Line> {
        match line_pattern(line_type) {
            LinePattern::None => None,
            LinePattern::Solid => Some(Line::solid(width, color)),
            LinePattern::Dashed(pattern) => Some(Line::dashed(width, color, pattern)),
        }
    }

    /// A line head for a named head type, falling back to `default_type`.
    ///
    /// Unknown names and `none` give no head.
    #[must_use]
    pub fn create_head(
        &self,
        head_type: Option<&str>,
        line_width: f64,
        color: &str,
        default_type: Option<&str>,
    ) -> Option<Box<dyn LineHead>> {
        let name = head_type.filter(|t| !t.is_empty()).or(default_type)?;
        let Some(descriptor) = line_head_descriptor(name) else {
            tracing::debug!("Unknown line head type {:?}", name);
            return None;
        };
        if descriptor == "none" {
            return None;
        }

        let children: Vec<Box<dyn LineHead>> = descriptor
            .split(',')
            .flat_map(|token| self.head_parts(token.trim(), line_width, color))
            .collect();
        Some(Box::new(CompoundLineHead::new(children)))
    }

    fn head_parts(&self, token: &str, line_width: f64, color: &str) -> Vec<Box<dyn LineHead>> {
        let base = self.config.line_end_base_size;
        let size = base + line_width;
        let spacer = || Box::new(EmptyLineHead::new(base * SPACER_FACTOR)) as Box<dyn LineHead>;

        match token {
            "spacer" => vec![spacer()],
            "cross-axis" => vec![
                Box::new(CrossAxisLineHead::new(base, HeadPaint::filled_and_stroked(color))),
                spacer(),
            ],
            "circle" => vec![Box::new(CircleHead::new(size, HeadPaint::filled(color)))],
            "diamond" => vec![Box::new(DiamondHead::new(size, size, HeadPaint::filled(color)))],
            "square" => vec![Box::new(RectangleHead::new(size, size, HeadPaint::filled(color)))],
            _ => vec![Box::new(
                Arrowhead::new(size, HeadPaint::filled(color).with_line_width(line_width))
                    .with_length(base),
            )],
        }
    }

    fn resolve_url(&self, link: &str) -> Option<Url> {
        match &self.base_url {
            Some(base) => base.join(link).ok(),
            None => Url::parse(link).ok(),
        }
    }

    fn label_font(&self, font_size_scale: Option<f64>) -> Font {
        Font::new(
            self.config.base_font_size * font_size_scale.unwrap_or(1.0),
            &self.config.font_family,
        )
    }

    fn node_colors<'a>(node: &'a Node, style: Option<&'a NodeStyle>) -> NodeColors<'a> {
        let mut colors = NodeColors {
            text: DEFAULT_TEXT_COLOR,
            background: DEFAULT_BACKGROUND_COLOR,
            stroke: DEFAULT_STROKE_COLOR,
        };

        if let Some(fill) = style.and_then(|s| s.fill_color.as_deref()) {
            colors.text = fill;
        } else if let Some(annotation) = annotation_style(&node.label) {
            colors.text = annotation.color;
            if let Some(background) = annotation.background {
                colors.background = background;
            }
            if let Some(text) = annotation.text {
                colors.text = text;
            }
            if let Some(border) = annotation.border {
                colors.stroke = border;
            }
        }
        if let Some(stroke) = style.and_then(|s| s.stroke_color.as_deref()) {
            colors.stroke = stroke;
        }
        colors
    }

    fn place_detail_node(
        &self,
        node: &Node,
        style: Option<&NodeStyle>,
        measurer: &dyn TextMeasurer,
        options: PlacementOptions,
    ) -> RectangleNode {
        let data = &node.data;
        let background = detail_background(&node.label).unwrap_or(DEFAULT_BACKGROUND_COLOR);
        let font = self.label_font(style.and_then(|s| s.font_size_scale));

        let text_box = TextElement::builder(data.entity.detail.clone().unwrap_or_default(), font)
            .width(data.width)
            .height(data.height)
            .max_width(data.width.is_none().then_some(self.config.max_width_if_unsized))
            .max_height(data.height.is_none().then_some(self.config.max_height_if_unsized))
            .fill_style(
                style
                    .and_then(|s| s.fill_color.as_deref())
                    .unwrap_or(DETAIL_TEXT_COLOR),
            )
            .horizontal_align(TextAlignment::Start)
            .vertical_align(TextAlignment::Start)
            .insets(Insets::uniform(DETAIL_INSET))
            .layout(measurer);

        let width = data
            .width
            .unwrap_or_else(|| text_box.actual_width_with_insets());
        let height = data
            .height
            .unwrap_or_else(|| text_box.actual_height_with_insets());
        let emphasis = if options.force_high_detail() {
            EMPHASIZED_BORDER_SCALE
        } else {
            1.0
        };
        let stroke = Self::create_line(
            style.and_then(|s| s.line_type.as_deref()).unwrap_or("solid"),
            style.and_then(|s| s.line_width_scale).unwrap_or(1.0) * emphasis,
            style
                .and_then(|s| s.stroke_color.as_deref())
                .unwrap_or(background),
        );

        RectangleNode::new(data.x, data.y, text_box)
            .with_size(width, height)
            .with_stroke(stroke)
            .with_fill(background)
            .with_force_high_detail(options.force_high_detail())
    }

    fn place_icon_node(
        &self,
        node: &Node,
        glyph: IconGlyph,
        style: Option<&NodeStyle>,
        measurer: &dyn TextMeasurer,
        options: PlacementOptions,
    ) -> FontIconNode {
        let colors = Self::node_colors(node, style);
        let icon = node.icon.as_ref();
        let has_fill = style.is_some_and(|s| s.fill_color.is_some());

        let mut label_color = icon.and_then(|i| i.color.as_deref()).unwrap_or(colors.text);
        if let Some(special) = glyph.special_color {
            if !has_fill {
                label_color = special;
            }
        }
        let glyph_color = glyph.special_color.unwrap_or(label_color);

        let icon_size = icon
            .and_then(|i| i.size)
            .unwrap_or(self.config.default_icon_size);
        let icon_face = icon
            .and_then(|i| i.face.as_deref())
            .unwrap_or_else(|| icon_font_family(glyph.code));

        let icon_text_box = TextElement::builder(glyph.code, Font::new(icon_size, icon_face))
            .fill_style(glyph_color)
            .layout(measurer);
        let label_text_box = TextElement::builder(
            node.display_name.as_str(),
            self.label_font(style.and_then(|s| s.font_size_scale)),
        )
        .max_width(self.config.max_icon_node_width_if_unsized)
        .fill_style(label_color)
        .horizontal_align(TextAlignment::Center)
        .layout(measurer);

        FontIconNode::new(node.data.x, node.data.y, icon_text_box, label_text_box)
            .with_force_high_detail(options.force_high_detail())
    }

    fn place_image_node(
        &self,
        node: &Node,
        image_id: &str,
        style: Option<&NodeStyle>,
        measurer: &dyn TextMeasurer,
    ) -> ImageNode {
        let colors = Self::node_colors(node, style);
        let data = &node.data;
        let width = data.width.unwrap_or(DEFAULT_IMAGE_SIZE);
        let height = data.height.unwrap_or(DEFAULT_IMAGE_SIZE);

        let caption = TextElement::builder(
            node.display_name.as_str(),
            self.label_font(style.and_then(|s| s.font_size_scale)),
        )
        .max_width(width)
        .fill_style(colors.text)
        .horizontal_align(TextAlignment::Center)
        .layout(measurer);

        let stroke = Self::create_line(
            style.and_then(|s| s.line_type.as_deref()).unwrap_or("blank"),
            style.and_then(|s| s.line_width_scale).unwrap_or(1.0),
            style
                .and_then(|s| s.stroke_color.as_deref())
                .unwrap_or(IMAGE_BORDER_COLOR),
        );

        ImageNode::new(data.x, data.y, width, height, image_id, caption).with_stroke(stroke)
    }

    fn place_plain_node(
        &self,
        node: &Node,
        style: Option<&NodeStyle>,
        measurer: &dyn TextMeasurer,
        options: PlacementOptions,
    ) -> RectangleNode {
        let colors = Self::node_colors(node, style);
        let data = &node.data;

        let text_box = TextElement::builder(
            node.display_name.as_str(),
            self.label_font(style.and_then(|s| s.font_size_scale)),
        )
        .width(data.width)
        .height(data.height)
        .max_width(data.width.is_none().then_some(self.config.max_width_if_unsized))
        .max_height(data.height.is_none().then_some(self.config.max_height_if_unsized))
        .fill_style(colors.text)
        .layout(measurer);

        let width = data.width.unwrap_or_else(|| text_box.actual_width());
        let height = data.height.unwrap_or_else(|| text_box.actual_height());
        let stroke = Self::create_line(
            style.and_then(|s| s.line_type.as_deref()).unwrap_or("solid"),
            style.and_then(|s| s.line_width_scale).unwrap_or(1.0),
            colors.stroke,
        );

        RectangleNode::new(data.x, data.y, text_box)
            .with_size(width, height)
            .with_stroke(stroke)
            .with_fill(colors.background)
            .with_force_high_detail(options.force_high_detail())
    }
}

impl RenderStyle for KnowledgeMapStyle {
    fn place_node(
        &self,
        node: &Node,
        measurer: &dyn TextMeasurer,
        options: PlacementOptions,
    ) -> PlacedNode {
        let style = node.style.as_ref();
        match self.classify(node) {
            NodeShape::Detail => self.place_detail_node(node, style, measurer, options).into(),
            NodeShape::Icon(glyph) => self
                .place_icon_node(node, glyph, style, measurer, options)
                .into(),
            NodeShape::Image { image_id } => self
                .place_image_node(node, image_id, style, measurer)
                .into(),
            NodeShape::Plain => self.place_plain_node(node, style, measurer, options).into(),
        }
    }

    fn place_edge(
        &self,
        edge: &Edge,
        ends: EdgeEnds<'_>,
        measurer: &dyn TextMeasurer,
        options: PlacementOptions,
    ) -> LineEdge {
        let connected_to_notes = is_detail_label(&ends.from.label) || is_detail_label(&ends.to.label);
        let style = edge.style.as_ref();
        let stroke_color = style
            .and_then(|s| s.stroke_color.as_deref())
            .unwrap_or(DEFAULT_STROKE_COLOR);
        let line_type = style
            .and_then(|s| s.line_type.as_deref())
            .unwrap_or(if connected_to_notes { "dashed" } else { "solid" });
        let line_width = style.and_then(|s| s.line_width_scale).unwrap_or(1.0);

        let target = ends
            .placed_to
            .line_intersection_point(ends.from.data.x, ends.from.data.y);
        let source = ends
            .placed_from
            .line_intersection_point(ends.to.data.x, ends.to.data.y);

        let source_head = self.create_head(
            style.and_then(|s| s.source_head_type.as_deref()),
            line_width,
            stroke_color,
            None,
        );
        let target_head = self.create_head(
            style.and_then(|s| s.target_head_type.as_deref()),
            line_width,
            stroke_color,
            (!connected_to_notes).then_some(DEFAULT_TARGET_HEAD),
        );

        let label = (!edge.label.is_empty()).then(|| {
            let font = Font::new(
                self.config.base_font_size * style.and_then(|s| s.font_size_scale).unwrap_or(1.0),
                &self.config.font_family,
            )
            .bold(options.highlighted);
            TextElement::builder(edge.label.as_str(), font)
                .fill_style(EDGE_LABEL_COLOR)
                .stroke(EDGE_LABEL_HALO, EDGE_LABEL_HALO_WIDTH)
                .layout(measurer)
        });

        LineEdge::new(source, target)
            .with_label(label)
            .with_heads(source_head, target_head)
            .with_stroke(Self::create_line(line_type, line_width, stroke_color))
            .with_force_high_detail(options.force_high_detail())
    }
}

#[cfg(test)]
mod tests {
    use kmap_core::{EdgeStyle, NodeIcon};

    use super::*;
    use crate::backend::{DrawCommand, MonospaceMeasurer, RecordingContext};
    use crate::placed::{DrawParams, PlacedObject};

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn style() -> KnowledgeMapStyle {
        KnowledgeMapStyle::default()
    }

    fn place(node: &Node) -> PlacedNode {
        style().place_node(node, &MonospaceMeasurer::default(), PlacementOptions::default())
    }

    fn link(url: &str, domain: &str) -> Node {
        Node::new("l", "link", "Link", 0.0, 0.0).with_hyperlink(url, domain)
    }

    fn glyph(node: &Node) -> IconGlyph {
        match style().classify(node) {
            NodeShape::Icon(glyph) => glyph,
            other => panic!("expected an icon, got {other:?}"),
        }
    }

    #[test]
    fn test_shape_priority() {
        let s = style();
        let note = Node::new("n", "note", "Note", 0.0, 0.0);
        assert!(matches!(s.classify(&note), NodeShape::Icon(_)));

        let detailed = note.clone().with_style(NodeStyle {
            show_detail: Some(true),
            ..NodeStyle::default()
        });
        assert_eq!(s.classify(&detailed), NodeShape::Detail);

        let picture = Node::new("i", "image", "Figure", 0.0, 0.0).with_image("img1");
        assert_eq!(s.classify(&picture), NodeShape::Image { image_id: "img1" });

        let gene = Node::new("g", "gene", "BRCA1", 0.0, 0.0);
        assert_eq!(s.classify(&gene), NodeShape::Plain);

        let eager = KnowledgeMapStyle::new(StyleConfig {
            show_detail_by_default: true,
            ..StyleConfig::default()
        });
        assert_eq!(eager.classify(&note), NodeShape::Detail);
    }

    #[test]
    fn test_link_icon_sniffing() {
        assert_eq!(glyph(&link("/projects/p1/bioc/abc", "")).code, icons::BIOC);
        assert_eq!(
            glyph(&link("https://example.org/projects/p1/enrichment-table/x", "")).code,
            icons::ENRICHMENT_TABLE
        );
        assert_eq!(glyph(&link("/projects/p1/maps/m", "")).code, icons::MAP);
        assert_eq!(glyph(&link("/projects/p1/sankey/s", "")).code, icons::GRAPH);
        assert_eq!(glyph(&link("/projects/p1/files/f", "")).code, icons::PDF);
        assert_eq!(glyph(&link("/projects/p1", "")).code, icons::PROJECT);
        assert_eq!(glyph(&link("/projects/p1/", "")).code, icons::PROJECT);
        assert_eq!(glyph(&link("mailto:someone@example.org", "")).code, icons::MAIL);
        assert_eq!(glyph(&link("https://example.org/other", "")).code, icons::LINK);
    }

    #[test]
    fn test_file_link_takes_brand_color() {
        let node = link("/files/abc", "Results.xlsx");
        let g = glyph(&node);
        assert_eq!(g.code, icons::EXCEL);
        assert_eq!(g.special_color, Some("#2e7d32"));

        let PlacedNode::Icon(icon) = place(&node) else {
            panic!("expected an icon node");
        };
        assert_eq!(icon.icon_text_box().fill_style(), Some("#2e7d32"));
        assert_eq!(icon.icon_text_box().font().family, "\"Font Awesome Kit\"");
        assert_eq!(icon.label_text_box().fill_style(), Some("#2e7d32"));
    }

    #[test]
    fn test_project_link_after_file_link_wins() {
        let node = link("/files/abc", "Results.xlsx").with_hyperlink("/projects/p1/maps/m", "");
        assert_eq!(glyph(&node), IconGlyph::plain(icons::MAP));
    }

    #[test]
    fn test_plain_node_colors() {
        let gene = Node::new("g", "gene", "BRCA1", 0.0, 0.0);
        let PlacedNode::Rectangle(rect) = place(&gene) else {
            panic!("expected a rectangle");
        };
        assert_eq!(rect.text_box().fill_style(), Some("#673ab7"));
        assert_eq!(rect.fill_color(), Some("#fff"));
        assert_eq!(rect.stroke().map(Line::color), Some("#2B7CE9"));

        let cause = Node::new("c", "cause", "Cause", 0.0, 0.0);
        let PlacedNode::Rectangle(rect) = place(&cause) else {
            panic!("expected a rectangle");
        };
        assert_eq!(rect.text_box().fill_style(), Some("#000"));
        assert_eq!(rect.fill_color(), Some("#d7d9f8"));
        assert_eq!(rect.stroke().map(Line::color), Some("#d7d9f8"));

        let custom = gene.with_style(NodeStyle {
            fill_color: Some("#123456".to_string()),
            stroke_color: Some("#abcdef".to_string()),
            line_type: Some("dotted".to_string()),
            ..NodeStyle::default()
        });
        let PlacedNode::Rectangle(rect) = place(&custom) else {
            panic!("expected a rectangle");
        };
        assert_eq!(rect.text_box().fill_style(), Some("#123456"));
        let stroke = rect.stroke().unwrap();
        assert_eq!(stroke.color(), "#abcdef");
        assert_eq!(stroke.dash(), &[1.0, 2.0]);
    }

    #[test]
    fn test_detail_node_box() {
        let note = Node::new("n", "note", "Note", 0.0, 0.0)
            .with_detail("Some notes")
            .with_style(NodeStyle {
                show_detail: Some(true),
                ..NodeStyle::default()
            });
        let s = style();
        let measurer = MonospaceMeasurer::default();
        let PlacedNode::Rectangle(rect) =
            s.place_node(&note, &measurer, PlacementOptions::default())
        else {
            panic!("expected a rectangle");
        };
        assert_eq!(rect.text_box().text(), "Some notes");
        assert_eq!(rect.fill_color(), Some("#FFF6D5"));
        assert_eq!(rect.stroke().map(Line::color), Some("#FFF6D5"));
        let expected = rect.text_box().actual_width_with_insets() + 10.0;
        assert!(approx_eq(rect.node_width(), expected));

        let selected = PlacementOptions {
            selected: true,
            highlighted: false,
        };
        let PlacedNode::Rectangle(rect) = s.place_node(&note, &measurer, selected) else {
            panic!("expected a rectangle");
        };
        assert!(approx_eq(rect.stroke().unwrap().width(), 1.3));
    }

    #[test]
    fn test_icon_node_defaults() {
        let note = Node::new("n", "note", "Note", 0.0, 0.0);
        let PlacedNode::Icon(icon) = place(&note) else {
            panic!("expected an icon node");
        };
        assert_eq!(icon.icon_text_box().text(), icons::NOTE);
        assert!(approx_eq(icon.icon_text_box().font().size, 50.0));
        assert_eq!(icon.icon_text_box().font().family, "\"Font Awesome 5 Pro\"");
        assert_eq!(icon.label_text_box().fill_style(), Some("#edc949"));

        let mut sized = note.clone();
        sized.icon = Some(NodeIcon {
            size: Some(30.0),
            color: Some("#111".to_string()),
            ..NodeIcon::default()
        });
        let PlacedNode::Icon(icon) = place(&sized) else {
            panic!("expected an icon node");
        };
        assert!(approx_eq(icon.icon_text_box().font().size, 30.0));
        assert_eq!(icon.icon_text_box().fill_style(), Some("#111"));
    }

    #[test]
    fn test_image_node_defaults() {
        let picture = Node::new("i", "image", "Figure", 0.0, 0.0).with_image("img1");
        let PlacedNode::Image(image) = place(&picture) else {
            panic!("expected an image node");
        };
        assert_eq!(image.image_id(), "img1");
        assert!(approx_eq(image.bounding_box().width(), 100.0));
        assert!(!image.is_bound());
    }

    #[test]
    fn test_edge_endpoints_on_borders() {
        let s = style();
        let measurer = MonospaceMeasurer::default();
        let a = Node::new("a", "gene", "A", 0.0, 0.0).with_size(100.0, 40.0);
        let b = Node::new("b", "gene", "B", 300.0, 0.0).with_size(100.0, 40.0);
        let placed_a = s.place_node(&a, &measurer, PlacementOptions::default());
        let placed_b = s.place_node(&b, &measurer, PlacementOptions::default());
        let edge = Edge::new("a", "b", "");

        let line = s.place_edge(
            &edge,
            EdgeEnds {
                from: &a,
                to: &b,
                placed_from: &placed_a,
                placed_to: &placed_b,
            },
            &measurer,
            PlacementOptions::default(),
        );
        assert!(approx_eq(line.source().x, 55.0));
        assert!(approx_eq(line.source().y, 0.0));
        assert!(approx_eq(line.target().x, 245.0));
        assert!(approx_eq(line.target().y, 0.0));
        assert!(line.has_target_head());
        assert!(!line.has_source_head());
        assert!(line.text_box().is_none());
        assert!(!line.stroke().unwrap().is_dashed());
    }

    #[test]
    fn test_edges_to_notes_are_dashed_without_arrow() {
        let s = style();
        let measurer = MonospaceMeasurer::default();
        let a = Node::new("a", "gene", "A", 0.0, 0.0);
        let n = Node::new("n", "note", "Note", 200.0, 0.0);
        let placed_a = s.place_node(&a, &measurer, PlacementOptions::default());
        let placed_n = s.place_node(&n, &measurer, PlacementOptions::default());
        let ends = EdgeEnds {
            from: &a,
            to: &n,
            placed_from: &placed_a,
            placed_to: &placed_n,
        };

        let line = s.place_edge(&Edge::new("a", "n", "see"), ends, &measurer, PlacementOptions::default());
        assert!(!line.has_target_head());
        assert_eq!(line.stroke().unwrap().dash(), &[10.0, 10.0]);
        assert_eq!(line.text_box().unwrap().text(), "see");

        let styled = Edge::new("a", "n", "").with_style(EdgeStyle {
            target_head_type: Some("circle-arrow".to_string()),
            source_head_type: Some("diamond".to_string()),
            ..EdgeStyle::default()
        });
        let line = s.place_edge(&styled, ends, &measurer, PlacementOptions::default());
        assert!(line.has_target_head());
        assert!(line.has_source_head());
    }

    #[test]
    fn test_highlighted_edge_label_is_bold() {
        let s = style();
        let measurer = MonospaceMeasurer::default();
        let a = Node::new("a", "gene", "A", 0.0, 0.0);
        let b = Node::new("b", "gene", "B", 200.0, 0.0);
        let placed_a = s.place_node(&a, &measurer, PlacementOptions::default());
        let placed_b = s.place_node(&b, &measurer, PlacementOptions::default());
        let line = s.place_edge(
            &Edge::new("a", "b", "binds"),
            EdgeEnds {
                from: &a,
                to: &b,
                placed_from: &placed_a,
                placed_to: &placed_b,
            },
            &measurer,
            PlacementOptions {
                selected: false,
                highlighted: true,
            },
        );
        assert!(line.text_box().unwrap().font().bold);
    }

    #[test]
    fn test_create_head() {
        let s = style();
        assert!(s.create_head(None, 1.0, "#000", None).is_none());
        assert!(s.create_head(Some(""), 1.0, "#000", None).is_none());
        assert!(s.create_head(Some("none"), 1.0, "#000", Some("arrow")).is_none());
        assert!(s.create_head(Some("bogus"), 1.0, "#000", None).is_none());
        assert!(s.create_head(None, 1.0, "#000", Some("arrow")).is_some());
    }

    #[test]
    fn test_arrow_head_size_follows_line_width() {
        let head = style()
            .create_head(Some("arrow"), 1.0, "#000", None)
            .unwrap();
        let start = crate::geometry::Point::new(0.0, 0.0);
        let end = crate::geometry::Point::new(100.0, 0.0);
        let stop = head.stop_point(start, end);
        assert!(approx_eq(stop.x, 84.0));

        let mut ctx = RecordingContext::new();
        head.draw(&mut ctx, start, end);
        assert!(ctx.commands().contains(&DrawCommand::FillStyle {
            color: "#000".to_string()
        }));
    }

    #[test]
    fn test_cross_axis_head_keeps_a_gap() {
        let head = style()
            .create_head(Some("cross-axis"), 1.0, "#000", None)
            .unwrap();
        let stop = head.stop_point(
            crate::geometry::Point::new(0.0, 0.0),
            crate::geometry::Point::new(100.0, 0.0),
        );
        assert!(approx_eq(stop.x, 100.0 - 16.0 * 0.3));
    }

    #[test]
    fn test_blank_line_type_draws_nothing() {
        assert!(KnowledgeMapStyle::create_line("blank", 1.0, "#000").is_none());
        assert!(KnowledgeMapStyle::create_line("none", 1.0, "#000").is_none());
        assert!(KnowledgeMapStyle::create_line("wavy", 1.0, "#000").is_some());
    }

    #[test]
    fn test_placed_shapes_draw() {
        let gene = Node::new("g", "gene", "BRCA1", 0.0, 0.0);
        let mut ctx = RecordingContext::new();
        place(&gene).draw(&mut ctx, &DrawParams::default());
        assert!(ctx.filled_texts().any(|t| t == "BRCA1"));
    }
}
