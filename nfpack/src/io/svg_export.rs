use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle as SvgCircle, Path};

use crate::entities::{Bin, Item};
use crate::geometry::primitives::{Point, SPolygon};

/// Renders a packed bin and its items as an SVG document, for debugging purposes.
/// Items are drawn under their current transformation, with their reference vertices marked.
pub fn packed_bin_to_svg(bin: &Bin, items: &[Item]) -> Document {
    let bbox = bin.bbox();
    let margin = 0.05 * f64::max(bbox.width(), bbox.height());

    let mut document = Document::new().set(
        "viewBox",
        (
            bbox.x_min - margin,
            bbox.y_min - margin,
            bbox.width() + 2.0 * margin,
            bbox.height() + 2.0 * margin,
        ),
    );

    document = document.add(bin_outline(bin));

    for item in items {
        let transformed = item.transformed();
        let mut data = polygon_data(&transformed.shape.outer);
        for hole in &transformed.shape.holes {
            data = append_polygon_data(data, hole);
        }
        let path = Path::new()
            .set("fill", "rgba(122, 122, 122, 0.5)")
            .set("stroke", "black")
            .set("stroke-width", 0.002 * bbox.width())
            .set("fill-rule", "evenodd")
            .set("d", data);
        document = document.add(path);

        let Point(rx, ry) = transformed.reference_vertex;
        document = document.add(
            SvgCircle::new()
                .set("cx", rx)
                .set("cy", ry)
                .set("r", 0.005 * bbox.width())
                .set("fill", "red"),
        );
    }

    document
}

fn bin_outline(bin: &Bin) -> Path {
    let data = match bin {
        Bin::Rect(r) => {
            Data::new()
                .move_to((r.x_min, r.y_min))
                .line_to((r.x_max, r.y_min))
                .line_to((r.x_max, r.y_max))
                .line_to((r.x_min, r.y_max))
                .close()
        }
        Bin::Circle(c) => {
            //the circle as two arcs
            let Point(cx, cy) = c.center;
            let r = c.radius;
            Data::new()
                .move_to((cx - r, cy))
                .elliptical_arc_to((r, r, 0.0, 1.0, 0.0, cx + r, cy))
                .elliptical_arc_to((r, r, 0.0, 1.0, 0.0, cx - r, cy))
                .close()
        }
        Bin::Polygon(p) => polygon_data(p),
    };

    Path::new()
        .set("fill", "none")
        .set("stroke", "#0077ff")
        .set("stroke-width", 0.004 * bin.bbox().width())
        .set("d", data)
}

fn polygon_data(s_poly: &SPolygon) -> Data {
    append_polygon_data(Data::new(), s_poly)
}

fn append_polygon_data(mut data: Data, s_poly: &SPolygon) -> Data {
    data = data.move_to::<(f64, f64)>(s_poly.vertex(0).into());
    for i in 1..s_poly.n_vertices() {
        data = data.line_to::<(f64, f64)>(s_poly.vertex(i).into());
    }
    data.close()
}
