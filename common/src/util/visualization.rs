use crate::db::core::{Circuit, ComponentKind};
use crate::geom::segment::Segment;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect as ImageRect;
use std::path::Path;

/// Polyline of one routed wire, as handed to the renderer.
pub struct RouteSketch {
    pub segments: Vec<Segment>,
    pub is_fallback: bool,
}

pub fn draw_routed_circuit(
    circuit: &Circuit,
    routes: &[RouteSketch],
    filename: &Path,
    px_per_unit: u32,
) -> image::ImageResult<()> {
    let scale = px_per_unit.max(4);
    let w = circuit.width * scale;
    let h = circuit.height * scale;
    let mut img = RgbImage::from_pixel(w, h, Rgb([20, 20, 20]));

    // Cell centres sit on half units so a cell's lines land mid-square.
    let map = |x: f64, y: f64| {
        (
            ((x + 0.5) * scale as f64) as f32,
            ((y + 0.5) * scale as f64) as f32,
        )
    };

    let grid_color = Rgb([40, 40, 40]);
    for gx in 0..circuit.width {
        let (x, _) = map(gx as f64, 0.0);
        draw_line_segment_mut(&mut img, (x, 0.0), (x, h as f32), grid_color);
    }
    for gy in 0..circuit.height {
        let (_, y) = map(0.0, gy as f64);
        draw_line_segment_mut(&mut img, (0.0, y), (w as f32, y), grid_color);
    }

    let body_color = Rgb([180, 120, 40]);
    let wire_color = Rgb([200, 200, 200]);
    for placed in circuit.placed() {
        let (x1, y1) = map(placed.bbox.min.x, placed.bbox.min.y);
        let (x2, y2) = map(placed.bbox.max.x, placed.bbox.max.y);
        match placed.data.kind {
            ComponentKind::DynamicWire => {}
            ComponentKind::Wire | ComponentKind::Port => {
                draw_line_segment_mut(&mut img, (x1, y1), (x2, y2), wire_color);
            }
            _ => {
                let rect = ImageRect::at(x1 as i32, y1 as i32)
                    .of_size(((x2 - x1) as u32).max(2), ((y2 - y1) as u32).max(2));
                draw_filled_rect_mut(&mut img, rect, body_color);
            }
        }
    }

    let route_color = Rgb([0, 200, 120]);
    let fallback_color = Rgb([255, 40, 60]);
    for route in routes {
        let color = if route.is_fallback {
            fallback_color
        } else {
            route_color
        };
        for seg in &route.segments {
            let p1 = map(seg.p1.x, seg.p1.y);
            let p2 = map(seg.p2.x, seg.p2.y);
            draw_line_segment_mut(&mut img, p1, p2, color);
            // Second stroke for legibility at small scales.
            draw_line_segment_mut(&mut img, (p1.0 + 1.0, p1.1 + 1.0), (p2.0 + 1.0, p2.1 + 1.0), color);
        }
    }

    let node_color = Rgb([255, 255, 255]);
    for node in &circuit.nodes {
        let (x, y) = map(node.position.x, node.position.y);
        let rect = ImageRect::at(x as i32 - 2, y as i32 - 2).of_size(5, 5);
        draw_hollow_rect_mut(&mut img, rect, node_color);
    }

    if let Some(parent) = filename.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(image::ImageError::IoError)?;
        }
    }
    img.save(filename)
}
