use crate::error::RenderError;
use crate::types::marker::MarkerStyle;
use crate::types::route::{LatLng, RoutePoint};

const MAX_MERCATOR_LAT: f64 = 85.051_128_78;
const BASE_ROUTE_OPACITY: f64 = 0.35;
const ENDPOINT_RADIUS: f32 = 5.0;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub padding: u32,
    pub stroke_width: f32,
    pub marker: MarkerStyle,
}

impl RenderOptions {
    pub fn new(width: u32, height: u32, marker: MarkerStyle) -> Self {
        Self {
            width,
            height,
            padding: 40,
            stroke_width: 4.0,
            marker,
        }
    }
}

/// Maps geographic coordinates into the padded viewport. Web-Mercator, with
/// a uniform scale so the route keeps its shape.
struct Viewport {
    min_x: f64,
    min_y: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    height: f64,
}

impl Viewport {
    fn fit(points: &[RoutePoint], options: &RenderOptions) -> Result<Self, RenderError> {
        let width = options.width as f64;
        let height = options.height as f64;
        let padding = options.padding as f64;
        let view_width = width - 2.0 * padding;
        let view_height = height - 2.0 * padding;
        if view_width <= 0.0 || view_height <= 0.0 {
            return Err(RenderError::SvgError("Invalid viewport size".to_string()));
        }

        let projected: Vec<(f64, f64)> = points
            .iter()
            .map(|p| mercator_project(p.latitude, p.longitude))
            .collect();
        if projected.is_empty() {
            return Err(RenderError::SvgError("Route has no points".to_string()));
        }

        let min_x = projected.iter().map(|(x, _)| *x).fold(f64::INFINITY, f64::min);
        let max_x = projected.iter().map(|(x, _)| *x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = projected.iter().map(|(_, y)| *y).fold(f64::INFINITY, f64::min);
        let max_y = projected.iter().map(|(_, y)| *y).fold(f64::NEG_INFINITY, f64::max);

        let range_x = max_x - min_x;
        let range_y = max_y - min_y;
        let scale = match (range_x > f64::EPSILON, range_y > f64::EPSILON) {
            (true, true) => (view_width / range_x).min(view_height / range_y),
            (true, false) => view_width / range_x,
            (false, true) => view_height / range_y,
            (false, false) => 0.0,
        };

        Ok(Self {
            min_x,
            min_y,
            scale,
            offset_x: padding + (view_width - range_x * scale) / 2.0,
            offset_y: padding + (view_height - range_y * scale) / 2.0,
            height,
        })
    }

    fn project(&self, position: LatLng) -> (f64, f64) {
        let (x, y) = mercator_project(position.latitude, position.longitude);
        let px = self.offset_x + (x - self.min_x) * self.scale;
        let py = self.height - (self.offset_y + (y - self.min_y) * self.scale);
        (px, py)
    }
}

/// Draws the route, the part already travelled up to `current_index`, and
/// the marker at its interpolated position.
pub fn render_snapshot_svg(
    points: &[RoutePoint],
    current_index: usize,
    marker: Option<LatLng>,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    let viewport = Viewport::fit(points, options)?;
    let coords: Vec<(f64, f64)> = points
        .iter()
        .map(|p| viewport.project(p.position()))
        .collect();

    let style = &options.marker;
    let travelled_end = current_index.min(coords.len() - 1);
    let mut travelled: Vec<(f64, f64)> = coords[..=travelled_end].to_vec();
    if let Some(marker) = marker {
        travelled.push(viewport.project(marker));
    }

    let base_path = format!(
        r##"<path d="{}" fill="none" stroke="#888888" stroke-opacity="{}" stroke-width="{:.1}" stroke-linecap="round" stroke-linejoin="round"/>"##,
        build_polyline_path(&coords),
        BASE_ROUTE_OPACITY,
        options.stroke_width
    );
    let trail_path = format!(
        r#"<path d="{}" fill="none" stroke="{}" stroke-width="{:.1}" stroke-linecap="round" stroke-linejoin="round"/>"#,
        build_polyline_path(&travelled),
        style.trail,
        options.stroke_width
    );
    let endpoints = build_endpoint_dots(&coords);
    let marker_node = marker
        .map(|position| {
            let (x, y) = viewport.project(position);
            format!(
                r#"<circle cx="{:.2}" cy="{:.2}" r="{:.1}" fill="{}" stroke="{}" stroke-width="2"/>"#,
                x, y, style.radius, style.fill, style.stroke
            )
        })
        .unwrap_or_default();

    Ok(format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
  {}
  {}
  {}
  {}
</svg>"#,
        options.width,
        options.height,
        options.width,
        options.height,
        base_path,
        trail_path,
        endpoints,
        marker_node
    ))
}

fn mercator_project(lat: f64, lon: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = lon;
    let y = (lat.to_radians().tan() + (1.0 / lat.to_radians().cos())).ln().to_degrees();
    (x, y)
}

fn build_polyline_path(coords: &[(f64, f64)]) -> String {
    let mut path = String::new();
    for (idx, (x, y)) in coords.iter().enumerate() {
        let command = if idx == 0 { 'M' } else { 'L' };
        path.push_str(&format!("{}{:.2},{:.2} ", command, x, y));
    }
    path.trim_end().to_string()
}

fn build_endpoint_dots(coords: &[(f64, f64)]) -> String {
    let (Some(start), Some(end)) = (coords.first(), coords.last()) else {
        return String::new();
    };
    format!(
        r##"<circle cx="{:.2}" cy="{:.2}" r="{:.1}" fill="#4CD964"/><circle cx="{:.2}" cy="{:.2}" r="{:.1}" fill="#FF3366"/>"##,
        start.0, start.1, ENDPOINT_RADIUS, end.0, end.1, ENDPOINT_RADIUS
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn points() -> Vec<RoutePoint> {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        vec![
            RoutePoint { latitude: 52.52, longitude: 13.405, timestamp: t },
            RoutePoint { latitude: 52.53, longitude: 13.415, timestamp: t },
            RoutePoint { latitude: 52.54, longitude: 13.405, timestamp: t },
        ]
    }

    #[test]
    fn renders_route_and_marker_with_configured_style() {
        let marker = MarkerStyle::get("bus").expect("preset");
        let options = RenderOptions::new(640, 480, marker);
        let svg = render_snapshot_svg(&points(), 1, Some(LatLng::new(52.525, 13.41)), &options)
            .expect("svg");

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("fill=\"#FF9933\""));
        assert!(svg.contains("stroke=\"#FF6600\""));
        assert_eq!(svg.matches("<circle").count(), 3);
    }

    #[test]
    fn projected_points_stay_inside_padding() {
        let options = RenderOptions::new(400, 400, MarkerStyle::default());
        let viewport = Viewport::fit(&points(), &options).expect("viewport");
        for point in points() {
            let (x, y) = viewport.project(point.position());
            assert!((40.0 - 1e-6..=360.0 + 1e-6).contains(&x), "x {x}");
            assert!((40.0 - 1e-6..=360.0 + 1e-6).contains(&y), "y {y}");
        }
    }

    #[test]
    fn north_is_up() {
        let options = RenderOptions::new(400, 400, MarkerStyle::default());
        let viewport = Viewport::fit(&points(), &options).expect("viewport");
        let (_, south_y) = viewport.project(LatLng::new(52.52, 13.405));
        let (_, north_y) = viewport.project(LatLng::new(52.54, 13.405));
        assert!(north_y < south_y);
    }

    #[test]
    fn single_point_route_renders_centered() {
        let route = &points()[..1];
        let options = RenderOptions::new(400, 400, MarkerStyle::default());
        let svg = render_snapshot_svg(route, 0, Some(route[0].position()), &options).expect("svg");
        assert!(svg.contains("cx=\"200.00\" cy=\"200.00\""));
    }

    #[test]
    fn padding_larger_than_viewport_is_rejected() {
        let mut options = RenderOptions::new(50, 50, MarkerStyle::default());
        options.padding = 40;
        assert!(render_snapshot_svg(&points(), 0, None, &options).is_err());
    }
}
