use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::pipeline::rasterize::{self, OutputConfig};
use crate::pipeline::render::{self, RenderOptions};
use crate::state::AppState;
use crate::types::marker::parse_hex_color;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/sessions/:id/snapshot.png", get(snapshot_png))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotQuery {
    #[serde(default = "default_width")]
    width: u32,
    #[serde(default = "default_height")]
    height: u32,
    background: Option<String>,
}

fn default_width() -> u32 {
    1024
}

fn default_height() -> u32 {
    768
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), AppError> {
    const MIN_DIM: u32 = 320;
    const MAX_DIM: u32 = 4096;

    if !(MIN_DIM..=MAX_DIM).contains(&width) || !(MIN_DIM..=MAX_DIM).contains(&height) {
        return Err(AppError::BadRequest(format!(
            "Invalid dimensions: {}x{}. Width/height must be between {} and {}",
            width, height, MIN_DIM, MAX_DIM
        )));
    }
    Ok(())
}

fn parse_background(background: Option<&str>) -> Result<Option<(u8, u8, u8, u8)>, AppError> {
    match background {
        Some("white") | None => Ok(Some((255, 255, 255, 255))),
        Some("black") => Ok(Some((0, 0, 0, 255))),
        Some("transparent") => Ok(None),
        Some(other) => parse_hex_color(other)
            .map(|(r, g, b)| Some((r, g, b, 255)))
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Invalid background: {}. Use 'transparent', 'white', 'black', or a #RRGGBB colour",
                    other
                ))
            }),
    }
}

async fn snapshot_png(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SnapshotQuery>,
) -> Result<impl IntoResponse, AppError> {
    validate_dimensions(query.width, query.height)?;
    let background = parse_background(query.background.as_deref())?;

    let session = state
        .get(&id)
        .ok_or_else(|| AppError::NotFound(id.clone()))?;
    let snapshot = session.snapshot().await?;

    let options = RenderOptions::new(query.width, query.height, state.config().marker.clone());
    let svg = render::render_snapshot_svg(
        session.route(),
        snapshot.current_index,
        snapshot.marker,
        &options,
    )?;
    let png = rasterize::rasterize(
        &svg,
        &OutputConfig {
            width: query.width,
            height: query.height,
            background,
        },
    )?;

    tracing::debug!(
        "Rendered snapshot for session {} at index {}: {} bytes",
        id,
        snapshot.current_index,
        png.len()
    );

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], png))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_accepts_names_and_hex() {
        assert_eq!(parse_background(None).ok(), Some(Some((255, 255, 255, 255))));
        assert_eq!(parse_background(Some("transparent")).ok(), Some(None));
        assert_eq!(
            parse_background(Some("#102030")).ok(),
            Some(Some((16, 32, 48, 255)))
        );
        assert!(parse_background(Some("mauve")).is_err());
        assert!(parse_background(Some("a\u{e9}123")).is_err());
    }

    #[test]
    fn dimensions_are_bounded() {
        assert!(validate_dimensions(320, 4096).is_ok());
        assert!(validate_dimensions(319, 800).is_err());
        assert!(validate_dimensions(800, 5000).is_err());
    }
}
