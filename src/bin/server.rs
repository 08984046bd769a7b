use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use base64::Engine;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use patchgen::automaton::Observer;
use patchgen::config::Params;
use patchgen::patches::PatchStats;
use patchgen::render;

#[derive(Deserialize)]
struct SimulateRequest {
    seed: Option<u64>,
    /// Missing fields fall back to `Params::default()`.
    #[serde(default)]
    params: Params,
}

#[derive(Serialize)]
struct SimulateResponse {
    layers: Vec<Layer>,
    timings: Vec<TimingEntry>,
    stats: PatchStats,
    fractal_dimension: Option<f64>,
    cover_trace: Vec<f32>,
    cover: f32,
    nx: usize,
}

#[derive(Serialize)]
struct Layer {
    name: String,
    data_url: String,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn encode_png(rgba: &[u8], w: usize, h: usize) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new(&mut buf);
    encoder.write_image(rgba, w as u32, h as u32, image::ExtendedColorType::Rgba8)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&buf);
    Ok(format!("data:image/png;base64,{}", b64))
}

fn simulate(seed: u64, params: Params) -> Result<SimulateResponse, String> {
    let (landscape, timings) =
        patchgen::generate(seed, &params, &mut Observer::NoOp).map_err(|e| e.to_string())?;
    let nx = landscape.nx;
    let (kernel_rgba, side) = render::render_kernel(&landscape.kernel, 8);

    let layers = vec![
        Layer {
            name: "landscape".into(),
            data_url: encode_png(&landscape.rgba, nx, nx).map_err(|e| e.to_string())?,
        },
        Layer {
            name: "patches".into(),
            data_url: encode_png(&render::render_patches(&landscape.labels.labels), nx, nx)
                .map_err(|e| e.to_string())?,
        },
        Layer {
            name: "kernel".into(),
            data_url: encode_png(&kernel_rgba, side, side).map_err(|e| e.to_string())?,
        },
    ];

    let timing_entries = timings
        .iter()
        .map(|t| TimingEntry {
            name: t.name.to_string(),
            ms: t.ms,
        })
        .collect();

    Ok(SimulateResponse {
        layers,
        timings: timing_entries,
        fractal_dimension: landscape.stats.fractal_dimension(),
        cover: landscape.grid.cover(),
        cover_trace: landscape.cover_trace,
        stats: landscape.stats,
        nx,
    })
}

async fn simulate_handler(
    Json(req): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let seed = req.seed.unwrap_or(42);
    let params = req.params;
    log::info!("simulate: seed={} nx={} iterations={}", seed, params.nx, params.iterations);

    let result = tokio::task::spawn_blocking(move || simulate(seed, params))
        .await
        .map_err(|e| e.to_string())
        .and_then(|r| r);

    match result {
        Ok(response) => Ok(Json(response)),
        Err(error) => {
            log::warn!("simulate failed: {}", error);
            Err((StatusCode::BAD_REQUEST, Json(ErrorResponse { error })))
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let frontend = ServeDir::new("frontend");

    let app = Router::new()
        .route("/api/simulate", post(simulate_handler))
        .fallback_service(frontend)
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    log::info!("patchgen server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
