// src/ui.rs
use crate::config::{SimulationConfig, ValidatedConfig};
use crate::error::{SimError, SimResult};
use crate::model::PendulumModel;
use crate::playback::{Frame, Playback};
use actix_web::{http::StatusCode, web, HttpResponse, Result};
use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::{self, Cursor};
use tracing::{info, warn};

/// Largest grid a single request may ask for; every point becomes a frame in the response body.
pub const MAX_REQUEST_GRID_POINTS: usize = 250_000;

#[derive(Deserialize)]
pub struct SimParams {
    #[serde(flatten)]
    config: SimulationConfig, // Any field left out takes the CLI default
    #[serde(default = "default_plot")]
    plot: bool, // Render the PNG trajectory overview
}

fn default_plot() -> bool {
    true
}

#[derive(Serialize)]
struct SimResponse {
    success: bool, // Whether the simulation succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>, // Why it did not
    trajectory_image: String, // Base64-encoded PNG data URL, empty when not rendered
    #[serde(skip_serializing_if = "Option::is_none")]
    animation_data: Option<AnimationData>, // Per-frame screen data for the frontend
}

#[derive(Serialize)]
struct AnimationData {
    width: u32,
    height: u32,
    fps: u32,
    frame_delay_ms: u64,
    path_depth: usize, // Trail length the frontend should keep, 0 = all
    scale: f64,        // Pixels per meter
    frames: Vec<Frame>,
}

impl SimResponse {
    fn failure(err: &SimError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            trajectory_image: String::new(),
            animation_data: None,
        }
    }
}

/// Route table for the simulator API.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/simulate", web::post().to(simulate_handler));
}

pub async fn simulate_handler(params: web::Json<SimParams>) -> Result<HttpResponse> {
    let SimParams { config, plot } = params.into_inner();

    // Range-check before spending any time integrating
    let validated = match config.validate() {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "rejected simulation request");
            return Ok(HttpResponse::BadRequest().json(SimResponse::failure(&e)));
        }
    };

    // The CLI may run long horizons, one HTTP response may not
    let points = validated.grid().len();
    if points > MAX_REQUEST_GRID_POINTS {
        let e = SimError::config(format!(
            "time / dt yields {points} grid points, a request is limited to {MAX_REQUEST_GRID_POINTS}"
        ));
        warn!(error = %e, "rejected simulation request");
        return Ok(HttpResponse::BadRequest().json(SimResponse::failure(&e)));
    }

    // The solve is a blocking batch job, keep it off the async workers
    let outcome = web::block(move || run_simulation(&validated, plot)).await?;

    match outcome {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => {
            warn!(error = %e, "simulation failed");
            Ok(HttpResponse::build(StatusCode::UNPROCESSABLE_ENTITY).json(SimResponse::failure(&e)))
        }
    }
}

fn run_simulation(config: &ValidatedConfig, plot: bool) -> SimResult<SimResponse> {
    let model = PendulumModel::from_config(config)?;

    let trajectory_image = if plot {
        match render_trajectory_png(&model) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "trajectory plot unavailable");
                String::new()
            }
        }
    } else {
        String::new()
    };

    let frames: Vec<Frame> = Playback::new(&model, config).collect();
    let (width, height) = config.resolution();
    info!(frames = frames.len(), "simulation served");

    Ok(SimResponse {
        success: true,
        error: None,
        trajectory_image,
        animation_data: Some(AnimationData {
            width,
            height,
            fps: config.fps(),
            frame_delay_ms: config.frame_delay().as_millis() as u64,
            path_depth: config.path_depth(),
            scale: config.scale(),
            frames,
        }),
    })
}

/// Draws the paths of both bodies (meters) into a PNG and returns it as a data URL.
pub fn render_trajectory_png(model: &PendulumModel) -> io::Result<String> {
    // Image width in pixels
    const W: u32 = 500;

    // Image height in pixels
    const H: u32 = 500;

    // Plot limits: full reach of both rods plus padding
    let (l1, l2) = model.parameters().lengths();
    let limit = l1 + l2 + 0.5;

    let (xs1, ys1, xs2, ys2) = (0..model.len())
        .filter_map(|i| model.positions(i).ok())
        .fold(
            (Vec::new(), Vec::new(), Vec::new(), Vec::new()),
            |(mut a, mut b, mut c, mut d), p| {
                a.push(p.x1);
                b.push(p.y1);
                c.push(p.x2);
                d.push(p.y2);
                (a, b, c, d)
            },
        );

    // Allocate RGB pixel buffer (3 bytes per pixel)
    let mut pixel_buffer = vec![0u8; (W * H * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut pixel_buffer, (W, H)).into_drawing_area();

        root.fill(&WHITE).map_err(io::Error::other)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Double pendulum trajectory", ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(30)
            .build_cartesian_2d(-limit..limit, -limit..limit)
            .map_err(io::Error::other)?;

        chart.configure_mesh().draw().map_err(io::Error::other)?;

        // First body traces a circle arc, second body the chaotic path
        for (xs, ys, style) in [
            (&xs1, &ys1, BLUE.mix(0.75).stroke_width(1)),
            (&xs2, &ys2, RED.mix(0.75).stroke_width(1)),
        ] {
            chart
                .draw_series(LineSeries::new(
                    xs.iter().zip(ys.iter()).map(|(&x, &y)| (x, y)),
                    style,
                ))
                .map_err(io::Error::other)?;
        }

        root.present().map_err(io::Error::other)?;
    }

    let img_buffer = image::ImageBuffer::from_raw(W, H, pixel_buffer)
        .ok_or_else(|| io::Error::other("Failed to create image buffer"))?;

    let dynamic_image = image::DynamicImage::ImageRgb8(img_buffer);

    let mut png_buffer = Cursor::new(Vec::new());
    dynamic_image
        .write_to(&mut png_buffer, ImageFormat::Png)
        .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(png_buffer.into_inner())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn simulate_returns_frames() {
        let app = test::init_service(App::new().configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/simulate")
            .set_json(json!({
                "time": 5,
                "dt": 0.5,
                "fps": 2,
                "plot": false
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["trajectory_image"], "");
        let data = &body["animation_data"];
        assert_eq!(data["frame_delay_ms"], 500);
        assert_eq!(data["path_depth"], 50);
        // stride 1 over 11 grid points
        let frames = data["frames"].as_array().unwrap();
        assert_eq!(frames.len(), 11);
        assert_eq!(frames[0]["pivot"], json!({"x": 400, "y": 266}));
        assert!(frames[0]["info"][0]
            .as_str()
            .unwrap()
            .starts_with("Mass 1 X: "));
    }

    #[actix_web::test]
    async fn simulate_rejects_bad_mass() {
        let app = test::init_service(App::new().configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/simulate")
            .set_json(json!({ "mass": [0, 1], "plot": false }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("mass 1"));
        assert!(body.get("animation_data").is_none());
    }

    #[actix_web::test]
    async fn simulate_rejects_oversized_grid() {
        let app = test::init_service(App::new().configure(routes)).await;
        // 1e4 s at 0.01 s is a million points, fine for the CLI but not for one response
        let req = test::TestRequest::post()
            .uri("/simulate")
            .set_json(json!({ "time": 10000, "dt": 0.01, "plot": false }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("limited to"));
        assert!(body.get("animation_data").is_none());
    }
}
