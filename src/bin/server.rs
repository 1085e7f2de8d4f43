//! Tower Calculator HTTP Server
//!
//! Serves the in-process geometry calculator over the same endpoints the
//! viewer's HTTP client talks to.

use std::sync::Arc;

use tower_viewer::prelude::*;
use tower_viewer::server::create_router;

fn default_library() -> ProfileLibrary {
    let round = [("RD 5/8in", 197.9, 0.0159), ("RD 3/4in", 285.0, 0.0191), ("RD 1in", 506.7, 0.0254), ("RD 2in", 2026.8, 0.0508)];
    let angular = [("L2x2x3/16", 461.3, 0.0508), ("L2.5x2.5x1/4", 759.4, 0.0635), ("L3x3x1/4", 923.9, 0.0762)];
    let descriptor = |(name, area, width): (&str, f64, f64)| ProfileDescriptor {
        cross_area: Some(area),
        projected_width: Some(width),
        ..ProfileDescriptor::named(name)
    };
    ProfileLibrary::new(
        round.into_iter().map(descriptor).collect(),
        angular.into_iter().map(descriptor).collect(),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ViewerConfig::from_env();
    let calculator = Arc::new(LocalCalculator::new(default_library()).with_layouts(config.layouts));
    let app = create_router(calculator);

    let addr = config.bind_addr();
    println!("Tower Calculator Server listening on http://{}", addr);
    println!("  Health check: GET  /health");
    println!("  Calculate:    POST /api/calculate/section-json");
    println!("  Library:      GET  /api/section-library");
    println!("  Download:     GET  /api/download_json/{{tower_id}}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
