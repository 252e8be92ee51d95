use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use winit::event::{ElementState, MouseButton};

use myth_stage::environment::EnvironmentConfig;
use myth_stage::{
    Environment, EnvironmentLoader, EnvironmentProps, PointerInput, PresentationControls,
    PresentationOptions, Stage, Transform,
};

/// `stage.json` layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StageConfig {
    environment: EnvironmentConfig,
    controls: PresentationOptions,
}

const DT: f32 = 1.0 / 60.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // 1. Config
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| concat!(env!("CARGO_MANIFEST_DIR"), "/stage.json").to_string());
    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read stage config '{path}'"))?;
    let config: StageConfig = serde_json::from_str(&text)?;

    // 2. Environment
    let stage = Stage::new();
    let loader = Arc::new(EnvironmentLoader::default());
    let props = EnvironmentProps::try_from(config.environment)?;
    let environment = Environment::new(props)?;

    let handle = match environment.mount(&loader, &stage).await {
        Ok(handle) => {
            let map = handle.map();
            println!(
                "Environment '{}': {}px, {} mip levels",
                map.label,
                map.size(),
                map.mip_level_count()
            );
            Some(handle)
        }
        Err(err) => {
            // Presets live on a CDN; keep going offline.
            log::warn!("Environment unavailable: {err}");
            None
        }
    };

    // 3. Scripted drag
    let mut controls = PresentationControls::new(config.controls)
        .with_cursor_callback(|icon| log::info!("cursor -> {icon:?}"));
    let mut input = PointerInput::new();
    let mut transform = Transform::new();
    input.handle_resize(1280, 720);
    input.handle_cursor_move(640.0, 360.0);
    input.set_hovered(true);

    let mut frame = |input: &mut PointerInput, label: &str| {
        controls.update(input, DT, &mut transform);
        input.end_frame();
        let r = controls.rotation();
        println!(
            "{label:>8}: polar {:+.3} azimuth {:+.3} scale {:.3}",
            r.x,
            r.y,
            controls.scale()
        );
    };

    frame(&mut input, "hover");
    input.handle_mouse_input(ElementState::Pressed, MouseButton::Left);
    frame(&mut input, "press");
    for step in 0..30 {
        let x = 640.0 + f64::from(step) * 12.0;
        let y = 360.0 + f64::from(step) * 6.0;
        input.handle_cursor_move(x, y);
        frame(&mut input, "drag");
    }
    input.handle_mouse_input(ElementState::Released, MouseButton::Left);
    frame(&mut input, "release");
    for _ in 0..60 {
        frame(&mut input, "settle");
    }

    if let Some(handle) = handle {
        handle.release();
    }
    Ok(())
}
